//! Interactive chat loop.

use runtime::{Backend, EXECUTE_SQL, Session, ToolHost, TurnObserver};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

const SQL_PREVIEW_CHARS: usize = 100;
const HELP_QUESTIONS: usize = 5;

/// Anything that can answer a user message.
pub trait Agent {
    fn ask(
        &self,
        message: &str,
        observer: &impl TurnObserver,
    ) -> impl Future<Output = runtime::Result<String>> + Send;
}

impl<B: Backend, T: ToolHost> Agent for Session<B, T> {
    fn ask(
        &self,
        message: &str,
        observer: &impl TurnObserver,
    ) -> impl Future<Output = runtime::Result<String>> + Send {
        self.resolve_observed(message, observer)
    }
}

/// Prints each SQL statement as the agent runs it.
struct SqlEcho<'a, W> {
    out: &'a Mutex<W>,
}

impl<W: Write + Send> TurnObserver for SqlEcho<'_, W> {
    fn on_function_call(&self, name: &str, arguments: &Value) {
        if name != EXECUTE_SQL {
            return;
        }
        let sql = arguments
            .get("sql_query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let _ = say(
            self.out,
            format_args!("\n  [Executing SQL]\n  {}\n", preview(sql)),
        );
    }
}

/// Read questions from `input` until quit or EOF, writing answers to
/// `output`.
pub async fn run<A, R, W>(agent: &A, mut input: R, output: W, samples: &[String]) -> io::Result<()>
where
    A: Agent,
    R: BufRead,
    W: Write + Send,
{
    let out = Mutex::new(output);
    let echo = SqlEcho { out: &out };

    loop {
        say(&out, format_args!("\nYou: "))?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            say(&out, format_args!("\n\nGoodbye!\n"))?;
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        match message.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                say(&out, format_args!("\nGoodbye!\n"))?;
                break;
            }
            "help" => {
                say(&out, format_args!("\nSample questions:\n"))?;
                for question in samples.iter().take(HELP_QUESTIONS) {
                    say(&out, format_args!("  - {question}\n"))?;
                }
                continue;
            }
            _ => {}
        }

        say(&out, format_args!("\nAgent: "))?;
        match agent.ask(message, &echo).await {
            Ok(answer) if answer.is_empty() => say(&out, format_args!("(No response)\n"))?,
            Ok(answer) => say(&out, format_args!("{answer}\n"))?,
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                say(&out, format_args!("Error: {e}\n"))?;
            }
        }
    }

    Ok(())
}

fn say<W: Write>(out: &Mutex<W>, text: fmt::Arguments<'_>) -> io::Result<()> {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    out.write_fmt(text)?;
    out.flush()
}

/// First 100 characters, with `...` when cut.
fn preview(sql: &str) -> String {
    let mut chars = sql.chars();
    let head: String = chars.by_ref().take(SQL_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
