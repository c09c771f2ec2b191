//! Session management and the tool-call resolution loop.

use crate::model::{
    AgentDefinition, Backend, ConversationId, FunctionCall, FunctionCallOutput, ModelRequest,
    TurnInput,
};
use crate::tools::{ToolCall, ToolCatalog, ToolHost};
use crate::{Error, Result};
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

/// Default bound on tool rounds per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Hooks for watching a turn while it resolves.
///
/// Both methods default to doing nothing.
pub trait TurnObserver: Send + Sync {
    /// Called before a function runs, with its decoded arguments.
    fn on_function_call(&self, _name: &str, _arguments: &Value) {}

    /// Called with the output about to be sent back to the model.
    fn on_function_output(&self, _name: &str, _output: &str) {}
}

impl TurnObserver for () {}

/// A conversation with a hosted agent.
///
/// The server keeps the history; the session only holds the conversation
/// id and the agent's definition, and resolves function calls locally.
pub struct Session<B, T> {
    backend: B,
    tools: T,
    agent: AgentDefinition,
    catalog: ToolCatalog,
    conversation: ConversationId,
    max_iterations: usize,
}

impl<B: Backend, T: ToolHost> Session<B, T> {
    /// Validate the agent's tools against `tools` and open a conversation.
    pub async fn start(backend: B, tools: T, agent: AgentDefinition) -> Result<Self> {
        let catalog = ToolCatalog::new(&agent.tools, &tools)?;
        let conversation = backend.create_conversation().await?;
        tracing::info!(
            conversation = %conversation,
            model = %agent.model,
            functions = ?catalog.names().collect::<Vec<_>>(),
            "session started"
        );

        Ok(Self {
            backend,
            tools,
            agent,
            catalog,
            conversation,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        })
    }

    /// Set the number of tool rounds allowed per turn.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation
    }

    /// Send a user message and return the agent's final text.
    pub async fn resolve(&self, message: &str) -> Result<String> {
        self.resolve_observed(message, &()).await
    }

    /// Like [`resolve`](Self::resolve), reporting each function call to
    /// `observer`.
    pub async fn resolve_observed(
        &self,
        message: &str,
        observer: &impl TurnObserver,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(Error::InvalidState("empty message".into()));
        }

        let span = tracing::info_span!(
            "turn",
            turn_id = %Uuid::new_v4(),
            conversation = %self.conversation,
        );
        self.run_turn(message, observer).instrument(span).await
    }

    async fn run_turn(&self, message: &str, observer: &impl TurnObserver) -> Result<String> {
        let mut input = TurnInput::Message(message.to_string());
        let mut parts: Vec<String> = Vec::new();
        let mut rounds = 0;

        loop {
            let response = self.backend.respond(self.request(&input)).await?;
            parts.extend(response.texts().map(str::to_string));

            let calls = response.function_calls();
            if calls.is_empty() {
                tracing::debug!(rounds, response = %response.id, "turn complete");
                return Ok(parts.join("\n").trim().to_string());
            }
            if rounds == self.max_iterations {
                tracing::warn!(limit = self.max_iterations, "tool round limit reached");
                return Err(Error::MaxIterationsExceeded {
                    limit: self.max_iterations,
                });
            }
            rounds += 1;
            tracing::debug!(round = rounds, calls = calls.len(), "resolving function calls");

            let mut outputs = Vec::with_capacity(calls.len());
            for call in calls {
                let output = self.dispatch(call, observer).await;
                outputs.push(FunctionCallOutput {
                    call_id: call.call_id.clone(),
                    output,
                });
            }
            input = TurnInput::FunctionOutputs(outputs);
        }
    }

    fn request<'a>(&'a self, input: &'a TurnInput) -> ModelRequest<'a> {
        ModelRequest {
            model: &self.agent.model,
            instructions: &self.agent.instructions,
            tools: &self.agent.tools,
            conversation: &self.conversation,
            input,
        }
    }

    async fn dispatch(&self, call: &FunctionCall, observer: &impl TurnObserver) -> String {
        let arguments = decode_arguments(call);
        observer.on_function_call(&call.name, &arguments);

        let output = if self.catalog.contains(&call.name) {
            let tool_call = ToolCall {
                id: call.call_id.clone(),
                name: call.name.clone(),
                input: arguments,
            };
            match self.tools.execute(&tool_call).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(name = %call.name, error = %e, "tool failed");
                    format!("Error: {e}")
                }
            }
        } else {
            tracing::warn!(name = %call.name, "model called an unknown function");
            format!("Error: unknown function '{}'", call.name)
        };

        observer.on_function_output(&call.name, &output);
        output
    }
}

/// Arguments as a JSON object; anything else becomes `{}`.
fn decode_arguments(call: &FunctionCall) -> Value {
    if call.arguments.trim().is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            tracing::warn!(
                name = %call.name,
                call_id = %call.call_id,
                "function arguments are not a JSON object; using {{}}"
            );
            Value::Object(Map::new())
        }
    }
}
