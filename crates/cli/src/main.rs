mod config;
mod error;
mod repl;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use identity::{CachedCredential, DefaultCredential};
use runtime::{FoundryClient, Session, SqlToolHost};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use warehouse::{AnyWarehouse, FabricWarehouse, LakehouseClient, SqlEndpoint, SqliteWarehouse};

use config::{Config, DataSource, Overrides, Settings};
use error::{Error, Result};

const LOG_ENV: &str = "LAKECHAT_LOG";

type Credential = Arc<CachedCredential<DefaultCredential>>;

#[derive(Parser)]
#[command(name = "lakechat")]
#[command(about = "Chat with a Foundry agent that answers questions from your lakehouse", long_about = None)]
#[command(version)]
struct Cli {
    /// Foundry agent id (defaults to FOUNDRY_AGENT_ID, then agent_ids.json)
    #[arg(long)]
    agent_id: Option<String>,

    /// Config file (defaults to ./lakechat.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query a local SQLite snapshot instead of the lakehouse SQL endpoint
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Tool rounds allowed per question
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    let overrides = Overrides {
        agent_id: cli.agent_id,
        sqlite: cli.sqlite,
        max_iterations: cli.max_iterations,
    };
    let settings = Settings::resolve(config, overrides, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    })?;

    let credential: Credential = Arc::new(CachedCredential::new(DefaultCredential::from_env()));
    tracing::debug!(sources = ?credential_sources(&credential), "credential chain");

    let rule = "=".repeat(60);
    println!("\n{rule}\nAI Foundry Agent Chat\n{rule}");
    println!("Agent ID: {}", settings.agent_id);
    println!(
        "Lakehouse: {}",
        settings.source.lakehouse_name().unwrap_or("(unknown)")
    );
    println!("Type 'quit' to exit, 'help' for sample questions\n");

    let warehouse = open_warehouse(&settings, &credential).await?;

    let mut builder = FoundryClient::builder(&settings.endpoint, Arc::clone(&credential))
        .timeout(settings.request_timeout);
    if let Some(version) = &settings.api_version {
        builder = builder.api_version(version);
    }
    let client = builder.build().map_err(runtime::Error::from)?;
    tracing::debug!(%client, "model client ready");

    let agent = client
        .get_agent(&settings.agent_id)
        .await
        .map_err(|source| Error::Agent {
            agent_id: settings.agent_id.clone(),
            source,
        })?;
    println!("Model: {}", agent.model);

    let mut session = Session::start(client, SqlToolHost::new(warehouse), agent).await?;
    if let Some(limit) = settings.max_iterations {
        session = session.with_max_iterations(limit);
    }
    println!("Conversation ID: {}", session.conversation_id());
    println!("{}", "-".repeat(60));
    io::stdout().flush()?;

    repl::run(
        &session,
        io::stdin().lock(),
        io::stdout(),
        &settings.sample_questions,
    )
    .await?;

    println!(
        "\nSession ended. Conversation ID: {}",
        session.conversation_id()
    );
    Ok(())
}

/// Pick the backend for `execute_sql` and report it in the banner.
///
/// A lakehouse whose SQL endpoint cannot be discovered still starts a
/// session; its queries report the missing endpoint to the model.
async fn open_warehouse(
    settings: &Settings,
    credential: &Credential,
) -> Result<AnyWarehouse<DefaultCredential>> {
    match &settings.source {
        DataSource::Sqlite { path, .. } => {
            let warehouse = SqliteWarehouse::open(path)?.with_timeout(settings.query_timeout);
            println!("SQLite snapshot: {}", path.display());
            Ok(AnyWarehouse::Sqlite(warehouse))
        }
        DataSource::Fabric {
            workspace_id,
            lakehouse,
            api_base,
        } => {
            let mut lookup = LakehouseClient::new(Arc::clone(credential));
            if let Some(base) = api_base {
                lookup = lookup.with_api_base(base);
            }

            let discovered = match lookup
                .sql_endpoint(workspace_id, &lakehouse.lakehouse_id)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, "SQL endpoint lookup failed");
                    None
                }
            };

            let endpoint = discovered.and_then(|raw| match raw.parse::<SqlEndpoint>() {
                Ok(endpoint) => Some(endpoint),
                Err(e) => {
                    tracing::warn!(endpoint = %raw, error = %e, "unusable SQL endpoint");
                    None
                }
            });

            match endpoint {
                Some(endpoint) => {
                    println!("SQL Endpoint: {endpoint}");
                    Ok(AnyWarehouse::Fabric(
                        FabricWarehouse::new(
                            endpoint,
                            &lakehouse.lakehouse_name,
                            Arc::clone(credential),
                        )
                        .with_timeout(settings.query_timeout),
                    ))
                }
                None => {
                    println!("WARNING: Could not get SQL endpoint. SQL queries may fail.");
                    Ok(AnyWarehouse::Unavailable)
                }
            }
        }
    }
}

fn credential_sources(credential: &Credential) -> Vec<String> {
    credential
        .inner()
        .sources()
        .iter()
        .map(ToString::to_string)
        .collect()
}
