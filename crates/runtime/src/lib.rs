//! lakechat runtime: hosted agent sessions with local function calls.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Backend**: a trait over the model provider. The conversation lives
//!   on the server; each request carries the conversation id plus either
//!   the user's message or the outputs of the previous function calls.
//! - **FoundryClient**: the [`Backend`] for a Foundry project (Responses API).
//! - **ToolHost**: executes function calls locally. [`SqlToolHost`] serves
//!   `execute_sql` from a [`warehouse::Warehouse`].
//! - **Session**: resolves one user message into the agent's final text,
//!   running every function call the model asks for until it answers in
//!   plain text.
//!
//! # Example
//!
//! ```no_run
//! use identity::DefaultCredential;
//! use runtime::{FoundryClient, Session, SqlToolHost};
//! use warehouse::SqliteWarehouse;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FoundryClient::builder(
//!     "https://example.services.ai.azure.com/api/projects/demo",
//!     DefaultCredential::from_env(),
//! )
//! .build()?;
//! let agent = client.get_agent("sales-analyst").await?;
//! let tools = SqlToolHost::new(SqliteWarehouse::open("snapshot.db")?);
//!
//! let session = Session::start(client, tools, agent).await?;
//! println!("{}", session.resolve("Which region sold the most?").await?);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod providers;
mod session;
pub mod tools;

pub use error::{Error, Result};

pub use model::{
    AgentDefinition, Backend, ConversationId, FunctionCall, FunctionCallOutput, ModelError,
    ModelRequest, ModelResponse, ResponseItem, Role, ToolSpec, TurnInput, Usage,
};

pub use providers::{DEFAULT_API_VERSION, FoundryClient, FoundryClientBuilder};

pub use session::{DEFAULT_MAX_ITERATIONS, Session, TurnObserver};

pub use tools::{EXECUTE_SQL, SqlToolHost, ToolCall, ToolCatalog, ToolError, ToolHost};
