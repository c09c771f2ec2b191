//! Local tool execution.

mod catalog;
pub mod errors;
mod host;
mod sql;
mod types;

pub use catalog::ToolCatalog;
pub use errors::ToolError;
pub use host::ToolHost;
pub use sql::{EXECUTE_SQL, SqlToolHost};
pub use types::ToolCall;
