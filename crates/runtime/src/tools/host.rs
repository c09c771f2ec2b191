//! Tool host trait.

use super::{ToolCall, ToolError};
use crate::model::ToolSpec;
use std::future::Future;

/// Trait for tool execution hosts.
///
/// Implementations provide tool specifications and execute tool calls.
/// This is the boundary between the model loop and side effects.
pub trait ToolHost: Send + Sync {
    /// Get available tool specifications.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool call, returning the text sent back to the model.
    fn execute(&self, call: &ToolCall) -> impl Future<Output = Result<String, ToolError>> + Send;
}
