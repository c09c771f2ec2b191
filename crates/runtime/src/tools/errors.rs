use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// None of these end a turn: the session hands the display text back to
/// the model as the function output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("execution failed: {0}")]
    Execution(String),
}
