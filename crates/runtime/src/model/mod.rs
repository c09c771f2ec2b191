//! Model protocol types and backend trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{
    AgentDefinition, Backend, ConversationId, FunctionCall, FunctionCallOutput, ModelRequest,
    ModelResponse, ResponseItem, Role, ToolSpec, TurnInput, Usage,
};
