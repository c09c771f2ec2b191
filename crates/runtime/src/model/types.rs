use super::errors::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// The role of a message author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    #[default]
    Assistant,
}

/// Server-held conversation handle.
///
/// Assigned once when the session starts and sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A function the model asked the client to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Correlation id; the output must echo it.
    pub call_id: String,
    pub name: String,
    /// Serialized JSON arguments, exactly as the model produced them.
    pub arguments: String,
}

/// The client's answer to a [`FunctionCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallOutput {
    pub call_id: String,
    pub output: String,
}

/// One item of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseItem {
    /// Text for the user, one entry per content part.
    Message { role: Role, parts: Vec<String> },
    FunctionCall(FunctionCall),
}

/// What the client sends on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    /// The user's message; first request of a turn.
    Message(String),
    /// Results for the previous response's function calls.
    FunctionOutputs(Vec<FunctionCallOutput>),
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

impl ToolSpec {
    /// Parse a function declaration. Hosted tools (search and the like)
    /// return `None`.
    pub fn from_declaration(declaration: &Value) -> Option<Self> {
        if declaration.get("type").and_then(Value::as_str) != Some("function") {
            return None;
        }
        // Older declarations nest the body under "function".
        let body = declaration.get("function").unwrap_or(declaration);
        let name = body.get("name")?.as_str()?.to_string();
        Some(Self {
            name,
            description: body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            parameters: body.get("parameters").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Model, instructions and tool declarations of a hosted agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub model: String,
    pub instructions: String,
    /// Raw declarations, sent verbatim on every request.
    pub tools: Vec<Value>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for a model request.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub instructions: &'a str,
    pub tools: &'a [Value],
    pub conversation: &'a ConversationId,
    pub input: &'a TurnInput,
}

/// The response from a model.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub id: String,
    pub output: Vec<ResponseItem>,
    pub usage: Usage,
}

impl ModelResponse {
    /// Text parts of every message item, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponseItem::Message { parts, .. } => Some(parts),
                ResponseItem::FunctionCall(_) => None,
            })
            .flatten()
            .map(String::as_str)
    }

    /// Function calls, in order.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                ResponseItem::FunctionCall(call) => Some(call),
                ResponseItem::Message { .. } => None,
            })
            .collect()
    }
}

/// Trait for conversational model backends.
pub trait Backend: Send + Sync {
    /// Create the server-side conversation for a new session.
    fn create_conversation(
        &self,
    ) -> impl Future<Output = Result<ConversationId, ModelError>> + Send;

    /// Send one request and wait for the complete response.
    fn respond(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, name: &str) -> ResponseItem {
        ResponseItem::FunctionCall(FunctionCall {
            call_id: id.into(),
            name: name.into(),
            arguments: "{}".into(),
        })
    }

    #[test]
    fn response_text_and_call_extraction() {
        let response = ModelResponse {
            id: "resp_1".into(),
            output: vec![
                ResponseItem::Message {
                    role: Role::Assistant,
                    parts: vec!["Let me check".into(), "the data".into()],
                },
                call("c1", "execute_sql"),
                call("c2", "execute_sql"),
            ],
            usage: Usage::default(),
        };

        assert_eq!(
            response.texts().collect::<Vec<_>>(),
            vec!["Let me check", "the data"]
        );
        let calls = response.function_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call_id, "c1");
        assert_eq!(calls[1].call_id, "c2");
    }

    #[test]
    fn flat_function_declaration() {
        let declaration = json!({
            "type": "function",
            "name": "execute_sql",
            "description": "Run SQL",
            "parameters": {"type": "object"}
        });
        assert_eq!(
            ToolSpec::from_declaration(&declaration),
            Some(ToolSpec {
                name: "execute_sql".into(),
                description: "Run SQL".into(),
                parameters: json!({"type": "object"}),
            })
        );
    }

    #[test]
    fn hosted_tools_are_not_functions() {
        let hosted = json!({"type": "azure_ai_search", "azure_ai_search": {}});
        assert_eq!(ToolSpec::from_declaration(&hosted), None);
    }

    #[test]
    fn nested_function_declaration() {
        let nested = json!({
            "type": "function",
            "function": {"name": "execute_sql", "parameters": {}}
        });
        let spec = ToolSpec::from_declaration(&nested).unwrap();
        assert_eq!(spec.name, "execute_sql");
        assert_eq!(spec.description, "");
    }
}
