//! Foundry project backend (OpenAI-compatible Responses API).

use crate::model::{
    AgentDefinition, Backend, ConversationId, FunctionCall, ModelError, ModelRequest,
    ModelResponse, ResponseItem, Role, TurnInput, Usage,
};
use identity::{AI_PROJECT_SCOPE, TokenCredential};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: ApiInput<'a>,
    instructions: &'a str,
    tools: &'a [Value],
    conversation: ApiConversationRef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiInput<'a> {
    Text(&'a str),
    Items(Vec<ApiInputItem<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiInputItem<'a> {
    FunctionCallOutput { call_id: &'a str, output: &'a str },
}

#[derive(Debug, Serialize)]
struct ApiConversationRef<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    output: Vec<ApiOutputItem>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiOutputItem {
    Message {
        #[serde(default)]
        role: Role,
        #[serde(default)]
        content: Vec<ApiContentPart>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiConversation {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiAgent {
    versions: ApiAgentVersions,
}

#[derive(Debug, Deserialize)]
struct ApiAgentVersions {
    latest: ApiAgentVersion,
}

#[derive(Debug, Deserialize)]
struct ApiAgentVersion {
    definition: ApiAgentDefinition,
}

#[derive(Debug, Deserialize)]
struct ApiAgentDefinition {
    model: String,
    #[serde(default)]
    instructions: String,
    #[serde(default)]
    tools: Vec<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a Foundry client.
#[derive(Debug, Clone)]
pub struct FoundryClientBuilder<C> {
    endpoint: String,
    credential: C,
    api_version: String,
    timeout: Duration,
}

impl<C: TokenCredential> FoundryClientBuilder<C> {
    pub fn new(endpoint: impl Into<String>, credential: C) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credential,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Bound every HTTP request, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<FoundryClient<C>, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;
        Ok(FoundryClient {
            client,
            endpoint: self.endpoint,
            api_version: self.api_version,
            credential: self.credential,
        })
    }
}

/// Client for a Foundry project: agent lookup, conversations, responses.
pub struct FoundryClient<C> {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    credential: C,
}

impl<C: TokenCredential> FoundryClient<C> {
    pub fn builder(endpoint: impl Into<String>, credential: C) -> FoundryClientBuilder<C> {
        FoundryClientBuilder::new(endpoint, credential)
    }

    /// Fetch the latest version of an agent's definition.
    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentDefinition, ModelError> {
        let url = format!("{}/agents/{agent_id}", self.endpoint);
        let agent: ApiAgent = self.send(self.client.get(url)).await?;
        let definition = agent.versions.latest.definition;
        Ok(AgentDefinition {
            model: definition.model,
            instructions: definition.instructions,
            tools: definition.tools,
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ModelError> {
        let token = self
            .credential
            .token(AI_PROJECT_SCOPE)
            .await
            .map_err(|e| ModelError::Auth(e.to_string()))?;

        let response = req
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(&token.token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout
            } else {
                ModelError::InvalidResponse(e.to_string())
            }
        })
    }

    fn input_to_api(input: &TurnInput) -> ApiInput<'_> {
        match input {
            TurnInput::Message(text) => ApiInput::Text(text),
            TurnInput::FunctionOutputs(outputs) => ApiInput::Items(
                outputs
                    .iter()
                    .map(|o| ApiInputItem::FunctionCallOutput {
                        call_id: &o.call_id,
                        output: &o.output,
                    })
                    .collect(),
            ),
        }
    }

    fn response_from_api(api: ApiResponse) -> Result<ModelResponse, ModelError> {
        if api.status.as_deref() == Some("failed") {
            let message = api
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "response failed".to_string());
            return Err(ModelError::InvalidResponse(message));
        }

        let output = api
            .output
            .into_iter()
            .filter_map(|item| match item {
                ApiOutputItem::Message { role, content } => Some(ResponseItem::Message {
                    role,
                    parts: content
                        .into_iter()
                        .filter_map(|part| match part {
                            ApiContentPart::OutputText { text } => Some(text),
                            ApiContentPart::Other => None,
                        })
                        .collect(),
                }),
                ApiOutputItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => Some(ResponseItem::FunctionCall(FunctionCall {
                    call_id,
                    name,
                    arguments,
                })),
                ApiOutputItem::Other => None,
            })
            .collect();

        let usage = api
            .usage
            .map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            id: api.id,
            output,
            usage,
        })
    }
}

impl<C> std::fmt::Display for FoundryClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "foundry({}, api-version={})", self.endpoint, self.api_version)
    }
}

impl<C: TokenCredential> Backend for FoundryClient<C> {
    async fn create_conversation(&self) -> Result<ConversationId, ModelError> {
        let url = format!("{}/openai/conversations", self.endpoint);
        let conversation: ApiConversation = self
            .send(self.client.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(ConversationId::new(conversation.id))
    }

    async fn respond(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: request.model,
            input: Self::input_to_api(request.input),
            instructions: request.instructions,
            tools: request.tools,
            conversation: ApiConversationRef {
                id: request.conversation.as_str(),
            },
        };

        let url = format!("{}/openai/responses", self.endpoint);
        let api_response: ApiResponse = self.send(self.client.post(url).json(&api_request)).await?;
        let response = Self::response_from_api(api_response)?;
        tracing::debug!(
            response = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model responded"
        );
        Ok(response)
    }
}

fn map_transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FunctionCallOutput;
    use identity::StaticTokenCredential;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FoundryClient<StaticTokenCredential> {
        FoundryClient::builder(server.uri(), StaticTokenCredential::new("project-token"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn fetches_latest_agent_definition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agents/sales-agent"))
            .and(query_param("api-version", DEFAULT_API_VERSION))
            .and(header("authorization", "Bearer project-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "sales-agent",
                "versions": {
                    "latest": {
                        "version": "3",
                        "definition": {
                            "kind": "prompt",
                            "model": "gpt-4o",
                            "instructions": "Answer with SQL.",
                            "tools": [{"type": "function", "name": "execute_sql"}]
                        }
                    }
                }
            })))
            .mount(&server)
            .await;

        let agent = client(&server).get_agent("sales-agent").await.unwrap();
        assert_eq!(agent.model, "gpt-4o");
        assert_eq!(agent.instructions, "Answer with SQL.");
        assert_eq!(agent.tools.len(), 1);
    }

    #[tokio::test]
    async fn creates_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "conv_123",
                "object": "conversation"
            })))
            .mount(&server)
            .await;

        let id = client(&server).create_conversation().await.unwrap();
        assert_eq!(id.as_str(), "conv_123");
    }

    #[tokio::test]
    async fn sends_function_outputs_and_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/responses"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "conversation": {"id": "conv_1"},
                "input": [{"type": "function_call_output", "call_id": "call_9", "output": "| a |"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_2",
                "status": "completed",
                "output": [
                    {"type": "reasoning", "id": "rs_1", "summary": []},
                    {
                        "type": "message",
                        "role": "assistant",
                        "content": [
                            {"type": "output_text", "text": "There are 3.", "annotations": []},
                            {"type": "refusal", "refusal": "no"}
                        ]
                    },
                    {"type": "function_call", "call_id": "call_10", "name": "execute_sql", "arguments": "{\"sql_query\":\"SELECT 1\"}"}
                ],
                "usage": {"input_tokens": 12, "output_tokens": 4, "total_tokens": 16}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let conversation = ConversationId::new("conv_1");
        let input = TurnInput::FunctionOutputs(vec![FunctionCallOutput {
            call_id: "call_9".into(),
            output: "| a |".into(),
        }]);
        let response = client(&server)
            .respond(ModelRequest {
                model: "gpt-4o",
                instructions: "be brief",
                tools: &[],
                conversation: &conversation,
                input: &input,
            })
            .await
            .unwrap();

        assert_eq!(response.id, "resp_2");
        assert_eq!(response.texts().collect::<Vec<_>>(), vec!["There are 3."]);
        let calls = response.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call_id, "call_10");
        assert_eq!(response.usage.input_tokens, 12);
    }

    #[tokio::test]
    async fn failed_status_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_x",
                "status": "failed",
                "error": {"code": "server_error", "message": "model overloaded"},
                "output": []
            })))
            .mount(&server)
            .await;

        let conversation = ConversationId::new("conv_1");
        let input = TurnInput::Message("hi".into());
        let err = client(&server)
            .respond(ModelRequest {
                model: "gpt-4o",
                instructions: "",
                tools: &[],
                conversation: &conversation,
                input: &input,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(ref m) if m == "model overloaded"));
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("conversation not found"))
            .mount(&server)
            .await;

        let err = client(&server).create_conversation().await.unwrap_err();
        match err {
            ModelError::Api { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "conversation not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "conv_1"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = FoundryClient::builder(server.uri(), StaticTokenCredential::new("t"))
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = client.create_conversation().await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout));
    }
}
