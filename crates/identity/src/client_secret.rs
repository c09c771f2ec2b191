//! Service principal credential (OAuth2 client-credentials grant).

use crate::{AccessToken, Error, Result, TokenCredential};
use chrono::{Duration, Utc};
use serde::Deserialize;

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Service principal identified by tenant, client id and secret.
#[derive(Clone)]
pub struct ClientSecretCredential {
    client: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Build from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Unavailable(format!("{name} not set")))
        };
        Ok(Self::new(
            var("AZURE_TENANT_ID")?,
            var("AZURE_CLIENT_ID")?,
            var("AZURE_CLIENT_SECRET")?,
        ))
    }

    /// Override the authority host (sovereign clouds, tests).
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenCredential for ClientSecretCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];

        tracing::debug!(scope, tenant = %self.tenant_id, "requesting client-credentials token");
        let response = self
            .client
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(Error::Authentication(format!("{status}: {detail}")));
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        Ok(AccessToken::new(
            parsed.access_token,
            Utc::now() + Duration::seconds(parsed.expires_in),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn exchanges_secret_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "issued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new("tenant-1", "app-1", "shh")
            .with_authority(server.uri());
        let token = credential.token("https://ai.azure.com/.default").await.unwrap();
        assert_eq!(token.token, "issued");
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn surfaces_error_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let credential =
            ClientSecretCredential::new("t", "c", "wrong").with_authority(server.uri());
        let err = credential.token("scope").await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(message.contains("invalid_client"));
        assert!(message.contains("AADSTS7000215"));
    }

    #[test]
    fn debug_hides_secret() {
        let credential = ClientSecretCredential::new("t", "c", "very-secret");
        assert!(!format!("{credential:?}").contains("very-secret"));
    }
}
