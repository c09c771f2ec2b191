//! Fabric REST lookup of a lakehouse's SQL endpoint.

use crate::{Error, Result};
use identity::{FABRIC_API_SCOPE, TokenCredential};
use serde::Deserialize;

pub const DEFAULT_FABRIC_API_BASE: &str = "https://api.fabric.microsoft.com";

/// Client for the Fabric lakehouse API.
pub struct LakehouseClient<C> {
    client: reqwest::Client,
    api_base: String,
    credential: C,
}

#[derive(Debug, Deserialize)]
struct LakehouseResponse {
    #[serde(default)]
    properties: Option<LakehouseProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LakehouseProperties {
    #[serde(default)]
    sql_endpoint_properties: Option<SqlEndpointProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SqlEndpointProperties {
    #[serde(default)]
    connection_string: Option<String>,
}

impl<C: TokenCredential> LakehouseClient<C> {
    pub fn new(credential: C) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_FABRIC_API_BASE.to_string(),
            credential,
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Look up the SQL endpoint host for a lakehouse.
    ///
    /// Returns `None` when the API answers with a non-success status or the
    /// lakehouse has no SQL endpoint provisioned yet.
    pub async fn sql_endpoint(
        &self,
        workspace_id: &str,
        lakehouse_id: &str,
    ) -> Result<Option<String>> {
        let token = self.credential.token(FABRIC_API_SCOPE).await?;
        let url = format!(
            "{}/v1/workspaces/{workspace_id}/lakehouses/{lakehouse_id}",
            self.api_base
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(%status, workspace_id, lakehouse_id, "lakehouse lookup failed");
            return Ok(None);
        }

        let body: LakehouseResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        Ok(body
            .properties
            .and_then(|p| p.sql_endpoint_properties)
            .and_then(|p| p.connection_string)
            .filter(|s| !s.trim().is_empty()))
    }
}
