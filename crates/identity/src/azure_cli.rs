//! Azure CLI credential.
//!
//! Shells out to `az account get-access-token`, so whatever account the user
//! signed into with `az login` is used. This is the usual path on a
//! developer machine.

use crate::{AccessToken, Error, Result, TokenCredential};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_COMMAND: &str = "az";

/// Token source backed by the `az` CLI.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    command: String,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
        }
    }

    /// Use a custom command path instead of `az`.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Unix timestamp, present in newer CLI versions.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
    /// Local time without offset, e.g. `2026-01-02 13:14:15.000000`.
    #[serde(default)]
    expires_on: Option<String>,
}

impl TokenCredential for AzureCliCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("account")
            .arg("get-access-token")
            .arg("--output")
            .arg("json")
            .arg("--scope")
            .arg(scope)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(scope, "requesting token from azure cli");
        let output = cmd.output().await.map_err(|e| {
            Error::Unavailable(format!("failed to run {}: {e}", self.command))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Cli(format!(
                "exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_cli_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_cli_output(stdout: &str) -> Result<AccessToken> {
    let parsed: CliToken =
        serde_json::from_str(stdout).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    let expires_at = match (parsed.expires_on_unix, parsed.expires_on.as_deref()) {
        (Some(secs), _) => DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| Error::InvalidResponse(format!("bad expires_on: {secs}")))?,
        (None, Some(local)) => parse_local_time(local)?,
        (None, None) => return Err(Error::InvalidResponse("missing token expiry".into())),
    };

    Ok(AccessToken::new(parsed.access_token, expires_at))
}

fn parse_local_time(value: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| Error::InvalidResponse(format!("bad expiresOn '{value}': {e}")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidResponse(format!("ambiguous expiresOn '{value}'")))
}
