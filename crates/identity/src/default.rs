//! Credential chain.

use crate::{
    AccessToken, AzureCliCredential, ClientSecretCredential, Error, Result,
    StaticTokenCredential, TokenCredential,
};

/// One link in a [`DefaultCredential`] chain.
#[derive(Debug)]
pub enum CredentialSource {
    ClientSecret(ClientSecretCredential),
    Static(StaticTokenCredential),
    AzureCli(AzureCliCredential),
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientSecret(_) => write!(f, "client_secret"),
            Self::Static(_) => write!(f, "static_token"),
            Self::AzureCli(_) => write!(f, "azure_cli"),
        }
    }
}

impl CredentialSource {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        match self {
            Self::ClientSecret(c) => c.token(scope).await,
            Self::Static(c) => c.token(scope).await,
            Self::AzureCli(c) => c.token(scope).await,
        }
    }
}

/// Tries each source in order; the first token wins.
#[derive(Debug)]
pub struct DefaultCredential {
    sources: Vec<CredentialSource>,
}

impl DefaultCredential {
    /// Build the chain from whatever the environment provides.
    ///
    /// Order: service principal (`AZURE_TENANT_ID`/`AZURE_CLIENT_ID`/
    /// `AZURE_CLIENT_SECRET`), then `AZURE_ACCESS_TOKEN`, then the Azure CLI.
    pub fn from_env() -> Self {
        let mut sources = Vec::new();
        if let Ok(c) = ClientSecretCredential::from_env() {
            sources.push(CredentialSource::ClientSecret(c));
        }
        if let Ok(c) = StaticTokenCredential::from_env() {
            sources.push(CredentialSource::Static(c));
        }
        sources.push(CredentialSource::AzureCli(AzureCliCredential::new()));
        Self { sources }
    }

    /// Build a chain from explicit sources.
    pub fn from_sources(sources: Vec<CredentialSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }
}

impl TokenCredential for DefaultCredential {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.token(scope).await {
                Ok(token) => {
                    tracing::debug!(%source, scope, "acquired token");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::debug!(%source, scope, error = %e, "credential source failed");
                    failures.push(format!("{source}: {e}"));
                }
            }
        }
        Err(Error::Exhausted(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_success_wins() {
        let chain = DefaultCredential::from_sources(vec![
            CredentialSource::AzureCli(
                AzureCliCredential::new().with_command("definitely-not-az-binary"),
            ),
            CredentialSource::Static(StaticTokenCredential::new("fallback")),
        ]);
        let token = chain.token("scope").await.unwrap();
        assert_eq!(token.token, "fallback");
    }

    #[tokio::test]
    async fn exhausted_chain_lists_every_failure() {
        let chain = DefaultCredential::from_sources(vec![CredentialSource::AzureCli(
            AzureCliCredential::new().with_command("definitely-not-az-binary"),
        )]);
        let err = chain.token("scope").await.unwrap_err();
        match err {
            Error::Exhausted(failures) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].starts_with("azure_cli:"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn chain_always_ends_with_cli() {
        let chain = DefaultCredential::from_env();
        assert!(matches!(
            chain.sources().last(),
            Some(CredentialSource::AzureCli(_))
        ));
    }
}
