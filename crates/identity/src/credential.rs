//! Token credential trait.

use crate::{AccessToken, Error, Result};
use chrono::{Duration, Utc};
use std::future::Future;
use std::sync::Arc;

/// Trait for sources of bearer tokens.
///
/// Implementations fetch a token for a single OAuth2 scope. Callers that
/// make many requests should wrap the credential in
/// [`CachedCredential`](crate::CachedCredential).
pub trait TokenCredential: Send + Sync {
    /// Get a token for `scope`.
    fn token(&self, scope: &str) -> impl Future<Output = Result<AccessToken>> + Send;
}

impl<C: TokenCredential> TokenCredential for Arc<C> {
    fn token(&self, scope: &str) -> impl Future<Output = Result<AccessToken>> + Send {
        (**self).token(scope)
    }
}

/// A pre-issued token, used for every scope.
///
/// The real expiry is unknown, so the token is reported as valid for an hour
/// from each call. Use this only when the issuer guarantees the lifetime.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `AZURE_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        match std::env::var("AZURE_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(Error::Unavailable("AZURE_ACCESS_TOKEN not set".into())),
        }
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticTokenCredential(<redacted>)")
    }
}

impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken::new(
            self.token.clone(),
            Utc::now() + Duration::hours(1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_ignores_scope() {
        let credential = StaticTokenCredential::new("abc");
        let a = credential.token("scope-a").await.unwrap();
        let b = credential.token("scope-b").await.unwrap();
        assert_eq!(a.token, "abc");
        assert_eq!(b.token, "abc");
        assert!(!a.is_expired());
    }

    #[tokio::test]
    async fn arc_forwards_to_inner() {
        let credential = Arc::new(StaticTokenCredential::new("shared"));
        let token = credential.token("scope").await.unwrap();
        assert_eq!(token.token, "shared");
    }
}
