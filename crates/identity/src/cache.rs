//! Per-scope token cache.

use crate::{AccessToken, Result, TokenCredential};
use std::collections::HashMap;
use std::sync::Mutex;

/// Reuses tokens per scope until they are about to expire.
#[derive(Debug)]
pub struct CachedCredential<C> {
    inner: C,
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl<C: TokenCredential> CachedCredential<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Drop the cached token for `scope`, e.g. after the backend rejected it.
    pub fn invalidate(&self, scope: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(scope);
        }
    }

    fn cached(&self, scope: &str) -> Option<AccessToken> {
        let tokens = self.tokens.lock().ok()?;
        tokens.get(scope).filter(|t| !t.is_expired()).cloned()
    }
}

impl<C: TokenCredential> TokenCredential for CachedCredential<C> {
    async fn token(&self, scope: &str) -> Result<AccessToken> {
        if let Some(token) = self.cached(scope) {
            return Ok(token);
        }

        let token = self.inner.token(scope).await?;
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(scope.to_string(), token.clone());
        }
        Ok(token)
    }
}
