//! Token cache seam

use async_trait::async_trait;
use dashmap::DashMap;

use common::error::Result;

/// Cache key under which a token's owner permalink is stored
pub fn access_token_key(token: &str) -> String {
    format!("access_token:{}", token)
}

/// Key-value cache mapping API tokens to owner permalinks
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Value stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Process-local token cache
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    entries: DashMap<String, String>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for the owner with the given permalink
    pub fn insert_token(&self, token: &str, permalink: impl Into<String>) {
        self.entries.insert(access_token_key(token), permalink.into());
    }

    pub fn revoke(&self, token: &str) {
        self.entries.remove(&access_token_key(token));
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}
