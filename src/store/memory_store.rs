use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{TokenKind, TokenScope, TokenStore};
use crate::error::ClientError;

/// A process-local store. Useful for tests and one-shot sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds the given tokens.
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let mut tokens = HashMap::new();
        if let Some(access) = access {
            tokens.insert(TokenKind::Access, access.to_string());
        }
        if let Some(refresh) = refresh {
            tokens.insert(TokenKind::Refresh, refresh.to_string());
        }
        MemoryTokenStore {
            tokens: RwLock::new(tokens),
        }
    }
}

fn poisoned<T>(_: T) -> ClientError {
    ClientError::Storage("memory token store lock poisoned".to_string())
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, kind: TokenKind) -> Result<Option<String>, ClientError> {
        Ok(self.tokens.read().map_err(poisoned)?.get(&kind).cloned())
    }

    async fn set(&self, kind: TokenKind, value: &str) -> Result<(), ClientError> {
        self.tokens
            .write()
            .map_err(poisoned)?
            .insert(kind, value.to_string());
        Ok(())
    }

    async fn clear(&self, scope: TokenScope) -> Result<(), ClientError> {
        let mut tokens = self.tokens.write().map_err(poisoned)?;
        for kind in scope.kinds() {
            tokens.remove(kind);
        }
        Ok(())
    }

    fn get_name(&self) -> &str {
        "memory"
    }
}
