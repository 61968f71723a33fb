use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{file_store::FileTokenStore, memory_store::MemoryTokenStore};
use crate::config::StoreConfig;
use crate::error::ClientError;

/// The two credentials the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Fixed key the token is stored under.
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::Refresh => "refresh_token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which tokens a `clear` call removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Only(TokenKind),
    All,
}

impl TokenScope {
    pub fn kinds(&self) -> &'static [TokenKind] {
        match self {
            TokenScope::Only(TokenKind::Access) => &[TokenKind::Access],
            TokenScope::Only(TokenKind::Refresh) => &[TokenKind::Refresh],
            TokenScope::All => &[TokenKind::Access, TokenKind::Refresh],
        }
    }
}

/// The TokenStore trait abstracts token persistence (get, set, clear).
///
/// Implementations must not cache: a `set` or `clear` is visible to the very
/// next `get`. Token contents are never validated here.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, kind: TokenKind) -> Result<Option<String>, ClientError>;
    async fn set(&self, kind: TokenKind, value: &str) -> Result<(), ClientError>;
    async fn clear(&self, scope: TokenScope) -> Result<(), ClientError>;
    fn get_name(&self) -> &str;
}

/// Creates a concrete store implementation based on the StoreConfig.
pub fn create_store(config: &StoreConfig) -> Arc<dyn TokenStore> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory token store; tokens will not survive a restart.");
            Arc::new(MemoryTokenStore::new())
        }
        StoreConfig::File(file_config) => {
            info!("Using file token store at '{}'", file_config.path);
            Arc::new(FileTokenStore::new(&file_config.path))
        }
    }
}
