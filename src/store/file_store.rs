use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{TokenKind, TokenScope, TokenStore};
use crate::error::ClientError;

/// Persists tokens as a small JSON object on disk so a session survives restarts.
///
/// Every `get` reads the file; every `set`/`clear` rewrites it through a
/// temporary file and a rename. Writers are serialized by an async mutex so two
/// concurrent updates can't lose each other's key.
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

type TokenFile = BTreeMap<String, String>;

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileTokenStore {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<TokenFile, ClientError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Token file '{}' does not exist yet", self.path.display());
                return Ok(TokenFile::new());
            }
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read token file '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str::<TokenFile>(&raw) {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                // A damaged file is treated as "logged out" rather than a hard error.
                warn!(
                    event_name = "store.file.corrupt",
                    path = %self.path.display(),
                    "Ignoring unreadable token file: {}",
                    e
                );
                Ok(TokenFile::new())
            }
        }
    }

    async fn save(&self, tokens: &TokenFile) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ClientError::Storage(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string(tokens)
            .map_err(|e| ClientError::Storage(format!("Failed to serialize tokens: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            ClientError::Storage(format!("Failed to write '{}': {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ClientError::Storage(format!(
                "Failed to replace token file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, kind: TokenKind) -> Result<Option<String>, ClientError> {
        Ok(self.load().await?.remove(kind.key()))
    }

    async fn set(&self, kind: TokenKind, value: &str) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().await;
        let mut tokens = self.load().await?;
        tokens.insert(kind.key().to_string(), value.to_string());
        self.save(&tokens).await
    }

    async fn clear(&self, scope: TokenScope) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().await;
        let mut tokens = self.load().await?;
        let before = tokens.len();
        for kind in scope.kinds() {
            tokens.remove(kind.key());
        }
        if tokens.len() == before {
            return Ok(());
        }
        self.save(&tokens).await
    }

    fn get_name(&self) -> &str {
        "file"
    }
}
