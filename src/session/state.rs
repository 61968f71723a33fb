use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::claims::{derive_session, SessionClaims, SessionSnapshot};
use crate::error::ClientError;
use crate::models::{CurrentUser, TokenPair};
use crate::refresh::LogoutHandle;
use crate::store::{TokenKind, TokenScope, TokenStore};

/// Single source of truth for "who is logged in", rebuilt from the stored
/// access token at fixed trigger points: initialization, after login or
/// registration, after a refresh, and on logout.
pub struct SessionState {
    store: Arc<dyn TokenStore>,
    snapshot: RwLock<SessionSnapshot>,
    ready: watch::Sender<bool>,
}

impl SessionState {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (ready, _) = watch::channel(false);
        SessionState {
            store,
            snapshot: RwLock::new(SessionSnapshot::logged_out()),
            ready,
        }
    }

    /// Derive the session from the persisted token once, then mark loading as complete.
    pub async fn initialize(&self) -> SessionSnapshot {
        let snapshot = self.recompute().await;
        self.ready.send_replace(true);
        info!(
            event_name = "session.ready",
            authenticated = snapshot.is_authenticated(),
            "Session initialized"
        );
        snapshot
    }

    /// False until [`initialize`](Self::initialize) has finished.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn is_loading(&self) -> bool {
        !self.is_ready()
    }

    /// Resolves once initialization has completed.
    pub async fn wait_until_ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this can only fail if it was dropped.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    /// Re-derive the session from the current access token.
    ///
    /// A token that is present but undecodable or expired resets the session to
    /// logged out, tokens included; the caller never sees an error for it.
    pub async fn recompute(&self) -> SessionSnapshot {
        let token = match self.store.get(TokenKind::Access).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read access token, treating session as logged out: {}", e);
                None
            }
        };

        let snapshot = derive_session(token.as_deref(), Utc::now().timestamp_millis());
        if token.is_some() && !snapshot.is_authenticated() {
            info!(
                event_name = "session.invalid",
                "Stored access token is expired or unreadable; logging out"
            );
            if let Err(e) = self.logout().await {
                error!("Failed to clear invalid session: {}", e);
            }
            return SessionSnapshot::logged_out();
        }

        self.replace(snapshot.clone());
        snapshot
    }

    /// Persist a token pair returned by login or registration and derive the session from it.
    ///
    /// The pair is authoritative: a response without a refresh token clears any stored one.
    pub async fn adopt_tokens(&self, tokens: &TokenPair) -> Result<SessionSnapshot, ClientError> {
        self.store.set(TokenKind::Access, &tokens.access_token).await?;
        match &tokens.refresh_token {
            Some(refresh_token) => self.store.set(TokenKind::Refresh, refresh_token).await?,
            None => {
                self.store
                    .clear(TokenScope::Only(TokenKind::Refresh))
                    .await?
            }
        }
        Ok(self.recompute().await)
    }

    /// Clear both tokens and the derived user. Safe to call when already logged out.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.replace(SessionSnapshot::logged_out());
        self.store.clear(TokenScope::All).await?;
        debug!("Session cleared");
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.snapshot().user
    }

    pub fn claims(&self) -> Option<SessionClaims> {
        self.snapshot().claims
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    fn replace(&self, snapshot: SessionSnapshot) {
        let mut current = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = snapshot;
    }
}

#[async_trait]
impl LogoutHandle for SessionState {
    async fn force_logout(&self) {
        info!(event_name = "session.forced_logout", "Authorization could not be recovered; logging out");
        if let Err(e) = self.logout().await {
            error!("Forced logout could not clear tokens: {}", e);
        }
    }

    async fn tokens_refreshed(&self) {
        self.recompute().await;
    }
}
