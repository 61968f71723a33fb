use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::api::auth::refresh_request;
use crate::config::RefreshConfig;
use crate::error::ClientError;
use crate::http::{ApiRequest, ApiResponse, AuthMode, HttpClient, ResponseInterceptor};
use crate::models::TokenPair;
use crate::store::{TokenKind, TokenStore};

/// Capability the coordinator uses to end or update the session.
#[async_trait]
pub trait LogoutHandle: Send + Sync {
    /// Called when authorization can't be recovered. Must be idempotent.
    async fn force_logout(&self);

    /// Called after a successful exchange has stored a new access token.
    async fn tokens_refreshed(&self) {}
}

type Waiter = oneshot::Sender<Result<String, ClientError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<Waiter>,
    exchanges: u64,
}

enum Admission {
    /// This request runs the exchange.
    Leader,
    /// Another request is refreshing; wait for its outcome.
    Queued(oneshot::Receiver<Result<String, ClientError>>),
}

/// Response interceptor that turns a 401 into a single-flight token refresh.
///
/// The first request to see a 401 becomes the leader and performs the
/// `/auth/refresh` exchange; every request that sees a 401 while the exchange is
/// in flight is queued and re-sent (or rejected) once it settles. A request is
/// retried at most once.
pub struct RefreshCoordinator {
    store: Arc<dyn TokenStore>,
    session: Arc<dyn LogoutHandle>,
    config: RefreshConfig,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn TokenStore>,
        session: Arc<dyn LogoutHandle>,
        config: RefreshConfig,
    ) -> Self {
        RefreshCoordinator {
            store,
            session,
            config,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Requests currently waiting on the in-flight exchange.
    pub fn pending_len(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Exchanges started since construction.
    pub fn exchange_count(&self) -> u64 {
        self.lock().exchanges
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // No code path panics while holding the lock; recover the data if one did.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_in_ms)
    }

    fn admit(&self, request: &ApiRequest) -> Result<Admission, ClientError> {
        let mut state = self.lock();
        if !state.in_flight {
            state.in_flight = true;
            state.exchanges += 1;
            return Ok(Admission::Leader);
        }

        if state.waiters.len() >= self.config.max_pending {
            warn!(
                event_name = "refresh.queue.full",
                request_id = %request.id,
                pending = state.waiters.len(),
                "Rejecting request: refresh queue is full"
            );
            return Err(ClientError::QueueFull(state.waiters.len()));
        }

        let (tx, rx) = oneshot::channel();
        state.waiters.push_back(tx);
        debug!(
            event_name = "refresh.queue.push",
            request_id = %request.id,
            pending = state.waiters.len(),
            "Refresh in flight; queued request"
        );
        Ok(Admission::Queued(rx))
    }

    /// Clears the in-flight flag and hands `outcome` to every waiter, oldest first.
    fn settle(&self, outcome: Result<String, ClientError>) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(
            event_name = "refresh.queue.drain",
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Draining refresh queue"
        );
        for waiter in waiters {
            // A waiter that timed out has dropped its receiver; nothing to deliver.
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn exchange(&self, client: &HttpClient, refresh_token: &str) -> Result<TokenPair, ClientError> {
        let request = refresh_request(refresh_token, self.config.encoding)?;
        client.send_json::<TokenPair>(request).await
    }

    async fn store_tokens(&self, tokens: &TokenPair) -> Result<(), ClientError> {
        self.store.set(TokenKind::Access, &tokens.access_token).await?;
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store.set(TokenKind::Refresh, refresh_token).await?;
        }
        Ok(())
    }

    /// Everything the leader does before settling: read the refresh token,
    /// exchange it, persist the new pair and update the session.
    /// `Ok(None)` means there was no refresh token to exchange.
    async fn obtain_tokens(
        &self,
        client: &HttpClient,
        request: &ApiRequest,
    ) -> Result<Option<TokenPair>, ClientError> {
        let Some(refresh_token) = self.store.get(TokenKind::Refresh).await? else {
            return Ok(None);
        };

        info!(
            event_name = "refresh.start",
            request_id = %request.id,
            "Access token rejected; exchanging refresh token"
        );
        let tokens = self.exchange(client, &refresh_token).await?;
        self.store_tokens(&tokens).await?;
        self.session.tokens_refreshed().await;
        Ok(Some(tokens))
    }

    async fn refresh_and_replay(
        &self,
        client: &HttpClient,
        mut request: ApiRequest,
        original: ClientError,
    ) -> Result<ApiResponse, ClientError> {
        let mut guard = SettleGuard::new(self);

        // Queued waiters start their own clock after this one, so the leader
        // always settles before any of them gives up.
        let obtained = match timeout(self.refresh_timeout(), self.obtain_tokens(client, &request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "token refresh did not settle within {}ms",
                self.config.timeout_in_ms
            ))),
        };

        match obtained {
            Ok(Some(tokens)) => {
                info!(
                    event_name = "refresh.success",
                    request_id = %request.id,
                    rotated = tokens.refresh_token.is_some(),
                    "Token refresh succeeded"
                );
                request.retried = true;
                request.set_bearer(&tokens.access_token)?;
                guard.settle(Ok(tokens.access_token));
                client.send(request).await
            }
            Ok(None) => {
                info!(
                    event_name = "refresh.unavailable",
                    request_id = %request.id,
                    "Access token rejected and no refresh token stored; logging out"
                );
                guard.settle(Err(original.clone()));
                self.session.force_logout().await;
                Err(original)
            }
            Err(e) => {
                let failure = as_refresh_failure(e);
                warn!(
                    event_name = "refresh.failure",
                    request_id = %request.id,
                    "Token refresh failed: {}",
                    failure
                );
                guard.settle(Err(failure.clone()));
                self.session.force_logout().await;
                Err(failure)
            }
        }
    }

    /// The stored access token, if it differs from the one `request` was sent with.
    ///
    /// A 401 for a token that has already been replaced is answered by replaying
    /// with the current token instead of spending the refresh token again.
    async fn newer_token(&self, request: &ApiRequest) -> Option<String> {
        let current = match self.store.get(TokenKind::Access).await {
            Ok(current) => current?,
            Err(e) => {
                warn!("Failed to read access token: {}", e);
                return None;
            }
        };
        if request.bearer() == Some(current.as_str()) {
            None
        } else {
            Some(current)
        }
    }

    async fn replay(
        &self,
        client: &HttpClient,
        mut request: ApiRequest,
        token: &str,
    ) -> Result<ApiResponse, ClientError> {
        request.retried = true;
        request.set_bearer(token)?;
        debug!(request_id = %request.id, "Replaying request with refreshed token");
        client.send(request).await
    }

    async fn wait_and_replay(
        &self,
        client: &HttpClient,
        request: ApiRequest,
        receiver: oneshot::Receiver<Result<String, ClientError>>,
    ) -> Result<ApiResponse, ClientError> {
        let token = match timeout(self.refresh_timeout(), receiver).await {
            Ok(Ok(Ok(token))) => token,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(_)) => return Err(ClientError::Cancelled),
            Err(_) => {
                return Err(ClientError::Timeout(format!(
                    "no refreshed token within {}ms",
                    self.config.timeout_in_ms
                )))
            }
        };

        self.replay(client, request, &token).await
    }
}

/// Timeouts keep their own variant; every other exchange failure becomes
/// `RefreshFailed` so callers can tell it apart from the 401 it replaced.
fn as_refresh_failure(err: ClientError) -> ClientError {
    match err {
        ClientError::Timeout(_) | ClientError::RefreshFailed(_) => err,
        other => ClientError::RefreshFailed(other.to_string()),
    }
}

/// Settles the refresh exactly once. If the leader's future is dropped before
/// it settles, the waiters are rejected with `Cancelled` and the flag is cleared.
struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl<'a> SettleGuard<'a> {
    fn new(coordinator: &'a RefreshCoordinator) -> Self {
        SettleGuard {
            coordinator,
            settled: false,
        }
    }

    fn settle(&mut self, outcome: Result<String, ClientError>) {
        if !self.settled {
            self.settled = true;
            self.coordinator.settle(outcome);
        }
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(event_name = "refresh.cancelled", "Token refresh dropped before it settled");
            self.coordinator.settle(Err(ClientError::Cancelled));
        }
    }
}

#[async_trait]
impl ResponseInterceptor for RefreshCoordinator {
    async fn on_response(
        &self,
        client: &HttpClient,
        request: ApiRequest,
        result: Result<ApiResponse, ClientError>,
    ) -> Result<ApiResponse, ClientError> {
        let err = match result {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !err.is_unauthorized() || request.auth != AuthMode::Bearer {
            return Err(err);
        }
        if request.retried {
            warn!(
                request_id = %request.id,
                "Request was rejected again after a token refresh; giving up"
            );
            return Err(err);
        }

        if !self.is_refreshing() {
            if let Some(current) = self.newer_token(&request).await {
                debug!(
                    event_name = "refresh.stale",
                    request_id = %request.id,
                    "Rejected token was already replaced"
                );
                return self.replay(client, request, &current).await;
            }
        }

        match self.admit(&request)? {
            Admission::Leader => self.refresh_and_replay(client, request, err).await,
            Admission::Queued(receiver) => self.wait_and_replay(client, request, receiver).await,
        }
    }
}
