//! Shared application state.
//!
//! Everything a command needs to talk to the backend: the token store, the
//! derived session, the intercepted HTTP client and the APIs built on it.

use std::sync::Arc;

use crate::api::TaskApi;
use crate::config::ConfigV1;
use crate::http::HttpClient;
use crate::refresh::RefreshCoordinator;
use crate::session::{AuthService, SessionState};
use crate::store::TokenStore;

/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigV1>,
    /// Persistent access and refresh tokens.
    pub store: Arc<dyn TokenStore>,
    /// Current user, derived from the stored access token.
    pub session: Arc<SessionState>,
    pub client: Arc<HttpClient>,
    /// Also installed on `client` as its response interceptor.
    pub refresh: Arc<RefreshCoordinator>,
    pub auth: AuthService,
    pub tasks: TaskApi,
}
