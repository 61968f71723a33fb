//! Client assembly.
//!
//! Wires the token store, session, refresh coordinator and HTTP client
//! together and derives the initial session from the persisted token.

use std::sync::Arc;

use tracing::info;

use crate::api::TaskApi;
use crate::config::ConfigV1;
use crate::error::ClientError;
use crate::http::{BearerInterceptor, HttpClient, ReqwestTransport, Transport};
use crate::refresh::RefreshCoordinator;
use crate::session::{AuthService, SessionState};
use crate::state::AppState;
use crate::store::{create_store, TokenStore};

/// Build the client from configuration, using the configured token store and
/// a reqwest transport.
///
/// # Errors
///
/// Returns an error if the HTTP transport can't be constructed.
pub async fn connect(config: ConfigV1) -> Result<AppState, ClientError> {
    let store = create_store(&config.store);
    let transport = Arc::new(ReqwestTransport::new(&config.api)?);
    Ok(connect_with(config, store, transport).await)
}

/// Build the client around an explicit store and transport.
///
/// The session is initialized before this returns, so `session.is_loading()`
/// is false on the returned state.
pub async fn connect_with(
    config: ConfigV1,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
) -> AppState {
    let session = Arc::new(SessionState::new(store.clone()));
    let refresh = Arc::new(RefreshCoordinator::new(
        store.clone(),
        session.clone(),
        config.refresh.clone(),
    ));
    let client = Arc::new(
        HttpClient::new(config.api.base_url.clone(), transport)
            .with_request_interceptor(Arc::new(BearerInterceptor::new(store.clone())))
            .with_response_interceptor(refresh.clone()),
    );

    info!(
        "Connecting to {} with '{}' token store",
        client.base_url(),
        store.get_name()
    );
    session.initialize().await;

    AppState {
        config: Arc::new(config),
        auth: AuthService::new(client.clone(), session.clone()),
        tasks: TaskApi::new(client.clone()),
        store,
        session,
        client,
        refresh,
    }
}
