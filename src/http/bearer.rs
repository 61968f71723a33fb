use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::client::RequestInterceptor;
use super::request::{ApiRequest, AuthMode};
use crate::error::ClientError;
use crate::store::{TokenKind, TokenStore};

/// Attaches the stored access token as a bearer credential.
///
/// The token is read from the store on every request, so a login, refresh or
/// logout takes effect on the next send. Refresh exchanges and anonymous
/// requests never carry the access token.
pub struct BearerInterceptor {
    store: Arc<dyn TokenStore>,
}

impl BearerInterceptor {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        BearerInterceptor { store }
    }
}

#[async_trait]
impl RequestInterceptor for BearerInterceptor {
    async fn on_request(&self, request: &mut ApiRequest) -> Result<(), ClientError> {
        match request.auth {
            AuthMode::Bearer => {
                if let Some(token) = self.store.get(TokenKind::Access).await? {
                    request.set_bearer(&token)?;
                } else {
                    trace!(request_id = %request.id, "No access token stored; sending unauthenticated");
                }
            }
            AuthMode::Anonymous | AuthMode::RefreshExchange => request.clear_authorization(),
        }
        Ok(())
    }
}
