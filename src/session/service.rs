use std::sync::Arc;

use tracing::info;

use super::state::SessionState;
use crate::api::auth;
use crate::error::ClientError;
use crate::http::HttpClient;
use crate::models::{CurrentUser, LoginRequest, RegistrationRequest};

/// Login, registration and logout on top of the shared session.
#[derive(Clone)]
pub struct AuthService {
    client: Arc<HttpClient>,
    session: Arc<SessionState>,
}

impl AuthService {
    pub fn new(client: Arc<HttpClient>, session: Arc<SessionState>) -> Self {
        AuthService { client, session }
    }

    /// Exchange credentials for a token pair, persist it and return the new user.
    ///
    /// `Ok(None)` means the backend issued an access token that can't be used
    /// (undecodable or already expired); the session stays logged out.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Option<CurrentUser>, ClientError> {
        let tokens = auth::login(&self.client, credentials).await?;
        let snapshot = self.session.adopt_tokens(&tokens).await?;
        Ok(snapshot.user)
    }

    pub async fn register(
        &self,
        registration: &RegistrationRequest,
    ) -> Result<Option<CurrentUser>, ClientError> {
        let tokens = auth::register(&self.client, registration).await?;
        let snapshot = self.session.adopt_tokens(&tokens).await?;
        Ok(snapshot.user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session.logout().await?;
        info!(event_name = "auth.logout", "Logged out");
        Ok(())
    }
}
