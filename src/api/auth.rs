//! Requests against the `/auth` endpoints.

use http::StatusCode;
use tracing::{debug, info};

use crate::config::RefreshEncoding;
use crate::error::ClientError;
use crate::http::{ApiRequest, AuthMode, HttpClient};
use crate::models::{LoginRequest, RegistrationRequest, TokenPair};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Build the refresh-token exchange request.
pub fn refresh_request(refresh_token: &str, encoding: RefreshEncoding) -> Result<ApiRequest, ClientError> {
    let request = ApiRequest::post(REFRESH_PATH).with_auth(AuthMode::RefreshExchange);
    match encoding {
        RefreshEncoding::Form => Ok(request.form(&[("refresh_token", refresh_token)])),
        RefreshEncoding::Json => request.json(&serde_json::json!({ "refresh_token": refresh_token })),
    }
}

/// `POST /auth/login`. A rejected credential set becomes `ClientError::Authentication`.
pub async fn login(client: &HttpClient, credentials: &LoginRequest) -> Result<TokenPair, ClientError> {
    debug!("Logging in user '{}'", credentials.username);
    let request = ApiRequest::post(LOGIN_PATH)
        .with_auth(AuthMode::Anonymous)
        .json(credentials)?;
    let tokens = client
        .send_json::<TokenPair>(request)
        .await
        .map_err(credential_rejection)?;
    info!(event_name = "auth.login.success", "Login accepted for '{}'", credentials.username);
    Ok(tokens)
}

/// `POST /auth/register`. Same contract as [`login`].
pub async fn register(
    client: &HttpClient,
    registration: &RegistrationRequest,
) -> Result<TokenPair, ClientError> {
    debug!("Registering user '{}'", registration.username);
    let request = ApiRequest::post(REGISTER_PATH)
        .with_auth(AuthMode::Anonymous)
        .json(registration)?;
    let tokens = client
        .send_json::<TokenPair>(request)
        .await
        .map_err(credential_rejection)?;
    info!(event_name = "auth.register.success", "Registered '{}'", registration.username);
    Ok(tokens)
}

// The backend answers a wrong password with 404 (unknown user) as often as 401.
fn credential_rejection(err: ClientError) -> ClientError {
    match err {
        ClientError::Http { status, body }
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND =>
        {
            ClientError::Authentication(body)
        }
        other => other,
    }
}
