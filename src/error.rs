//! Error taxonomy shared by every layer of the client.

use http::StatusCode;

/// Every failure the client can surface to a caller.
///
/// The enum is `Clone` because a single refresh failure is handed to every
/// request that was queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS, TLS, transport timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The backend rejected login or registration credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The refresh-token exchange itself failed.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// Too many requests are already waiting on the in-flight refresh.
    #[error("refresh queue is full ({0} pending requests)")]
    QueueFull(usize),

    /// The refresh a request was waiting on was dropped before settling.
    #[error("refresh was cancelled before it settled")]
    Cancelled,

    #[error("token store error: {0}")]
    Storage(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Status code of an HTTP failure, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401 response from the backend.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<figment::Error> for ClientError {
    fn from(err: figment::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}
