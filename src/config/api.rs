use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend endpoint and transport settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    /// Base URL every request path is appended to, e.g. `http://localhost:8000/api/v1`.
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_in_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            timeout_in_ms: default_api_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Policy for the refresh-token exchange and the requests queued behind it.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct RefreshConfig {
    /// Upper bound for the exchange itself and for each queued wait.
    #[serde(default = "default_refresh_timeout")]
    pub timeout_in_ms: u64,
    /// Requests allowed to wait on one in-flight refresh.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    #[serde(default)]
    pub encoding: RefreshEncoding,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            timeout_in_ms: default_refresh_timeout(),
            max_pending: default_max_pending(),
            encoding: RefreshEncoding::default(),
        }
    }
}

/// Body encoding of `POST /auth/refresh`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshEncoding {
    #[default]
    Form,
    Json,
}

fn default_api_timeout() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("taskdesk/{}", env!("CARGO_PKG_VERSION"))
}

fn default_refresh_timeout() -> u64 {
    15_000
}

fn default_max_pending() -> usize {
    64
}
