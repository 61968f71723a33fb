#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use http::{Method, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use taskdesk::config::{ConfigV1, RefreshConfig};
use taskdesk::error::ClientError;
use taskdesk::http::{ApiRequest, ApiResponse, RequestBody, Transport};
use taskdesk::startup::connect_with;
use taskdesk::state::AppState;
use taskdesk::store::TokenStore;
use tokio::sync::Notify;

pub const BASE_URL: &str = "http://backend.test";

/// Served as 404 to an authorized caller.
pub const MISSING_TASK_PATH: &str = "/tasks/404";

pub const TASKS_BODY: &str =
    r#"[{"id": 1, "title": "write tests", "description": null, "status": "pending", "owner_id": 7}]"#;

/// Mint an HS256 access token for `sub` that expires `exp_offset_secs` from now.
pub fn make_token(sub: &str, exp_offset_secs: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": sub, "exp": Utc::now().timestamp() + exp_offset_secs }),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .expect("failed to mint test token")
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
    match refresh {
        Some(refresh) => json!({ "access_token": access, "refresh_token": refresh, "token_type": "bearer" }),
        None => json!({ "access_token": access, "token_type": "bearer" }),
    }
    .to_string()
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

/// In-process stand-in for the backend.
///
/// Task routes answer 200 only for the bearer in `valid_token`, 401 otherwise.
/// A successful refresh makes the issued access token the valid one. With a
/// gate installed, `/auth/refresh` holds until the test calls `release_refresh`.
pub struct FakeBackend {
    calls: Mutex<Vec<RecordedCall>>,
    valid_token: Mutex<Option<String>>,
    login_response: Mutex<(u16, String)>,
    refresh_response: Mutex<(u16, String)>,
    refresh_gate: Option<Arc<Notify>>,
    honour_refreshed_tokens: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            calls: Mutex::new(Vec::new()),
            valid_token: Mutex::new(None),
            login_response: Mutex::new((401, r#"{"detail": "Incorrect username or password"}"#.to_string())),
            refresh_response: Mutex::new((401, r#"{"detail": "Invalid refresh token"}"#.to_string())),
            refresh_gate: None,
            honour_refreshed_tokens: true,
        }
    }

    pub fn gated() -> Self {
        FakeBackend {
            refresh_gate: Some(Arc::new(Notify::new())),
            ..Self::new()
        }
    }

    pub fn accept_token(self, token: &str) -> Self {
        *self.valid_token.lock().unwrap() = Some(token.to_string());
        self
    }

    pub fn on_login(self, status: u16, body: impl Into<String>) -> Self {
        *self.login_response.lock().unwrap() = (status, body.into());
        self
    }

    pub fn on_refresh(self, status: u16, body: impl Into<String>) -> Self {
        *self.refresh_response.lock().unwrap() = (status, body.into());
        self
    }

    /// Keep answering 401 on task routes even after a successful refresh.
    pub fn reject_refreshed_tokens(mut self) -> Self {
        self.honour_refreshed_tokens = false;
        self
    }

    pub fn release_refresh(&self) {
        if let Some(gate) = &self.refresh_gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls_to("/auth/refresh").len()
    }

    fn respond(status: u16, body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).expect("valid status"),
            body.to_string(),
        )
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let path = url.trim_start_matches(BASE_URL).to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: path.clone(),
            bearer: request.bearer().map(str::to_string),
            body: request.body.clone(),
        });

        match path.as_str() {
            "/auth/login" | "/auth/register" => {
                let (status, body) = self.login_response.lock().unwrap().clone();
                Ok(Self::respond(status, &body))
            }
            "/auth/refresh" => {
                if let Some(gate) = &self.refresh_gate {
                    gate.notified().await;
                }
                let (status, body) = self.refresh_response.lock().unwrap().clone();
                if status == 200 && self.honour_refreshed_tokens {
                    let issued: Value = serde_json::from_str(&body).expect("refresh body is json");
                    *self.valid_token.lock().unwrap() =
                        issued["access_token"].as_str().map(str::to_string);
                }
                Ok(Self::respond(status, &body))
            }
            _ => {
                let valid = self.valid_token.lock().unwrap().clone();
                if valid.is_some() && request.bearer().map(str::to_string) == valid {
                    if path == MISSING_TASK_PATH {
                        return Ok(Self::respond(404, r#"{"detail": "Task not found."}"#));
                    }
                    let body = if request.method == Method::GET && path == "/tasks/" {
                        TASKS_BODY
                    } else {
                        r#"{"id": 1, "title": "write tests", "description": null, "status": "done", "owner_id": 7}"#
                    };
                    Ok(Self::respond(200, body))
                } else {
                    Ok(Self::respond(401, r#"{"detail": "Not authenticated"}"#))
                }
            }
        }
    }
}

pub async fn connect_fake(
    backend: Arc<FakeBackend>,
    store: Arc<dyn TokenStore>,
    refresh: RefreshConfig,
) -> AppState {
    let mut config = ConfigV1::in_memory(BASE_URL);
    config.refresh = refresh;
    connect_with(config, store, backend).await
}

/// Poll `condition`, yielding to other tasks, until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition was not reached in time");
}
