use serde::{Deserialize, Serialize};

/// The user the current session belongs to, as derived from the access token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// Credentials for `POST /auth/login`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        RegistrationRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
