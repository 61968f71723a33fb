use serde::{Deserialize, Serialize};

/// Token response returned by login, registration and refresh.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when the backend does not rotate the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        TokenPair {
            access_token: access_token.into(),
            refresh_token,
            token_type: Some("bearer".to_string()),
        }
    }
}

// Tokens are credentials; keep them out of debug output and logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(redact))
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Shortens a token to a recognizable prefix for log output.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_is_optional() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token": "A2"}"#).expect("should deserialize");
        assert_eq!(pair.access_token, "A2");
        assert_eq!(pair.refresh_token, None);
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let pair = TokenPair::new("eyJhbGciOiJIUzI1NiJ9.secret", Some("refresh-secret".into()));
        let printed = format!("{:?}", pair);
        assert!(!printed.contains("secret\""));
        assert!(printed.contains("eyJhbG..."));
        assert!(printed.contains("refres..."));
    }
}
