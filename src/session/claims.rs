//! Decoding the access token into the session it describes.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::CurrentUser;

/// The access-token claims the client relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "sub")]
    pub subject_id: String,
    #[serde(rename = "exp")]
    pub expires_at_epoch_seconds: i64,
}

impl SessionClaims {
    /// A token is expired once `exp * 1000 <= now_ms`; there is no leeway.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at_epoch_seconds.saturating_mul(1000) <= now_ms
    }
}

/// Current user and claims derived from one access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<CurrentUser>,
    pub claims: Option<SessionClaims>,
}

impl SessionSnapshot {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Decode the payload of an access token.
///
/// The client does not hold the signing key, so the signature is not checked;
/// the backend remains the authority on validity. Expiry is checked separately
/// by [`derive_session`].
pub fn decode_claims(token: &str) -> Result<SessionClaims, String> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Failed to decode access token: {}", e))
}

/// Rebuild the session from the current access token.
///
/// Absent, undecodable and expired tokens all yield the logged-out snapshot.
pub fn derive_session(token: Option<&str>, now_ms: i64) -> SessionSnapshot {
    let Some(token) = token else {
        return SessionSnapshot::logged_out();
    };

    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("{}", e);
            return SessionSnapshot::logged_out();
        }
    };

    if claims.is_expired_at(now_ms) {
        debug!(
            "Access token for subject '{}' expired at {}",
            claims.subject_id, claims.expires_at_epoch_seconds
        );
        return SessionSnapshot::logged_out();
    }

    SessionSnapshot {
        user: Some(CurrentUser {
            id: claims.subject_id.clone(),
        }),
        claims: Some(claims),
    }
}
