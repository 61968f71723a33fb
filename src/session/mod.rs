pub mod claims;
pub mod service;
pub mod state;

pub use claims::{decode_claims, derive_session, SessionClaims, SessionSnapshot};
pub use service::AuthService;
pub use state::SessionState;
