//! # Sessions
//!
//! Server-side sessions via `tower-sessions`. The session holds only the
//! sanitized identity, stored under [`SESSION_USER_KEY`].

use shop_core::{AuthError, AuthResult, SanitizedIdentity};
use tower_sessions::Session;

/// Key under which the signed-in identity is stored
pub const SESSION_USER_KEY: &str = "user";

/// Name of the session id cookie
pub const SESSION_COOKIE: &str = "shop.sid";

fn session_error(e: tower_sessions::session::Error) -> AuthError {
    AuthError::Session(e.to_string())
}

/// Bind `identity` to the session under a fresh session id.
pub async fn establish(session: &Session, identity: &SanitizedIdentity) -> AuthResult<()> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(session_error)
}

/// Identity bound to the session, if any.
pub async fn current_identity(session: &Session) -> AuthResult<Option<SanitizedIdentity>> {
    session
        .get::<SanitizedIdentity>(SESSION_USER_KEY)
        .await
        .map_err(session_error)
}

/// Destroy the session (logout).
pub async fn destroy(session: &Session) -> AuthResult<()> {
    session.flush().await.map_err(session_error)
}
