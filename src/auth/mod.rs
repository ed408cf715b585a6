//! Identity module
//!
//! Supplies the authenticated-user-or-absent answer the gate consumes.
//! The oracle is constructed once at startup and injected; nothing here is
//! a lazily initialised global.

pub mod provider;
pub mod session;

pub use provider::{AnonymousOracle, IdentityOracle, SharedIdentityOracle};
pub use session::SessionCookieOracle;

use crate::config::AuthConfig;
use crate::error::AuthError;
use std::sync::Arc;

/// Create an identity oracle from configuration
pub fn create_identity_oracle(config: &AuthConfig) -> Result<SharedIdentityOracle, AuthError> {
    if config.sessions.is_empty() {
        Ok(Arc::new(AnonymousOracle))
    } else {
        Ok(Arc::new(SessionCookieOracle::new(
            &config.session_cookie,
            &config.sessions,
        )?))
    }
}
