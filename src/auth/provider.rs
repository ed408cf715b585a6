//! Identity oracle trait
//!
//! The gate does not authenticate anyone itself. It asks an oracle, once per
//! request, who (if anyone) is signed in.

use crate::error::AuthError;
use crate::gate::{AuthenticatedUser, CookieJar};
// async_trait required for dyn-compatibility with Arc<dyn IdentityOracle>
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves the signed-in user for a request
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    /// Look up the user behind the request's cookies.
    ///
    /// `Ok(None)` means anonymous. An `Err` means the oracle could not
    /// answer; callers treat that as anonymous too.
    async fn identify(&self, cookies: &CookieJar) -> Result<Option<AuthenticatedUser>, AuthError>;

    /// Short description of the oracle (for logging)
    fn oracle_type(&self) -> &'static str;
}

/// Shared oracle handle
pub type SharedIdentityOracle = Arc<dyn IdentityOracle>;

/// Oracle that never recognises anyone
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousOracle;

#[async_trait]
impl IdentityOracle for AnonymousOracle {
    async fn identify(&self, _cookies: &CookieJar) -> Result<Option<AuthenticatedUser>, AuthError> {
        Ok(None)
    }

    fn oracle_type(&self) -> &'static str {
        "anonymous"
    }
}
