//! Session-cookie identity oracle
//!
//! Resolves the session cookie against a fixed set of configured sessions.

use crate::auth::provider::IdentityOracle;
use crate::config::SessionEntry;
use crate::error::AuthError;
use crate::gate::{AuthenticatedUser, CookieJar};
use crate::util::SecretString;
use async_trait::async_trait;

#[derive(Debug, Clone)]
struct Session {
    token: SecretString,
    user: AuthenticatedUser,
}

/// Oracle backed by configured session tokens
#[derive(Debug, Clone)]
pub struct SessionCookieOracle {
    cookie_name: String,
    sessions: Vec<Session>,
}

impl SessionCookieOracle {
    /// Build from configuration; empty or repeated tokens are rejected
    pub fn new(cookie_name: impl Into<String>, entries: &[SessionEntry]) -> Result<Self, AuthError> {
        let mut sessions: Vec<Session> = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.token.is_empty() {
                return Err(AuthError::MalformedToken);
            }
            if sessions
                .iter()
                .any(|s| s.token.matches(entry.token.expose_secret()))
            {
                return Err(AuthError::DuplicateSession {
                    email: entry.email.clone(),
                });
            }
            sessions.push(Session {
                token: entry.token.clone(),
                user: AuthenticatedUser::new(&entry.email, &entry.id),
            });
        }

        Ok(Self {
            cookie_name: cookie_name.into(),
            sessions,
        })
    }

}

#[async_trait]
impl IdentityOracle for SessionCookieOracle {
    async fn identify(&self, cookies: &CookieJar) -> Result<Option<AuthenticatedUser>, AuthError> {
        let Some(token) = cookies.get(&self.cookie_name).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        Ok(self
            .sessions
            .iter()
            .find(|s| s.token.matches(token))
            .map(|s| s.user.clone()))
    }

    fn oracle_type(&self) -> &'static str {
        "session cookie"
    }
}
