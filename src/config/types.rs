//! Configuration types for starboard-gate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables. The defaults reproduce the
//! route tables the site ships with.

use crate::util::SecretString;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener and upstream settings
    pub server: ServerConfig,

    /// Redirect targets and cookie names used by the gate
    pub gate: GateConfig,

    /// Route tables
    pub routes: RoutesConfig,

    /// Identity oracle settings
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gate: GateConfig::default(),
            routes: RoutesConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Base URL of the renderer that receives allowed requests.
    /// When unset, allowed requests without a local route get a 404.
    pub upstream: Option<String>,

    /// Upstream request timeout in seconds
    pub upstream_timeout_secs: u64,

    /// Largest request body forwarded upstream
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3080,
            upstream: None,
            upstream_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Gate behaviour that is not a route table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Cookie carrying the selected workspace id
    pub workspace_cookie: String,

    /// Login page; anonymous users are sent here
    pub login_path: String,

    /// Landing page for signed-in users hitting an auth page
    pub dashboard_path: String,

    /// Workspace picker; users without a workspace cookie are sent here
    pub workspace_select_path: String,

    /// Query parameter carrying the original path on login redirects
    pub callback_param: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            workspace_cookie: "starboard-workspace".to_string(),
            login_path: "/auth/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            workspace_select_path: "/workspaces/select".to_string(),
            callback_param: "callbackUrl".to_string(),
        }
    }
}

/// Route tables
///
/// Every list is a set of literal path prefixes unless the field name says
/// `patterns`, in which case each entry is a regex matched against the
/// whole path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Login/registration pages; signed-in users are bounced to the dashboard
    pub auth: Vec<String>,

    /// Pages requiring a session and a selected workspace
    pub workspace_protected: Vec<String>,

    /// Pages requiring a session but no workspace
    pub workspace_management: Vec<String>,

    /// Pages open to everyone (exact or prefix match)
    pub public: Vec<String>,

    /// API prefixes open to everyone
    pub public_api: Vec<String>,

    /// API patterns open to everyone
    pub public_api_patterns: Vec<String>,

    /// API prefixes requiring a session but no workspace
    pub workspace_management_api: Vec<String>,

    /// Static asset prefixes the gate never inspects
    pub bypass: Vec<String>,

    /// Static asset patterns the gate never inspects
    pub bypass_patterns: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            auth: strings(&["/auth/login", "/auth/register"]),
            workspace_protected: strings(&[
                "/dashboard",
                "/applications",
                "/events",
                "/resources",
                "/messages",
                "/profile",
                "/admin",
                "/settings",
                "/analytics",
                "/integrations",
                "/team",
            ]),
            workspace_management: strings(&[
                "/workspaces/select",
                "/workspaces/create",
                "/workspaces/join",
            ]),
            public: strings(&[
                "/",
                "/about",
                "/contact",
                "/apply",
                "/events/public",
                "/resources/public",
                "/auth/error",
                "/auth/verify-email",
                "/auth/reset-password",
                "/auth/forgot-password",
                "/auth/invite",
            ]),
            public_api: strings(&[
                "/api/auth",
                "/api/health",
                "/api/public",
                "/api/applications/submit",
                "/api/invitations/accept",
                "/api/invitations/details",
                "/api/onboarding/complete",
                "/api/upload/public/presigned-url",
                "/api/workspaces/check-slug",
                "/api/sanity-test",
            ]),
            public_api_patterns: strings(&["^/api/applications/[^/]+/submit$"]),
            workspace_management_api: strings(&[
                "/api/workspaces",
                "/api/workspaces/switch",
                "/api/workspaces/validate",
                "/api/workspaces/current",
                // workspace logo uploads happen before a workspace exists
                "/api/upload/presigned-url",
                "/api/upload",
            ]),
            bypass: strings(&["/_next/static", "/_next/image", "/favicon.ico", "/uploads"]),
            bypass_patterns: strings(&[r"\.(?:svg|png|jpg|jpeg|gif|webp)$"]),
        }
    }
}

/// Identity oracle configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Cookie carrying the session token
    pub session_cookie: String,

    /// Known sessions. Empty means every request is anonymous.
    pub sessions: Vec<SessionEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie: "authjs.session-token".to_string(),
            sessions: Vec::new(),
        }
    }
}

/// A session token and the user it belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct SessionEntry {
    pub token: SecretString,
    pub email: String,
    pub id: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
