//! Starboard access gate
//!
//! Runs in front of every page and API request of the Starboard site and
//! decides, per request, whether to let it through, redirect it, or reject it.
//!
//! ## Decision Model
//!
//! ```text
//! static-asset bypass → /api/ sub-classifier | page rules → Decision
//! ```
//!
//! A [`Decision`](gate::Decision) is one of:
//! - `Allow` - the request continues to the renderer untouched
//! - `RedirectTo` - login (with `callbackUrl`), dashboard, or workspace picker
//! - `RejectUnauthenticated` - `401 {"error": "Authentication required"}`
//! - `RejectNoWorkspace` - `403 {"error": "Workspace context required", "redirect": ...}`
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! port = 3080
//! upstream = "http://127.0.0.1:3000"   # renderer receiving allowed requests
//!
//! [gate]
//! workspace_cookie = "starboard-workspace"
//!
//! [routes]
//! workspace_protected = ["/dashboard", "/events", "/team"]
//!
//! [[auth.sessions]]
//! token = "..."
//! email = "ada@example.com"
//! id = "u_1"
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod transport;
pub mod util;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use gate::{AccessGate, Decision, IncomingRequest};
