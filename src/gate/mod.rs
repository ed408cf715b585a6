//! Access gate
//!
//! Decides, before any page renderer or API handler runs, whether a request
//! is allowed through, redirected, or rejected.
//!
//! ## Page routes
//!
//! Evaluated in this order; the first applicable rule wins:
//!
//! 1. **Signed in, auth page** - redirect to the dashboard
//! 2. **Anonymous, member page** (workspace-protected or workspace-management) -
//!    redirect to login with `callbackUrl`
//! 3. **Signed in, workspace-management page** - allow
//! 4. **Signed in, workspace-protected page** - allow with a workspace cookie,
//!    otherwise redirect to the workspace picker
//! 5. **Anything else** - allow
//!
//! ## API routes (`/api/...`)
//!
//! 1. **Public API** (prefix list or `/api/applications/<id>/submit`) - allow
//! 2. **Workspace-management API** - 401 without a session, else allow
//! 3. **Any other API** - 401 without a session, 403 without a workspace
//!    cookie, else allow
//!
//! ## Trust boundary
//!
//! Only the *presence* of the workspace cookie is checked. Whether the user
//! belongs to that workspace is verified downstream by the page through the
//! workspace validation API.
//!
//! Paths are judged in their [`canonicalize`]d form. The transport refuses
//! anything that has no canonical form and forwards the canonical path, so
//! the renderer serves exactly what the gate classified.

pub mod path;
pub mod patterns;
pub mod resolver;
pub mod types;

pub use path::canonicalize;
pub use patterns::{MatcherSet, RouteMatcher, RouteTable};
pub use resolver::{AccessGate, Evaluation, PAGE_RULES, PageOutcome, PageRule};
pub use types::{
    AuthenticatedUser, CategorySet, CookieJar, Decision, IncomingRequest, RouteCategory,
};
