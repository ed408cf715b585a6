//! Access gate types
//!
//! Request-scoped inputs and outputs of the gate. Nothing here outlives
//! the request it describes.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Route classification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    /// Pages needing a session and a selected workspace
    WorkspaceProtected,
    /// Pages needing a session only (pick/create/join a workspace)
    WorkspaceManagement,
    /// Login and registration pages
    Auth,
    /// Pages open to everyone
    Public,
    /// API endpoints open to everyone
    ApiPublic,
    /// API endpoints needing a session only
    ApiWorkspaceManagement,
    /// Every other API endpoint
    ApiOther,
}

impl RouteCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RouteCategory::WorkspaceProtected => "workspace_protected",
            RouteCategory::WorkspaceManagement => "workspace_management",
            RouteCategory::Auth => "auth",
            RouteCategory::Public => "public",
            RouteCategory::ApiPublic => "api_public",
            RouteCategory::ApiWorkspaceManagement => "api_workspace_management",
            RouteCategory::ApiOther => "api_other",
        }
    }

    /// Whether this category applies to `/api/` paths
    pub const fn is_api(&self) -> bool {
        matches!(
            self,
            RouteCategory::ApiPublic
                | RouteCategory::ApiWorkspaceManagement
                | RouteCategory::ApiOther
        )
    }

    pub fn all() -> &'static [RouteCategory] {
        &[
            RouteCategory::WorkspaceProtected,
            RouteCategory::WorkspaceManagement,
            RouteCategory::Auth,
            RouteCategory::Public,
            RouteCategory::ApiPublic,
            RouteCategory::ApiWorkspaceManagement,
            RouteCategory::ApiOther,
        ]
    }

    const fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of categories a path matched
///
/// Page tables are independent, so one path can sit in several of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorySet(u8);

impl CategorySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, category: RouteCategory) {
        self.0 |= category.bit();
    }

    pub const fn contains(&self, category: RouteCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn contains_any(&self, categories: &[RouteCategory]) -> bool {
        categories.iter().any(|c| self.contains(*c))
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = RouteCategory> + '_ {
        RouteCategory::all()
            .iter()
            .copied()
            .filter(|c| self.contains(*c))
    }
}

impl FromIterator<RouteCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = RouteCategory>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("unclassified");
        }
        let names: Vec<&str> = self.iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// User resolved by the identity oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub id: String,
}

impl AuthenticatedUser {
    pub fn new(email: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            id: id.into(),
        }
    }
}

/// Request cookies, name to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one or more `Cookie` header values (`a=1; b=2`).
    ///
    /// Pairs without `=` are skipped. When a name repeats, the first
    /// occurrence wins.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for header in headers {
            for pair in header.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    jar.cookies
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().trim_matches('"').to_string());
                }
            }
        }
        jar
    }

    /// Add a cookie, replacing any previous value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// A cookie counts as present only when it carries a non-empty value
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Everything the gate looks at for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub path: String,
    pub cookies: CookieJar,
    pub authenticated_user: Option<AuthenticatedUser>,
}

impl IncomingRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cookies: CookieJar::new(),
            authenticated_user: None,
        }
    }

    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies = self.cookies.with(name, value);
        self
    }

    pub fn with_user(mut self, user: Option<AuthenticatedUser>) -> Self {
        self.authenticated_user = user;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_user.is_some()
    }
}

/// The single outcome the gate produces for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Pass through to the downstream handler unmodified
    Allow,
    /// Redirect the browser; with `preserve_callback` the original path is
    /// attached so the login page can send the user back
    RedirectTo {
        target: String,
        preserve_callback: bool,
    },
    /// 401: an API call without a session
    RejectUnauthenticated,
    /// 403: an API call with a session but no selected workspace
    RejectNoWorkspace,
}

impl Decision {
    pub fn redirect(target: impl Into<String>) -> Self {
        Decision::RedirectTo {
            target: target.into(),
            preserve_callback: false,
        }
    }

    pub fn redirect_with_callback(target: impl Into<String>) -> Self {
        Decision::RedirectTo {
            target: target.into(),
            preserve_callback: true,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Decision::RejectUnauthenticated | Decision::RejectNoWorkspace
        )
    }

    /// Redirect target, if this is a redirect
    pub fn target(&self) -> Option<&str> {
        match self {
            Decision::RedirectTo { target, .. } => Some(target),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::RedirectTo { .. } => "redirect",
            Decision::RejectUnauthenticated => "reject_unauthenticated",
            Decision::RejectNoWorkspace => "reject_no_workspace",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::RedirectTo {
                target,
                preserve_callback,
            } => {
                write!(f, "redirect to {}", target)?;
                if *preserve_callback {
                    f.write_str(" (with callback)")?;
                }
                Ok(())
            }
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_set() {
        let mut set = CategorySet::empty();
        assert!(set.is_empty());
        set.insert(RouteCategory::Public);
        set.insert(RouteCategory::WorkspaceProtected);

        assert!(set.contains(RouteCategory::Public));
        assert!(set.contains(RouteCategory::WorkspaceProtected));
        assert!(!set.contains(RouteCategory::Auth));
        assert!(set.contains_any(&[RouteCategory::Auth, RouteCategory::Public]));
        assert_eq!(set.to_string(), "workspace_protected,public");
    }

    #[test]
    fn test_category_bits_are_distinct() {
        let set: CategorySet = RouteCategory::all().iter().copied().collect();
        assert_eq!(set.iter().count(), RouteCategory::all().len());
    }

    #[test]
    fn test_category_is_api() {
        assert!(RouteCategory::ApiOther.is_api());
        assert!(!RouteCategory::Public.is_api());
    }

    #[test]
    fn test_cookie_jar_parse() {
        let jar = CookieJar::from_headers(["starboard-workspace=ws_1; theme=dark", "a=b=c"]);
        assert_eq!(jar.get("starboard-workspace"), Some("ws_1"));
        assert_eq!(jar.get("theme"), Some("dark"));
        assert_eq!(jar.get("a"), Some("b=c"));
        assert_eq!(jar.len(), 3);
    }

    #[test]
    fn test_cookie_jar_first_occurrence_wins() {
        let jar = CookieJar::from_headers(["ws=first; ws=second"]);
        assert_eq!(jar.get("ws"), Some("first"));
    }

    #[test]
    fn test_cookie_jar_skips_garbage() {
        let jar = CookieJar::from_headers(["novalue; =orphan; ok=1"]);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("ok"), Some("1"));
    }

    #[test]
    fn test_empty_cookie_value_is_absent() {
        let jar = CookieJar::new().with("starboard-workspace", "");
        assert!(!jar.has_value("starboard-workspace"));
        assert!(!jar.has_value("missing"));
        assert!(jar.with("starboard-workspace", "ws_1").has_value("starboard-workspace"));
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(Decision::Allow.to_string(), "allow");
        assert_eq!(
            Decision::redirect_with_callback("/auth/login").to_string(),
            "redirect to /auth/login (with callback)"
        );
        assert_eq!(Decision::redirect("/dashboard").target(), Some("/dashboard"));
        assert!(Decision::RejectNoWorkspace.is_rejection());
        assert!(!Decision::Allow.is_rejection());
    }
}
