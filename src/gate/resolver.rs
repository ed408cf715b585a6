//! Access gate resolver
//!
//! Classifies a request path and picks exactly one [`Decision`].
//!
//! Page paths are matched against four independent tables, then the
//! ordered [`PAGE_RULES`] are walked once; the first rule whose session
//! requirement and categories apply decides. Paths under `/api/` skip the
//! page rules and take the first API table that matches, in rank order.

use crate::config::{GateConfig, RoutesConfig};
use crate::error::ConfigError;
use crate::gate::patterns::{MatcherSet, RouteTable};
use crate::gate::types::{CategorySet, Decision, IncomingRequest, RouteCategory};
use tracing::{debug, trace};

/// Paths under this prefix are API calls
pub const API_PREFIX: &str = "/api/";

/// Which sessions a page rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Anonymous,
}

impl SessionState {
    const fn applies(&self, authenticated: bool) -> bool {
        match self {
            SessionState::Authenticated => authenticated,
            SessionState::Anonymous => !authenticated,
        }
    }
}

/// What a page rule does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Send a signed-in user to the dashboard
    RedirectToDashboard,
    /// Send an anonymous user to login, remembering where they were going
    RedirectToLogin,
    Allow,
    /// Allow only with a workspace cookie, else send to the workspace picker
    RequireWorkspace,
}

/// One row of the page decision table
#[derive(Debug, Clone, Copy)]
pub struct PageRule {
    pub name: &'static str,
    pub session: SessionState,
    pub any_of: &'static [RouteCategory],
    pub outcome: PageOutcome,
}

/// Page decision table, in evaluation order. Anything reaching the end is
/// allowed, which covers public and unclassified pages.
pub const PAGE_RULES: &[PageRule] = &[
    PageRule {
        name: "signed_in_on_auth_page",
        session: SessionState::Authenticated,
        any_of: &[RouteCategory::Auth],
        outcome: PageOutcome::RedirectToDashboard,
    },
    PageRule {
        name: "anonymous_on_member_page",
        session: SessionState::Anonymous,
        any_of: &[
            RouteCategory::WorkspaceProtected,
            RouteCategory::WorkspaceManagement,
        ],
        outcome: PageOutcome::RedirectToLogin,
    },
    PageRule {
        name: "workspace_management_page",
        session: SessionState::Authenticated,
        any_of: &[RouteCategory::WorkspaceManagement],
        outcome: PageOutcome::Allow,
    },
    PageRule {
        name: "workspace_page",
        session: SessionState::Authenticated,
        any_of: &[RouteCategory::WorkspaceProtected],
        outcome: PageOutcome::RequireWorkspace,
    },
];

/// Name reported when no page rule fires
pub const FALLTHROUGH_RULE: &str = "fallthrough";

/// Name reported for static assets
pub const BYPASS_RULE: &str = "bypass";

/// What an API category requires of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRequirement {
    Nothing,
    Session,
    SessionAndWorkspace,
}

impl ApiRequirement {
    pub const fn for_category(category: RouteCategory) -> Self {
        match category {
            RouteCategory::ApiPublic => ApiRequirement::Nothing,
            RouteCategory::ApiWorkspaceManagement => ApiRequirement::Session,
            _ => ApiRequirement::SessionAndWorkspace,
        }
    }
}

/// Full account of one decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    /// Every category the path matched (a single one for API paths)
    pub categories: CategorySet,
    /// Page rule name, `api:<category>`, [`FALLTHROUGH_RULE`] or [`BYPASS_RULE`]
    pub rule: &'static str,
}

/// The access gate
///
/// Built once from configuration and shared by reference; holds no
/// mutable state, so concurrent calls never interact.
#[derive(Debug, Clone)]
pub struct AccessGate {
    page_tables: Vec<RouteTable>,
    api_tables: Vec<RouteTable>,
    bypass: MatcherSet,
    workspace_cookie: String,
    login_path: String,
    dashboard_path: String,
    workspace_select_path: String,
    callback_param: String,
}

impl AccessGate {
    /// Compile the route tables
    pub fn new(gate: &GateConfig, routes: &RoutesConfig) -> Result<Self, ConfigError> {
        let page_tables = vec![
            RouteTable::new(RouteCategory::Auth, 0, MatcherSet::prefixes(&routes.auth)),
            RouteTable::new(
                RouteCategory::WorkspaceProtected,
                1,
                MatcherSet::prefixes(&routes.workspace_protected),
            ),
            RouteTable::new(
                RouteCategory::WorkspaceManagement,
                2,
                MatcherSet::prefixes(&routes.workspace_management),
            ),
            RouteTable::new(RouteCategory::Public, 3, MatcherSet::prefixes(&routes.public)),
        ];

        let api_tables = vec![
            RouteTable::new(
                RouteCategory::ApiPublic,
                0,
                MatcherSet::new(&routes.public_api, &routes.public_api_patterns)?,
            ),
            RouteTable::new(
                RouteCategory::ApiWorkspaceManagement,
                1,
                MatcherSet::prefixes(&routes.workspace_management_api),
            ),
        ];
        debug_assert!(api_tables.is_sorted_by_key(RouteTable::rank));

        Ok(Self {
            page_tables,
            api_tables,
            bypass: MatcherSet::new(&routes.bypass, &routes.bypass_patterns)?,
            workspace_cookie: gate.workspace_cookie.clone(),
            login_path: gate.login_path.clone(),
            dashboard_path: gate.dashboard_path.clone(),
            workspace_select_path: gate.workspace_select_path.clone(),
            callback_param: gate.callback_param.clone(),
        })
    }

    /// Decide what happens to a request
    pub fn decide(&self, request: &IncomingRequest) -> Decision {
        self.evaluate(request).decision
    }

    /// Decide and report which categories and rule produced the decision
    pub fn evaluate(&self, request: &IncomingRequest) -> Evaluation {
        let path = request.path.as_str();

        if let Some(matched) = self.bypass.find_match(path) {
            trace!(path, matched, "Static asset bypass");
            return Evaluation {
                decision: Decision::Allow,
                categories: CategorySet::empty(),
                rule: BYPASS_RULE,
            };
        }

        let authenticated = request.is_authenticated();
        let has_workspace = request.cookies.has_value(&self.workspace_cookie);

        let evaluation = if path.starts_with(API_PREFIX) {
            self.evaluate_api(path, authenticated, has_workspace)
        } else {
            self.evaluate_page(path, authenticated, has_workspace)
        };

        debug!(
            path,
            authenticated,
            user = request
                .authenticated_user
                .as_ref()
                .map_or("none", |u| u.email.as_str()),
            has_workspace_cookie = has_workspace,
            categories = %evaluation.categories,
            rule = evaluation.rule,
            decision = %evaluation.decision,
            "Access gate decision"
        );

        evaluation
    }

    /// Every page category the path matches
    pub fn classify_page(&self, path: &str) -> CategorySet {
        self.page_tables
            .iter()
            .filter(|t| t.matches(path))
            .map(RouteTable::category)
            .collect()
    }

    /// First API category the path matches, falling back to [`RouteCategory::ApiOther`]
    pub fn classify_api(&self, path: &str) -> RouteCategory {
        self.api_tables
            .iter()
            .find(|t| t.matches(path))
            .map_or(RouteCategory::ApiOther, RouteTable::category)
    }

    fn evaluate_page(&self, path: &str, authenticated: bool, has_workspace: bool) -> Evaluation {
        let categories = self.classify_page(path);

        let fired = PAGE_RULES
            .iter()
            .find(|rule| rule.session.applies(authenticated) && categories.contains_any(rule.any_of));

        let Some(rule) = fired else {
            return Evaluation {
                decision: Decision::Allow,
                categories,
                rule: FALLTHROUGH_RULE,
            };
        };

        let decision = match rule.outcome {
            PageOutcome::RedirectToDashboard => Decision::redirect(&self.dashboard_path),
            PageOutcome::RedirectToLogin => Decision::redirect_with_callback(&self.login_path),
            PageOutcome::Allow => Decision::Allow,
            // Cookie presence only; membership is checked by the page itself
            PageOutcome::RequireWorkspace if has_workspace => Decision::Allow,
            PageOutcome::RequireWorkspace => Decision::redirect(&self.workspace_select_path),
        };

        Evaluation {
            decision,
            categories,
            rule: rule.name,
        }
    }

    fn evaluate_api(&self, path: &str, authenticated: bool, has_workspace: bool) -> Evaluation {
        let category = self.classify_api(path);

        let decision = match ApiRequirement::for_category(category) {
            ApiRequirement::Nothing => Decision::Allow,
            _ if !authenticated => Decision::RejectUnauthenticated,
            ApiRequirement::Session => Decision::Allow,
            ApiRequirement::SessionAndWorkspace if has_workspace => Decision::Allow,
            ApiRequirement::SessionAndWorkspace => Decision::RejectNoWorkspace,
        };

        Evaluation {
            decision,
            categories: std::iter::once(category).collect(),
            rule: api_rule_name(category),
        }
    }

    /// Static assets are never classified and need no identity lookup
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass.matches(path)
    }

    /// Cookie the gate reads the workspace selection from
    pub fn workspace_cookie(&self) -> &str {
        &self.workspace_cookie
    }

    pub fn workspace_select_path(&self) -> &str {
        &self.workspace_select_path
    }

    /// Query parameter that carries the original path on login redirects
    pub fn callback_param(&self) -> &str {
        &self.callback_param
    }
}

const fn api_rule_name(category: RouteCategory) -> &'static str {
    match category {
        RouteCategory::ApiPublic => "api:public",
        RouteCategory::ApiWorkspaceManagement => "api:workspace_management",
        _ => "api:other",
    }
}
