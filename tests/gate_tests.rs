//! Access gate integration tests
//!
//! Covers the page decision table, the API sub-classifier, the workspace
//! cookie sub-rule and the precedence between overlapping route tables.
//!
//! IMPORTANT: route matching is plain string prefix, and `/` is a public
//! prefix, so every page path is technically "public". The public-route
//! cases below therefore use paths that sit in no other table.

use rstest::rstest;
use starboard_gate::config::{GateConfig, RoutesConfig};
use starboard_gate::gate::{
    AccessGate, AuthenticatedUser, Decision, IncomingRequest, RouteCategory,
};

// =============================================================================
// Test Helpers
// =============================================================================

const WORKSPACE_COOKIE: &str = "starboard-workspace";

fn gate() -> AccessGate {
    AccessGate::new(&GateConfig::default(), &RoutesConfig::default()).unwrap()
}

fn user() -> Option<AuthenticatedUser> {
    Some(AuthenticatedUser::new("ada@example.com", "u_1"))
}

fn anonymous(path: &str) -> IncomingRequest {
    IncomingRequest::new(path)
}

fn signed_in(path: &str) -> IncomingRequest {
    IncomingRequest::new(path).with_user(user())
}

fn signed_in_with_workspace(path: &str) -> IncomingRequest {
    signed_in(path).with_cookie(WORKSPACE_COOKIE, "ws_42")
}

fn login_redirect() -> Decision {
    Decision::redirect_with_callback("/auth/login")
}

// =============================================================================
// 1. Public pages
// =============================================================================

mod public_pages {
    use super::*;

    #[rstest]
    #[case("/")]
    #[case("/about")]
    #[case("/contact")]
    #[case("/apply")]
    #[case("/apply/fall-cohort")]
    #[case("/auth/error")]
    #[case("/auth/verify-email")]
    #[case("/auth/reset-password")]
    #[case("/auth/forgot-password")]
    #[case("/auth/invite/abc")]
    fn test_public_page_allowed_for_everyone(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), Decision::Allow);
        assert_eq!(gate.decide(&signed_in(path)), Decision::Allow);
        assert_eq!(gate.decide(&signed_in_with_workspace(path)), Decision::Allow);
    }

    #[rstest]
    #[case("/blog/launch-week")]
    #[case("/api")]
    #[case("/workspaces")]
    fn test_unclassified_page_fails_open(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), Decision::Allow);
        assert_eq!(gate.decide(&signed_in(path)), Decision::Allow);
    }
}

// =============================================================================
// 2. Workspace-protected pages
// =============================================================================

mod workspace_protected_pages {
    use super::*;

    #[rstest]
    #[case("/dashboard")]
    #[case("/applications")]
    #[case("/applications/123")]
    #[case("/events")]
    #[case("/resources")]
    #[case("/messages")]
    #[case("/profile")]
    #[case("/admin/users")]
    #[case("/settings")]
    #[case("/analytics")]
    #[case("/integrations")]
    #[case("/team")]
    fn test_anonymous_redirected_to_login(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), login_redirect());

        // a workspace cookie does not help without a session
        let request = anonymous(path).with_cookie(WORKSPACE_COOKIE, "ws_42");
        assert_eq!(gate.decide(&request), login_redirect());
    }

    #[rstest]
    #[case("/dashboard")]
    #[case("/events/2024/kickoff")]
    #[case("/team")]
    fn test_signed_in_without_cookie_sent_to_picker(#[case] path: &str) {
        assert_eq!(
            gate().decide(&signed_in(path)),
            Decision::redirect("/workspaces/select")
        );
    }

    #[rstest]
    #[case("/dashboard")]
    #[case("/events/2024/kickoff")]
    #[case("/team")]
    fn test_signed_in_with_cookie_allowed(#[case] path: &str) {
        assert_eq!(gate().decide(&signed_in_with_workspace(path)), Decision::Allow);
    }

    #[test]
    fn test_empty_cookie_counts_as_absent() {
        let request = signed_in("/dashboard").with_cookie(WORKSPACE_COOKIE, "");
        assert_eq!(
            gate().decide(&request),
            Decision::redirect("/workspaces/select")
        );
    }

    #[test]
    fn test_other_cookies_do_not_count() {
        let request = signed_in("/dashboard").with_cookie("workspace", "ws_42");
        assert_eq!(
            gate().decide(&request),
            Decision::redirect("/workspaces/select")
        );
    }

    /// The gate trusts cookie presence. A workspace the user does not belong
    /// to (or one that does not exist) still passes here; the page checks
    /// membership through the workspace validation API.
    #[test]
    fn test_cookie_value_is_not_validated() {
        let request = signed_in("/dashboard").with_cookie(WORKSPACE_COOKIE, "someone-elses-ws");
        assert_eq!(gate().decide(&request), Decision::Allow);

        let request = signed_in("/dashboard").with_cookie(WORKSPACE_COOKIE, "%%%not-an-id");
        assert_eq!(gate().decide(&request), Decision::Allow);
    }

    #[test]
    fn test_prefix_match_is_not_segment_aware() {
        // "/teams" starts with "/team"
        assert_eq!(gate().decide(&anonymous("/teams")), login_redirect());
    }
}

// =============================================================================
// 3. Workspace-management pages
// =============================================================================

mod workspace_management_pages {
    use super::*;

    #[rstest]
    #[case("/workspaces/select")]
    #[case("/workspaces/create")]
    #[case("/workspaces/join")]
    #[case("/workspaces/join/invite-code")]
    fn test_anonymous_redirected_to_login(#[case] path: &str) {
        assert_eq!(gate().decide(&anonymous(path)), login_redirect());
    }

    #[rstest]
    #[case("/workspaces/select")]
    #[case("/workspaces/create")]
    #[case("/workspaces/join")]
    fn test_signed_in_allowed_without_workspace(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&signed_in(path)), Decision::Allow);
        assert_eq!(gate.decide(&signed_in_with_workspace(path)), Decision::Allow);
    }
}

// =============================================================================
// 4. Auth pages
// =============================================================================

mod auth_pages {
    use super::*;

    #[rstest]
    #[case("/auth/login")]
    #[case("/auth/register")]
    fn test_signed_in_redirected_to_dashboard(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&signed_in(path)), Decision::redirect("/dashboard"));
        assert_eq!(
            gate.decide(&signed_in_with_workspace(path)),
            Decision::redirect("/dashboard")
        );
    }

    #[rstest]
    #[case("/auth/login")]
    #[case("/auth/register")]
    fn test_anonymous_allowed(#[case] path: &str) {
        assert_eq!(gate().decide(&anonymous(path)), Decision::Allow);
    }

    #[test]
    fn test_login_redirect_keeps_callback_flag_off() {
        let decision = gate().decide(&signed_in("/auth/login"));
        assert!(matches!(
            decision,
            Decision::RedirectTo {
                preserve_callback: false,
                ..
            }
        ));
    }
}

// =============================================================================
// 5. API routes
// =============================================================================

mod api_routes {
    use super::*;

    #[rstest]
    #[case("/api/auth/session")]
    #[case("/api/health")]
    #[case("/api/public/events")]
    #[case("/api/applications/submit")]
    #[case("/api/invitations/accept")]
    #[case("/api/invitations/details")]
    #[case("/api/onboarding/complete")]
    #[case("/api/upload/public/presigned-url")]
    #[case("/api/workspaces/check-slug")]
    #[case("/api/sanity-test")]
    #[case("/api/applications/abc123/submit")]
    fn test_public_api_allowed_for_everyone(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), Decision::Allow);
        assert_eq!(gate.decide(&signed_in(path)), Decision::Allow);
    }

    #[test]
    fn test_submit_pattern_needs_single_segment() {
        let gate = gate();
        assert_eq!(
            gate.classify_api("/api/applications/abc123/other"),
            RouteCategory::ApiOther
        );
        assert_eq!(
            gate.decide(&anonymous("/api/applications/abc123/other")),
            Decision::RejectUnauthenticated
        );
        assert_eq!(
            gate.decide(&signed_in("/api/applications/abc123/other")),
            Decision::RejectNoWorkspace
        );
        assert_eq!(
            gate.decide(&anonymous("/api/applications/a/b/submit")),
            Decision::RejectUnauthenticated
        );
    }

    #[rstest]
    #[case("/api/workspaces")]
    #[case("/api/workspaces/switch")]
    #[case("/api/workspaces/validate")]
    #[case("/api/workspaces/current")]
    #[case("/api/upload/presigned-url")]
    #[case("/api/upload")]
    fn test_workspace_management_api_checks_session_only(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), Decision::RejectUnauthenticated);
        assert_eq!(gate.decide(&signed_in(path)), Decision::Allow);
    }

    #[test]
    fn test_workspace_switch_anonymous_is_401() {
        let request = anonymous("/api/workspaces/switch").with_cookie(WORKSPACE_COOKIE, "ws_1");
        assert_eq!(gate().decide(&request), Decision::RejectUnauthenticated);
    }

    #[rstest]
    #[case("/api/team/list")]
    #[case("/api/events")]
    #[case("/api/messages/thread/9")]
    fn test_other_api_requires_session_and_workspace(#[case] path: &str) {
        let gate = gate();
        assert_eq!(gate.decide(&anonymous(path)), Decision::RejectUnauthenticated);
        assert_eq!(gate.decide(&signed_in(path)), Decision::RejectNoWorkspace);
        assert_eq!(gate.decide(&signed_in_with_workspace(path)), Decision::Allow);
    }

    #[test]
    fn test_anonymous_with_cookie_is_still_401() {
        let request = anonymous("/api/team/list").with_cookie(WORKSPACE_COOKIE, "ws_1");
        assert_eq!(gate().decide(&request), Decision::RejectUnauthenticated);
    }

    #[test]
    fn test_api_paths_never_redirect() {
        let gate = gate();
        for path in ["/api/dashboard", "/api/auth-but-not-really", "/api/workspaces/select"] {
            for request in [anonymous(path), signed_in(path), signed_in_with_workspace(path)] {
                assert!(
                    gate.decide(&request).target().is_none(),
                    "{} redirected",
                    path
                );
            }
        }
    }
}

// =============================================================================
// 6. Precedence between overlapping tables
// =============================================================================

mod precedence {
    use super::*;

    #[test]
    fn test_protected_and_public_overlap_resolves_by_order() {
        // "/events/public" is in the public list but also starts with "/events"
        let gate = gate();
        let categories = gate.classify_page("/events/public");
        assert!(categories.contains(RouteCategory::WorkspaceProtected));
        assert!(categories.contains(RouteCategory::Public));

        assert_eq!(gate.decide(&anonymous("/events/public")), login_redirect());
        assert_eq!(
            gate.decide(&signed_in("/events/public")),
            Decision::redirect("/workspaces/select")
        );
        assert_eq!(
            gate.decide(&anonymous("/resources/public/handbook")),
            login_redirect()
        );
    }

    #[test]
    fn test_explicit_overlap_not_decided_by_specificity() {
        // same path listed in both tables, public entry more specific
        let routes = RoutesConfig {
            workspace_protected: vec!["/events".to_string()],
            public: vec!["/events/open-house".to_string()],
            ..Default::default()
        };
        let gate = AccessGate::new(&GateConfig::default(), &routes).unwrap();
        assert_eq!(gate.decide(&anonymous("/events/open-house")), login_redirect());
    }

    #[test]
    fn test_auth_rule_shadows_protected_rule() {
        // a path in both the auth and protected tables bounces signed-in users to the dashboard
        let routes = RoutesConfig {
            auth: vec!["/team/join".to_string()],
            ..Default::default()
        };
        let gate = AccessGate::new(&GateConfig::default(), &routes).unwrap();
        assert_eq!(
            gate.decide(&signed_in("/team/join")),
            Decision::redirect("/dashboard")
        );
        // anonymous users skip the auth rule and hit the login rule
        assert_eq!(gate.decide(&anonymous("/team/join")), login_redirect());
    }

    #[test]
    fn test_management_allow_shadows_workspace_requirement() {
        let routes = RoutesConfig {
            workspace_management: vec!["/settings/workspaces".to_string()],
            ..Default::default()
        };
        let gate = AccessGate::new(&GateConfig::default(), &routes).unwrap();
        assert_eq!(
            gate.decide(&signed_in("/settings/workspaces")),
            Decision::Allow
        );
        assert_eq!(
            gate.decide(&signed_in("/settings/profile")),
            Decision::redirect("/workspaces/select")
        );
    }

    #[test]
    fn test_public_api_wins_over_management_api() {
        let gate = gate();
        assert_eq!(
            gate.decide(&anonymous("/api/workspaces/check-slug?slug=acme")),
            Decision::Allow
        );
        assert_eq!(
            gate.decide(&anonymous("/api/workspaces/current")),
            Decision::RejectUnauthenticated
        );
    }
}

// =============================================================================
// 7. Static asset bypass
// =============================================================================

mod bypass {
    use super::*;

    #[rstest]
    #[case("/_next/static/chunks/main.js")]
    #[case("/_next/image?url=%2Flogo.png")]
    #[case("/favicon.ico")]
    #[case("/uploads/avatars/1.bin")]
    #[case("/dashboard/logo.png")]
    #[case("/api/team/banner.webp")]
    #[case("/events/cover.JPG.jpg")]
    fn test_static_assets_allowed_anonymously(#[case] path: &str) {
        assert_eq!(gate().decide(&anonymous(path)), Decision::Allow);
    }

    #[test]
    fn test_extension_must_be_at_end() {
        assert_eq!(gate().decide(&anonymous("/dashboard/logo.png/edit")), login_redirect());
    }
}

// =============================================================================
// 8. Determinism
// =============================================================================

mod determinism {
    use super::*;

    #[test]
    fn test_decide_is_idempotent() {
        let gate = gate();
        let requests = [
            anonymous("/dashboard"),
            signed_in("/dashboard"),
            signed_in_with_workspace("/dashboard"),
            anonymous("/api/team/list"),
            signed_in("/api/team/list"),
            signed_in("/auth/login"),
        ];
        for request in &requests {
            let first = gate.decide(request);
            let second = gate.decide(request);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_identity_does_not_matter_only_presence() {
        let gate = gate();
        let other = IncomingRequest::new("/dashboard")
            .with_user(Some(AuthenticatedUser::new("grace@example.com", "u_2")));
        assert_eq!(gate.decide(&other), gate.decide(&signed_in("/dashboard")));
    }

    #[test]
    fn test_gate_is_shareable_across_threads() {
        let gate = std::sync::Arc::new(gate());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let gate = gate.clone();
                std::thread::spawn(move || {
                    let path = if i % 2 == 0 { "/dashboard" } else { "/api/team" };
                    gate.decide(&IncomingRequest::new(path))
                })
            })
            .collect();

        let decisions: Vec<Decision> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(decisions[0], login_redirect());
        assert_eq!(decisions[1], Decision::RejectUnauthenticated);
    }
}
