//! Gate middleware
//!
//! Turns an HTTP request into an [`IncomingRequest`], asks the identity
//! oracle, runs the gate, and applies the decision.

use crate::gate::{AccessGate, CookieJar, Decision, IncomingRequest, canonicalize};
use crate::transport::http::AppState;
use crate::util::QueryBuilder;
use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, Uri, header, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::{debug, warn};

/// Message for 401 responses
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// Message for 403 responses
pub const WORKSPACE_REQUIRED: &str = "Workspace context required";

/// Message for 400 responses to paths with no canonical form
pub const INVALID_PATH: &str = "Invalid request path";

/// JSON error body returned to API callers
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }
}

/// Run the access gate in front of every route
///
/// The request is classified, and forwarded, under its canonical path.
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = match canonicalize(request.uri().path()) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, path = request.uri().path(), "Refusing request path");
            return invalid_path();
        }
    };

    if path != request.uri().path() {
        let Some(uri) = with_path(request.uri(), &path) else {
            return invalid_path();
        };
        debug!(from = %request.uri(), to = %uri, "Canonicalised request path");
        *request.uri_mut() = uri;
    }

    if state.gate.is_bypassed(&path) {
        return next.run(request).await;
    }

    let cookies = CookieJar::from_headers(
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );

    let user = match state.oracle.identify(&cookies).await {
        Ok(user) => user,
        Err(e) => {
            warn!(
                error = %e,
                oracle = state.oracle.oracle_type(),
                path = %path,
                "Identity oracle failed, treating request as anonymous"
            );
            None
        }
    };

    let incoming = IncomingRequest::new(path)
        .with_cookies(cookies)
        .with_user(user);

    let decision = state.gate.decide(&incoming);

    match decision_response(&decision, &incoming.path, &state.gate) {
        Some(response) => response,
        None => next.run(request).await,
    }
}

fn invalid_path() -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(INVALID_PATH))).into_response()
}

/// `uri` with its path replaced, query kept
fn with_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>().ok()?);
    Uri::from_parts(parts).ok()
}

/// Wire response for a decision; `None` means let the request through
pub fn decision_response(
    decision: &Decision,
    original_path: &str,
    gate: &AccessGate,
) -> Option<Response> {
    match decision {
        Decision::Allow => None,
        Decision::RedirectTo {
            target,
            preserve_callback,
        } => {
            let location = if *preserve_callback {
                format!(
                    "{}{}",
                    target,
                    QueryBuilder::new()
                        .param(gate.callback_param(), original_path)
                        .build()
                )
            } else {
                target.clone()
            };
            debug!(from = original_path, to = %location, "Redirecting");
            Some(Redirect::temporary(&location).into_response())
        }
        Decision::RejectUnauthenticated => Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::new(AUTHENTICATION_REQUIRED)),
            )
                .into_response(),
        ),
        Decision::RejectNoWorkspace => Some(
            (
                StatusCode::FORBIDDEN,
                Json(
                    ErrorBody::new(WORKSPACE_REQUIRED)
                        .with_redirect(gate.workspace_select_path()),
                ),
            )
                .into_response(),
        ),
    }
}
