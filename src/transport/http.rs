//! HTTP server
//!
//! Serves the site through the access gate. Allowed requests reach the
//! local routes or, failing those, the upstream renderer.

use crate::auth::SharedIdentityOracle;
use crate::error::{TransportError, UpstreamError};
use crate::gate::AccessGate;
use crate::transport::middleware::{ErrorBody, gate_middleware};
use crate::transport::upstream::UpstreamClient;
use crate::util::find_available_port;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Default listen port
pub const DEFAULT_HTTP_PORT: u16 = 3080;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:3080")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// Collaborators shared by every request
///
/// Built once at startup; each field is immutable for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub oracle: SharedIdentityOracle,
    pub upstream: Option<Arc<UpstreamClient>>,
}

impl AppState {
    pub fn new(
        gate: AccessGate,
        oracle: SharedIdentityOracle,
        upstream: Option<UpstreamClient>,
    ) -> Self {
        Self {
            gate: Arc::new(gate),
            oracle,
            upstream: upstream.map(Arc::new),
        }
    }
}

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    version: &'static str,
    oracle: &'static str,
    upstream: bool,
}

/// Build the router with the gate in front of every route
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .fallback(forward_or_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), gate_middleware)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthInfo> {
    Json(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        oracle: state.oracle.oracle_type(),
        upstream: state.upstream.is_some(),
    })
}

/// Hand an allowed request to the renderer
async fn forward_or_not_found(State(state): State<AppState>, request: Request) -> Response {
    let Some(upstream) = &state.upstream else {
        return (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found"))).into_response();
    };

    match upstream.forward(request).await {
        Ok(response) => response,
        Err(e @ UpstreamError::BodyTooLarge { .. }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorBody::new(e.to_string())),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, upstream = upstream.base_url(), "Upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new("Upstream unavailable")),
            )
                .into_response()
        }
    }
}

/// Start the server in the background
///
/// Port discovery is used to find an available port if the configured port
/// is taken. Returns the bound address and a token that stops the server.
pub async fn run_http(
    state: AppState,
    config: HttpConfig,
) -> Result<(SocketAddr, CancellationToken), TransportError> {
    let host = config.bind.ip().to_string();
    let actual_port = find_available_port(&host, config.bind.port()).await?;

    let listener = TcpListener::bind(SocketAddr::new(config.bind.ip(), actual_port)).await?;
    let bound = listener.local_addr()?;

    info!(
        gate_cookie = state.gate.workspace_cookie(),
        oracle = state.oracle.oracle_type(),
        upstream = state.upstream.as_ref().map(|u| u.base_url()),
        "Access gate listening on http://{}",
        bound
    );

    let ct = CancellationToken::new();
    let shutdown = ct.clone();
    let router = build_router(state);

    tokio::spawn(async move {
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;
        if let Err(e) = result {
            error!(error = %e, "HTTP server error");
        }
    });

    Ok((bound, ct))
}

/// Run the server and wait for Ctrl+C
pub async fn run_http_blocking(state: AppState, config: HttpConfig) -> Result<(), TransportError> {
    let (_, ct) = run_http(state, config).await?;

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = ct.cancelled() => {
            info!("Server cancelled");
        }
    }

    ct.cancel();

    info!("HTTP server stopped");
    Ok(())
}
