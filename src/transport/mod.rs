//! Transport module
//!
//! HTTP boundary around the access gate: request extraction, decision
//! responses, and forwarding to the upstream renderer.

pub mod http;
pub mod middleware;
pub mod upstream;

pub use http::{AppState, DEFAULT_HTTP_PORT, HttpConfig, build_router, run_http, run_http_blocking};
pub use middleware::{ErrorBody, decision_response, gate_middleware};
pub use upstream::UpstreamClient;
