//! Upstream renderer client
//!
//! Forwards allowed requests to the site renderer and streams its response
//! back. The renderer sees the original host and client through the
//! `X-Forwarded-*` headers.

use crate::config::ServerConfig;
use crate::error::UpstreamError;
use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    response::Response,
};
use reqwest::Client;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP client for the upstream renderer
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    max_body_bytes: usize,
}

impl UpstreamClient {
    /// Create a client for `base_url`
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, UpstreamError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(UpstreamError::InvalidUrl {
                url: base_url.to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            // redirects from the renderer belong to the browser
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(format!("starboard-gate/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_body_bytes,
        })
    }

    /// Create a client from server configuration, if an upstream is configured
    pub fn from_config(config: &ServerConfig) -> Result<Option<Self>, UpstreamError> {
        config
            .upstream
            .as_deref()
            .map(|url| {
                Self::new(
                    url,
                    Duration::from_secs(config.upstream_timeout_secs),
                    config.max_body_bytes,
                )
            })
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward a request and relay the response
    #[instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn forward(&self, request: Request) -> Result<Response, UpstreamError> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        let url = format!("{}{}", self.base_url, path_and_query);

        let body = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|_| UpstreamError::BodyTooLarge {
                limit: self.max_body_bytes,
            })?;

        let mut headers = end_to_end(&parts.headers);
        add_forwarded_headers(&mut headers, &parts, client_ip(&parts));

        let upstream = self
            .http
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let headers = end_to_end(upstream.headers());

        debug!(%url, status = status.as_u16(), "Upstream responded");

        // relayed chunk by chunk; the body is never buffered here
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Copy of `headers` without hop-by-hop entries
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Peer address, present when served with connect info
fn client_ip(parts: &Parts) -> Option<IpAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Describe the original request to the renderer
///
/// An existing `X-Forwarded-For` chain is extended with the peer; existing
/// `X-Forwarded-Host` and `X-Forwarded-Proto` from a proxy in front are kept.
fn add_forwarded_headers(headers: &mut HeaderMap, original: &Parts, client: Option<IpAddr>) {
    if let Some(ip) = client {
        let chain = match original
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{prior}, {ip}"),
            None => ip.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert("x-forwarded-for", value);
        }
    }

    if !headers.contains_key("x-forwarded-host") {
        let host = original.headers.get(header::HOST).cloned().or_else(|| {
            original
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
        if let Some(host) = host {
            headers.insert("x-forwarded-host", host);
        }
    }

    if !headers.contains_key("x-forwarded-proto") {
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    }
}

/// Headers that describe a single hop and must not be forwarded
fn is_hop_by_hop(name: &HeaderName) -> bool {
    [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::HOST,
        header::CONTENT_LENGTH,
    ]
    .contains(name)
}
