//! Utility functions shared across the application.

mod secret;

pub use secret::SecretString;

use std::fmt::Display;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::warn;

/// Builder for URL query parameters.
///
/// # Example
/// ```ignore
/// let location = format!(
///     "/auth/login{}",
///     QueryBuilder::new().param("callbackUrl", "/dashboard").build()
/// );
/// // "/auth/login?callbackUrl=%2Fdashboard"
/// ```
#[derive(Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, percent-encoding the value.
    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.params.push((
            key.to_string(),
            urlencoding::encode(&value.to_string()).into_owned(),
        ));
        self
    }

    /// Build the query string.
    ///
    /// Returns an empty string if no parameters were added,
    /// otherwise returns "?key1=value1&key2=value2...".
    pub fn build(self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .into_iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Find an available port, starting from the preferred port.
///
/// Tries the preferred port, then the next 10 consecutive ports, and
/// finally lets the OS assign one.
pub async fn find_available_port(host: &str, preferred: u16) -> std::io::Result<u16> {
    let parse = |port: u16| -> std::io::Result<SocketAddr> {
        format!("{}:{}", host, port)
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    };

    if let Ok(listener) = TcpListener::bind(parse(preferred)?).await {
        drop(listener);
        return Ok(preferred);
    }

    for offset in 1..=10 {
        let port = preferred.saturating_add(offset);
        if let Ok(listener) = TcpListener::bind(parse(port)?).await {
            drop(listener);
            warn!(
                preferred,
                actual = port,
                "Preferred port unavailable, using alternate"
            );
            return Ok(port);
        }
    }

    let listener = TcpListener::bind(parse(0)?).await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    warn!(preferred, actual = port, "Using OS-assigned port");
    Ok(port)
}
