//! Error types for starboard-gate
//!
//! This module defines the error hierarchy used throughout the application.
//! Access outcomes (401/403) are not errors: the gate always returns a
//! [`Decision`](crate::gate::Decision). These types cover the ambient
//! concerns around it: configuration, the identity oracle, the HTTP
//! transport and the upstream renderer.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Identity oracle errors
///
/// The gate never sees these: an oracle failure is logged and the request
/// is treated as anonymous.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed session token")]
    MalformedToken,

    #[error("Duplicate session token for user '{email}'")]
    DuplicateSession { email: String },
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

/// Request path errors
///
/// A path that cannot be reduced to one unambiguous spelling is refused
/// before the gate sees it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path must start with '/'")]
    NotAbsolute,

    #[error("Path contains a '.' or '..' segment")]
    DotSegment,

    #[error("Path contains an encoded separator")]
    EncodedSeparator,

    #[error("Path contains a backslash")]
    Backslash,

    #[error("Malformed percent-encoding in path")]
    MalformedEncoding,
}

/// Upstream renderer errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
