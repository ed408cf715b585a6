//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Well-known environment variables (STARBOARD_UPSTREAM_URL, STARBOARD_WORKSPACE_COOKIE)
//! 2. Environment variables (STARBOARD_GATE__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::{AppConfig, RoutesConfig};
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "starboard-gate.toml",
    ".starboard-gate.toml",
    "~/.config/starboard-gate/config.toml",
    "/etc/starboard-gate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // Double underscore (__) maps to nested keys (server.port)
    builder = builder.add_source(
        Environment::with_prefix("STARBOARD_GATE")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(url) = std::env::var("STARBOARD_UPSTREAM_URL")
        && !url.is_empty()
    {
        builder = builder
            .set_override("server.upstream", url)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    if let Ok(cookie) = std::env::var("STARBOARD_WORKSPACE_COOKIE")
        && !cookie.is_empty()
    {
        builder = builder
            .set_override("gate.workspace_cookie", cookie)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if let Some(upstream) = &config.server.upstream
        && !upstream.starts_with("http://")
        && !upstream.starts_with("https://")
    {
        return Err(ConfigError::Invalid {
            message: format!(
                "server.upstream must start with http:// or https://, got: {}",
                upstream
            ),
        });
    }

    if config.server.upstream_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "server.upstream_timeout_secs must be greater than 0".to_string(),
        });
    }

    for (field, value) in [
        ("gate.workspace_cookie", &config.gate.workspace_cookie),
        ("gate.callback_param", &config.gate.callback_param),
        ("auth.session_cookie", &config.auth.session_cookie),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Missing {
                field: field.to_string(),
            });
        }
    }

    for (field, value) in [
        ("gate.login_path", &config.gate.login_path),
        ("gate.dashboard_path", &config.gate.dashboard_path),
        ("gate.workspace_select_path", &config.gate.workspace_select_path),
    ] {
        validate_path(value, field)?;
    }

    validate_routes(&config.routes)?;

    Ok(())
}

/// Validate every route table: prefixes must be absolute paths, patterns must compile
fn validate_routes(routes: &RoutesConfig) -> Result<(), ConfigError> {
    for (field, prefixes) in [
        ("routes.auth", &routes.auth),
        ("routes.workspace_protected", &routes.workspace_protected),
        ("routes.workspace_management", &routes.workspace_management),
        ("routes.public", &routes.public),
        ("routes.public_api", &routes.public_api),
        ("routes.workspace_management_api", &routes.workspace_management_api),
        ("routes.bypass", &routes.bypass),
    ] {
        for prefix in prefixes {
            validate_path(prefix, field)?;
        }
    }

    validate_patterns(&routes.public_api_patterns, "routes.public_api_patterns")?;
    validate_patterns(&routes.bypass_patterns, "routes.bypass_patterns")?;

    Ok(())
}

fn validate_path(path: &str, field_path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid {
            message: format!("{} entries must start with '/', got: '{}'", field_path, path),
        });
    }
    Ok(())
}

/// Validate that all patterns are valid regex
fn validate_patterns(patterns: &[String], field_path: &str) -> Result<(), ConfigError> {
    for pattern in patterns {
        if let Err(e) = regex::Regex::new(pattern) {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: format!("in {}: {}", field_path, e),
            });
        }
    }
    Ok(())
}
