//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an application.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity and mode.
    pub app: AppSection,

    /// Listener and request limits.
    pub server: ServerConfig,

    /// Route table source and global middleware.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSection {
    /// Name used in logs.
    pub name: String,

    /// Environment label (e.g., "local", "production").
    pub env: String,

    /// Include error details in error responses.
    pub debug: bool,

    /// Base URL for absolute URL generation (e.g., "https://example.com").
    pub url: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "Valkyrja".to_string(),
            env: "production".to_string(),
            debug: false,
            url: "http://localhost:8080".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed for one request.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Boot from the cache file when it exists.
    pub use_cache: bool,

    /// Route cache file.
    pub cache_path: String,

    /// Reload the route table when the cache file changes.
    pub watch_cache: bool,

    /// Middleware run around every request, outermost first.
    pub middleware: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            use_cache: false,
            cache_path: "bootstrap/cache/routes.json".to_string(),
            watch_cache: false,
            middleware: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Full,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(!config.routing.use_cache);
        assert_eq!(config.observability.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [app]
            debug = true

            [routing]
            middleware = ["request_log", "cors"]

            [observability]
            log_format = "pretty"
            "#,
        )
        .unwrap();
        assert!(config.app.debug);
        assert_eq!(config.app.name, "Valkyrja");
        assert_eq!(config.routing.middleware, vec!["request_log", "cors"]);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }
}
