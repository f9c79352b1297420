//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file.
//! Every section has defaults so an empty file (or no file) is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the snippetbox server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Database pool settings.
    pub database: DatabaseConfig,

    /// Template source settings.
    pub templates: TemplateConfig,

    /// Static asset settings.
    pub static_files: StaticConfig,

    /// Session cookie and store settings.
    pub session: SessionConfig,

    /// Password hashing settings.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:4000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4000".to_string(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string.
    pub dsn: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Run the bootstrap DDL at startup.
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: "sqlite://snippetbox.db?mode=rwc".to_string(),
            max_connections: 5,
            create_schema: true,
        }
    }
}

/// Template source configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding `html/base.html`, `html/partials/` and `html/pages/`.
    /// When unset the templates compiled into the binary are used.
    pub dir: Option<String>,
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Directory served under `/static/`.
    pub dir: String,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: "./ui/static".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Session lifetime in seconds, pushed out on every session save.
    pub lifetime_secs: u64,

    /// Mark the cookie `Secure`.
    pub secure: bool,

    /// Interval between expired-session sweeps in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            lifetime_secs: 12 * 60 * 60,
            secure: false,
            cleanup_interval_secs: 60,
        }
    }
}

/// Password hashing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Install the Prometheus recorder and expose `/metrics`.
    pub metrics_enabled: bool,

    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            log_filter: "snippetbox=info,tower_http=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert!(config.templates.dir.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [session]
            secure = true

            [templates]
            dir = "./ui"
            "#,
        )
        .unwrap();
        assert!(config.session.secure);
        assert_eq!(config.session.lifetime_secs, 12 * 60 * 60);
        assert_eq!(config.templates.dir.as_deref(), Some("./ui"));
    }
}
