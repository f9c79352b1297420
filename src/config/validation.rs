//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. Validation is a pure
//! function that reports every problem, not just the first.

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, returning all errors found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.database.dsn.trim().is_empty() {
        errors.push(ValidationError::new("database.dsn", "must not be empty"));
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be at least 1",
        ));
    }

    let cookie = &config.session.cookie_name;
    if cookie.is_empty() || !cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        errors.push(ValidationError::new(
            "session.cookie_name",
            "must be a non-empty token of [A-Za-z0-9_-]",
        ));
    }

    if config.session.lifetime_secs == 0 {
        errors.push(ValidationError::new("session.lifetime_secs", "must be > 0"));
    }

    if config.session.cleanup_interval_secs == 0 {
        errors.push(ValidationError::new(
            "session.cleanup_interval_secs",
            "must be > 0",
        ));
    }

    if !(4..=31).contains(&config.auth.bcrypt_cost) {
        errors.push(ValidationError::new(
            "auth.bcrypt_cost",
            "must be between 4 and 31",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
