//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks on a merged configuration (decoding handles syntax)
//! - Value ranges (replica count, write limit)
//! - Address shape (`host:port`) for the listen address and cluster hosts
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `&ResolvedConfig → Result<(), Vec<ValidationError>>`
//! - Runs before the configuration is handed to the server

use std::fmt;

use crate::config::field::{self, Field};
use crate::config::schema::ResolvedConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &Field, message: impl Into<String>) -> Self {
        Self {
            field: field.path(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a merged configuration.
pub fn validate_config(config: &ResolvedConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if split_host_port(&config.bind).is_none() {
        errors.push(ValidationError::new(
            &field::BIND,
            format!("must be host:port, got {:?}", config.bind),
        ));
    }

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ValidationError::new(
            &field::LOG_LEVEL,
            format!(
                "must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                config.log_level
            ),
        ));
    }

    if config.max_writes_per_request == 0 {
        errors.push(ValidationError::new(
            &field::MAX_WRITES_PER_REQUEST,
            "must be at least 1",
        ));
    }

    if config.cluster.replica_count == 0 {
        errors.push(ValidationError::new(
            &field::CLUSTER_REPLICAS,
            "must be at least 1",
        ));
    }

    for host in &config.cluster.nodes {
        if split_host_port(host).is_none() {
            errors.push(ValidationError::new(
                &field::CLUSTER_HOSTS,
                format!("entry must be host:port, got {:?}", host),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Split `host:port`, accepting bracketed IPv6 hosts (`[::1]:10101`).
pub fn split_host_port(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')?,
        None => host,
    };
    if host.is_empty() || host.contains(char::is_whitespace) {
        return None;
    }
    let port = port.parse().ok()?;
    Some((host, port))
}
