//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::tree::Source;
use crate::config::validation::ValidationError;

/// Errors raised while loading or resolving configuration.
///
/// All of these surface before any server resource is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The config file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML.
    #[error("malformed config file {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value could not be decoded into its field's type.
    #[error("invalid value for `{field}` from {origin}: {reason}")]
    Parse {
        field: String,
        origin: Source,
        reason: String,
    },

    /// The merged configuration failed semantic checks.
    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Field named by a parse or validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Parse { field, .. } => Some(field),
            ConfigError::Validation(errors) => errors.first().map(|e| e.field.as_str()),
            _ => None,
        }
    }

    /// Source named by a parse error.
    pub fn origin(&self) -> Option<Source> {
        match self {
            ConfigError::Parse { origin, .. } => Some(*origin),
            ConfigError::Syntax { .. } => Some(Source::File),
            _ => None,
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
