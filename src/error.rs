//! Top-level error type.

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::config::ConfigError;
use crate::lifecycle::ServerError;

/// Any error the `indexd` binary can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    /// A global log subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] TryInitError),

    /// The resolved configuration could not be rendered.
    #[error("failed to render configuration: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
