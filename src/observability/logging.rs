//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber for the binary
//! - Pick the level from `RUST_LOG`, falling back to the resolved `log-level`
//!
//! # Design Decisions
//! - Library code only emits events; only the binary installs a subscriber
//! - `try_init` so repeated initialization (tests, embedding) is an error,
//!   not a panic

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(level: &str) -> String {
    format!("indexd={level}")
}

/// Install a fmt subscriber filtered by `RUST_LOG` or `level`.
pub fn init(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
