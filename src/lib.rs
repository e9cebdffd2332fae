//! indexd: configuration resolution and server lifecycle for the index server.

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigLoader, ResolvedConfig};
pub use error::Error;
pub use lifecycle::{Readiness, ServerProcess};
