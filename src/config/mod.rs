//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (ResolvedConfig::default)
//!     → loader.rs   config file  → ConfigTree (Source::File)
//!     → env.rs      INDEXD_*     → ConfigTree (Source::Environment)
//!     → flags.rs    --a.b value  → ConfigTree (Source::Flag)
//!     → resolver.rs field-by-field precedence merge
//!     → validation.rs (semantic checks)
//!     → ResolvedConfig (validated, immutable)
//!     → shared via Arc with the server process
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a fresh resolution
//!   and a fresh server process
//! - Every source is decoded into the same tree shape, so the resolver has
//!   one code path for all of them
//! - Decoding errors name the field and the source that supplied the value

pub mod duration;
pub mod env;
pub mod error;
pub mod field;
pub mod flags;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod tree;
pub mod validation;

pub use duration::{parse_duration, DurationError};
pub use env::EnvOverlay;
pub use error::{ConfigError, ConfigResult};
pub use field::Field;
pub use flags::ConfigFlags;
pub use loader::{load_file, ConfigLoader};
pub use resolver::{resolve, resolve_layers};
pub use schema::{AntiEntropyConfig, ClusterConfig, PluginsConfig, ProfileConfig, ResolvedConfig};
pub use tree::{ConfigTree, Source};
pub use validation::{validate_config, ValidationError};
