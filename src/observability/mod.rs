//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config + lifecycle produce:
//!     → tracing events (structured fields, one span per server run)
//!     → metrics.rs (counters, histogram)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber installed by the binary)
//!     → any metrics recorder the embedding process installs
//! ```

pub mod logging;
pub mod metrics;
