//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (server.rs, on a spawned worker task):
//!     start() → bind listener → create data dir → open subsystems
//!             → [state lock] Started + fire `started`
//!
//! Shutdown (server.rs):
//!     close() → [state lock] Closing + fire `close_requested`
//!             → worker closes subsystems in reverse, drops listener
//!             → Closed + fire `exited`
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the future passed to run_until
//! ```
//!
//! # Design Decisions
//! - Each startup step races the close request, so close never waits on a
//!   slow startup to finish first
//! - `started` fires under the same lock `close` takes, so a close either
//!   sees `Started` or startup sees `Closing`
//! - Panics in the worker are caught by a supervising task and still fire
//!   `exited`

pub mod error;
pub mod latch;
pub mod server;
pub mod signals;
pub mod state;
pub mod subsystem;

pub use error::ServerError;
pub use latch::Latch;
pub use server::{Readiness, ServerProcess};
pub use state::LifecycleState;
pub use subsystem::Subsystem;
