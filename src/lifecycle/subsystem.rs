//! Startup collaborators.

use std::io;

use async_trait::async_trait;

use crate::config::ResolvedConfig;

/// An external component the server opens during startup.
///
/// Subsystems (storage engine, cluster membership, anti-entropy, profiler)
/// are opened in registration order after the listener is bound, and closed
/// in reverse order at shutdown. Only subsystems whose `open` succeeded are
/// closed.
#[async_trait]
pub trait Subsystem: Send + Sync {
    /// Name used in logs and resource errors.
    fn name(&self) -> &str;

    /// Acquire whatever the subsystem needs. An error aborts startup.
    async fn open(&self, config: &ResolvedConfig) -> io::Result<()>;

    /// Release resources. Called at most once, only after a successful `open`.
    async fn close(&self);
}
