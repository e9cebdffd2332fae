//! Server lifecycle errors.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::lifecycle::state::LifecycleState;

/// Errors from starting or running a server process.
///
/// `Clone` so the execution result can be observed by any number of waiters.
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    /// A resource needed for startup could not be acquired.
    #[error("failed to acquire {resource}: {source}")]
    Resource {
        resource: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} a server that is {state}")]
    Lifecycle {
        operation: &'static str,
        state: LifecycleState,
    },

    /// `start` was called outside a Tokio runtime.
    #[error("no Tokio runtime is available to run the server")]
    NoRuntime,

    /// The worker task panicked.
    #[error("server worker panicked: {0}")]
    Panicked(String),
}

impl ServerError {
    pub(crate) fn resource(resource: impl Into<String>, source: io::Error) -> Self {
        ServerError::Resource {
            resource: resource.into(),
            source: Arc::new(source),
        }
    }
}
