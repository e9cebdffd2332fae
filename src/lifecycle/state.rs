//! Server lifecycle states.

use std::fmt;

/// Where a [`ServerProcess`](super::ServerProcess) is in its life.
///
/// ```text
/// Idle ──▶ Starting ──▶ Started ──▶ Closing ──▶ Closed
///   │          │                      ▲
///   └──────────┴──────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created, not yet started.
    Idle,
    /// Worker is acquiring resources.
    Starting,
    /// Resources are bound and the started signal has fired.
    Started,
    /// Shutdown requested; the worker is releasing resources.
    Closing,
    /// Worker has exited. Terminal.
    Closed,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Starting => "starting",
            LifecycleState::Started => "started",
            LifecycleState::Closing => "closing",
            LifecycleState::Closed => "closed",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Idle, Closing)
                | (Starting, Started)
                | (Starting, Closing)
                | (Started, Closing)
                | (Closing, Closed)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
