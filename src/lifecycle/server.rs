//! The server process and its startup/shutdown handshake.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ResolvedConfig;
use crate::lifecycle::error::ServerError;
use crate::lifecycle::latch::Latch;
use crate::lifecycle::state::LifecycleState;
use crate::lifecycle::subsystem::Subsystem;
use crate::observability::metrics;

/// Which signal a [`ServerProcess::wait_ready`] call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Resources are bound and the server is serving.
    Started,
    /// The worker finished without (or after) becoming ready.
    Exited,
}

/// Handle to one run of the server.
///
/// Cheap to clone; every clone drives the same process. A process runs at most
/// once: after it reaches [`LifecycleState::Closed`] a fresh `ServerProcess`
/// is needed.
///
/// # Example
///
/// ```rust,ignore
/// let server = ServerProcess::new(config);
/// server.start()?;
/// match server.wait_ready().await {
///     Readiness::Started => { /* serving */ }
///     Readiness::Exited => return server.wait().await,
/// }
/// server.close().await?;
/// ```
#[derive(Clone)]
pub struct ServerProcess {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    config: Arc<ResolvedConfig>,
    state: Mutex<LifecycleState>,
    started: Latch,
    exited: Latch,
    close_requested: Latch,
    outcome: Mutex<Option<Result<(), ServerError>>>,
    local_addr: Mutex<Option<SocketAddr>>,
    subsystems: Mutex<Vec<Arc<dyn Subsystem>>>,
    /// Subsystems whose `open` succeeded, in opening order. Kept outside the
    /// worker so they are still closed if the worker panics.
    opened: Mutex<Vec<Arc<dyn Subsystem>>>,
}

impl ServerProcess {
    /// A new idle process for `config`.
    pub fn new(config: impl Into<Arc<ResolvedConfig>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                config: config.into(),
                state: Mutex::new(LifecycleState::Idle),
                started: Latch::new(),
                exited: Latch::new(),
                close_requested: Latch::new(),
                outcome: Mutex::new(None),
                local_addr: Mutex::new(None),
                subsystems: Mutex::new(Vec::new()),
                opened: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a subsystem to open during startup.
    ///
    /// Subsystems registered after `start` are not opened by that run.
    pub fn with_subsystem(self, subsystem: impl Subsystem + 'static) -> Self {
        lock(&self.inner.subsystems).push(Arc::new(subsystem));
        self
    }

    /// Run id, recorded on the worker's tracing span.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.inner.config
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.inner.state)
    }

    /// Address the listener is bound to, once bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.inner.local_addr)
    }

    /// Fires once, after every startup resource is acquired.
    ///
    /// Never fires if startup failed or was aborted by [`close`](Self::close).
    pub fn started(&self) -> &Latch {
        &self.inner.started
    }

    /// Fires once, when the worker has fully finished for any reason.
    pub fn exited(&self) -> &Latch {
        &self.inner.exited
    }

    /// Begin startup on a spawned task and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<(), ServerError> {
        let handle = Handle::try_current().map_err(|_| ServerError::NoRuntime)?;
        {
            let mut state = lock(&self.inner.state);
            if *state != LifecycleState::Idle {
                return Err(ServerError::Lifecycle {
                    operation: "start",
                    state: *state,
                });
            }
            self.inner.transition(&mut state, LifecycleState::Starting);
        }

        tracing::info!(
            run_id = %self.inner.id,
            bind = %self.inner.config.bind,
            data_dir = %self.inner.config.data_dir.display(),
            "Starting server"
        );
        handle.spawn(supervise(Arc::clone(&self.inner)));
        Ok(())
    }

    /// Wait for either the started or the exited signal.
    pub async fn wait_ready(&self) -> Readiness {
        tokio::select! {
            biased;
            _ = self.inner.started.wait() => Readiness::Started,
            _ = self.inner.exited.wait() => Readiness::Exited,
        }
    }

    /// Wait for the worker to exit and return its result.
    pub async fn wait(&self) -> Result<(), ServerError> {
        self.inner.exited.wait().await;
        lock(&self.inner.outcome).clone().unwrap_or(Ok(()))
    }

    /// Request shutdown and wait until resources are released.
    ///
    /// Safe at any point: before `start`, during startup, after readiness, and
    /// repeatedly. A close before readiness aborts startup and the started
    /// signal never fires. Startup failures are reported by [`wait`](Self::wait),
    /// not here.
    pub async fn close(&self) -> Result<(), ServerError> {
        {
            let mut state = lock(&self.inner.state);
            match *state {
                LifecycleState::Idle => {
                    self.inner.transition(&mut state, LifecycleState::Closing);
                    self.inner.transition(&mut state, LifecycleState::Closed);
                    *lock(&self.inner.outcome) = Some(Ok(()));
                    self.inner.exited.fire();
                }
                LifecycleState::Starting | LifecycleState::Started => {
                    self.inner.transition(&mut state, LifecycleState::Closing);
                    self.inner.close_requested.fire();
                }
                LifecycleState::Closing | LifecycleState::Closed => {}
            }
        }

        self.inner.exited.wait().await;
        Ok(())
    }

    /// Start, run until `shutdown` resolves or the worker exits, then close.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        tokio::select! {
            _ = shutdown => {
                tracing::info!(run_id = %self.inner.id, "Shutdown requested");
            }
            _ = self.inner.exited.wait() => {}
        }
        self.close().await?;
        self.wait().await
    }
}

impl fmt::Debug for ServerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProcess")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl Inner {
    /// Apply a transition. Callers check legality first.
    fn transition(&self, state: &mut LifecycleState, to: LifecycleState) {
        debug_assert!(state.can_transition_to(to), "{state} -> {to}");
        tracing::debug!(run_id = %self.id, from = %state, to = %to, "Lifecycle transition");
        *state = to;
        metrics::record_transition(to);
    }

    /// Move to `Started` and fire the started signal, unless a close got in first.
    fn mark_started(&self) -> bool {
        let mut state = lock(&self.state);
        if *state != LifecycleState::Starting {
            return false;
        }
        self.transition(&mut state, LifecycleState::Started);
        self.started.fire();
        true
    }

    /// Record the worker's result, reach `Closed`, and fire the exited signal.
    fn finish(&self, result: Result<(), ServerError>) {
        let mut state = lock(&self.state);
        if matches!(*state, LifecycleState::Starting | LifecycleState::Started) {
            self.transition(&mut state, LifecycleState::Closing);
        }
        if *state == LifecycleState::Closing {
            self.transition(&mut state, LifecycleState::Closed);
        }
        *lock(&self.outcome) = Some(result);
        drop(state);
        self.exited.fire();
    }

    async fn open(&self, listener_slot: &mut Option<TcpListener>) -> Result<(), ServerError> {
        let bind = &self.config.bind;
        let listener = TcpListener::bind(bind.as_str())
            .await
            .map_err(|e| ServerError::resource(format!("listener on {bind}"), e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::resource(format!("listener on {bind}"), e))?;
        *lock(&self.local_addr) = Some(addr);
        *listener_slot = Some(listener);
        tracing::debug!(address = %addr, "Listener bound");

        let data_dir = &self.config.data_dir;
        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            ServerError::resource(format!("data directory {}", data_dir.display()), e)
        })?;

        let subsystems = lock(&self.subsystems).clone();
        for subsystem in subsystems {
            subsystem
                .open(&self.config)
                .await
                .map_err(|e| ServerError::resource(subsystem.name(), e))?;
            tracing::debug!(subsystem = subsystem.name(), "Subsystem opened");
            lock(&self.opened).push(subsystem);
        }
        Ok(())
    }
}

impl Inner {
    /// Close every opened subsystem in reverse order. Later calls find
    /// nothing left to close.
    async fn close_opened(&self) {
        let opened = std::mem::take(&mut *lock(&self.opened));
        for subsystem in opened.iter().rev() {
            subsystem.close().await;
            tracing::debug!(subsystem = subsystem.name(), "Subsystem closed");
        }
    }
}

/// Run the worker and always report how it ended.
async fn supervise(inner: Arc<Inner>) {
    let span = tracing::info_span!("server", run_id = %inner.id);
    let worker = tokio::spawn(run(Arc::clone(&inner)).instrument(span));

    let result = match worker.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(ServerError::Panicked(panic_message(err.into_panic()))),
        Err(err) => Err(ServerError::Panicked(err.to_string())),
    };
    // A panicking worker unwinds past its own cleanup.
    inner.close_opened().await;

    if let Err(err) = &result {
        tracing::error!(run_id = %inner.id, error = %err, "Server exited with error");
    } else {
        tracing::info!(run_id = %inner.id, "Server stopped");
    }
    inner.finish(result);
}

async fn run(inner: Arc<Inner>) -> Result<(), ServerError> {
    let started_at = Instant::now();
    let mut listener = None;

    let opened = tokio::select! {
        biased;
        _ = inner.close_requested.wait() => None,
        result = inner.open(&mut listener) => Some(result),
    };

    match opened {
        None => {
            tracing::warn!("Startup aborted by close request");
            metrics::record_start("aborted", started_at);
            inner.close_opened().await;
            return Ok(());
        }
        Some(Err(err)) => {
            metrics::record_start("failed", started_at);
            inner.close_opened().await;
            return Err(err);
        }
        Some(Ok(())) => {}
    }

    if !inner.mark_started() {
        tracing::warn!("Startup aborted by close request");
        metrics::record_start("aborted", started_at);
        inner.close_opened().await;
        return Ok(());
    }
    metrics::record_start("ready", started_at);
    tracing::info!(
        address = ?listener.as_ref().and_then(|l| l.local_addr().ok()),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Server started"
    );

    inner.close_requested.wait().await;
    tracing::info!("Releasing server resources");
    inner.close_opened().await;
    drop(listener);
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Lock ignoring poison; every critical section leaves the data consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
