//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use indexd::config::ResolvedConfig;
use indexd::lifecycle::Subsystem;
use tokio::sync::Notify;

/// Upper bound for any single lifecycle step in tests.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// A config that binds an ephemeral local port and keeps data under `dir`.
pub fn test_config(dir: &Path) -> ResolvedConfig {
    ResolvedConfig {
        data_dir: dir.join("data"),
        bind: "127.0.0.1:0".into(),
        ..ResolvedConfig::default()
    }
}

/// Write `content` to `dir/name` and return the path.
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Await `future`, failing the test if it takes longer than [`STEP_TIMEOUT`].
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(STEP_TIMEOUT, future)
        .await
        .expect("lifecycle step timed out")
}

/// Shared log of subsystem calls, e.g. `["open:a", "open:b", "close:b"]`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Opens and closes successfully, recording each call.
pub struct RecordingSubsystem {
    name: String,
    log: CallLog,
}

impl RecordingSubsystem {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Subsystem for RecordingSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, _config: &ResolvedConfig) -> io::Result<()> {
        self.log.push(format!("open:{}", self.name));
        Ok(())
    }

    async fn close(&self) {
        self.log.push(format!("close:{}", self.name));
    }
}

/// Fails to open.
pub struct FailingSubsystem;

#[async_trait]
impl Subsystem for FailingSubsystem {
    fn name(&self) -> &str {
        "storage"
    }

    async fn open(&self, _config: &ResolvedConfig) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage locked"))
    }

    async fn close(&self) {}
}

/// Panics while opening.
pub struct PanickingSubsystem;

#[async_trait]
impl Subsystem for PanickingSubsystem {
    fn name(&self) -> &str {
        "profiler"
    }

    async fn open(&self, _config: &ResolvedConfig) -> io::Result<()> {
        panic!("profiler exploded");
    }

    async fn close(&self) {}
}

/// Control side of a [`GatedSubsystem`].
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    log: CallLog,
}

impl Gate {
    /// Wait until startup is blocked inside the gated subsystem.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the blocked `open` complete.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.entries()
    }
}

/// Blocks in `open` until its [`Gate`] is released.
pub struct GatedSubsystem {
    gate: Gate,
}

impl GatedSubsystem {
    pub fn new() -> (Self, Gate) {
        let gate = Gate::default();
        (Self { gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl Subsystem for GatedSubsystem {
    fn name(&self) -> &str {
        "gated"
    }

    async fn open(&self, _config: &ResolvedConfig) -> io::Result<()> {
        self.gate.log.push("open:gated".into());
        self.gate.entered.notify_one();
        self.gate.release.notified().await;
        self.gate.log.push("opened:gated".into());
        Ok(())
    }

    async fn close(&self) {
        self.gate.log.push("close:gated".into());
    }
}
