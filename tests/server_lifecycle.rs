//! Startup/shutdown handshake tests.

use std::time::Duration;

use indexd::lifecycle::{LifecycleState, Readiness, ServerError, ServerProcess};
use tokio::sync::oneshot;

mod common;

use common::{
    test_config, within, CallLog, FailingSubsystem, GatedSubsystem, PanickingSubsystem,
    RecordingSubsystem,
};

#[tokio::test]
async fn test_start_ready_close() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let data_dir = config.data_dir.clone();

    let server = ServerProcess::new(config);
    assert_eq!(server.state(), LifecycleState::Idle);
    server.start().unwrap();

    assert_eq!(within(server.wait_ready()).await, Readiness::Started);
    assert_eq!(server.state(), LifecycleState::Started);
    assert!(server.started().is_fired());
    assert!(!server.exited().is_fired());
    assert!(data_dir.is_dir());

    let addr = server.local_addr().unwrap();
    assert_ne!(addr.port(), 0);
    within(tokio::net::TcpStream::connect(addr)).await.unwrap();

    within(server.close()).await.unwrap();
    assert_eq!(server.state(), LifecycleState::Closed);
    assert!(server.exited().is_fired());
    assert!(server.wait().await.is_ok());
}

#[tokio::test]
async fn test_close_during_startup_never_fires_started() {
    let dir = tempfile::tempdir().unwrap();
    let (gated, gate) = GatedSubsystem::new();
    let server = ServerProcess::new(test_config(dir.path())).with_subsystem(gated);

    server.start().unwrap();
    within(gate.entered()).await;
    assert_eq!(server.state(), LifecycleState::Starting);

    within(server.close()).await.unwrap();

    assert!(!server.started().is_fired());
    assert!(server.exited().is_fired());
    assert_eq!(server.state(), LifecycleState::Closed);
    assert!(server.wait().await.is_ok());
    // open never completed, so the subsystem is not closed
    assert_eq!(gate.calls(), vec!["open:gated"]);

    // the gate opening late must not resurrect the process
    gate.release();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!server.started().is_fired());
}

#[tokio::test]
async fn test_released_gate_completes_startup() {
    let dir = tempfile::tempdir().unwrap();
    let (gated, gate) = GatedSubsystem::new();
    let server = ServerProcess::new(test_config(dir.path())).with_subsystem(gated);

    server.start().unwrap();
    within(gate.entered()).await;
    gate.release();

    assert_eq!(within(server.wait_ready()).await, Readiness::Started);
    within(server.close()).await.unwrap();
    assert_eq!(
        gate.calls(),
        vec!["open:gated", "opened:gated", "close:gated"]
    );
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path()));
    server.start().unwrap();
    within(server.started().wait()).await;

    let other = server.clone();
    let (a, b) = tokio::join!(other.close(), server.close());
    a.unwrap();
    b.unwrap();
    within(server.close()).await.unwrap();

    assert_eq!(server.state(), LifecycleState::Closed);
    assert!(server.wait().await.is_ok());
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path()));
    server.start().unwrap();

    let err = server.start().unwrap_err();
    assert!(matches!(
        err,
        ServerError::Lifecycle {
            operation: "start",
            ..
        }
    ));

    within(server.close()).await.unwrap();
    assert!(matches!(
        server.start(),
        Err(ServerError::Lifecycle {
            state: LifecycleState::Closed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_bind_failure_surfaces_through_wait() {
    let dir = tempfile::tempdir().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config(dir.path());
    config.bind = taken.local_addr().unwrap().to_string();

    let server = ServerProcess::new(config);
    server.start().unwrap();

    assert_eq!(within(server.wait_ready()).await, Readiness::Exited);
    assert!(!server.started().is_fired());

    let err = server.wait().await.unwrap_err();
    match &err {
        ServerError::Resource { resource, .. } => assert!(resource.starts_with("listener")),
        other => panic!("unexpected error: {other:?}"),
    }

    // close after a failed startup is still clean
    within(server.close()).await.unwrap();
    assert_eq!(server.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_data_dir_failure_is_a_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let mut config = test_config(dir.path());
    config.data_dir = blocker.join("data");

    let server = ServerProcess::new(config);
    server.start().unwrap();

    let err = within(server.wait()).await.unwrap_err();
    assert!(matches!(
        &err,
        ServerError::Resource { resource, .. } if resource.starts_with("data directory")
    ));
    assert!(!server.started().is_fired());
}

#[tokio::test]
async fn test_subsystems_open_in_order_and_close_in_reverse() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let server = ServerProcess::new(test_config(dir.path()))
        .with_subsystem(RecordingSubsystem::new("storage", &log))
        .with_subsystem(RecordingSubsystem::new("cluster", &log))
        .with_subsystem(RecordingSubsystem::new("anti-entropy", &log));

    server.start().unwrap();
    within(server.started().wait()).await;
    assert_eq!(
        log.entries(),
        vec!["open:storage", "open:cluster", "open:anti-entropy"]
    );

    within(server.close()).await.unwrap();
    assert_eq!(
        log.entries()[3..],
        ["close:anti-entropy", "close:cluster", "close:storage"]
    );
}

#[tokio::test]
async fn test_failed_subsystem_releases_opened_ones() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let server = ServerProcess::new(test_config(dir.path()))
        .with_subsystem(RecordingSubsystem::new("cluster", &log))
        .with_subsystem(FailingSubsystem);

    server.start().unwrap();
    let err = within(server.wait()).await.unwrap_err();

    assert!(matches!(
        &err,
        ServerError::Resource { resource, source } if resource == "storage"
            && source.kind() == std::io::ErrorKind::PermissionDenied
    ));
    assert_eq!(log.entries(), vec!["open:cluster", "close:cluster"]);
    assert!(!server.started().is_fired());
}

#[tokio::test]
async fn test_worker_panic_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path())).with_subsystem(PanickingSubsystem);

    server.start().unwrap();
    assert_eq!(within(server.wait_ready()).await, Readiness::Exited);

    let err = server.wait().await.unwrap_err();
    assert!(matches!(&err, ServerError::Panicked(msg) if msg.contains("profiler exploded")));
    within(server.close()).await.unwrap();
    assert_eq!(server.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_panic_during_startup_closes_opened_subsystems() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let server = ServerProcess::new(test_config(dir.path()))
        .with_subsystem(RecordingSubsystem::new("storage", &log))
        .with_subsystem(PanickingSubsystem);

    server.start().unwrap();
    let err = within(server.wait()).await.unwrap_err();
    assert!(matches!(err, ServerError::Panicked(_)));

    within(server.close()).await.unwrap();
    assert_eq!(log.entries(), vec!["open:storage", "close:storage"]);
    assert!(!server.started().is_fired());
}

#[tokio::test]
async fn test_wait_can_be_observed_repeatedly() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path())).with_subsystem(FailingSubsystem);
    server.start().unwrap();

    let first = within(server.wait()).await.unwrap_err().to_string();
    let second = within(server.clone().wait()).await.unwrap_err().to_string();
    assert_eq!(first, second);
    assert!(first.contains("storage locked"));
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown_future() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path()));
    let (tx, rx) = oneshot::channel::<()>();

    let running = {
        let server = server.clone();
        tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = rx.await;
                })
                .await
        })
    };

    within(server.started().wait()).await;
    tx.send(()).unwrap();

    within(running).await.unwrap().unwrap();
    assert_eq!(server.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_run_until_reports_startup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let server = ServerProcess::new(test_config(dir.path())).with_subsystem(FailingSubsystem);

    let result = within(server.run_until(std::future::pending())).await;
    assert!(matches!(result, Err(ServerError::Resource { .. })));
}
