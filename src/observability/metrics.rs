//! Lifecycle and configuration metrics.
//!
//! # Metrics
//! - `indexd_config_resolutions_total` (counter): resolution attempts by outcome
//! - `indexd_lifecycle_transitions_total` (counter): state changes by target state
//! - `indexd_server_starts_total` (counter): finished startups by outcome
//! - `indexd_startup_duration_seconds` (histogram): time from start to ready
//!
//! # Design Decisions
//! - Emits through the `metrics` facade only; installing a recorder or
//!   exporter is left to the embedding binary
//! - Label values are static strings

use std::time::Instant;

use crate::lifecycle::LifecycleState;

/// Record one configuration resolution attempt.
pub fn record_resolution(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("indexd_config_resolutions_total", "outcome" => outcome).increment(1);
}

/// Record a lifecycle state change.
pub fn record_transition(to: LifecycleState) {
    metrics::counter!("indexd_lifecycle_transitions_total", "to" => to.as_str()).increment(1);
}

/// Record how a startup ended: `ready`, `aborted`, or `failed`.
pub fn record_start(outcome: &'static str, started_at: Instant) {
    metrics::counter!("indexd_server_starts_total", "outcome" => outcome).increment(1);
    if outcome == "ready" {
        metrics::histogram!("indexd_startup_duration_seconds")
            .record(started_at.elapsed().as_secs_f64());
    }
}
