//! Configuration schema definitions.
//!
//! [`ResolvedConfig`] is the output of resolution: every field holds a final
//! value and the whole tree is immutable from then on. Types serialize in the
//! config file's own shape so that a resolved configuration can be written
//! out and read back as a config file.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::config::duration;

/// Root configuration for the index server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedConfig {
    /// Directory holding index data.
    pub data_dir: PathBuf,

    /// Listen address, `host:port`.
    pub bind: String,

    /// Log level for the `indexd` target.
    pub log_level: String,

    /// Upper bound on write operations per request.
    pub max_writes_per_request: u32,

    /// Cluster membership and replication.
    pub cluster: ClusterConfig,

    /// Background consistency repair.
    pub anti_entropy: AntiEntropyConfig,

    /// CPU profiling.
    pub profile: ProfileConfig,

    /// Plugin loading.
    pub plugins: PluginsConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind: "localhost:10101".to_string(),
            log_level: "info".to_string(),
            max_writes_per_request: 5000,
            cluster: ClusterConfig::default(),
            anti_entropy: AntiEntropyConfig::default(),
            profile: ProfileConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".indexd"))
        .unwrap_or_else(|| PathBuf::from(".indexd"))
}

/// Cluster configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterConfig {
    /// Cluster hosts in declaration order. Duplicates are kept.
    #[serde(rename = "hosts")]
    pub nodes: Vec<String>,

    /// Number of copies kept of each shard.
    #[serde(rename = "replicas")]
    pub replica_count: u32,

    /// Interval between membership polls.
    #[serde(rename = "poll-interval", serialize_with = "duration::serialize")]
    pub polling_interval: Duration,

    /// Queries slower than this are logged by the query engine.
    #[serde(rename = "long-query-time", serialize_with = "duration::serialize")]
    pub long_query_time: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            replica_count: 1,
            polling_interval: Duration::from_secs(60),
            long_query_time: Duration::from_secs(60),
        }
    }
}

/// Anti-entropy configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AntiEntropyConfig {
    #[serde(serialize_with = "duration::serialize")]
    pub interval: Duration,
}

impl Default for AntiEntropyConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
        }
    }
}

/// CPU profiling configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileConfig {
    /// Where to write a CPU profile captured at startup.
    #[serde(rename = "cpu", skip_serializing_if = "Option::is_none")]
    pub cpu_profile_path: Option<PathBuf>,

    /// How long the startup CPU profile runs.
    #[serde(rename = "cpu-time", serialize_with = "duration::serialize")]
    pub cpu_profile_duration: Duration,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            cpu_profile_path: None,
            cpu_profile_duration: Duration::from_secs(30),
        }
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
