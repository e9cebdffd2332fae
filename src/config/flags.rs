//! Command-line flag overlay.
//!
//! Flags use the dotted field path as their long name (`--cluster.hosts`).
//! Values are kept as text and decoded by the resolver so that malformed
//! input is reported with the field name and the `flag` source.

use std::path::PathBuf;

use clap::Args;
use toml::Value;

use crate::config::field::{self, Field};
use crate::config::tree::{ConfigTree, Source};

/// Configuration flags shared by every subcommand that resolves config.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigFlags {
    /// Path to a TOML configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for index data
    #[arg(long = "data-dir", short = 'd', value_name = "PATH")]
    pub data_dir: Option<String>,

    /// Address to listen on
    #[arg(long, short = 'b', value_name = "HOST:PORT")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Maximum number of write operations accepted per request
    #[arg(long = "max-writes-per-request", value_name = "N")]
    pub max_writes_per_request: Option<String>,

    /// Comma-separated list of cluster hosts
    #[arg(long = "cluster.hosts", value_name = "HOST:PORT,...")]
    pub cluster_hosts: Option<String>,

    /// Number of replicas kept for each shard
    #[arg(long = "cluster.replicas", value_name = "N")]
    pub cluster_replicas: Option<String>,

    /// Interval between cluster membership polls
    #[arg(long = "cluster.poll-interval", value_name = "DURATION")]
    pub cluster_poll_interval: Option<String>,

    /// Queries running longer than this are logged
    #[arg(long = "cluster.long-query-time", value_name = "DURATION")]
    pub cluster_long_query_time: Option<String>,

    /// Interval between anti-entropy passes
    #[arg(long = "anti-entropy.interval", value_name = "DURATION")]
    pub anti_entropy_interval: Option<String>,

    /// Write a CPU profile to this file
    #[arg(long = "profile.cpu", value_name = "PATH")]
    pub profile_cpu: Option<String>,

    /// How long to capture the CPU profile
    #[arg(long = "profile.cpu-time", value_name = "DURATION")]
    pub profile_cpu_time: Option<String>,

    /// Directory to load plugins from
    #[arg(long = "plugins.path", value_name = "PATH")]
    pub plugins_path: Option<String>,
}

impl ConfigFlags {
    /// Build the flag layer. Only flags given on the command line appear.
    pub fn overlay(&self) -> ConfigTree {
        let mut tree = ConfigTree::new(Source::Flag);
        for (field, value) in self.values() {
            if let Some(value) = value {
                tree.insert(&field, Value::String(value.clone()));
            }
        }
        tree
    }

    fn values(&self) -> [(Field, &Option<String>); 12] {
        [
            (field::DATA_DIR, &self.data_dir),
            (field::BIND, &self.bind),
            (field::LOG_LEVEL, &self.log_level),
            (field::MAX_WRITES_PER_REQUEST, &self.max_writes_per_request),
            (field::CLUSTER_HOSTS, &self.cluster_hosts),
            (field::CLUSTER_REPLICAS, &self.cluster_replicas),
            (field::CLUSTER_POLL_INTERVAL, &self.cluster_poll_interval),
            (field::CLUSTER_LONG_QUERY_TIME, &self.cluster_long_query_time),
            (field::ANTI_ENTROPY_INTERVAL, &self.anti_entropy_interval),
            (field::PROFILE_CPU, &self.profile_cpu),
            (field::PROFILE_CPU_TIME, &self.profile_cpu_time),
            (field::PLUGINS_PATH, &self.plugins_path),
        ]
    }
}
