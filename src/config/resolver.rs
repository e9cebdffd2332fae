//! Field-scoped merging of configuration layers.
//!
//! # Precedence (lowest to highest)
//! 1. Built-in defaults
//! 2. Config file
//! 3. Environment variables
//! 4. Command-line flags
//!
//! Every leaf field is resolved on its own: it takes the value of the
//! highest-precedence layer that mentions it, and layers that do not mention
//! it leave the lower value in place. Lists are replaced whole, never
//! appended.

use std::path::PathBuf;
use std::time::Duration;

use toml::Value;

use crate::config::duration::parse_duration;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::field::{self, Field};
use crate::config::schema::ResolvedConfig;
use crate::config::tree::{ConfigTree, Source};
use crate::config::validation::validate_config;

/// Resolve the four standard sources into a validated configuration.
pub fn resolve(
    defaults: ResolvedConfig,
    file: &ConfigTree,
    env: &ConfigTree,
    flags: &ConfigTree,
) -> ConfigResult<ResolvedConfig> {
    resolve_layers(defaults, &[file, env, flags])
}

/// Resolve any number of layers, given in ascending precedence.
pub fn resolve_layers(
    defaults: ResolvedConfig,
    layers: &[&ConfigTree],
) -> ConfigResult<ResolvedConfig> {
    for tree in layers {
        if let Some((section, found)) = tree.misplaced_sections().first() {
            return Err(ConfigError::Parse {
                field: section.to_string(),
                origin: tree.source(),
                reason: format!("expected a table, found {}", found),
            });
        }
    }

    let layers = Layers(layers);
    let mut config = defaults;

    if let Some(v) = layers.pick(field::DATA_DIR) {
        config.data_dir = v.path()?;
    }
    if let Some(v) = layers.pick(field::BIND) {
        config.bind = v.string()?;
    }
    if let Some(v) = layers.pick(field::LOG_LEVEL) {
        config.log_level = v.string()?.to_lowercase();
    }
    if let Some(v) = layers.pick(field::MAX_WRITES_PER_REQUEST) {
        config.max_writes_per_request = v.count()?;
    }

    let cluster = &mut config.cluster;
    if let Some(v) = layers.pick(field::CLUSTER_HOSTS) {
        cluster.nodes = v.list()?;
    }
    if let Some(v) = layers.pick(field::CLUSTER_REPLICAS) {
        cluster.replica_count = v.count()?;
    }
    if let Some(v) = layers.pick(field::CLUSTER_POLL_INTERVAL) {
        cluster.polling_interval = v.interval()?;
    }
    if let Some(v) = layers.pick(field::CLUSTER_LONG_QUERY_TIME) {
        cluster.long_query_time = v.interval()?;
    }

    if let Some(v) = layers.pick(field::ANTI_ENTROPY_INTERVAL) {
        config.anti_entropy.interval = v.interval()?;
    }

    if let Some(v) = layers.pick(field::PROFILE_CPU) {
        config.profile.cpu_profile_path = Some(v.path()?);
    }
    if let Some(v) = layers.pick(field::PROFILE_CPU_TIME) {
        config.profile.cpu_profile_duration = v.interval()?;
    }

    if let Some(v) = layers.pick(field::PLUGINS_PATH) {
        config.plugins.path = Some(v.path()?);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

struct Layers<'a>(&'a [&'a ConfigTree]);

impl<'a> Layers<'a> {
    /// Highest-precedence value set for `field`.
    fn pick(&self, field: Field) -> Option<Picked<'a>> {
        self.0.iter().rev().find_map(|tree| {
            tree.get(&field).map(|value| Picked {
                field,
                origin: tree.source(),
                value,
            })
        })
    }
}

/// A value chosen for a field, with enough context to report decode errors.
struct Picked<'a> {
    field: Field,
    origin: Source,
    value: &'a Value,
}

impl Picked<'_> {
    fn error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Parse {
            field: self.field.path(),
            origin: self.origin,
            reason: reason.into(),
        }
    }

    fn mismatch(&self, expected: &str) -> ConfigError {
        self.error(format!(
            "expected {}, found {}",
            expected,
            self.value.type_str()
        ))
    }

    fn string(&self) -> ConfigResult<String> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.mismatch("a string")),
        }
    }

    fn path(&self) -> ConfigResult<PathBuf> {
        let raw = self.string()?;
        if raw.trim().is_empty() {
            return Err(self.error("path is empty"));
        }
        Ok(expand_home(&raw))
    }

    fn count(&self) -> ConfigResult<u32> {
        match self.value {
            Value::Integer(n) => u32::try_from(*n)
                .map_err(|_| self.error(format!("{} is out of range", n))),
            Value::String(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|e| self.error(format!("{:?} is not a count: {}", s, e))),
            _ => Err(self.mismatch("an integer")),
        }
    }

    /// Strings parse as intervals; file integers are whole seconds.
    fn interval(&self) -> ConfigResult<Duration> {
        match self.value {
            Value::String(s) => parse_duration(s).map_err(|e| self.error(e.to_string())),
            Value::Integer(n) => u64::try_from(*n)
                .map(Duration::from_secs)
                .map_err(|_| self.error(format!("{} seconds is negative", n))),
            _ => Err(self.mismatch("a duration string")),
        }
    }

    fn list(&self) -> ConfigResult<Vec<String>> {
        match self.value {
            Value::String(s) => Ok(split_list(s)),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => {
                            let s = s.trim();
                            if !s.is_empty() {
                                out.push(s.to_string());
                            }
                        }
                        other => {
                            return Err(self.error(format!(
                                "list entries must be strings, found {}",
                                other.type_str()
                            )))
                        }
                    }
                }
                Ok(out)
            }
            _ => Err(self.mismatch("a list")),
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(raw),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(raw),
    }
}
