//! Environment variable overlay.
//!
//! # Naming
//! `INDEXD_` + uppercased dotted path, with `_` standing in for `-`:
//!
//! | variable                        | field                   |
//! |---------------------------------|-------------------------|
//! | `INDEXD_DATA_DIR`               | `data-dir`              |
//! | `INDEXD_CLUSTER.POLL_INTERVAL`  | `cluster.poll-interval` |
//! | `INDEXD_ANTI_ENTROPY.INTERVAL`  | `anti-entropy.interval` |
//!
//! Only the first `.` separates section from key. Empty values are treated
//! as unset. Variables that name no field are ignored. `INDEXD_CONFIG`
//! selects the config file and is read by the loader, not here.

use std::ffi::OsString;

use toml::Value;

use crate::config::field::{self, Field};
use crate::config::tree::{ConfigTree, Source};

/// Prefix shared by every variable this process reads.
pub const ENV_PREFIX: &str = "INDEXD_";

/// Decodes prefixed environment variables into a [`ConfigTree`].
#[derive(Debug, Clone)]
pub struct EnvOverlay {
    prefix: String,
}

impl Default for EnvOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Name of the variable selecting the config file under this prefix.
    pub fn config_var(&self) -> String {
        format!("{}CONFIG", self.prefix)
    }

    /// Map a variable name to the field it configures.
    ///
    /// The prefix must match exactly; the rest is compared without regard to
    /// case.
    pub fn field_for(&self, name: &str) -> Option<Field> {
        if !name.starts_with(&self.prefix) {
            return None;
        }
        field::ALL
            .iter()
            .copied()
            .find(|f| f.env_var(&self.prefix).eq_ignore_ascii_case(name))
    }

    /// Build the environment layer from `(name, value)` pairs.
    pub fn overlay<I, K, V>(&self, vars: I) -> ConfigTree
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let config_var = self.config_var();
        let mut tree = ConfigTree::new(Source::Environment);
        for (name, value) in vars {
            let (name, value) = (name.as_ref(), value.as_ref());
            if !name.starts_with(&self.prefix) || name == config_var {
                continue;
            }
            let Some(field) = self.field_for(name) else {
                tracing::debug!(variable = name, "Ignoring unknown environment variable");
                continue;
            };
            if value.is_empty() {
                continue;
            }
            tracing::trace!(variable = name, field = %field, "Environment override");
            tree.insert(&field, Value::String(value.to_string()));
        }
        tree
    }
}

/// Snapshot of the process environment as UTF-8 pairs.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(name, value): (OsString, OsString)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_dotted_sections() {
        let env = EnvOverlay::new();
        assert_eq!(
            env.field_for("INDEXD_CLUSTER.POLL_INTERVAL"),
            Some(field::CLUSTER_POLL_INTERVAL)
        );
        assert_eq!(
            env.field_for("INDEXD_PROFILE.CPU_TIME"),
            Some(field::PROFILE_CPU_TIME)
        );
        assert_eq!(
            env.field_for("INDEXD_ANTI_ENTROPY.INTERVAL"),
            Some(field::ANTI_ENTROPY_INTERVAL)
        );
        assert_eq!(env.field_for("INDEXD_DATA_DIR"), Some(field::DATA_DIR));
    }

    #[test]
    fn names_are_case_insensitive_after_the_prefix() {
        let env = EnvOverlay::new();
        assert_eq!(
            env.field_for("INDEXD_cluster.Hosts"),
            Some(field::CLUSTER_HOSTS)
        );
        assert_eq!(env.field_for("indexd_CLUSTER.HOSTS"), None);
    }

    #[test]
    fn rejects_foreign_and_unknown_names() {
        let env = EnvOverlay::new();
        assert_eq!(env.field_for("PATH"), None);
        assert_eq!(env.field_for("INDEXD_"), None);
        assert_eq!(env.field_for("INDEXD_CLUSTER.NOPE"), None);
        // the section separator must be a literal dot
        assert_eq!(env.field_for("INDEXD_CLUSTER_HOSTS"), None);
    }

    #[test]
    fn overlay_keeps_string_values() {
        let env = EnvOverlay::new();
        let tree = env.overlay([
            ("INDEXD_CLUSTER.HOSTS", "h1:1,h2:2"),
            ("INDEXD_CLUSTER.POLL_INTERVAL", "3m2s"),
            ("HOME", "/root"),
        ]);
        assert_eq!(
            tree.get(&field::CLUSTER_HOSTS),
            Some(&Value::String("h1:1,h2:2".into()))
        );
        assert_eq!(
            tree.get(&field::CLUSTER_POLL_INTERVAL),
            Some(&Value::String("3m2s".into()))
        );
        assert_eq!(tree.source(), Source::Environment);
    }

    #[test]
    fn empty_values_are_unset() {
        let env = EnvOverlay::new();
        let tree = env.overlay([("INDEXD_DATA_DIR", ""), ("INDEXD_CONFIG", "/etc/x.toml")]);
        assert!(tree.is_empty());
    }

    #[test]
    fn custom_prefix() {
        let env = EnvOverlay::with_prefix("APP_");
        assert_eq!(env.config_var(), "APP_CONFIG");
        let tree = env.overlay([("APP_BIND", "x:1"), ("INDEXD_BIND", "y:2")]);
        assert_eq!(tree.get(&field::BIND), Some(&Value::String("x:1".into())));
    }
}
