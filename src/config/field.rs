//! Registry of configurable fields.
//!
//! Every leaf of [`ResolvedConfig`](super::ResolvedConfig) has exactly one
//! [`Field`] entry. Its dotted path (`cluster.poll-interval`) is the name used
//! by the config file, the command-line flag, and (uppercased) the
//! environment variable.

use std::fmt;

/// Address of one configuration leaf: an optional section and a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub section: Option<&'static str>,
    pub key: &'static str,
}

impl Field {
    const fn top(key: &'static str) -> Self {
        Self { section: None, key }
    }

    const fn nested(section: &'static str, key: &'static str) -> Self {
        Self {
            section: Some(section),
            key,
        }
    }

    /// Dotted path, e.g. `cluster.hosts`.
    pub fn path(&self) -> String {
        match self.section {
            Some(section) => format!("{}.{}", section, self.key),
            None => self.key.to_string(),
        }
    }

    /// Environment variable carrying this field, e.g.
    /// `INDEXD_CLUSTER.POLL_INTERVAL` for prefix `INDEXD_`.
    pub fn env_var(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.path().to_uppercase().replace('-', "_"))
    }

    /// Find the registered field for a section/key pair.
    pub fn lookup(section: Option<&str>, key: &str) -> Option<Field> {
        ALL.iter()
            .copied()
            .find(|f| f.section == section && f.key == key)
    }

    /// Whether any registered field lives in `section`.
    pub fn is_section(section: &str) -> bool {
        ALL.iter().any(|f| f.section == Some(section))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "{}.{}", section, self.key),
            None => f.write_str(self.key),
        }
    }
}

pub const DATA_DIR: Field = Field::top("data-dir");
pub const BIND: Field = Field::top("bind");
pub const LOG_LEVEL: Field = Field::top("log-level");
pub const MAX_WRITES_PER_REQUEST: Field = Field::top("max-writes-per-request");

pub const CLUSTER_HOSTS: Field = Field::nested("cluster", "hosts");
pub const CLUSTER_REPLICAS: Field = Field::nested("cluster", "replicas");
pub const CLUSTER_POLL_INTERVAL: Field = Field::nested("cluster", "poll-interval");
pub const CLUSTER_LONG_QUERY_TIME: Field = Field::nested("cluster", "long-query-time");

pub const ANTI_ENTROPY_INTERVAL: Field = Field::nested("anti-entropy", "interval");

pub const PROFILE_CPU: Field = Field::nested("profile", "cpu");
pub const PROFILE_CPU_TIME: Field = Field::nested("profile", "cpu-time");

pub const PLUGINS_PATH: Field = Field::nested("plugins", "path");

/// Every registered field.
pub const ALL: &[Field] = &[
    DATA_DIR,
    BIND,
    LOG_LEVEL,
    MAX_WRITES_PER_REQUEST,
    CLUSTER_HOSTS,
    CLUSTER_REPLICAS,
    CLUSTER_POLL_INTERVAL,
    CLUSTER_LONG_QUERY_TIME,
    ANTI_ENTROPY_INTERVAL,
    PROFILE_CPU,
    PROFILE_CPU_TIME,
    PLUGINS_PATH,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_names() {
        assert_eq!(
            CLUSTER_POLL_INTERVAL.env_var("INDEXD_"),
            "INDEXD_CLUSTER.POLL_INTERVAL"
        );
        assert_eq!(DATA_DIR.env_var("INDEXD_"), "INDEXD_DATA_DIR");
        assert_eq!(
            ANTI_ENTROPY_INTERVAL.env_var("INDEXD_"),
            "INDEXD_ANTI_ENTROPY.INTERVAL"
        );
    }

    #[test]
    fn lookup_matches_section_and_key() {
        assert_eq!(Field::lookup(Some("cluster"), "hosts"), Some(CLUSTER_HOSTS));
        assert_eq!(Field::lookup(None, "bind"), Some(BIND));
        assert_eq!(Field::lookup(None, "hosts"), None);
        assert_eq!(Field::lookup(Some("cluster"), "bind"), None);
    }

    #[test]
    fn paths_are_unique() {
        let mut paths: Vec<String> = ALL.iter().map(Field::path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), ALL.len());
    }

    #[test]
    fn display_matches_path() {
        assert_eq!(PROFILE_CPU_TIME.to_string(), "profile.cpu-time");
        assert!(Field::is_section("anti-entropy"));
        assert!(!Field::is_section("metrics"));
    }
}
