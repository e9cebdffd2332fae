//! Configuration loading from disk, environment, and flags.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::env::{process_vars, EnvOverlay};
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::flags::ConfigFlags;
use crate::config::resolver::{expand_home, resolve};
use crate::config::schema::ResolvedConfig;
use crate::config::tree::{ConfigTree, Source};
use crate::observability::metrics;

/// Parse a TOML config file into the file layer.
///
/// Syntax errors fail here, before any other source is looked at. Keys that
/// name no configuration field are logged and otherwise ignored.
pub fn load_file(path: &Path) -> ConfigResult<ConfigTree> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let table: toml::Table = toml::from_str(&content).map_err(|source| ConfigError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;

    let tree = ConfigTree::from_table(Source::File, table);
    for key in tree.unknown_keys() {
        tracing::warn!(path = %path.display(), key = %key, "Ignoring unknown config key");
    }
    Ok(tree)
}

/// Gathers the configuration sources and resolves them.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .process_env()
///     .flags(&cli_flags)
///     .load()?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env: EnvOverlay,
    vars: Vec<(String, String)>,
    flags: ConfigFlags,
    file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader with built-in defaults and no other sources.
    pub fn new() -> Self {
        Self {
            env: EnvOverlay::new(),
            vars: Vec::new(),
            flags: ConfigFlags::default(),
            file: None,
        }
    }

    /// Read the environment layer from the current process.
    pub fn process_env(mut self) -> Self {
        self.vars = process_vars();
        self
    }

    /// Read the environment layer from explicit `(name, value)` pairs.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Use parsed command-line flags as the top layer.
    pub fn flags(mut self, flags: &ConfigFlags) -> Self {
        self.flags = flags.clone();
        self
    }

    /// Load this config file. Takes precedence over `--config` and
    /// `INDEXD_CONFIG`.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// The config file that [`load`](Self::load) will read, if any.
    ///
    /// Explicit [`file`](Self::file), then `--config`, then `INDEXD_CONFIG`.
    /// A leading `~` is expanded whichever source named the file.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.file.as_ref().or(self.flags.config.as_ref()) {
            return Some(match path.to_str() {
                Some(raw) => expand_home(raw),
                None => path.clone(),
            });
        }
        let var = self.env.config_var();
        self.vars
            .iter()
            .find(|(name, value)| *name == var && !value.is_empty())
            .map(|(_, value)| expand_home(value))
    }

    /// Load every source and resolve the final configuration.
    pub fn load(self) -> ConfigResult<ResolvedConfig> {
        let result = self.load_inner();
        metrics::record_resolution(result.is_ok());
        result
    }

    fn load_inner(self) -> ConfigResult<ResolvedConfig> {
        let config_path = self.config_path();
        let file = match &config_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading configuration file");
                load_file(path)?
            }
            None => {
                tracing::debug!("No configuration file given");
                ConfigTree::new(Source::File)
            }
        };
        let env = self
            .env
            .overlay(self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let flags = self.flags.overlay();

        let config = resolve(ResolvedConfig::default(), &file, &env, &flags)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            bind = %config.bind,
            hosts = ?config.cluster.nodes,
            replicas = config.cluster.replica_count,
            "Configuration resolved"
        );
        Ok(config)
    }
}
