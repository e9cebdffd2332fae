//! Command-line interface.
//!
//! ```text
//! indexd server [flags]                       run until Ctrl-C / SIGTERM
//! indexd config [flags] [--format toml|json]  print the resolved configuration
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ConfigFlags, ResolvedConfig};
use crate::error::Error;

#[derive(Debug, Parser)]
#[command(name = "indexd")]
#[command(about = "Distributed bitmap index server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the server
    Server(ServerArgs),
    /// Print the resolved configuration and exit
    Config(ConfigArgs),
}

impl Command {
    /// Configuration flags, whichever subcommand was given.
    pub fn flags(&self) -> &ConfigFlags {
        match self {
            Command::Server(args) => &args.flags,
            Command::Config(args) => &args.flags,
        }
    }
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[command(flatten)]
    pub flags: ConfigFlags,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub flags: ConfigFlags,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Toml,
    Json,
}

impl OutputFormat {
    /// Render a configuration in this format.
    ///
    /// TOML output is itself a valid config file.
    pub fn render(self, config: &ResolvedConfig) -> Result<String, Error> {
        match self {
            OutputFormat::Toml => {
                toml::to_string(config).map_err(|e| Error::Render(e.to_string()))
            }
            OutputFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| Error::Render(e.to_string()))
            }
        }
    }
}
