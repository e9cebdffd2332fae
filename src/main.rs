//! indexd server binary.
//!
//! # Startup Sequence
//!
//! ```text
//! parse CLI ─▶ resolve config ─▶ init logging ─▶ ServerProcess::run_until(signal)
//!              (defaults < file < INDEXD_* < flags)
//! ```
//!
//! Configuration errors are reported before any server resource is touched.

use clap::Parser;

use indexd::cli::{Cli, Command};
use indexd::config::ConfigLoader;
use indexd::error::Result;
use indexd::lifecycle::{signals, ServerProcess};
use indexd::observability::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .process_env()
        .flags(cli.command.flags())
        .load()?;

    match cli.command {
        Command::Config(args) => {
            print!("{}", args.format.render(&config)?);
        }
        Command::Server(_) => {
            logging::init(&config.log_level)?;
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "indexd starting");

            let server = ServerProcess::new(config);
            tracing::info!(run_id = %server.id(), "Server process created");
            server.run_until(signals::shutdown_signal()).await?;

            tracing::info!("Shutdown complete");
        }
    }
    Ok(())
}
