#![allow(clippy::multiple_crate_versions)]

//! Frost - blurred wallpaper backdrop daemon.
//!
//! Keeps a blurred copy of the current wallpaper positioned behind a
//! floating panel and adapts a scrim overlay to the wallpaper's
//! brightness. The panel process connects over a Unix socket in the
//! cache directory.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "frost", version, about)]
struct Cli {
    /// Path to a configuration file, overriding the default search paths.
    /// Supports `~` expansion.
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Force a full backdrop regeneration on startup.
    #[arg(long)]
    force: bool,

    /// Log filter, in tracing env-filter syntax.
    #[arg(long, env = "FROST_LOG", default_value = "info")]
    log: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = frost_lib::RunOptions {
        config_path: cli.config.as_deref().map(frost_lib::platform::path::expand),
        force: cli.force,
    };

    match frost_lib::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            eprintln!("frost: {err}");
            ExitCode::FAILURE
        }
    }
}
