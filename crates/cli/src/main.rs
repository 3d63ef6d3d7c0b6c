//! Thinner - packfile and scene file tool
//!
//! Logging follows `RUST_LOG` when set, otherwise the `log_level` option of
//! the configuration file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thinner_cli::pak::{self, PakCommand};
use thinner_cli::scene::{self, SceneCommand};
use thinner_config::ToolConfig;
use thinner_core::Endian;
use tracing_subscriber::EnvFilter;

/// Thinner - packfile and scene file tool
#[derive(Parser)]
#[command(name = "thinner")]
#[command(about = "Inspect, extract and rebuild packfiles and scene files")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./thinner.cfg when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Byte order for written files, overriding the configuration
    #[arg(long, global = true)]
    endian: Option<Endian>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Packfile commands
    #[command(subcommand)]
    Pak(PakCommand),

    /// Scene file commands
    #[command(subcommand)]
    Scene(SceneCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ToolConfig::load_or_default(cli.config.as_deref())?;
    if let Some(endian) = cli.endian {
        config.endian = endian;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    config.display();

    match cli.command {
        Commands::Pak(cmd) => pak::execute(cmd, &config),
        Commands::Scene(cmd) => scene::execute(cmd, &config),
    }
}
