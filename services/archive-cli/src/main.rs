//! Weather archive command line.
//!
//! Resolves logical paths against the archive's per-directory `meta.json`
//! rules and runs the bound operation:
//! - `archive get year/1990/3/14/temp` — read data at a path
//! - `archive build year/1990/3/14/temp` — build derived data at a path
//! - `archive meta year/1990` — show the merged metadata along a path

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dispatch::{Archive, OperationRegistry};

#[derive(Parser, Debug)]
#[command(name = "archive")]
#[command(about = "Metadata-driven weather data archive")]
struct Args {
    /// Archive root directory
    #[arg(long, env = "ARCHIVE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get data at a logical path
    Get { path: String },
    /// Build derived data at a logical path
    Build { path: String },
    /// Show the merged metadata along a path
    Meta { path: String },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = args.log_level.parse().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut registry = OperationRegistry::new();
    weather_grid::ops::register(&mut registry);

    info!(root = %args.root.display(), "opening archive");
    let archive = Archive::new(&args.root, registry);

    let result = match args.command {
        Command::Get { path } => archive.get(&path)?,
        Command::Build { path } => archive.build(&path)?,
        Command::Meta { path } => archive.meta(&path)?.into_value(),
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
