//! cloudxfer CLI - Command-line interface for cloudxfer
//!
//! Provides commands for:
//! - Authenticating against the storage service
//! - Uploading and downloading files and folder trees in parallel
//! - Listing and creating remote folders
//! - Inspecting configuration and account state

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use cloudxfer_core::config::Config;
use cloudxfer_core::domain::{DuplicateMode, Region};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    auth::AuthCommand,
    download::DownloadCommand,
    list::ListCommand,
    mkdir::MkdirCommand,
    status::StatusCommand,
    upload::UploadCommand,
    Context,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "cloudxfer",
    version,
    about = "Parallel file transfers to and from cloud storage"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hide the progress line
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Number of parallel transfers (overrides transfer.workers)
    #[arg(short, long, global = true, env = "CLOUDXFER_WORKERS")]
    workers: Option<usize>,

    /// What to do when the destination already has the file: skip, overwrite, rename
    #[arg(long, global = true)]
    mode: Option<DuplicateMode>,

    /// API region: us or eu (overrides api.region)
    #[arg(long, global = true, env = "CLOUDXFER_REGION")]
    region: Option<Region>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Upload local files or folders
    Upload(UploadCommand),
    /// Download remote files or folders
    Download(DownloadCommand),
    /// List a remote folder
    List(ListCommand),
    /// Create a remote folder
    Mkdir(MkdirCommand),
    /// Show configuration and authentication state
    Status(StatusCommand),
}

impl Cli {
    /// Loads the config file and applies command-line overrides
    fn load_config(&self) -> Result<(Config, PathBuf)> {
        let (mut config, path) = match &self.config {
            Some(path) => (
                Config::load(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?,
                path.clone(),
            ),
            None => {
                let path = Config::default_path();
                (Config::load_or_default(&path), path)
            }
        };

        if let Some(workers) = self.workers {
            config.transfer.workers = workers;
        }
        if let Some(mode) = self.mode {
            config.transfer.duplicate_mode = mode;
        }
        if let Some(region) = self.region {
            config.api.region = region;
        }
        Ok((config, path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = cli.load_config()?;

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = Context {
        format,
        quiet: cli.quiet,
        config,
        config_path,
    };

    match cli.command {
        Commands::Auth(cmd) => cmd.execute(&ctx).await,
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Download(cmd) => cmd.execute(&ctx).await,
        Commands::List(cmd) => cmd.execute(&ctx).await,
        Commands::Mkdir(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
    }
}
