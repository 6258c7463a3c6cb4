//! CLI subcommands and the wiring they share

pub mod auth;
pub mod download;
pub mod list;
pub mod mkdir;
pub mod status;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use cloudxfer_api::{ApiClient, KeyringTokenStore, TransportSettings};
use cloudxfer_core::config::Config;
use cloudxfer_core::ports::{IRemoteStorage, ITokenStore};
use cloudxfer_engine::{BatchReport, ParallelTransferOrchestrator};

use crate::output::{get_formatter, progress_printer, OutputFormat, OutputFormatter};

/// Everything a command needs from the command line and config file
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config: Config,
    pub config_path: PathBuf,
}

impl Context {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format == OutputFormat::Json)
    }

    pub fn token_store(&self) -> KeyringTokenStore {
        KeyringTokenStore::new(self.config.api.region, &self.config.auth.token_cache_file)
    }

    /// API client without a session, for login
    pub fn anonymous_client(&self) -> Result<ApiClient> {
        ApiClient::new(
            self.config.api.region,
            None,
            TransportSettings::from_config(&self.config),
        )
        .context("Failed to create HTTP client")
    }

    /// API client carrying the stored session token
    pub fn authenticated_client(&self) -> Result<ApiClient> {
        let token = self
            .token_store()
            .load_token()
            .context("Failed to read stored credentials")?
            .context("Not logged in. Run 'cloudxfer auth login' first.")?;
        ApiClient::new(
            self.config.api.region,
            Some(token),
            TransportSettings::from_config(&self.config),
        )
        .context("Failed to create HTTP client")
    }

    /// Orchestrator over the authenticated client, with progress display
    pub fn orchestrator(&self) -> Result<ParallelTransferOrchestrator> {
        let storage: Arc<dyn IRemoteStorage> = Arc::new(self.authenticated_client()?);
        let orchestrator =
            ParallelTransferOrchestrator::new(storage, self.config.transfer_config());
        Ok(match progress_printer(self.format, self.quiet) {
            Some(callback) => orchestrator.with_progress(callback),
            None => orchestrator,
        })
    }
}

/// Turns a batch with failures into a non-zero exit
pub fn finish_batch(report: &BatchReport) -> Result<()> {
    if report.summary.has_failures() {
        anyhow::bail!(
            "{} of {} transfers failed",
            report.summary.failed,
            report.summary.total()
        );
    }
    Ok(())
}
