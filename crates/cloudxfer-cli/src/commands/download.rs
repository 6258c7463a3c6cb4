//! Download command
//!
//! Each remote file lands in the destination directory under its own name.
//! With `--recursive` the arguments are remote folders, mirrored locally as
//! `<destination>/<folder name>/...`.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use cloudxfer_core::domain::RemotePath;
use cloudxfer_engine::plan_download_tree;
use tracing::info;

use super::{finish_batch, Context};
use crate::output::print_report;

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Remote files (or folders with --recursive)
    #[arg(required = true)]
    pub paths: Vec<RemotePath>,

    /// Local destination directory
    #[arg(short, long, default_value = ".")]
    pub to: PathBuf,

    /// Download folders with their contents
    #[arg(short, long)]
    pub recursive: bool,
}

impl DownloadCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        let orchestrator = ctx.orchestrator()?;

        let report = if self.recursive {
            let storage = ctx.authenticated_client()?;
            let mut items = Vec::new();
            for folder in &self.paths {
                fmt.info(&format!("Scanning {folder}..."));
                let planned = plan_download_tree(&storage, folder, &self.to)
                    .await
                    .with_context(|| format!("Failed to plan download of {folder}"))?;
                items.extend(planned);
            }
            info!(files = items.len(), destination = %self.to.display(), "Downloading tree");
            orchestrator.run_batch(items).await
        } else {
            let pairs = self
                .paths
                .iter()
                .map(|remote| {
                    let name = remote.file_name().unwrap_or("download");
                    (remote.clone(), self.to.join(name))
                })
                .collect::<Vec<_>>();
            info!(files = pairs.len(), destination = %self.to.display(), "Downloading files");
            orchestrator.download_files(pairs).await
        };

        print_report(&*fmt, ctx.format, "Downloaded", &report);
        finish_batch(&report)
    }
}
