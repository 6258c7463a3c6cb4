//! Upload command
//!
//! Plain files go straight to the destination folder. With `--recursive`,
//! directories are planned as trees: remote folders are created first and
//! every file becomes one batch item.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use cloudxfer_core::domain::{RemotePath, TransferItem};
use cloudxfer_engine::plan_upload_tree;
use tracing::info;

use super::{finish_batch, Context};
use crate::output::print_report;

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local files (or folders with --recursive)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Remote destination folder
    #[arg(short, long, default_value = "/")]
    pub to: RemotePath,

    /// Upload folders with their contents
    #[arg(short, long)]
    pub recursive: bool,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        let orchestrator = ctx.orchestrator()?;

        let report = if self.recursive {
            let storage = ctx.authenticated_client()?;
            let concurrency = orchestrator.config().workers;
            let mut items = Vec::new();
            for path in &self.paths {
                if path.is_dir() {
                    fmt.info(&format!("Scanning {}...", path.display()));
                    let planned = plan_upload_tree(&storage, path, &self.to, concurrency)
                        .await
                        .with_context(|| format!("Failed to plan upload of {}", path.display()))?;
                    items.extend(planned);
                } else {
                    items.push(
                        TransferItem::upload(path.clone(), &self.to)
                            .with_context(|| format!("Cannot upload {}", path.display()))?,
                    );
                }
            }
            info!(files = items.len(), destination = %self.to, "Uploading tree");
            orchestrator.run_batch(items).await
        } else {
            info!(files = self.paths.len(), destination = %self.to, "Uploading files");
            orchestrator.upload_files(&self.paths, &self.to).await
        };

        print_report(&*fmt, ctx.format, "Uploaded", &report);
        finish_batch(&report)
    }
}
