//! Mkdir command - Creates a remote folder (parents included)

use anyhow::{Context as _, Result};
use clap::Args;
use cloudxfer_core::domain::RemotePath;
use cloudxfer_core::ports::IRemoteStorage;
use tracing::debug;

use super::Context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct MkdirCommand {
    /// Remote folder to create
    pub path: RemotePath,
}

impl MkdirCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        let client = ctx.authenticated_client()?;

        let mut folder_id = None;
        for folder in self.path.ancestors().iter().chain(std::iter::once(&self.path)) {
            debug!(folder = %folder, "Creating remote folder");
            folder_id = Some(
                client
                    .create_folder(folder)
                    .await
                    .with_context(|| format!("Failed to create {folder}"))?,
            );
        }

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::json!({
                "path": self.path.to_string(),
                "folder_id": folder_id,
            }));
        } else {
            fmt.success(&format!("Created {}", self.path));
        }
        Ok(())
    }
}
