//! List command - Shows the contents of one remote folder

use anyhow::{Context as _, Result};
use clap::Args;
use cloudxfer_core::domain::{format_size, RemoteEntry, RemotePath};
use cloudxfer_core::ports::IRemoteStorage;

use super::Context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Remote folder
    #[arg(default_value = "/")]
    pub path: RemotePath,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        let client = ctx.authenticated_client()?;

        let mut entries = client
            .list_folder(&self.path)
            .await
            .with_context(|| format!("Failed to list {}", self.path))?;
        sort_entries(&mut entries);

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::json!({
                "path": self.path.to_string(),
                "entries": entries,
            }));
            return Ok(());
        }

        if entries.is_empty() {
            fmt.info(&format!("{} is empty", self.path));
            return Ok(());
        }
        for entry in &entries {
            println!("{}", entry_line(entry));
        }
        Ok(())
    }
}

/// Folders first, then files, each alphabetically
fn sort_entries(entries: &mut [RemoteEntry]) {
    entries.sort_by(|a, b| b.is_folder.cmp(&a.is_folder).then_with(|| a.name.cmp(&b.name)));
}

fn entry_line(entry: &RemoteEntry) -> String {
    let modified = entry
        .modified
        .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    if entry.is_folder {
        format!("{:>12}  {:16}  {}/", "-", modified, entry.name)
    } else {
        format!("{:>12}  {:16}  {}", format_size(entry.size), modified, entry.name)
    }
}
