//! Status command - Effective configuration and stored credentials
//!
//! Works offline: nothing here talks to the service. Use `auth status` to
//! check the session against the server.

use anyhow::Result;
use clap::Args;
use cloudxfer_core::ports::ITokenStore;

use super::Context;
use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        let config = &ctx.config;
        let transfer = config.transfer_config();
        let logged_in = matches!(ctx.token_store().load_token(), Ok(Some(_)));
        let config_exists = ctx.config_path.exists();

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "config_file_exists": config_exists,
                "config": config,
                "logged_in": logged_in,
            }));
            return Ok(());
        }

        if config_exists {
            fmt.success(&format!("Config: {}", ctx.config_path.display()));
        } else {
            fmt.info(&format!(
                "Config: {} (not found, using defaults)",
                ctx.config_path.display()
            ));
        }
        fmt.info(&format!("Region:          {} ({})", config.api.region, config.api.region.endpoint()));
        fmt.info(&format!("Workers:         {}", transfer.workers));
        fmt.info(&format!("Duplicate mode:  {}", transfer.duplicate_mode));
        fmt.info(&format!("Chunk size:      {} bytes", transfer.chunk_size));
        fmt.info(&format!(
            "Timeouts:        metadata {}s, transfer {}s, connect {}s",
            config.api.metadata_timeout_secs,
            config.api.transfer_timeout_secs,
            config.api.connect_timeout_secs
        ));
        fmt.info(&format!(
            "Retries:         {} attempts, base delay {}ms, max delay {}ms",
            config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
        ));
        if logged_in {
            fmt.success("Credentials stored");
        } else {
            fmt.warn("Not logged in. Run 'cloudxfer auth login'.");
        }
        Ok(())
    }
}
