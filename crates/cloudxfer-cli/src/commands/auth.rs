//! Auth commands - Login, Logout, and Status
//!
//! - `login`  exchanges username and password for a session token and stores
//!   it in the system keyring (or the fallback token file).
//! - `logout` removes the stored token.
//! - `status` reports whether a token is stored and, if so, the account it
//!   belongs to.

use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};
use clap::Subcommand;
use cloudxfer_core::domain::{format_size, RemoteError};
use cloudxfer_core::ports::{IRemoteStorage, ITokenStore};
use tracing::info;

use super::Context;
use crate::output::{OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in with username and password
    Login {
        /// Account e-mail
        #[arg(long, env = "CLOUDXFER_USERNAME")]
        username: Option<String>,
        /// Account password (prompted for when absent)
        #[arg(long, env = "CLOUDXFER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let fmt = ctx.formatter();
        match self {
            AuthCommand::Login { username, password } => {
                self.execute_login(ctx, username.as_deref(), password.as_deref(), &*fmt)
                    .await
            }
            AuthCommand::Logout => self.execute_logout(ctx, &*fmt),
            AuthCommand::Status => self.execute_status(ctx, &*fmt).await,
        }
    }

    async fn execute_login(
        &self,
        ctx: &Context,
        username: Option<&str>,
        password: Option<&str>,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let username = match username {
            Some(u) => u.to_string(),
            None => prompt("Username: ")?,
        };
        let password = match password {
            Some(p) => p.to_string(),
            None => prompt("Password: ")?,
        };

        info!(username = %username, region = %ctx.config.api.region, "Logging in");
        let mut client = ctx.anonymous_client()?;
        let token = client
            .login(&username, &password)
            .await
            .context("Login failed")?;

        ctx.token_store()
            .save_token(&token)
            .context("Failed to store credentials")?;
        client.set_token(token);

        let account = client
            .account_info()
            .await
            .context("Failed to retrieve account information")?;

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::json!({
                "authenticated": true,
                "email": account.email,
                "region": ctx.config.api.region.as_str(),
            }));
        } else {
            fmt.success(&format!("Authenticated as {}", account.email));
        }
        Ok(())
    }

    fn execute_logout(&self, ctx: &Context, fmt: &dyn OutputFormatter) -> Result<()> {
        ctx.token_store()
            .clear_token()
            .context("Failed to remove stored credentials")?;
        info!(region = %ctx.config.api.region, "Logged out");

        if ctx.format == OutputFormat::Json {
            fmt.print_json(&serde_json::json!({ "authenticated": false }));
        } else {
            fmt.success("Logged out");
        }
        Ok(())
    }

    async fn execute_status(&self, ctx: &Context, fmt: &dyn OutputFormatter) -> Result<()> {
        let client = match ctx.authenticated_client() {
            Ok(client) => client,
            Err(e) => {
                if ctx.format == OutputFormat::Json {
                    fmt.print_json(&serde_json::json!({
                        "authenticated": false,
                        "reason": e.to_string(),
                    }));
                } else {
                    fmt.warn(&e.to_string());
                }
                return Ok(());
            }
        };

        match client.account_info().await {
            Ok(account) => {
                if ctx.format == OutputFormat::Json {
                    fmt.print_json(&serde_json::json!({
                        "authenticated": true,
                        "email": account.email,
                        "quota": account.quota,
                        "used_quota": account.used_quota,
                        "premium": account.premium,
                    }));
                } else {
                    fmt.success(&format!("Authenticated as {}", account.email));
                    fmt.info(&format!(
                        "Storage: {} of {} used ({:.1}%), {} free",
                        format_size(account.used_quota),
                        format_size(account.quota),
                        account.usage_percent(),
                        format_size(account.available())
                    ));
                    if account.premium {
                        fmt.info("Plan: premium");
                    }
                }
                Ok(())
            }
            Err(RemoteError::Unauthorized(reason)) => {
                if ctx.format == OutputFormat::Json {
                    fmt.print_json(&serde_json::json!({
                        "authenticated": false,
                        "reason": reason,
                    }));
                } else {
                    fmt.warn("Stored session is no longer valid. Run 'cloudxfer auth login'.");
                }
                Ok(())
            }
            Err(e) => Err(e).context("Failed to retrieve account information"),
        }
    }
}

/// Reads one line from stdin after printing `label` to stderr
fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        anyhow::bail!("{} must not be empty", label.trim_end_matches([':', ' ']));
    }
    Ok(value)
}
