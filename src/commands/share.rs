//! Public share commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudfm_core::error::AppError;
use cloudfm_entity::{Entry, StarState};

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for `star`
#[derive(Debug, Args)]
pub struct StarArgs {
    /// File path relative to the owner root
    pub path: String,
}

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct SharesArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: SharesCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum SharesCommand {
    /// List the owner's active shares
    List,
    /// List every active share across owners
    Public,
    /// Remove every expired share now
    Sweep,
}

/// Share display row
#[derive(Debug, Serialize, Tabled)]
struct ShareRow {
    /// Name
    name: String,
    /// Owner
    owner: String,
    /// Shared at
    shared: String,
    /// Expires at
    expires: String,
    /// Public URL
    url: String,
}

/// Execute `star`
pub async fn star(args: &StarArgs, app: &App) -> Result<(), AppError> {
    let Entry::File(file) = app.resolve_entry(&args.path).await? else {
        return Err(AppError::validation("Only files can be made public"));
    };
    match app.services.shares.toggle_star(&app.ctx, &file).await? {
        StarState::Starred { expires_at } => {
            output::print_success(&format!("'{}' is public", file.name()));
            output::print_kv("Expires", &output::format_millis(expires_at));
        }
        StarState::Unstarred => {
            output::print_success(&format!("'{}' is private again", file.name()))
        }
    }
    app.refresh().await
}

/// Execute share commands
pub async fn execute(args: &SharesArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let shares = &app.services.shares;
    match &args.command {
        SharesCommand::List => {
            let rows: Vec<ShareRow> = shares
                .list_active(&app.ctx)
                .await?
                .into_iter()
                .map(|s| ShareRow {
                    url: app.services.shares.public_url(&s),
                    name: s.name,
                    owner: s.usr,
                    shared: output::format_millis(s.created_at),
                    expires: output::format_millis(s.expires_at),
                })
                .collect();
            output::print_list(&rows, format);
        }
        SharesCommand::Public => {
            let rows: Vec<ShareRow> = shares
                .list_public()
                .await?
                .into_iter()
                .map(|listing| ShareRow {
                    name: listing.share.name,
                    owner: listing.share.usr,
                    shared: output::format_millis(listing.share.created_at),
                    expires: output::format_millis(listing.share.expires_at),
                    url: listing.url,
                })
                .collect();
            output::print_list(&rows, format);
        }
        SharesCommand::Sweep => {
            let purged = shares.purge_expired().await?;
            output::print_success(&format!("{} expired share(s) removed", purged));
        }
    }
    Ok(())
}
