//! Recycle bin commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use dialoguer::Confirm;
use serde::Serialize;
use tabled::Tabled;

use cloudfm_core::error::AppError;
use cloudfm_entity::BinItem;

use super::App;
use super::entry::write_collected;
use crate::output::{self, OutputFormat};

/// Arguments for bin commands
#[derive(Debug, Args)]
pub struct BinArgs {
    /// Bin subcommand
    #[command(subcommand)]
    pub command: BinCommand,
}

/// Bin subcommands
#[derive(Debug, Subcommand)]
pub enum BinCommand {
    /// Show the collapsed bin view
    List,
    /// Permanently delete a bin item
    Purge {
        /// Item number from `bin list`
        index: usize,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Copy a bin item out to the local filesystem
    Download {
        /// Item number from `bin list`
        index: usize,
        /// Local directory to write into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

/// Bin display row
#[derive(Debug, Serialize, Tabled)]
struct BinRow {
    /// Item number
    #[tabled(rename = "#")]
    index: usize,
    /// Kind
    kind: &'static str,
    /// Name
    name: String,
}

/// Execute bin commands
pub async fn execute(args: &BinArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let items = app
        .services
        .resolver
        .resolve_bin(&app.ctx.owner_id)
        .await?;

    match &args.command {
        BinCommand::List => {
            let rows: Vec<BinRow> = items
                .iter()
                .enumerate()
                .map(|(i, item)| BinRow {
                    index: i + 1,
                    kind: if item.is_folder() { "dir" } else { "file" },
                    name: item.name.clone(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        BinCommand::Purge { index, yes } => {
            let item = pick(&items, *index)?;
            if !*yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Permanently delete '{}'?", item.name))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Prompt failed: {}", e)))?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let report = app.services.bin.purge(&app.ctx, item).await?;
            output::print_success(&report.message());
        }
        BinCommand::Download { index, out } => {
            let item = pick(&items, *index)?;
            let files = app.services.bin.download(&app.ctx, item).await?;
            let written = write_collected(out, &files).await?;
            output::print_success(&format!("{} file(s) written to {}", written, out.display()));
        }
    }
    Ok(())
}

fn pick(items: &[BinItem], index: usize) -> Result<&BinItem, AppError> {
    index
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| AppError::not_found(format!("No bin item #{}", index)))
}
