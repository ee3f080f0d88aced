//! Directory listing and file preview commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use cloudfm_core::error::AppError;
use cloudfm_entity::Entry;
use cloudfm_service::Preview;

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Directory relative to the owner root
    #[arg(default_value = "")]
    pub directory: String,
}

/// Arguments for `cat`
#[derive(Debug, Args)]
pub struct CatArgs {
    /// File path relative to the owner root
    pub path: String,
}

/// Listing display row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Kind
    kind: &'static str,
    /// Name
    name: String,
    /// Created at
    created: String,
    /// Flags
    flags: String,
}

/// Execute `ls`
pub async fn ls(args: &LsArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let listing = app
        .state
        .navigate(&app.services.reconciler, &app.ctx, &args.directory)
        .await?;

    let rows: Vec<EntryRow> = listing
        .folders
        .iter()
        .map(|f| EntryRow {
            kind: "dir",
            name: format!("{}/", f.name()),
            created: String::new(),
            flags: String::new(),
        })
        .chain(listing.files.iter().map(|f| {
            let mut flags = Vec::new();
            if f.starred {
                flags.push("public");
            }
            if f.is_clipboard {
                flags.push("note");
            }
            EntryRow {
                kind: "file",
                name: f.name().to_string(),
                created: output::format_millis(f.base.created_at),
                flags: flags.join(","),
            }
        }))
        .collect();

    if format == OutputFormat::Table {
        println!("/{}", listing.directory);
    }
    output::print_list(&rows, format);
    Ok(())
}

/// Execute `cat`
pub async fn cat(args: &CatArgs, app: &App) -> Result<(), AppError> {
    let Entry::File(file) = app.resolve_entry(&args.path).await? else {
        return Err(AppError::validation(format!("'{}' is a folder", args.path)));
    };

    match app.services.files.preview(&app.ctx, &file).await? {
        Preview::Text(text) => print!("{}", text),
        Preview::Url(url) => output::print_kv("Preview URL", &url),
        Preview::Unsupported => {
            output::print_warning(&format!("No preview available for '{}'", file.name()))
        }
    }
    Ok(())
}
