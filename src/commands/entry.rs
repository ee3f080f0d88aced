//! Create, rename, move, delete and download commands.

use std::path::{Path, PathBuf};

use clap::Args;
use dialoguer::Confirm;

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_entity::Entry;
use cloudfm_service::{CollectedFile, OperationReport};

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// New folder path relative to the owner root
    pub path: String,
}

/// Arguments for `note`
#[derive(Debug, Args)]
pub struct NoteArgs {
    /// Directory to create the note in
    #[arg(default_value = "")]
    pub directory: String,

    /// Note name (a free `fileN` name is picked when omitted)
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Note text
    #[arg(short, long, conflicts_with = "from")]
    pub text: Option<String>,

    /// Read the note text from a local file
    #[arg(long)]
    pub from: Option<PathBuf>,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Entry path relative to the owner root
    pub path: String,
    /// New name
    pub new_name: String,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MvArgs {
    /// Entry path relative to the owner root
    pub path: String,
    /// Destination directory ("" for the root)
    pub destination: String,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// Entry path relative to the owner root
    pub path: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `download`
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Entry path relative to the owner root
    pub path: String,
    /// Local directory to write into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,
}

/// Execute `mkdir`
pub async fn mkdir(args: &MkdirArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let target = args.path.trim_matches('/');
    let folder = app
        .services
        .folders
        .create_folder(&app.ctx, &path::parent_of(target), path::name_of(target))
        .await?;
    app.refresh().await?;
    match format {
        OutputFormat::Json => output::print_item(&folder, format),
        OutputFormat::Table => {
            output::print_success(&format!("Folder '/{}' created", folder.relative_path()))
        }
    }
    Ok(())
}

/// Execute `note`
pub async fn note(args: &NoteArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let text = match (&args.text, &args.from) {
        (Some(text), _) => text.clone(),
        (None, Some(file)) => tokio::fs::read_to_string(file).await?,
        (None, None) => String::new(),
    };
    let file = app
        .services
        .files
        .create_note(&app.ctx, &args.directory, &args.name, &text)
        .await?;
    app.refresh().await?;
    match format {
        OutputFormat::Json => output::print_item(&file, format),
        OutputFormat::Table => output::print_success(&format!("Note '{}' saved", file.name())),
    }
    Ok(())
}

/// Execute `rename`
pub async fn rename(args: &RenameArgs, app: &App) -> Result<(), AppError> {
    let entry = app.resolve_entry(&args.path).await?;
    let report = app
        .with_progress(|progress| async move {
            match &entry {
                Entry::File(file) => {
                    app.services
                        .files
                        .rename_file(&app.ctx, file, &args.new_name, &progress)
                        .await
                }
                Entry::Folder(folder) => {
                    app.services
                        .folders
                        .rename_folder(&app.ctx, folder, &args.new_name, &progress)
                        .await
                }
            }
        })
        .await?;
    finish(app, &report).await
}

/// Execute `mv`
pub async fn mv(args: &MvArgs, app: &App) -> Result<(), AppError> {
    let entry = app.resolve_entry(&args.path).await?;
    let destination = args.destination.trim_matches('/');
    let report = app
        .with_progress(|progress| async move {
            match &entry {
                Entry::File(file) => {
                    app.services
                        .files
                        .move_file(&app.ctx, file, destination, &progress)
                        .await
                }
                Entry::Folder(folder) => {
                    app.services
                        .folders
                        .move_folder(&app.ctx, folder, destination, &progress)
                        .await
                }
            }
        })
        .await?;
    finish(app, &report).await
}

/// Execute `rm`
pub async fn rm(args: &RmArgs, app: &App) -> Result<(), AppError> {
    let entry = app.resolve_entry(&args.path).await?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '/{}'?", args.path.trim_matches('/')))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Prompt failed: {}", e)))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = app
        .with_progress(|progress| async move {
            match &entry {
                Entry::File(file) => app.services.files.delete_file(&app.ctx, file, &progress).await,
                Entry::Folder(folder) => {
                    app.services
                        .folders
                        .delete_folder(&app.ctx, folder, &progress)
                        .await
                }
            }
        })
        .await?;
    finish(app, &report).await
}

/// Execute `download`
pub async fn download(args: &DownloadArgs, app: &App) -> Result<(), AppError> {
    let collected = match app.resolve_entry(&args.path).await? {
        Entry::File(file) => {
            let data = app.services.files.read_bytes(&app.ctx, &file).await?;
            vec![CollectedFile {
                relative_path: file.name().to_string(),
                data,
            }]
        }
        Entry::Folder(folder) => {
            app.with_progress(|progress| async move {
                app.services
                    .folders
                    .collect_files(&app.ctx, &folder, &progress)
                    .await
            })
            .await?
        }
    };
    let written = write_collected(&args.out, &collected).await?;
    output::print_success(&format!(
        "{} file(s) written to {}",
        written,
        args.out.display()
    ));
    Ok(())
}

/// Write collected files beneath `out`, creating directories as needed
pub async fn write_collected(out: &Path, files: &[CollectedFile]) -> Result<usize, AppError> {
    for file in files {
        let target = out.join(&file.relative_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &file.data).await?;
    }
    Ok(files.len())
}

async fn finish(app: &App, report: &OperationReport) -> Result<(), AppError> {
    app.refresh().await?;
    if report.failed > 0 {
        output::print_warning(&report.message());
    } else {
        output::print_success(&report.message());
    }
    Ok(())
}
