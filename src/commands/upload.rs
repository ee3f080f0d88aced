//! File and folder upload command.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use clap::Args;

use cloudfm_core::error::AppError;
use cloudfm_service::{UploadFile, UploadNode, UploadReport};

use super::App;
use crate::output;

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local files or folders to upload
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Target directory relative to the owner root
    #[arg(short, long, default_value = "")]
    pub directory: String,
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, app: &App) -> Result<(), AppError> {
    let mut nodes = Vec::with_capacity(args.sources.len());
    for source in &args.sources {
        if !tokio::fs::try_exists(source).await? {
            return Err(AppError::not_found(format!(
                "File not found: {}",
                source.display()
            )));
        }
        nodes.push(read_node(source.clone()).await?);
    }

    let flat: Option<Vec<UploadFile>> = nodes
        .iter()
        .map(|node| match node {
            UploadNode::File(file) => Some(file.clone()),
            UploadNode::Directory { .. } => None,
        })
        .collect();

    let uploads = &app.services.uploads;
    let directory = args.directory.as_str();
    let report: UploadReport = match flat {
        Some(files) => {
            app.with_progress(|progress| async move {
                uploads
                    .upload_files(&app.ctx, directory, &files, &progress)
                    .await
            })
            .await?
        }
        None => {
            let nodes = &nodes;
            app.with_progress(|progress| async move {
                uploads
                    .upload_tree(&app.ctx, directory, nodes, &progress)
                    .await
            })
            .await?
        }
    };

    app.state
        .navigate(&app.services.reconciler, &app.ctx, directory)
        .await?;
    output::print_success(&report.message());
    if report.folders_created > 0 {
        output::print_kv("Folders created", &report.folders_created.to_string());
    }
    Ok(())
}

/// Read a local file or directory tree into memory
fn read_node(source: PathBuf) -> Pin<Box<dyn Future<Output = Result<UploadNode, AppError>> + Send>> {
    Box::pin(async move {
        let name = file_name(&source);
        let meta = tokio::fs::metadata(&source).await?;
        if !meta.is_dir() {
            let data = tokio::fs::read(&source).await?;
            return Ok(UploadNode::File(UploadFile::new(name, Bytes::from(data))));
        }

        let mut entries = tokio::fs::read_dir(&source).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();

        let mut children = Vec::with_capacity(paths.len());
        for path in paths {
            children.push(read_node(path).await?);
        }
        Ok(UploadNode::Directory { name, children })
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}
