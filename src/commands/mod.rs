//! CLI command definitions and dispatch.

pub mod bin;
pub mod browse;
pub mod entry;
pub mod share;
pub mod upload;
pub mod worker;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use cloudfm_core::config::AppConfig;
use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::types::{ProgressReporter, SystemClock};
use cloudfm_entity::Entry;
use cloudfm_service::{DirectoryState, ServiceRegistry, SessionContext};
use cloudfm_storage::StorageManager;

use crate::output::{self, OutputFormat};

/// cloudfm: a personal cloud file manager
#[derive(Debug, Parser)]
#[command(name = "cloudfm", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load (`config/{env}.toml`)
    #[arg(short, long, env = "CLOUDFM_ENV", default_value = "development")]
    pub env: String,

    /// Owner id (defaults to `session.default_owner`)
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List a directory
    Ls(browse::LsArgs),
    /// Show a file's content or preview URL
    Cat(browse::CatArgs),
    /// Create a folder
    Mkdir(entry::MkdirArgs),
    /// Create a text note
    Note(entry::NoteArgs),
    /// Rename a file or folder
    Rename(entry::RenameArgs),
    /// Move a file or folder to another directory
    Mv(entry::MvArgs),
    /// Delete a file or folder (a backup goes to the recycle bin)
    Rm(entry::RmArgs),
    /// Copy a file or folder out to the local filesystem
    Download(entry::DownloadArgs),
    /// Upload files or folders
    Upload(upload::UploadArgs),
    /// Toggle the public share of a file
    Star(share::StarArgs),
    /// Public share listings and maintenance
    Shares(share::SharesArgs),
    /// Recycle bin
    Bin(bin::BinArgs),
    /// Run the scheduled background tasks
    Worker(worker::WorkerArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let app = App::open(config, self.owner.clone()).await?;
        let result = match &self.command {
            Commands::Ls(args) => browse::ls(args, &app, self.format).await,
            Commands::Cat(args) => browse::cat(args, &app).await,
            Commands::Mkdir(args) => entry::mkdir(args, &app, self.format).await,
            Commands::Note(args) => entry::note(args, &app, self.format).await,
            Commands::Rename(args) => entry::rename(args, &app).await,
            Commands::Mv(args) => entry::mv(args, &app).await,
            Commands::Rm(args) => entry::rm(args, &app).await,
            Commands::Download(args) => entry::download(args, &app).await,
            Commands::Upload(args) => upload::execute(args, &app).await,
            Commands::Star(args) => share::star(args, &app).await,
            Commands::Shares(args) => share::execute(args, &app, self.format).await,
            Commands::Bin(args) => bin::execute(args, &app, self.format).await,
            Commands::Worker(args) => worker::execute(args, &app).await,
        };
        app.services.flush_heals().await;
        result
    }
}

/// Everything a command needs: configuration, services and the session.
#[derive(Debug)]
pub struct App {
    /// Loaded configuration
    pub config: AppConfig,
    /// Wired services
    pub services: ServiceRegistry,
    /// Acting owner
    pub ctx: SessionContext,
    /// Current directory view
    pub state: DirectoryState,
}

impl App {
    /// Build storage and services for `owner`
    pub async fn open(config: AppConfig, owner: Option<String>) -> Result<Self, AppError> {
        let storage = StorageManager::from_config(&config.storage).await?;
        let services = ServiceRegistry::new(&storage, &config, Arc::new(SystemClock));
        let owner = owner.unwrap_or_else(|| config.session.default_owner.clone());
        let ctx = SessionContext::new(path::validate_name(&owner)?);
        Ok(Self {
            config,
            services,
            ctx,
            state: DirectoryState::new(),
        })
    }

    /// Look up the entry at `target` (relative to the owner root)
    pub async fn resolve_entry(&self, target: &str) -> Result<Entry, AppError> {
        let target = target.trim_matches('/');
        let parent = path::parent_of(target);
        let name = path::name_of(target);
        let listing = self.state.navigate(&self.services.reconciler, &self.ctx, &parent).await?;
        if let Some(folder) = listing.find_folder(name) {
            return Ok(folder.clone().into());
        }
        if let Some(file) = listing.find_file(name) {
            return Ok(file.clone().into());
        }
        Err(AppError::not_found(format!("No such file or folder: '/{target}'")))
    }

    /// Run `op` with a progress reporter echoed to stderr
    pub async fn with_progress<T, F, Fut>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(ProgressReporter) -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        let (reporter, rx) = ProgressReporter::channel();
        let watcher = output::watch_progress(rx);
        let result = op(reporter).await;
        if let Err(e) = watcher.await {
            tracing::debug!("Progress watcher ended abnormally: {}", e);
        }
        result
    }

    /// Re-list the directory the last command looked at
    pub async fn refresh(&self) -> Result<(), AppError> {
        let listing = self.state.refresh(&self.services.reconciler, &self.ctx).await?;
        tracing::debug!(
            directory = %listing.directory,
            folders = listing.folders.len(),
            files = listing.files.len(),
            "Listing refreshed"
        );
        Ok(())
    }
}
