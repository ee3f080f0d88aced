//! Background worker command.

use clap::Args;

use cloudfm_core::error::AppError;
use cloudfm_worker::CronScheduler;

use super::App;

/// Arguments for the worker command
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Override the share sweep schedule (cron, with seconds)
    #[arg(long)]
    pub sweep_cron: Option<String>,
}

/// Run scheduled tasks until interrupted
pub async fn execute(args: &WorkerArgs, app: &App) -> Result<(), AppError> {
    let mut scheduler = CronScheduler::new(app.services.shares.clone()).await?;
    match &args.sweep_cron {
        Some(schedule) => scheduler.register_share_sweep(schedule).await?,
        None => scheduler.register_default_tasks(&app.config.share).await?,
    }
    scheduler.start().await?;

    println!("Worker running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown: {}", e)))?;

    scheduler.shutdown().await
}
