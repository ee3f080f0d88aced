//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use cloudfm_core::config::ShareConfig;
use cloudfm_core::error::AppError;
use cloudfm_service::ShareService;

use crate::jobs::ShareExpiryJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Share service swept for expired records
    shares: Arc<ShareService>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(shares: Arc<ShareService>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, shares })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(&self, config: &ShareConfig) -> Result<(), AppError> {
        self.register_share_sweep(&config.sweep_cron).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Expired share sweep on the configured schedule
    pub async fn register_share_sweep(&self, schedule: &str) -> Result<(), AppError> {
        let job_handler = ShareExpiryJob::new(Arc::clone(&self.shares));
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let job_handler = job_handler.clone();
            Box::pin(async move {
                match job_handler.run().await {
                    Ok(result) => tracing::debug!(%result, "Share expiry sweep finished"),
                    Err(e) => tracing::error!("Share expiry sweep failed: {}", e),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid share sweep schedule '{}': {}",
                schedule, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add share_expiry schedule: {}", e))
        })?;

        tracing::info!(schedule, "Registered: share_expiry");
        Ok(())
    }
}
