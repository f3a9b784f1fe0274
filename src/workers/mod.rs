mod session_cleanup;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::WorkerSettings;
use crate::db::DatabaseProxy;

pub use session_cleanup::cleanup_expired_sessions;

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    db_proxy: Arc<DatabaseProxy>,
    settings: WorkerSettings,
}

impl WorkerManager {
    pub async fn new(db_proxy: Arc<DatabaseProxy>, settings: WorkerSettings) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            db_proxy,
            settings,
        })
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        if !self.settings.session_cleanup_enabled {
            info!("Session cleanup disabled, no workers to start");
            return Ok(());
        }

        let scheduler = self.scheduler.lock().await;

        let schedule = self.settings.session_cleanup_schedule.clone();
        let db = Arc::clone(&self.db_proxy);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
            let db = Arc::clone(&db);
            let mut rx = shutdown_rx.resubscribe();
            Box::pin(async move {
                tokio::select! {
                    _ = rx.recv() => {},
                    result = cleanup_expired_sessions(db) => {
                        if let Err(e) = result {
                            error!(error = %e, "Session cleanup worker error");
                        }
                    }
                }
            })
        })?;
        scheduler.add(job).await?;
        info!(schedule = %schedule, "Session cleanup worker scheduled");

        scheduler.start().await?;
        info!("All workers started");
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping workers...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }
        info!("Workers stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
