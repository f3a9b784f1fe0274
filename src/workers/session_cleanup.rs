use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::db::operations::{now_ms, session};
use crate::db::DatabaseProxy;

pub async fn cleanup_expired_sessions(db: Arc<DatabaseProxy>) -> Result<u64, super::WorkerError> {
    let start = Instant::now();
    debug!("Starting session cleanup cycle");

    let expired_sessions = session::delete_expired_sessions(db.pool(), now_ms()).await?;

    info!(
        expired_sessions,
        duration_secs = format!("{:.2}", start.elapsed().as_secs_f64()),
        "Session cleanup completed"
    );
    Ok(expired_sessions)
}
