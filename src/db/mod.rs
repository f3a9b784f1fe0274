pub mod migrate;
pub mod operations;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::DbConfig;
use crate::db::migrate::MigrationError;

#[derive(Clone)]
pub struct DatabaseProxy {
    pool: SqlitePool,
    ping_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub enum PingStatus {
    Connected { latency_ms: u64 },
    Timeout,
    Disconnected,
}

impl PingStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, PingStatus::Connected { .. })
    }
}

impl DatabaseProxy {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbInitError> {
        let in_memory = is_memory_url(&config.url);

        if !in_memory {
            if let Some(parent) = sqlite_file_path(&config.url).and_then(|p| p.parent().map(PathBuf::from)) {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(&parent)
                        .await
                        .map_err(|e| DbInitError::Io(e.to_string()))?;
                }
            }
        }

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(DbInitError::Sqlx)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // every pooled connection to `:memory:` is its own database
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(DbInitError::Sqlx)?;

        migrate::run_migrations(&pool).await?;

        tracing::info!(in_memory, "database ready");

        Ok(Self {
            pool,
            ping_timeout: config.ping_timeout,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> PingStatus {
        let started = Instant::now();
        let result =
            tokio::time::timeout(self.ping_timeout, sqlx::query("SELECT 1").execute(&self.pool)).await;

        match result {
            Ok(Ok(_)) => PingStatus::Connected {
                latency_ms: started.elapsed().as_millis() as u64,
            },
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "database ping failed");
                PingStatus::Disconnected
            }
            Err(_) => PingStatus::Timeout,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("io error: {0}")]
    Io(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}
