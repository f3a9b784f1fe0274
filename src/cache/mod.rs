pub mod keys;

use std::time::Duration;

use rand::Rng;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

const TTL_JITTER_RATIO: f64 = 0.1;

/// Optional read-through cache for verified sessions. Every failure degrades to a miss.
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;
        Ok(Self { connection })
    }

    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn.get(key).await.ok()?;
        payload.and_then(|p| serde_json::from_str(&p).ok())
    }

    pub async fn set<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: Serialize,
    {
        let Ok(payload) = serde_json::to_string(value) else {
            return;
        };
        let mut conn = self.connection.clone();
        let ttl_secs = jittered_ttl(ttl).as_secs().max(1);
        if let Err(err) = conn.set_ex::<_, _, ()>(key, payload, ttl_secs).await {
            tracing::debug!(error = %err, key, "cache write failed");
        }
    }

    pub async fn delete(&self, key: &str) {
        let mut conn = self.connection.clone();
        let _: Result<u64, _> = conn.del(key).await;
    }
}

fn jittered_ttl(ttl: Duration) -> Duration {
    let base_ms = ttl.as_millis() as f64;
    let factor = rand::rng().random_range(1.0 - TTL_JITTER_RATIO..=1.0 + TTL_JITTER_RATIO);
    Duration::from_millis((base_ms * factor).round().max(1.0) as u64)
}
