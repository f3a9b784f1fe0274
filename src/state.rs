use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::cache::RedisCache;
use crate::config::Config;
use crate::db::DatabaseProxy;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::llm_provider::LLMProvider;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    db_proxy: Arc<DatabaseProxy>,
    cache: Option<Arc<RedisCache>>,
    llm: Arc<LLMProvider>,
    auth_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db_proxy: Arc<DatabaseProxy>, cache: Option<Arc<RedisCache>>) -> Self {
        let llm = Arc::new(LLMProvider::new(config.llm.clone()));
        let auth_limiter = Arc::new(RateLimiter::from_settings(&config.rate_limit));
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config,
            db_proxy,
            cache,
            llm,
            auth_limiter,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_proxy(&self) -> &DatabaseProxy {
        &self.db_proxy
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_deref()
    }

    pub fn llm(&self) -> &LLMProvider {
        &self.llm
    }

    pub fn auth_limiter(&self) -> &RateLimiter {
        &self.auth_limiter
    }
}
