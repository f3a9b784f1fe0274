use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::services::llm_provider::LLMConfig;
use crate::services::mentor::DEFAULT_SYSTEM_PROMPT;

const DEV_JWT_SECRET: &str = "gate-trek-dev-secret-change-me";
const DEFAULT_JWT_EXPIRES_IN: &str = "7d";
const DEFAULT_SESSION_CLEANUP_SCHEDULE: &str = "0 0 * * * *";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingJwtSecret,
    #[error("invalid JWT_EXPIRES_IN: {0}")]
    InvalidExpiresIn(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub environment: String,
    pub database: DbConfig,
    pub jwt: JwtConfig,
    pub redis_url: Option<String>,
    pub rate_limit: RateLimitSettings,
    pub workers: WorkerSettings,
    pub llm: LLMConfig,
    pub mentor_system_prompt: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub ping_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_ms: i64,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub auth_window_ms: u64,
    pub auth_max: u64,
    pub trust_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub session_cleanup_enabled: bool,
    pub session_cleanup_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_string("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(5000);

        let host = env_string("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = env_string("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let environment = env_string("APP_ENV").unwrap_or_else(|| "development".to_string());

        let secret = match env_string("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => return Err(ConfigError::MissingJwtSecret),
            None => DEV_JWT_SECRET.to_string(),
        };
        let expires_in = env_string("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_JWT_EXPIRES_IN.to_string());
        let expires_in_ms = crate::auth::parse_expires_in_ms(&expires_in)
            .map_err(|_| ConfigError::InvalidExpiresIn(expires_in.clone()))?;

        let database = DbConfig {
            url: env_string("DATABASE_URL").unwrap_or_else(default_database_url),
            max_connections: env_u64("DB_MAX_CONNECTIONS").unwrap_or(5) as u32,
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS").unwrap_or(5000)),
            ping_timeout: Duration::from_millis(env_u64("DB_HEALTH_CHECK_TIMEOUT_MS").unwrap_or(3000)),
        };

        let rate_limit = RateLimitSettings {
            enabled: env_bool("RATE_LIMIT_ENABLED").unwrap_or(true),
            auth_window_ms: env_u64("AUTH_RATE_LIMIT_WINDOW_MS").unwrap_or(5 * 60 * 1000),
            auth_max: env_u64("AUTH_RATE_LIMIT_MAX").unwrap_or(30),
            trust_proxy: env_bool("TRUST_PROXY").unwrap_or(false),
        };

        let workers = WorkerSettings {
            session_cleanup_enabled: env_bool("ENABLE_SESSION_CLEANUP").unwrap_or(true),
            session_cleanup_schedule: env_string("SESSION_CLEANUP_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_SESSION_CLEANUP_SCHEDULE.to_string()),
        };

        Ok(Self {
            host,
            port,
            log_level,
            environment,
            database,
            jwt: JwtConfig {
                secret,
                expires_in_ms,
            },
            redis_url: env_string("REDIS_URL"),
            rate_limit,
            workers,
            llm: LLMConfig::from_env(),
            mentor_system_prompt: env_string("MENTOR_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }

    /// In-memory database, fixed secret, no limiter and no background jobs.
    pub fn for_tests() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            log_level: "warn".to_string(),
            environment: "test".to_string(),
            database: DbConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                busy_timeout: Duration::from_secs(5),
                ping_timeout: Duration::from_secs(1),
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                expires_in_ms: 7 * 24 * 60 * 60 * 1000,
            },
            redis_url: None,
            rate_limit: RateLimitSettings {
                enabled: false,
                auth_window_ms: 5 * 60 * 1000,
                auth_max: 30,
                trust_proxy: false,
            },
            workers: WorkerSettings {
                session_cleanup_enabled: false,
                session_cleanup_schedule: DEFAULT_SESSION_CLEANUP_SCHEDULE.to_string(),
            },
            llm: LLMConfig::disabled(),
            mentor_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt.secret == DEV_JWT_SECRET
    }
}

fn default_database_url() -> String {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gate-trek")
        .join("trek.db");
    format!("sqlite:{}?mode=rwc", path.display())
}

pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_uses_loopback_memory_db() {
        let config = Config::for_tests();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(config.bind_addr().ip().is_loopback());
        assert!(!config.is_production());
        assert!(!config.uses_dev_jwt_secret());
    }

    #[test]
    fn test_dev_secret_is_detected() {
        let mut config = Config::for_tests();
        config.jwt.secret = DEV_JWT_SECRET.to_string();
        assert!(config.uses_dev_jwt_secret());
    }

    #[test]
    fn test_default_database_url_is_sqlite() {
        let url = default_database_url();
        assert!(url.starts_with("sqlite:"));
        assert!(url.ends_with("trek.db?mode=rwc"));
    }
}
