use std::time::Duration;

pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

pub fn session_key(token_hash: &str) -> String {
    format!("session:{}", token_hash)
}
