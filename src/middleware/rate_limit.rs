use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header::RETRY_AFTER, HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::config::RateLimitSettings;
use crate::response::json_error;
use crate::state::AppState;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Fixed-window limiter for `/api/auth/*`, keyed by client IP.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let settings = &state.config().rate_limit;
    if !settings.enabled {
        return next.run(req).await;
    }

    let ip = extract_client_ip(&req, settings.trust_proxy);
    if ip.is_some_and(|ip| ip.is_loopback()) {
        return next.run(req).await;
    }

    let ip = ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let check = state.auth_limiter().check(ip).await;

    if !check.allowed {
        let mut res = json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "TOO_MANY_AUTH_REQUESTS",
            "Too many authentication attempts, please try again later",
        )
        .into_response();
        apply_rate_limit_headers(&mut res, check);
        return res;
    }

    let mut res = next.run(req).await;
    apply_rate_limit_headers(&mut res, check);
    res
}

fn apply_rate_limit_headers(res: &mut Response, check: RateLimitCheck) {
    let headers = res.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(check.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(check.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(check.reset_after_seconds));
    if check.remaining == 0 {
        headers.insert(RETRY_AFTER, HeaderValue::from(check.reset_after_seconds));
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    window_start_ms: u64,
    hits: u64,
}

#[derive(Debug)]
struct LimiterState {
    entries: HashMap<IpAddr, Entry>,
    last_cleanup_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitCheck {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_after_seconds: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    window_ms: u64,
    max: u64,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(window_ms: u64, max: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            max,
            state: Mutex::new(LimiterState {
                entries: HashMap::new(),
                last_cleanup_ms: now_ms(),
            }),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.auth_window_ms, settings.auth_max)
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitCheck {
        self.check_at(ip, now_ms()).await
    }

    async fn check_at(&self, ip: IpAddr, now_ms: u64) -> RateLimitCheck {
        let mut state = self.state.lock().await;

        if now_ms.saturating_sub(state.last_cleanup_ms) >= self.window_ms {
            let window_ms = self.window_ms;
            state
                .entries
                .retain(|_, entry| now_ms.saturating_sub(entry.window_start_ms) < window_ms);
            state.last_cleanup_ms = now_ms;
        }

        let entry = state.entries.entry(ip).or_insert(Entry {
            window_start_ms: now_ms,
            hits: 0,
        });

        if now_ms.saturating_sub(entry.window_start_ms) >= self.window_ms {
            entry.window_start_ms = now_ms;
            entry.hits = 0;
        }

        entry.hits = entry.hits.saturating_add(1);
        let allowed = entry.hits <= self.max;
        let reset_after_ms = self
            .window_ms
            .saturating_sub(now_ms.saturating_sub(entry.window_start_ms));

        RateLimitCheck {
            allowed,
            limit: self.max,
            remaining: self.max.saturating_sub(entry.hits),
            reset_after_seconds: reset_after_ms.div_ceil(1000),
        }
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn extract_client_ip(req: &Request<Body>, trust_proxy: bool) -> Option<IpAddr> {
    if trust_proxy {
        if let Some(ip) = extract_x_forwarded_for(req) {
            return Some(ip);
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn extract_x_forwarded_for(req: &Request<Body>) -> Option<IpAddr> {
    let raw = req
        .headers()
        .get(HeaderName::from_static("x-forwarded-for"))?
        .to_str()
        .ok()?;
    raw.split(',').next()?.trim().parse::<IpAddr>().ok()
}
