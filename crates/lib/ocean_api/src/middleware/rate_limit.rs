//! Fixed-window rate limiting keyed by client address.
//!
//! Best-effort abuse mitigation: counters live in process memory and are
//! not shared between instances.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tracing::warn;

use crate::AppState;
use crate::error::AppError;

/// Expired windows are swept once the table grows past this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

/// Bucket for requests with no discernible client address.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// A named fixed-window counter.
#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    max: u32,
    window: Duration,
    message: &'static str,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max: u32, window: Duration, message: &'static str) -> Self {
        Self {
            name,
            max,
            window,
            message,
            windows: DashMap::new(),
        }
    }

    /// Count a hit for `key`; `false` once the window's budget is spent.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
        }
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max
    }
}

/// The limiters the router applies.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub enabled: bool,
    /// Every route.
    pub general: Arc<RateLimiter>,
    /// POST register and login.
    pub auth: Arc<RateLimiter>,
    /// Forgot-password.
    pub email: Arc<RateLimiter>,
    /// Resource search.
    pub search: Arc<RateLimiter>,
}

impl RateLimits {
    pub fn standard(enabled: bool) -> Self {
        const MINUTE: Duration = Duration::from_secs(60);
        Self {
            enabled,
            general: Arc::new(RateLimiter::new(
                "general",
                100,
                15 * MINUTE,
                "Too many requests from this IP, please try again later.",
            )),
            auth: Arc::new(RateLimiter::new(
                "auth",
                5,
                15 * MINUTE,
                "Too many authentication attempts, please try again later.",
            )),
            email: Arc::new(RateLimiter::new(
                "email",
                3,
                60 * MINUTE,
                "Too many email requests, please try again later.",
            )),
            search: Arc::new(RateLimiter::new(
                "search",
                30,
                MINUTE,
                "Too many search requests, please try again later.",
            )),
        }
    }
}

/// Socket peer, else first `X-Forwarded-For` hop, else a shared bucket.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn enforce(enabled: bool, limiter: &RateLimiter, request: &Request) -> Result<(), AppError> {
    if !enabled {
        return Ok(());
    }
    let key = client_key(request);
    if limiter.check(&key, Instant::now()) {
        Ok(())
    } else {
        warn!(limiter = limiter.name, client = %key, path = %request.uri().path(), "rate limit exceeded");
        Err(AppError::RateLimited(limiter.message.to_string()))
    }
}

pub async fn general_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(state.limits.enabled, &state.limits.general, &request)?;
    Ok(next.run(request).await)
}

/// Only POSTs count against the auth budget.
pub async fn auth_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::POST {
        enforce(state.limits.enabled, &state.limits.auth, &request)?;
    }
    Ok(next.run(request).await)
}

pub async fn email_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(state.limits.enabled, &state.limits.email, &request)?;
    Ok(next.run(request).await)
}

pub async fn search_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(state.limits.enabled, &state.limits.search, &request)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn window_allows_max_then_blocks() {
        let limiter = RateLimiter::new("t", 3, Duration::from_secs(60), "slow down");
        let now = Instant::now();
        assert!(limiter.check("a", now));
        assert!(limiter.check("a", now));
        assert!(limiter.check("a", now));
        assert!(!limiter.check("a", now));
        // Independent key.
        assert!(limiter.check("b", now));
    }

    #[test]
    fn window_resets_after_elapsing() {
        let limiter = RateLimiter::new("t", 1, Duration::from_secs(60), "slow down");
        let now = Instant::now();
        assert!(limiter.check("a", now));
        assert!(!limiter.check("a", now + Duration::from_secs(59)));
        assert!(limiter.check("a", now + Duration::from_secs(60)));
    }

    #[test]
    fn client_key_prefers_forwarded_header_without_peer() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.9");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), UNKNOWN_CLIENT);
    }

    #[test]
    fn peer_address_wins() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 7], 5555))));
        assert_eq!(client_key(&req), "192.0.2.7");
    }
}
