//! Fixed-window rate limiting for sensitive POST endpoints.
//!
//! Fixed windows under-count bursts straddling a window boundary (a client
//! can land up to 2x the limit across two adjacent windows) but stay O(1) in
//! memory and per request, which is the right trade-off without an external
//! rate-limit store.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header::AUTHORIZATION, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::sha256_hex;
use crate::config::RateLimitConfig;
use crate::state::AppState;

/// POST paths that attract brute-force and enumeration traffic.
const GUARDED_POST_PATHS: &[&str] = &[
    "/auth/login",
    "/auth/signup",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/auth/refresh",
    "/auth/google",
    "/auth/apple",
    "/dashboard/login",
];

#[derive(Debug)]
struct Counter {
    window_start: u64,
    count: u32,
}

/// Per-key request counters over a fixed window.
///
/// The outer map lock is held only for lookup/insert; the (window_start,
/// count) pair is mutated under its own per-counter lock so two concurrent
/// requests cannot both observe `count = max - 1` and both be admitted.
pub struct RateLimiter {
    window_secs: u64,
    max_requests: u32,
    counters: Mutex<HashMap<String, Arc<Mutex<Counter>>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window_secs: config.window_secs,
            max_requests: config.max_requests,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, unix_now())
    }

    /// Clock-injected variant so window behavior is testable without sleeping.
    pub fn allow_at(&self, key: &str, now: u64) -> bool {
        let counter = {
            let mut counters = self.counters.lock().expect("rate limit lock poisoned");
            counters
                .entry(key.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(Counter {
                        window_start: now,
                        count: 0,
                    }))
                })
                .clone()
        };

        let mut c = counter.lock().expect("rate limit counter lock poisoned");
        if now.saturating_sub(c.window_start) >= self.window_secs {
            c.window_start = now;
            c.count = 0;
        }
        c.count += 1;
        c.count <= self.max_requests
    }

    /// Drop counters whose window lapsed more than one full window ago.
    /// Keys are otherwise never evicted, which grows without bound under
    /// rotating client identities.
    pub fn sweep_expired(&self) {
        self.sweep_expired_at(unix_now());
    }

    pub fn sweep_expired_at(&self, now: u64) {
        let mut counters = self.counters.lock().expect("rate limit lock poisoned");
        counters.retain(|_, counter| {
            let c = counter.lock().expect("rate limit counter lock poisoned");
            now.saturating_sub(c.window_start) < 2 * self.window_secs
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.counters.lock().expect("rate limit lock poisoned").len()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn is_guarded(method: &Method, path: &str) -> bool {
    method == Method::POST && GUARDED_POST_PATHS.iter().any(|p| path.starts_with(p))
}

/// Composite key: route + client IP, plus a digest of the Authorization
/// header when present so an authenticated caller is counted independently
/// of anonymous traffic behind the same NAT.
fn limit_key(request: &Request) -> String {
    let path = request.uri().path();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut key = format!("{}|{}", path, ip);
    if let Some(auth) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if !auth.trim().is_empty() {
            key.push('|');
            key.push_str(&sha256_hex(auth));
        }
    }
    key
}

/// Admission control in front of the request guards. Non-POST methods and
/// unguarded paths pass through without touching a counter.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_guarded(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let key = limit_key(&request);
    if !state.limiter.allow(&key) {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        )
            .into_response();
    }

    next.run(request).await
}
