//! Rate limiting middleware for the API
//!
//! Per-IP token buckets with per-route overrides. A bucket holds up to
//! `per_minute` tokens and refills at `per_minute / 60` tokens per second.
//! Routes without an override share one bucket per IP.

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Instant,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Bucket count above which idle, fully refilled buckets are evicted
const PRUNE_THRESHOLD: usize = 10_000;

/// Simple token bucket rate limiter
struct TokenBucket {
    /// Available tokens
    tokens: f64,
    /// Last refill time
    last_refill: Instant,
    /// Tokens per second
    rate: f64,
    /// Maximum burst size
    capacity: u32,
}

impl TokenBucket {
    fn per_minute(limit: u32) -> Self {
        Self {
            tokens: limit as f64,
            last_refill: Instant::now(),
            rate: limit as f64 / 60.0,
            capacity: limit,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity as f64);
        self.last_refill = now;
    }

    /// Take one token, or return the number of seconds until one is available
    fn try_consume(&mut self) -> Option<u64> {
        self.refill(Instant::now());

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let wait_secs = ((1.0 - self.tokens) / self.rate).ceil() as u64;
            Some(wait_secs.max(1))
        }
    }

    fn is_full(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= self.capacity as f64
    }
}

/// Bucket key: client IP and the overridden route (empty for the default limit)
type BucketKey = (IpAddr, String);

/// A rejected request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limited {
    /// Requests per minute allowed on the route
    pub limit: u32,
    /// Seconds until the next request would be accepted
    pub retry_after: u64,
}

/// Rate limiter with per-IP, per-route tracking
pub struct RateLimiter {
    buckets: Mutex<HashMap<BucketKey, TokenBucket>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter from configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Check if a path is exempt from rate limiting
    fn is_path_exempt(&self, path: &str) -> bool {
        self.config
            .exempt_paths
            .iter()
            .any(|exempt| path == exempt || path.starts_with(exempt.as_str()))
    }

    fn bucket_key(&self, ip: IpAddr, path: &str) -> (BucketKey, u32) {
        match self.config.route_limits.iter().find(|r| r.path == path) {
            Some(route) => ((ip, route.path.clone()), route.per_minute),
            None => ((ip, String::new()), self.config.per_minute),
        }
    }

    /// Check if a request from `ip` to `path` should be rejected
    pub async fn check(&self, path: &str, ip: IpAddr) -> Option<Limited> {
        if self.is_path_exempt(path) || self.config.exempt_ips.contains(&ip) {
            return None;
        }

        let (key, limit) = self.bucket_key(ip, path);
        if limit == 0 {
            return Some(Limited {
                limit,
                retry_after: 60,
            });
        }

        let mut buckets = self.buckets.lock().await;
        if buckets.len() >= PRUNE_THRESHOLD {
            let now = Instant::now();
            buckets.retain(|_, bucket| !bucket.is_full(now));
        }

        buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::per_minute(limit))
            .try_consume()
            .map(|retry_after| Limited { limit, retry_after })
    }
}

/// Rate limiting middleware function
///
/// Requests served without connection info (e.g. a router driven directly
/// in tests) are counted against the unspecified address.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(req.uri().path(), ip).await {
        None => next.run(req).await,
        Some(Limited { limit, retry_after }) => {
            debug!(%ip, path = req.uri().path(), limit, retry_after, "rate limited");
            let error = ApiError::rate_limited(format!(
                "Rate limit exceeded: {} per minute. Try again in {} seconds.",
                limit, retry_after
            ));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(error)).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
