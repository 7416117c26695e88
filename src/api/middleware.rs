//! HTTP middleware
//!
//! Provides:
//! - Optional bearer-token authentication (anonymous requests proceed)
//! - Per-IP rate limiting, with a stricter window for write endpoints
//! - Request body size limits
//! - Security headers

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::directory::RouteDirectory;
use crate::model::Contributor;

/// Rate limiter state - tracks requests per IP within a rolling window
#[derive(Debug)]
pub struct RateLimiter {
    /// Map of IP -> (request count, window start)
    requests: DashMap<String, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            limit,
            window,
        }
    }

    /// Check if a request is allowed and update the counter.
    /// Returns (allowed, remaining, reset_after_secs).
    pub fn check_request(&self, ip: &str) -> (bool, u32, u64) {
        let now = Instant::now();

        let mut entry = self.requests.entry(ip.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= self.window {
            *count = 0;
            *window_start = now;
        }

        let remaining = self.limit.saturating_sub(*count);
        let reset_after = self
            .window
            .checked_sub(now.duration_since(*window_start))
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if *count >= self.limit {
            return (false, 0, reset_after);
        }

        *count += 1;
        (true, remaining.saturating_sub(1), reset_after)
    }

    /// Drop expired windows (call periodically)
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.requests
            .retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }
}

/// Shared state for the security middleware
#[derive(Clone)]
pub struct SecurityState {
    pub rate_limiter: Arc<RateLimiter>,
    pub write_limiter: Arc<RateLimiter>,
    pub max_request_size: usize,
}

impl SecurityState {
    pub fn new(rate_limit_per_minute: u32, write_limit_per_hour: u32, max_request_size: usize) -> Self {
        Self {
            rate_limiter: Arc::new(RateLimiter::new(
                rate_limit_per_minute,
                Duration::from_secs(60),
            )),
            write_limiter: Arc::new(RateLimiter::new(
                write_limit_per_hour,
                Duration::from_secs(3600),
            )),
            max_request_size,
        }
    }
}

/// Extract client IP from request, handling proxies
fn get_client_ip(headers: &HeaderMap, addr: Option<&SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            return ip.trim().to_string();
        }
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn rate_limited_response(limit: u32, reset_after: u64) -> Response {
    let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_after));
    headers.insert("Retry-After", HeaderValue::from(reset_after));
    response
}

/// General per-IP rate limiting; write methods additionally consume the
/// stricter hourly window (votes and route creation are the abuse target).
pub async fn rate_limit_middleware(
    State(state): State<SecurityState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let client_ip = get_client_ip(&headers, Some(&addr));

    let (allowed, remaining, reset_after) = state.rate_limiter.check_request(&client_ip);
    if !allowed {
        warn!(ip = %client_ip, path = request.uri().path(), "Rate limit exceeded");
        return Err(rate_limited_response(0, reset_after));
    }

    if request.method() == Method::POST {
        let (write_allowed, _, write_reset) = state.write_limiter.check_request(&client_ip);
        if !write_allowed {
            warn!(ip = %client_ip, path = request.uri().path(), "Write rate limit exceeded");
            return Err(rate_limited_response(0, write_reset));
        }
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_after));
    Ok(response)
}

/// Reject oversized request bodies before reading them
pub async fn body_size_middleware(
    State(state): State<SecurityState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(length) = request
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if length > state.max_request_size {
            warn!(
                length,
                max = state.max_request_size,
                "Request body too large"
            );
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }

    Ok(next.run(request).await)
}

/// Security headers on every response
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, max-age=0"),
    );

    response
}

// Authentication. Votes, tips and route creation all allow anonymous
// callers; a valid bearer token attaches the contributor, an invalid or
// missing one just means anonymous.

/// SHA-256 hex digest of a bearer token; tokens are stored hashed at rest
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// State for the optional-auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub directory: Arc<RouteDirectory>,
}

/// Resolved caller identity, inserted as a request extension
#[derive(Clone, Default)]
pub struct AuthContext {
    pub contributor: Option<Contributor>,
}

/// Optional authentication: never rejects, only annotates the request
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let contributor = match token {
        Some(token) if !token.is_empty() => {
            match state
                .directory
                .contributor_by_token_digest(&token_digest(token))
                .await
            {
                Ok(found) => {
                    if found.is_none() {
                        debug!("Unknown bearer token, continuing anonymously");
                    }
                    found
                }
                Err(e) => {
                    warn!(error = %e, "Token lookup failed, continuing anonymously");
                    None
                }
            }
        }
        _ => None,
    };

    request.extensions_mut().insert(AuthContext { contributor });
    next.run(request).await
}
