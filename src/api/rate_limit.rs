//! Fixed-window request limiting keyed by client address.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::{DashMap, mapref::entry::Entry};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const UNKNOWN_CLIENT: &str = "unknown";

/// Longest window a limiter accepts. Larger settings are clamped so the
/// expiration instant stays representable.
pub const MAX_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct Window {
    expiration: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Counter store with one window per client. Windows expire after
/// `window`; [`RateLimiter::purge_expired`] drops them.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        if window > MAX_WINDOW {
            tracing::warn!(?window, max = ?MAX_WINDOW, "rate limit window clamped");
        }
        Self {
            windows: DashMap::new(),
            window: window.min(MAX_WINDOW),
            max_requests,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let fresh = Window {
            expiration: now + self.window,
            count: 1,
        };

        let window = match self.windows.entry(client.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                if now >= current.expiration {
                    *current = fresh;
                } else {
                    current.count = current.count.saturating_add(1);
                }
                *current
            }
            Entry::Vacant(vacant) => *vacant.insert(fresh),
        };

        if window.count > self.max_requests {
            RateDecision::Limited {
                retry_after: window.expiration.saturating_duration_since(now),
            }
        } else {
            RateDecision::Allowed {
                remaining: self.max_requests - window.count,
            }
        }
    }

    /// Drop every window that has expired by `now`.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.expiration);
        before - self.windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    match limiter.check(&client) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(%client, "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Too many requests from this client, please try again later."
                })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_limits_and_resets() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();

        assert_eq!(
            limiter.check_at("a", now),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check_at("a", now),
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limiter.check_at("a", now + Duration::from_secs(10)),
            RateDecision::Limited {
                retry_after: Duration::from_secs(50)
            }
        );
        // other clients have their own window
        assert_eq!(
            limiter.check_at("b", now),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check_at("a", now + Duration::from_secs(60)),
            RateDecision::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 100);
        let now = Instant::now();
        limiter.check_at("a", now);
        limiter.check_at("b", now + Duration::from_secs(30));

        assert_eq!(limiter.purge_expired(now + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let limiter = RateLimiter::new(Duration::from_secs(u64::MAX), 1);
        assert_eq!(limiter.window(), MAX_WINDOW);

        let now = Instant::now();
        assert_eq!(
            limiter.check_at("a", now),
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limiter.check_at("a", now),
            RateDecision::Limited {
                retry_after: MAX_WINDOW
            }
        );
    }
}
