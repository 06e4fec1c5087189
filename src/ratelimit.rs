//! Fixed-window per-client request gate, applied in front of the API.
//!
//! On trip it answers with a fixed payload without invoking any handler.

use crate::api::ErrorResponse;
use crate::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

pub struct RateLimiter {
    /// Requests allowed per window; 0 disables the limiter.
    max_requests: u32,
    window: Duration,
    /// Window start and request count per client.
    windows: DashMap<IpAddr, (Instant, u32)>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn allow(&self, client: IpAddr) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: IpAddr, now: Instant) -> bool {
        if self.max_requests == 0 {
            return true;
        }

        let mut entry = self.windows.entry(client).or_insert((now, 0));
        let (start, count) = *entry;
        if now.duration_since(start) >= self.window {
            *entry = (now, 1);
            true
        } else if count < self.max_requests {
            entry.1 = count + 1;
            true
        } else {
            false
        }
    }
}

pub async fn require_capacity(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.rate_limiter.allow(addr.ip()) {
        next.run(request).await
    } else {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests".to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IpAddr {
        "10.0.0.1".parse().unwrap()
    }

    #[test]
    fn test_zero_max_disables_limiting() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..1000 {
            assert!(limiter.allow_at(client(), now));
        }
    }

    #[test]
    fn test_trips_after_max_requests_in_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.allow_at(client(), now));
        assert!(limiter.allow_at(client(), now));
        assert!(limiter.allow_at(client(), now));
        assert!(!limiter.allow_at(client(), now));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.allow_at(client(), now));
        assert!(!limiter.allow_at(client(), now));
        assert!(limiter.allow_at(client(), now + Duration::from_secs(61)));
    }

    #[test]
    fn test_clients_tracked_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.allow_at(client(), now));
        assert!(!limiter.allow_at(client(), now));
        assert!(limiter.allow_at(other, now));
    }
}
