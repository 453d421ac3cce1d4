//! Per-client request rate limiting
//!
//! Fixed-window counters keyed by client address. The limiter lives in
//! [`AppState`]; a background task sweeps expired windows so the map does
//! not grow without bound.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::http::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

pub trait RateLimiter: Send + Sync + 'static {
    /// Count one request for `key`.
    fn check(&self, key: &str) -> Decision;

    /// Drop expired windows, returning how many were removed.
    fn sweep(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct FixedWindowLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return Decision::Limited {
                retry_after: self.window.saturating_sub(now.duration_since(entry.started)),
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    fn sweep(&self) -> usize {
        let before = self.windows.len();
        let window = self.window;
        self.windows.retain(|_, w| w.started.elapsed() < window);
        before.saturating_sub(self.windows.len())
    }
}

/// Periodically sweep `limiter` until the runtime shuts down.
pub fn spawn_sweeper(limiter: Arc<dyn RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, "rate limit windows swept");
            }
        }
    })
}

/// Peer address, or the first `X-Forwarded-For` hop when the server sits
/// behind a proxy that sets it. Clients control that header, so it is
/// ignored unless `trust_forwarded_for` is on.
fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_owned();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Middleware: 429 with `Retry-After` once a client exhausts its window.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        let key = client_key(&req, state.trust_forwarded_for);
        if let Decision::Limited { retry_after } = limiter.check(&key) {
            let retry_after_secs = (retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)).max(1);
            tracing::warn!(client = %key, retry_after_secs, "rate limited");
            return Err(ApiError::RateLimited { retry_after_secs });
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test(start_paused = true)]
    async fn limits_within_window_then_resets() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(10));

        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 0 });
        assert!(matches!(limiter.check("a"), Decision::Limited { .. }));

        // other clients are counted separately
        assert_eq!(limiter.check("b"), Decision::Allowed { remaining: 1 });

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.check("a"), Decision::Allowed { remaining: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_counts_down() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        limiter.check("a");
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(
            limiter.check("a"),
            Decision::Limited {
                retry_after: Duration::from_secs(40)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_expired_windows() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(10));
        limiter.check("old");
        tokio::time::advance(Duration::from_secs(6)).await;
        limiter.check("new");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_runs_on_interval() {
        let limiter = Arc::new(FixedWindowLimiter::new(5, Duration::from_secs(1)));
        limiter.check("a");

        let handle = spawn_sweeper(limiter.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(limiter.tracked_clients(), 0);
        handle.abort();
    }

    fn request_from(peer: [u8; 4], forwarded: &str) -> Request {
        let mut req = Request::builder()
            .header("x-forwarded-for", forwarded)
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        req
    }

    #[test]
    fn peer_address_is_the_default_key() {
        let req = request_from([192, 0, 2, 7], "203.0.113.9, 10.0.0.1");
        assert_eq!(client_key(&req, false), "192.0.2.7");
    }

    #[test]
    fn forwarded_for_is_used_only_when_trusted() {
        let mut req = request_from([127, 0, 0, 1], "203.0.113.9, 10.0.0.1");
        assert_eq!(client_key(&req, true), "203.0.113.9");

        req.headers_mut().remove("x-forwarded-for");
        assert_eq!(client_key(&req, true), "127.0.0.1");
    }
}
