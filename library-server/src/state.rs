//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::db::Store;
use crate::ratelimit::RateLimiter;

/// Shared application state, handed to routers as `Arc<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionKeys,
    /// `None` disables rate limiting.
    pub limiter: Option<Arc<dyn RateLimiter>>,
    /// Key rate limits on `X-Forwarded-For` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, sessions: SessionKeys) -> Self {
        Self {
            store,
            sessions,
            limiter: None,
            trust_forwarded_for: false,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}
