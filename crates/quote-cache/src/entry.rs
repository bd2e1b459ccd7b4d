//! Cached price with an absolute expiry.

use quote_core::Price;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached price and the unix second at which it stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached price.
    pub price: Price,
    /// Unix timestamp (seconds) at which the entry expires.
    pub expires_at: i64,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` after `now`.
    #[must_use]
    pub fn new(price: Price, now: i64, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            price,
            expires_at: now.saturating_add(ttl_secs),
        }
    }

    /// Expired at `now`. The boundary second counts as expired.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
