//! Cache trait for TTL price stores.
//!
//! This module defines the [`QuoteCache`] trait. A cache is also a
//! [`QuoteProvider`]: reading from it uses the same `fetch` contract as a
//! live provider, so it can be placed first in a fallback chain.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::Result,
    provider::QuoteProvider,
    types::{Price, Symbol},
};

/// Default time-to-live for cached prices (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Write side of a TTL price store.
///
/// `fetch` (from [`QuoteProvider`]) fails with `NotFound` both for absent
/// and for expired entries. An entry is valid iff `now < expires_at`.
#[async_trait]
pub trait QuoteCache: QuoteProvider {
    /// Stores a price for `ttl`, or for [`default_ttl`](Self::default_ttl) when `None`.
    ///
    /// A `None` price is a no-op. Any existing entry for the symbol is
    /// overwritten unconditionally.
    async fn put(&self, symbol: &Symbol, price: Option<Price>, ttl: Option<Duration>)
    -> Result<()>;

    /// Removes every expired entry.
    ///
    /// Returns the number of entries removed.
    async fn sweep_expired(&self) -> Result<usize>;

    /// Removes all cached data.
    async fn clear(&self) -> Result<()>;

    /// TTL applied by [`put`](Self::put) when none is given.
    fn default_ttl(&self) -> Duration;
}
