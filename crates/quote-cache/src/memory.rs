//! In-memory cache implementation.

use async_trait::async_trait;
use quote_core::{
    Clock, Price, QuoteCache, QuoteError, QuoteProvider, Result, Symbol, SystemClock,
    cache::DEFAULT_TTL,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::entry::CacheEntry;

const PROVIDER_NAME: &str = "InMemoryCache";

/// Price cache held in process memory.
///
/// Same expiry rules as [`FileCache`](crate::FileCache); data is lost when
/// the cache is dropped.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Symbol, CacheEntry>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }
}

impl InMemoryCache {
    /// Create a new empty in-memory cache with a one hour default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty in-memory cache with a custom default TTL.
    #[must_use]
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for expiry decisions instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Raw entry for a symbol, expired or not.
    pub async fn entry(&self, symbol: &Symbol) -> Option<CacheEntry> {
        self.entries.read().await.get(symbol).copied()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl QuoteProvider for InMemoryCache {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &Symbol) -> Result<Price> {
        let mut entries = self.entries.write().await;

        match entries.get(symbol).copied() {
            Some(entry) if !entry.is_expired(self.clock.now()) => {
                debug!("Cache hit");
                Ok(entry.price)
            }
            Some(_) => {
                debug!("Evicting expired entry");
                entries.remove(symbol);
                Err(QuoteError::not_found(PROVIDER_NAME, symbol.as_str()))
            }
            None => {
                debug!("Cache miss");
                Err(QuoteError::not_found(PROVIDER_NAME, symbol.as_str()))
            }
        }
    }
}

#[async_trait]
impl QuoteCache for InMemoryCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn put(
        &self,
        symbol: &Symbol,
        price: Option<Price>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if let Some(price) = price {
            let entry = CacheEntry::new(price, self.clock.now(), ttl.unwrap_or(self.default_ttl));
            self.entries.write().await.insert(symbol.clone(), entry);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Swept {} expired cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
