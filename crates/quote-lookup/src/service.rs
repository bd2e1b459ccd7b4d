//! Lookup service trying providers in order with cache write-through.

use std::sync::Arc;

use tracing::{debug, warn};

use quote_core::{Price, QuoteCache, QuoteProvider, Symbol};

/// Resolves symbols to prices through an ordered list of providers.
///
/// Providers are tried one after another until one returns a price. Errors
/// are logged and skipped, so a lookup that no provider can satisfy yields
/// `None` rather than an error. When a cache is configured, a price found by
/// any other provider is written into it.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use quote_lookup::{CoinGeckoProvider, FileCache, QuoteService, Symbol};
///
/// let service = QuoteService::new()
///     .with_cache_first(Arc::new(FileCache::new("quotes.json")))
///     .with_provider(Arc::new(CoinGeckoProvider::new("demo_key")?));
///
/// let btc = service.get_price(&Symbol::new("BTC.CRYPTO")).await;
/// ```
#[derive(Default)]
pub struct QuoteService {
    providers: Vec<Arc<dyn QuoteProvider>>,
    cache: Option<Arc<dyn QuoteCache>>,
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("providers", &self.providers())
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl QuoteService {
    /// Create a new service with no providers and no cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider to the end of the chain.
    pub fn register(&mut self, provider: Arc<dyn QuoteProvider>) {
        debug!(provider = provider.name(), "Registering quote provider");
        self.providers.push(provider);
    }

    /// Set the write-through cache.
    ///
    /// This does not add the cache to the provider chain; use
    /// [`with_cache_first`](Self::with_cache_first) for that.
    pub fn set_cache(&mut self, cache: Arc<dyn QuoteCache>) {
        self.cache = Some(cache);
    }

    /// Append a provider to the end of the chain.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Set the write-through cache without reading from it.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn QuoteCache>) -> Self {
        self.set_cache(cache);
        self
    }

    /// Use `cache` both as the next provider in the chain and as the
    /// write-through target.
    #[must_use]
    pub fn with_cache_first<C>(mut self, cache: Arc<C>) -> Self
    where
        C: QuoteCache + 'static,
    {
        self.register(cache.clone());
        self.set_cache(cache);
        self
    }

    /// Names of the providers, in lookup order.
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// The write-through cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<dyn QuoteCache>> {
        self.cache.as_ref()
    }

    /// Whether `provider` is the write-through cache itself.
    fn is_cache(&self, provider: &Arc<dyn QuoteProvider>) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| std::ptr::addr_eq(Arc::as_ptr(cache), Arc::as_ptr(provider)))
    }

    /// Fetch a price, trying providers in order until one succeeds.
    ///
    /// Returns `None` when every provider fails. A price that came from a
    /// provider other than the cache is written to the cache with its
    /// default TTL; a price served by the cache is returned as is, so cache
    /// hits never extend an entry's expiry.
    pub async fn get_price(&self, symbol: &Symbol) -> Option<Price> {
        for provider in &self.providers {
            debug!(
                provider = provider.name(),
                symbol = %symbol,
                "Looking up price"
            );

            match provider.fetch(symbol).await {
                Ok(price) => {
                    if let Some(cache) = &self.cache {
                        if !self.is_cache(provider) {
                            if let Err(e) = cache.put(symbol, Some(price), None).await {
                                warn!(
                                    provider = provider.name(),
                                    error = %e,
                                    "Failed to cache price"
                                );
                            }
                        }
                    }
                    return Some(price);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        symbol = %symbol,
                        error = %e,
                        "Provider failed, trying next"
                    );
                }
            }
        }

        debug!(symbol = %symbol, "No provider returned a price");
        None
    }

    /// Fetch prices for several symbols, one after another.
    pub async fn get_prices(&self, symbols: &[Symbol]) -> Vec<(Symbol, Option<Price>)> {
        let mut prices = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            prices.push((symbol.clone(), self.get_price(symbol).await));
        }
        prices
    }
}
