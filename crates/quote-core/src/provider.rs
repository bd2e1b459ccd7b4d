//! Provider trait for fetching prices.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{Price, Symbol},
};

/// A source of prices for single symbols.
///
/// Implemented by every live provider and by every cache store, so a cache
/// can sit in a fallback chain like any other source.
#[async_trait]
pub trait QuoteProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "AlphaVantage").
    fn name(&self) -> &str;

    /// Fetches the current price for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::NotFound`](crate::QuoteError::NotFound) when the
    /// provider has no price for the symbol, and one of the other kinds when
    /// the upstream throttled or failed.
    async fn fetch(&self, symbol: &Symbol) -> Result<Price>;
}
