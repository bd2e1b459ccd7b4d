//! Error types for quote operations.
//!
//! This module defines [`QuoteError`] which covers every way a provider or a
//! cache store can fail to produce a price.

use thiserror::Error;

/// Errors that can occur while resolving a price.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Invalid construction parameters (missing API key, negative sleep, ...).
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// The provider has no data for the symbol.
    #[error("Symbol not found by {provider}: {symbol}")]
    NotFound {
        /// The provider that was asked.
        provider: String,
        /// The symbol that was requested.
        symbol: String,
    },

    /// The upstream signaled throttling.
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
    },

    /// The retry policy gave up after repeated rate limiting.
    #[error("Rate limit retries exhausted for {provider} after {attempts} attempts")]
    RetryExhausted {
        /// The provider that kept rate limiting.
        provider: String,
        /// Total number of attempts made, including the first one.
        attempts: u32,
    },

    /// Any other upstream or transport failure.
    #[error("{provider} unavailable: {reason}")]
    Unavailable {
        /// The provider that failed.
        provider: String,
        /// Transport error, HTTP status or decoding failure.
        reason: String,
    },

    /// Error persisting cache state.
    #[error("Cache error: {0}")]
    Cache(String),
}

impl QuoteError {
    /// Creates a [`QuoteError::NotFound`].
    pub fn not_found(provider: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::NotFound {
            provider: provider.into(),
            symbol: symbol.into(),
        }
    }

    /// Creates a [`QuoteError::Unavailable`].
    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`QuoteError::RateLimited`].
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` for [`QuoteError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias using [`QuoteError`].
pub type Result<T> = std::result::Result<T, QuoteError>;
