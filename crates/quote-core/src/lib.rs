#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quote/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for price quote providers.
//!
//! This crate provides the foundational abstractions for resolving a symbol to a price:
//!
//! - [`QuoteProvider`](provider::QuoteProvider) - Single-symbol price lookup
//! - [`QuoteCache`](cache::QuoteCache) - TTL cache store, itself a provider
//! - [`RetryPolicy`](retry::RetryPolicy) - Bounded retry on rate limiting
//! - [`Clock`](clock::Clock) - Time source for expiry decisions

/// Cache trait for TTL price stores.
pub mod cache;
/// Time sources.
pub mod clock;
/// Error types for quote operations.
pub mod error;
/// Provider trait for fetching prices.
pub mod provider;
/// Rate-limit retry policy.
pub mod retry;
/// Core data types (Symbol, Price).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::QuoteCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{QuoteError, Result};
pub use provider::QuoteProvider;
pub use retry::RetryPolicy;
pub use types::{Price, Symbol};
