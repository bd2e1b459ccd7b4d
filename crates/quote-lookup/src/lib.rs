#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quote/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Symbol to price lookup with provider fallback.
//!
//! This crate re-exports the core types, the cache stores and the provider
//! implementations, and provides a [`QuoteService`] that tries providers in
//! order until one returns a price.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quote_lookup::{AlphaVantageProvider, FileCache, QuoteService, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> quote_lookup::Result<()> {
//!     let cache = Arc::new(FileCache::new("/tmp/quote_cache.json"));
//!     let service = QuoteService::new()
//!         .with_cache_first(cache)
//!         .with_provider(Arc::new(AlphaVantageProvider::new("api_key")?));
//!
//!     match service.get_price(&Symbol::new("AAPL")).await {
//!         Some(price) => println!("AAPL: {price}"),
//!         None => println!("AAPL: no price"),
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use quote_core::*;

// Cache implementations
pub use quote_cache::{CacheEntry, FileCache, InMemoryCache};

// Providers
#[cfg(feature = "alphavantage")]
pub use quote_alphavantage::{AlphaVantageBuilder, AlphaVantageProvider};
#[cfg(feature = "coingecko")]
pub use quote_coingecko::CoinGeckoProvider;

/// Environment and CLI configuration.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;

mod service;
pub use config::QuoteConfig;
pub use service::QuoteService;
