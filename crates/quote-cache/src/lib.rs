#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quote/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! TTL cache stores for price quotes.
//!
//! This crate provides implementations of the [`QuoteCache`] trait from `quote-core`:
//!
//! - [`FileCache`] - Persistent JSON file cache
//! - [`InMemoryCache`] - Process-local cache for embedding and testing

/// Cache entry type shared by the stores.
pub mod entry;
/// JSON file cache implementation.
pub mod file;
/// In-memory cache implementation.
pub mod memory;

// Re-export the trait for convenience
pub use quote_core::QuoteCache;

// Re-export implementations
pub use entry::CacheEntry;
pub use file::FileCache;
pub use memory::InMemoryCache;
