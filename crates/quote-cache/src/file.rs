//! JSON file cache implementation.

use async_trait::async_trait;
use quote_core::{
    Clock, Price, QuoteCache, QuoteError, QuoteProvider, Result, Symbol, SystemClock,
    cache::DEFAULT_TTL,
};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::entry::CacheEntry;

const PROVIDER_NAME: &str = "FileCache";

type Entries = BTreeMap<String, CacheEntry>;

/// Price cache persisted as a single JSON document.
///
/// The document maps symbol to `{"price": ..., "expires_at": ...}`. Every
/// operation reloads it from disk first, so several processes can share one
/// file (last writer wins, there is no locking between processes). A
/// missing or unparseable document reads as an empty cache.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileCache {
    /// Create a cache backed by `path` with a one hour default TTL.
    ///
    /// The file is not touched until the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_default_ttl(path, DEFAULT_TTL)
    }

    /// Create a cache backed by `path` with a custom default TTL.
    #[must_use]
    pub fn with_default_ttl(path: impl Into<PathBuf>, default_ttl: Duration) -> Self {
        Self {
            path: path.into(),
            default_ttl,
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    /// Use `clock` for expiry decisions instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, treating anything unreadable as empty.
    async fn load(&self) -> Entries {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Entries::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read cache file");
                return Entries::new();
            }
        };

        if text.trim().is_empty() {
            return Entries::new();
        }

        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unparseable cache file");
                return Entries::new();
            }
        };

        raw.into_iter()
            .filter_map(|(symbol, value)| match serde_json::from_value(value) {
                Ok(entry) => Some((symbol, entry)),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Dropping malformed cache entry");
                    None
                }
            })
            .collect()
    }

    async fn save(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_vec(entries).map_err(|e| QuoteError::Cache(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| QuoteError::Cache(format!("{}: {e}", parent.display())))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| QuoteError::Cache(format!("{}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Saved cache file");
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for FileCache {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch(&self, symbol: &Symbol) -> Result<Price> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;

        let Some(entry) = entries.get(symbol.as_str()).copied() else {
            debug!("Cache miss");
            return Err(QuoteError::not_found(PROVIDER_NAME, symbol.as_str()));
        };

        if entry.is_expired(self.clock.now()) {
            debug!(expires_at = entry.expires_at, "Evicting expired entry");
            entries.remove(symbol.as_str());
            if let Err(e) = self.save(&entries).await {
                warn!(error = %e, "Failed to persist eviction");
            }
            return Err(QuoteError::not_found(PROVIDER_NAME, symbol.as_str()));
        }

        debug!("Cache hit");
        Ok(entry.price)
    }
}

#[async_trait]
impl QuoteCache for FileCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn put(
        &self,
        symbol: &Symbol,
        price: Option<Price>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let Some(price) = price else {
            return Ok(());
        };

        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;

        let entry = CacheEntry::new(price, self.clock.now(), ttl.unwrap_or(self.default_ttl));
        entries.insert(symbol.to_string(), entry);
        self.save(&entries).await
    }

    #[instrument(skip(self))]
    async fn sweep_expired(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await;
        let now = self.clock.now();

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        if removed > 0 {
            self.save(&entries).await?;
            debug!("Swept {} expired cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared cache file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuoteError::Cache(format!("{}: {e}", self.path.display()))),
        }
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
