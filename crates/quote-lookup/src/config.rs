//! Service configuration from environment variables and CLI flags.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser};
use quote_cache::FileCache;
use quote_core::{QuoteError, Result, cache::DEFAULT_TTL};

use crate::QuoteService;

/// Settings for the providers, the cache and logging.
///
/// Every field can be set through its environment variable or the matching
/// long flag. Missing API keys leave the corresponding provider out of the
/// chain and a missing cache path runs without a cache.
#[derive(Debug, Clone, Args)]
pub struct QuoteConfig {
    /// Alpha Vantage (RapidAPI) key.
    #[arg(long, env = "ALPHA_VANTAGE_API_KEY", hide_env_values = true)]
    pub alpha_vantage_api_key: Option<String>,

    /// Retry Alpha Vantage requests that hit the rate limit.
    ///
    /// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`.
    #[arg(
        long,
        env = "ALPHA_VANTAGE_RETRY_ON_RATE_LIMIT",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub alpha_vantage_retry_on_rate_limit: bool,

    /// Seconds to sleep between rate-limit retries.
    #[arg(long, env = "ALPHA_VANTAGE_RATE_LIMIT_SLEEP_SECONDS", default_value_t = 3.0)]
    pub alpha_vantage_rate_limit_sleep_seconds: f64,

    /// Retries allowed after the first rate-limited attempt.
    #[arg(long, env = "ALPHA_VANTAGE_RATE_LIMIT_RETRY_COUNT", default_value_t = 10)]
    pub alpha_vantage_rate_limit_retry_count: u32,

    /// CoinGecko demo API key.
    #[arg(long, env = "COIN_GECKO_API_KEY", hide_env_values = true)]
    pub coin_gecko_api_key: Option<String>,

    /// Path of the JSON cache file.
    #[arg(long, env = "QUOTE_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    /// Lifetime of cached prices, in seconds.
    #[arg(long, env = "QUOTE_CACHE_TTL_SECONDS", default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl_seconds: u64,

    /// Log filter directive, e.g. `error` or `quote_lookup=debug`.
    #[arg(long, env = "QUOTE_LOG_LEVEL", default_value = "error")]
    pub log_level: String,
}

/// Parser used when no command line is involved.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
struct FromEnv {
    #[command(flatten)]
    config: QuoteConfig,
}

impl QuoteConfig {
    /// Load the configuration from flags, falling back to the environment.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] if a flag or variable is invalid.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        FromEnv::try_parse_from(args)
            .map(|parsed| parsed.config)
            .map_err(|e| QuoteError::Misconfigured(e.to_string()))
    }

    /// Cache lifetime as a [`Duration`].
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// The configured file cache, if a path is set.
    #[must_use]
    pub fn file_cache(&self) -> Option<FileCache> {
        self.cache_path
            .as_ref()
            .map(|path| FileCache::with_default_ttl(path, self.cache_ttl()))
    }

    /// Assemble the lookup service.
    ///
    /// The chain is: file cache (when a path is set), CoinGecko (when keyed),
    /// then Alpha Vantage (when keyed). The cache is also the write-through
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] if a provider rejects its settings.
    pub fn build_service(&self) -> Result<QuoteService> {
        let mut service = QuoteService::new();

        if let Some(cache) = self.file_cache() {
            tracing::debug!(path = %cache.path().display(), "Using file cache");
            service = service.with_cache_first(Arc::new(cache));
        }

        #[cfg(feature = "coingecko")]
        if let Some(key) = non_empty(self.coin_gecko_api_key.as_deref()) {
            let provider = quote_coingecko::CoinGeckoProvider::new(key)?;
            service.register(Arc::new(provider));
        }

        #[cfg(feature = "alphavantage")]
        if let Some(key) = non_empty(self.alpha_vantage_api_key.as_deref()) {
            let provider = quote_alphavantage::AlphaVantageProvider::builder()
                .api_key(key)
                .retry_on_rate_limit(self.alpha_vantage_retry_on_rate_limit)
                .rate_limit_sleep_seconds(self.alpha_vantage_rate_limit_sleep_seconds)
                .rate_limit_retry_count(self.alpha_vantage_rate_limit_retry_count)
                .build()?;
            service.register(Arc::new(provider));
        }

        tracing::debug!(providers = ?service.providers(), "Quote service ready");
        Ok(service)
    }
}

#[cfg(any(feature = "coingecko", feature = "alphavantage"))]
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
