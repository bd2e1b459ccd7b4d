#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quote/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage equities price provider.
//!
//! This crate implements [`QuoteProvider`] for the Alpha Vantage
//! `GLOBAL_QUOTE` endpoint as exposed by RapidAPI.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quote_alphavantage::AlphaVantageProvider;
//! use quote_core::{QuoteProvider, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = AlphaVantageProvider::builder()
//!         .api_key("your_api_key")
//!         .retry_on_rate_limit(true)
//!         .rate_limit_sleep_seconds(3.0)
//!         .rate_limit_retry_count(10)
//!         .build()?;
//!
//!     let price = provider.fetch(&Symbol::new("AAPL")).await?;
//!     println!("AAPL: {price}");
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use quote_core::{
    Price, QuoteError, QuoteProvider, Result, RetryPolicy, Symbol,
    retry::{DEFAULT_MAX_RETRIES, DEFAULT_SLEEP},
};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// RapidAPI host serving Alpha Vantage.
const ALPHA_VANTAGE_BASE_URL: &str = "https://alpha-vantage.p.rapidapi.com";

const PROVIDER_NAME: &str = "AlphaVantage";

/// Request timeout for the default HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Alpha Vantage price provider.
///
/// One `GLOBAL_QUOTE` request per attempt. Rate limiting is handled by the
/// provider's [`RetryPolicy`].
#[derive(Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
    host: String,
    retry: RetryPolicy,
}

impl fmt::Debug for AlphaVantageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageProvider")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AlphaVantageProvider {
    /// Create a provider with the given API key and no rate-limit retry.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Start building a provider.
    #[must_use]
    pub fn builder() -> AlphaVantageBuilder {
        AlphaVantageBuilder::default()
    }

    /// The retry policy applied to rate-limited requests.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Issue one `GLOBAL_QUOTE` request and extract the price.
    async fn request_price(&self, symbol: &Symbol) -> Result<Price> {
        let url = format!("{}/query", self.base_url);
        debug!(symbol = %symbol, "AlphaVantage request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol.as_str()),
                ("datatype", "json"),
            ])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await
            .map_err(|e| QuoteError::unavailable(PROVIDER_NAME, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| QuoteError::unavailable(PROVIDER_NAME, e.to_string()))?;

        if !status.is_success() {
            return Err(QuoteError::unavailable(
                PROVIDER_NAME,
                format!("HTTP {status}: {text}"),
            ));
        }

        let body: GlobalQuoteResponse = serde_json::from_str(&text)
            .map_err(|e| QuoteError::unavailable(PROVIDER_NAME, format!("{e}: {text}")))?;

        body.check_rate_limit()?;

        let raw = body
            .global_quote
            .and_then(|quote| quote.price)
            .ok_or_else(|| QuoteError::not_found(PROVIDER_NAME, symbol.as_str()))?;

        raw.parse::<Price>().map_err(|e| {
            QuoteError::unavailable(PROVIDER_NAME, format!("invalid price {raw:?}: {e}"))
        })
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<Price> {
        self.retry
            .run(PROVIDER_NAME, move || self.request_price(symbol))
            .await
    }
}

/// Builder for [`AlphaVantageProvider`].
///
/// Defaults: retry disabled, 3 second sleep, 10 retries.
#[derive(Debug, Clone)]
pub struct AlphaVantageBuilder {
    api_key: Option<String>,
    retry_on_rate_limit: bool,
    rate_limit_sleep_seconds: f64,
    rate_limit_retry_count: u32,
    base_url: String,
    client: Option<Client>,
}

impl Default for AlphaVantageBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            retry_on_rate_limit: false,
            rate_limit_sleep_seconds: DEFAULT_SLEEP.as_secs_f64(),
            rate_limit_retry_count: DEFAULT_MAX_RETRIES,
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            client: None,
        }
    }
}

impl AlphaVantageBuilder {
    /// RapidAPI key. Required.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Retry in place when the upstream rate limits.
    #[must_use]
    pub fn retry_on_rate_limit(mut self, enabled: bool) -> Self {
        self.retry_on_rate_limit = enabled;
        self
    }

    /// Seconds to sleep between rate-limited attempts. Must not be negative.
    #[must_use]
    pub fn rate_limit_sleep_seconds(mut self, seconds: f64) -> Self {
        self.rate_limit_sleep_seconds = seconds;
        self
    }

    /// Retries after the first attempt before giving up.
    #[must_use]
    pub fn rate_limit_retry_count(mut self, count: u32) -> Self {
        self.rate_limit_retry_count = count;
        self
    }

    /// Override the API base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a custom HTTP client.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Validate the configuration and build the provider.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] for a missing API key, a
    /// negative sleep, an unusable base URL, or an HTTP client that cannot
    /// be created.
    pub fn build(self) -> Result<AlphaVantageProvider> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| QuoteError::Misconfigured("API key is required".to_string()))?;

        let retry = RetryPolicy::new(
            self.retry_on_rate_limit,
            self.rate_limit_sleep_seconds,
            self.rate_limit_retry_count,
        )?;

        let base_url = self.base_url.trim_end_matches('/').to_string();
        let host = Url::parse(&base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| QuoteError::Misconfigured(format!("invalid base URL: {base_url}")))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| QuoteError::Misconfigured(e.to_string()))?,
        };

        Ok(AlphaVantageProvider {
            client,
            api_key,
            base_url,
            host,
            retry,
        })
    }
}

// ============================================================================
// Alpha Vantage API Response Types
// ============================================================================

/// GLOBAL_QUOTE response.
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl GlobalQuoteResponse {
    /// Alpha Vantage reports throttling in the body of a 200 response.
    fn check_rate_limit(&self) -> Result<()> {
        for msg in [&self.note, &self.information].into_iter().flatten() {
            if msg.contains("API call frequency") || msg.contains("rate limit") {
                return Err(QuoteError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            warn!("Alpha Vantage note: {}", msg);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const SUCCESS_BODY: &str = r#"{
        "Global Quote": {
            "01. symbol": "AAPL",
            "02. open": "212.1450",
            "03. high": "214.6500",
            "04. low": "211.8101",
            "05. price": "213.5500",
            "06. volume": "34955836",
            "07. latest trading day": "2025-07-03",
            "08. previous close": "212.4400",
            "09. change": "1.1100",
            "10. change percent": "0.5225%"
        }
    }"#;

    fn quote_query(symbol: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("function".into(), "GLOBAL_QUOTE".into()),
            Matcher::UrlEncoded("symbol".into(), symbol.into()),
            Matcher::UrlEncoded("datatype".into(), "json".into()),
        ])
    }

    fn provider(server: &ServerGuard) -> AlphaVantageProvider {
        AlphaVantageProvider::builder()
            .api_key("apikey")
            .base_url(server.url())
            .build()
            .unwrap()
    }

    fn retrying_provider(server: &ServerGuard, retries: u32) -> AlphaVantageProvider {
        AlphaVantageProvider::builder()
            .api_key("apikey")
            .base_url(server.url())
            .retry_on_rate_limit(true)
            .rate_limit_sleep_seconds(0.0)
            .rate_limit_retry_count(retries)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_price() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .match_header("x-rapidapi-key", "apikey")
            .match_header("x-rapidapi-host", "127.0.0.1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let price = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(price, "213.55".parse().unwrap());
        assert!(price.is_positive());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_quote_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(quote_query("BLAHBLAH"))
            .with_status(200)
            .with_body(r#"{"Global Quote": {}}"#)
            .create_async()
            .await;

        let err = provider(&server)
            .fetch(&Symbol::new("BLAHBLAH"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let err = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap_err();
        match err {
            QuoteError::Unavailable { reason, .. } => assert!(reason.contains("500")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap_err();
        assert!(matches!(err, QuoteError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_without_retry() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(429)
            .with_body("Rate Limit Exceeded")
            .expect(1)
            .create_async()
            .await;

        let err = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap_err();
        assert!(err.is_rate_limited());
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_note_in_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
            )
            .create_async()
            .await;

        let err = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(429)
            .with_body("Rate Limit Exceeded")
            .expect(4)
            .create_async()
            .await;

        let err = retrying_provider(&server, 3)
            .fetch(&Symbol::new("AAPL"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::RetryExhausted { attempts: 4, .. }));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(200)
            .with_body(SUCCESS_BODY)
            .expect(1)
            .create_async()
            .await;

        let price = retrying_provider(&server, 3)
            .fetch(&Symbol::new("AAPL"))
            .await
            .unwrap();
        assert_eq!(price, "213.5500".parse().unwrap());
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_budget_resets_between_calls() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/query")
            .match_query(quote_query("AAPL"))
            .with_status(429)
            .expect(6)
            .create_async()
            .await;

        let provider = retrying_provider(&server, 2);
        for _ in 0..2 {
            let err = provider.fetch(&Symbol::new("AAPL")).await.unwrap_err();
            assert!(matches!(err, QuoteError::RetryExhausted { attempts: 3, .. }));
        }
        limited.assert_async().await;
    }

    #[test]
    fn test_missing_api_key_is_misconfigured() {
        assert!(matches!(
            AlphaVantageProvider::builder().build(),
            Err(QuoteError::Misconfigured(_))
        ));
        assert!(matches!(
            AlphaVantageProvider::new("  "),
            Err(QuoteError::Misconfigured(_))
        ));
    }

    #[test]
    fn test_negative_sleep_is_misconfigured() {
        let result = AlphaVantageProvider::builder()
            .api_key("apikey")
            .rate_limit_sleep_seconds(-1.0)
            .build();
        assert!(matches!(result, Err(QuoteError::Misconfigured(_))));
    }

    #[test]
    fn test_default_configuration() {
        let provider = AlphaVantageProvider::new("apikey").unwrap();
        assert_eq!(provider.name(), "AlphaVantage");
        assert_eq!(provider.host, "alpha-vantage.p.rapidapi.com");
        assert!(!provider.retry_policy().is_enabled());
        assert_eq!(provider.retry_policy().max_retries(), 10);
        assert_eq!(provider.retry_policy().sleep(), Duration::from_secs(3));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = AlphaVantageProvider::new("secret_key_12345").unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
