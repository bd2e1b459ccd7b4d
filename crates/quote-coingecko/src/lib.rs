#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quote/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! CoinGecko crypto price provider.
//!
//! # Example
//!
//! ```no_run
//! use quote_coingecko::CoinGeckoProvider;
//! use quote_core::{QuoteProvider, Symbol};
//!
//! # async fn example() -> quote_core::Result<()> {
//! let provider = CoinGeckoProvider::new("demo_api_key")?;
//! let price = provider.fetch(&Symbol::new("BTC.CRYPTO")).await?;
//! println!("BTC: {price}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use quote_core::{Price, QuoteError, QuoteProvider, Result, Symbol};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// CoinGecko public API base URL.
const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Suffix marking a symbol as a crypto asset.
pub const CRYPTO_SUFFIX: &str = ".CRYPTO";

/// Quote currency for all prices.
const VS_CURRENCY: &str = "usd";

const PROVIDER_NAME: &str = "CoinGecko";

/// Request timeout for the default HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CoinGecko price provider for `.CRYPTO` symbols.
#[derive(Clone)]
pub struct CoinGeckoProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for CoinGeckoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinGeckoProvider")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CoinGeckoProvider {
    /// Create a new CoinGecko provider with the given demo API key.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| QuoteError::Misconfigured(e.to_string()))?;
        Ok(Self::with_client(client, api_key))
    }

    /// Create a new CoinGecko provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: COINGECKO_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bare coin identifier for a `.CRYPTO` symbol.
    fn coin_for(symbol: &Symbol) -> Option<&str> {
        symbol
            .as_str()
            .strip_suffix(CRYPTO_SUFFIX)
            .filter(|coin| !coin.is_empty())
    }

    async fn fetch_markets(&self, coin: &str) -> Result<Vec<CoinMarket>> {
        let url = format!("{}/coins/markets", self.base_url);
        debug!(coin, "CoinGecko request");

        let response = self
            .client
            .get(&url)
            .query(&[("vs_currency", VS_CURRENCY), ("symbols", coin)])
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
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

        serde_json::from_str(&text)
            .map_err(|e| QuoteError::unavailable(PROVIDER_NAME, format!("{e}: {text}")))
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<Price> {
        let coin = Self::coin_for(symbol)
            .ok_or_else(|| QuoteError::not_found(PROVIDER_NAME, symbol.as_str()))?;

        let markets = self.fetch_markets(coin).await?;

        let current = markets
            .into_iter()
            .next()
            .and_then(|market| market.current_price)
            .ok_or_else(|| QuoteError::not_found(PROVIDER_NAME, symbol.as_str()))?;

        Price::from_str(&current.to_string()).map_err(|e| {
            QuoteError::unavailable(PROVIDER_NAME, format!("invalid price {current}: {e}"))
        })
    }
}

// ============================================================================
// CoinGecko API Response Types
// ============================================================================

/// One row of the `coins/markets` response.
#[derive(Debug, Clone, Deserialize)]
struct CoinMarket {
    current_price: Option<serde_json::Number>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use rust_decimal_macros::dec;

    fn markets_query(coin: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("vs_currency".into(), "usd".into()),
            Matcher::UrlEncoded("symbols".into(), coin.into()),
        ])
    }

    fn provider(server: &ServerGuard) -> CoinGeckoProvider {
        CoinGeckoProvider::new("demo_key")
            .unwrap()
            .with_base_url(server.url())
    }

    #[tokio::test]
    async fn test_symbol_without_suffix_is_not_found() {
        let mut server = Server::new_async().await;
        let never = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = provider(&server).fetch(&Symbol::new("AAPL")).await.unwrap_err();
        assert!(err.is_not_found());

        let err = provider(&server)
            .fetch(&Symbol::new(".CRYPTO"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        never.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_markets_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(markets_query("BLAHBLAH"))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = provider(&server)
            .fetch(&Symbol::new("BLAHBLAH.CRYPTO"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_btc() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(markets_query("BTC"))
            .match_header("x-cg-demo-api-key", "demo_key")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(r#"[{"id": "bitcoin", "symbol": "btc", "current_price": 118395}]"#)
            .create_async()
            .await;

        let price = provider(&server).fetch(&Symbol::new("BTC.CRYPTO")).await.unwrap();
        assert_eq!(price.amount(), dec!(118395));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_eth_keeps_decimals() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(markets_query("ETH"))
            .with_status(200)
            .with_body(r#"[{"id": "ethereum", "symbol": "eth", "current_price": 3588.52}]"#)
            .create_async()
            .await;

        let price = provider(&server).fetch(&Symbol::new("ETH.CRYPTO")).await.unwrap();
        assert_eq!(price.amount(), dec!(3588.52));
    }

    #[tokio::test]
    async fn test_null_price_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id": "dead", "current_price": null}]"#)
            .create_async()
            .await;

        let err = provider(&server)
            .fetch(&Symbol::new("DEAD.CRYPTO"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(markets_query("BTC"))
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/coins/markets")
            .match_query(markets_query("ETH"))
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let provider = provider(&server);
        assert!(
            provider
                .fetch(&Symbol::new("BTC.CRYPTO"))
                .await
                .unwrap_err()
                .is_rate_limited()
        );
        assert!(matches!(
            provider.fetch(&Symbol::new("ETH.CRYPTO")).await,
            Err(QuoteError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_coin_for() {
        assert_eq!(
            CoinGeckoProvider::coin_for(&Symbol::new("BTC.CRYPTO")),
            Some("BTC")
        );
        assert_eq!(CoinGeckoProvider::coin_for(&Symbol::new("BTC")), None);
        assert_eq!(CoinGeckoProvider::coin_for(&Symbol::new("btc.crypto")), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = CoinGeckoProvider::new("secret_key_12345").unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
