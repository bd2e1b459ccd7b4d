//! Bounded retry on upstream rate limiting.
//!
//! [`RetryPolicy::run`] owns the retry budget for one logical call. The
//! counter lives on the stack of that call, so nothing carries over to the
//! next request made through the same provider.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::{QuoteError, Result};

/// Default sleep between rate-limited attempts.
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(3);

/// Default number of retries before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Retry-with-sleep on [`QuoteError::RateLimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    enabled: bool,
    sleep: Duration,
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            sleep: DEFAULT_SLEEP,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Misconfigured`] if `sleep_seconds` is negative or
    /// not a finite number.
    pub fn new(enabled: bool, sleep_seconds: f64, max_retries: u32) -> Result<Self> {
        if !sleep_seconds.is_finite() || sleep_seconds < 0.0 {
            return Err(QuoteError::Misconfigured(format!(
                "rate limit sleep seconds must be a non-negative number, got {sleep_seconds}"
            )));
        }

        Ok(Self {
            enabled,
            sleep: Duration::from_secs_f64(sleep_seconds),
            max_retries,
        })
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A policy that retries up to `max_retries` times, sleeping `sleep` in between.
    #[must_use]
    pub const fn enabled(sleep: Duration, max_retries: u32) -> Self {
        Self {
            enabled: true,
            sleep,
            max_retries,
        }
    }

    /// Whether rate-limited calls are retried at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sleep between attempts.
    #[must_use]
    pub const fn sleep(&self) -> Duration {
        self.sleep
    }

    /// Maximum number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `op` until it stops being rate limited or the budget is spent.
    ///
    /// With the policy enabled and an upstream that always throttles, `op`
    /// is attempted `max_retries + 1` times before
    /// [`QuoteError::RetryExhausted`] is returned. Any other outcome of `op`
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates errors from `op`; converts a rate limit that outlasts the
    /// budget into [`QuoteError::RetryExhausted`].
    pub async fn run<T, F, Fut>(&self, provider: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;

        loop {
            match op().await {
                Err(e) if e.is_rate_limited() => {
                    if !self.enabled {
                        return Err(e);
                    }

                    if retries >= self.max_retries {
                        return Err(QuoteError::RetryExhausted {
                            provider: provider.to_string(),
                            attempts: retries + 1,
                        });
                    }

                    warn!(
                        provider,
                        attempt = retries + 1,
                        sleep_secs = self.sleep.as_secs_f64(),
                        "Rate limited, sleeping before retry"
                    );
                    if !self.sleep.is_zero() {
                        sleep(self.sleep).await;
                    }
                    retries += 1;
                }
                other => return other,
            }
        }
    }
}
