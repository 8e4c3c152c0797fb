//! Rate limiting implementation
//!
//! A continuously refilling token bucket shared by every request a client
//! makes. Admission suspends the caller until a token exists; the bucket lock
//! is only held for the refill/consume step and is always released before
//! sleeping, so concurrent callers keep making progress while one waits.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Rate statistics are only computed once the window is this old
const MIN_RATE_WINDOW: Duration = Duration::from_millis(100);

/// Length of the request-counting window
const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Upper bound on the computed backoff after an upstream 429
const MAX_BACKOFF_SECS: f64 = 10.0;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    /// Maximum sustained requests per second
    pub requests_per_second: f64,
    /// Fraction of the limit (0, 1] at which admissions start to warn
    pub warning_threshold: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 3.0,
            warning_threshold: 0.8,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: f64, warning_threshold: f64) -> Self {
        Self {
            requests_per_second,
            warning_threshold,
        }
    }

    /// Check that the budget describes a usable limiter
    pub fn validate(&self) -> Result<()> {
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(Error::invalid_value(
                "requests_per_second",
                format!("must be a positive number, got {}", self.requests_per_second),
            ));
        }
        if !self.warning_threshold.is_finite()
            || self.warning_threshold <= 0.0
            || self.warning_threshold > 1.0
        {
            return Err(Error::invalid_value(
                "warning_threshold",
                format!("must be in (0, 1], got {}", self.warning_threshold),
            ));
        }
        Ok(())
    }

    /// Largest number of tokens the bucket can hold
    pub fn capacity(&self) -> f64 {
        self.requests_per_second.max(1.0)
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    window_start: Instant,
    request_count: u64,
}

/// Outcome of one locked admission attempt
enum Admission {
    Granted(Option<String>),
    Wait(Duration),
}

/// Token bucket rate limiter
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config, starting with a full bucket
    pub fn new(config: &RateLimiterConfig) -> Result<Self> {
        config.validate()?;

        let now = Instant::now();
        Ok(Self {
            config: *config,
            state: Mutex::new(BucketState {
                tokens: config.capacity(),
                last_refill: now,
                window_start: now,
                request_count: 0,
            }),
        })
    }

    /// The budget this limiter enforces
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Wait until a request can be made and consume one token.
    ///
    /// Returns a warning message when the rate observed in the current
    /// window has reached the warning threshold. Dropping the future while it
    /// waits consumes nothing.
    pub async fn acquire(&self) -> Option<String> {
        loop {
            match self.try_admit().await {
                Admission::Granted(warning) => return warning,
                Admission::Wait(wait) => {
                    debug!("Rate limiter out of tokens, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Refill, then consume a token if one is available. The guard is dropped
    /// on return, so callers never sleep while holding it.
    async fn try_admit(&self) -> Admission {
        let mut state = self.state.lock().await;
        let rps = self.config.requests_per_second;
        let now = Instant::now();

        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * rps).min(self.config.capacity());
        state.last_refill = now;

        if state.tokens < 1.0 {
            let wait = (1.0 - state.tokens) / rps;
            return Admission::Wait(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX));
        }

        state.tokens -= 1.0;
        state.request_count += 1;

        let window_elapsed = now.duration_since(state.window_start);
        let mut warning = None;
        if window_elapsed > MIN_RATE_WINDOW {
            let current_rate = state.request_count as f64 / window_elapsed.as_secs_f64();
            if current_rate >= rps * self.config.warning_threshold {
                warning = Some(format!(
                    "Approaching rate limit. Current rate: {current_rate:.2} req/s (limit: {rps} req/s)"
                ));
            }
        }

        if window_elapsed >= RATE_WINDOW {
            state.request_count = 0;
            state.window_start = now;
        }

        Admission::Granted(warning)
    }

    /// Back off after the upstream rejected a request with 429.
    ///
    /// This is a plain delay, not an admission: no token is consumed.
    pub async fn handle_rate_limit_error(&self, retry_after: Option<Duration>) {
        let delay = self.backoff_delay(retry_after).await;
        warn!("Rate limited by upstream (429), backing off for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    /// Delay to apply after an upstream 429.
    ///
    /// An explicit `retry_after` is honored exactly; otherwise the delay is
    /// `min(2^(window request count mod 5), 10)` seconds.
    pub async fn backoff_delay(&self, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay;
        }

        let count = self.state.lock().await.request_count;
        let exponent = (count % 5) as i32;
        Duration::from_secs_f64(2f64.powi(exponent).min(MAX_BACKOFF_SECS))
    }

    /// Tokens currently in the bucket, refilled up to now
    pub async fn available_tokens(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = Instant::now()
            .duration_since(state.last_refill)
            .as_secs_f64();
        (state.tokens + elapsed * self.config.requests_per_second).min(self.config.capacity())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
