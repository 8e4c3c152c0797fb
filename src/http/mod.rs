//! HTTP client module
//!
//! Provides the rate-governed request executor for the Notion API.
//!
//! # Features
//!
//! - **Rate Limiting**: Continuously refilling token bucket shared by all callers
//! - **Rate-Limit Recovery**: One reissue after a 429, honoring `Retry-After`
//! - **Error Classification**: Timeout, network, upstream status and empty-body failures

mod client;
mod rate_limit;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_API_VERSION, DEFAULT_BASE_URL,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
