//! # notion-pacer
//!
//! A rate-governed client for the Notion API. Every call draws from one
//! shared token bucket, upstream 429 rejections are recovered with a single
//! backed-off retry, and every failure is classified into one error type.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use notion_pacer::{config::Settings, cli::build_client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load(None)?;
//!     let notion = build_client(&settings)?;
//!
//!     let page = notion.retrieve_page("12345678123412341234123456789abc").await?;
//!     println!("{page}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  tools::ToolDispatcher / cli          (front ends)         │
//! └──────────────────────────────┬───────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────┐
//! │  pages::NotionClient    validate → canonicalize ids       │
//! └──────────────────────────────┬───────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────┐
//! │  http::HttpClient       acquire → send → 429? retry once  │
//! │  http::RateLimiter      token bucket, lock never held     │
//! │                         across a sleep                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Identifier canonicalization
pub mod ids;

/// HTTP client with rate limiting
pub mod http;

/// Page retrieval and creation
pub mod pages;

/// Settings loading
pub mod config;

/// Tool definitions and dispatch
pub mod tools;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use http::{HttpClient, HttpClientConfig, RateLimiter, RateLimiterConfig};
pub use pages::NotionClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
