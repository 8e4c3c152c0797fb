//! Error types for notion-pacer
//!
//! Every failure surfaced by the client is one [`Error`]. Callers branch on
//! [`Error::kind`] rather than on individual variants, and read the upstream
//! status code, when there is one, through [`Error::status`].

use std::fmt;
use thiserror::Error;

/// The closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required input was missing or blank; the network was never touched
    Validation,
    /// The transport exceeded the configured deadline
    Timeout,
    /// The connection could not be established or was dropped
    Network,
    /// The upstream answered with a non-2xx status
    UpstreamStatus,
    /// The upstream answered 2xx without a usable body
    EmptyResponse,
    /// Configuration could not be loaded or is invalid
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::UpstreamStatus => "upstream_status",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// The main error type for notion-pacer
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("{message}")]
    Validation { message: String },

    #[error("Request to Notion API timed out after {}s", format_secs(.timeout_ms))]
    Timeout { timeout_ms: u64 },

    #[error("Network error connecting to Notion API: {message}")]
    Network { message: String },

    #[error("Notion API error ({status}): {detail}")]
    UpstreamStatus { status: u16, detail: String },

    #[error("{message}")]
    EmptyResponse { message: String },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an upstream status error
    pub fn upstream_status(status: u16, detail: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            status,
            detail: detail.into(),
        }
    }

    /// Create an empty-response error
    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::EmptyResponse {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The category of this error, looking through any added context
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Network { .. } => ErrorKind::Network,
            Error::UpstreamStatus { .. } => ErrorKind::UpstreamStatus,
            Error::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Error::Context { source, .. } => source.kind(),
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::Io(_) => ErrorKind::Config,
        }
    }

    /// The upstream HTTP status, if the upstream rejected the call
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UpstreamStatus { status, .. } => Some(*status),
            Error::Context { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Wrap this error with a description of what was being attempted
    #[must_use]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Render a millisecond timeout as seconds without trailing zeros
fn format_secs(timeout_ms: &u64) -> String {
    let secs = *timeout_ms as f64 / 1000.0;
    format!("{secs}")
}

/// Result type alias for notion-pacer
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner: Error = e.into();
            inner.with_context(message)
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner: Error = e.into();
            inner.with_context(f())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("Page ID is required and cannot be empty");
        assert_eq!(err.to_string(), "Page ID is required and cannot be empty");

        let err = Error::upstream_status(404, "Parent not found");
        assert_eq!(err.to_string(), "Notion API error (404): Parent not found");

        let err = Error::Timeout { timeout_ms: 30_000 };
        assert_eq!(err.to_string(), "Request to Notion API timed out after 30s");

        let err = Error::Timeout { timeout_ms: 250 };
        assert_eq!(
            err.to_string(),
            "Request to Notion API timed out after 0.25s"
        );

        let err = Error::missing_field("api_key");
        assert_eq!(err.to_string(), "Missing required config field: api_key");
    }

    #[test]
    fn test_kind_and_status() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::network("x").kind(), ErrorKind::Network);
        assert_eq!(Error::empty_response("x").kind(), ErrorKind::EmptyResponse);
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);

        let err = Error::upstream_status(429, "slow down");
        assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
        assert_eq!(err.status(), Some(429));
        assert_eq!(Error::network("x").status(), None);
    }

    #[test]
    fn test_context_preserves_kind() {
        let err = Error::upstream_status(404, "Parent not found")
            .with_context("Failed to create page with title 'Notes'");

        assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "Failed to create page with title 'Notes': Notion API error (404): Parent not found"
        );
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::Timeout { timeout_ms: 1000 });
        let err = result.context("Failed to retrieve page abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err
            .to_string()
            .contains("Failed to retrieve page abc: Request to Notion API timed out after 1s"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::UpstreamStatus.to_string(), "upstream_status");
        assert_eq!(ErrorKind::EmptyResponse.to_string(), "empty_response");
    }
}
