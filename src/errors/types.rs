//! # Error Types
//!
//! Error taxonomy shared by every provider client and the purge orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ProviderKind;

/// Custom result type for gateway operations
pub type Result<T> = std::result::Result<T, CdnError>;

/// Coarse error classification exposed to hosts for programmatic branching.
///
/// A host typically shows a "reconnect" prompt on [`ErrorKind::AuthError`]
/// and a "wait and retry" prompt on [`ErrorKind::RateLimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredentials,
    InvalidInput,
    AuthError,
    RateLimited,
    Timeout,
    UpstreamError,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingCredentials => "missing_credentials",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the CDN gateway
#[derive(thiserror::Error, Debug)]
pub enum CdnError {
    /// A required credential field is absent or blank
    #[error("Missing credentials for {provider}: '{field}' is not configured")]
    MissingCredentials { provider: ProviderKind, field: String },

    /// Caller supplied an unusable request (empty URL list, malformed URL, ...)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The vendor rejected the configured credentials
    #[error("{provider} rejected the credentials: {message}")]
    Auth { provider: ProviderKind, message: String },

    /// The vendor throttled the request
    #[error("{provider} rate limit exceeded: {message}")]
    RateLimited {
        provider: ProviderKind,
        message: String,
        retry_after: Option<u64>,
    },

    /// The outbound call did not complete in time
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// The vendor answered with a non-success payload
    #[error("{message}")]
    Upstream {
        provider: ProviderKind,
        status: u16,
        message: String,
    },

    /// A zone or distribution could not be found
    #[error("No {resource} found matching '{name}'")]
    NotFound { resource: String, name: String },

    /// Programmer or configuration-construction errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CdnError {
    /// Create a missing credentials error
    pub fn missing_credentials<F: Into<String>>(provider: ProviderKind, field: F) -> Self {
        Self::MissingCredentials { provider, field: field.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(provider: ProviderKind, message: S) -> Self {
        Self::Auth { provider, message: message.into() }
    }

    /// Create a rate limit error
    pub fn rate_limited<S: Into<String>>(provider: ProviderKind, message: S) -> Self {
        Self::RateLimited { provider, message: message.into(), retry_after: None }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create an upstream error carrying the vendor message verbatim
    pub fn upstream<S: Into<String>>(provider: ProviderKind, status: u16, message: S) -> Self {
        Self::Upstream { provider, status, message: message.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, N: Into<String>>(resource: R, name: N) -> Self {
        Self::NotFound { resource: resource.into(), name: name.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Attach a `Retry-After` hint to a rate limit error
    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        if let CdnError::RateLimited { retry_after, .. } = &mut self {
            *retry_after = seconds;
        }
        self
    }

    /// Classify this error for hosts
    pub fn kind(&self) -> ErrorKind {
        match self {
            CdnError::MissingCredentials { .. } => ErrorKind::MissingCredentials,
            CdnError::InvalidInput { .. } => ErrorKind::InvalidInput,
            CdnError::Auth { .. } => ErrorKind::AuthError,
            CdnError::RateLimited { .. } => ErrorKind::RateLimited,
            CdnError::Timeout { .. } => ErrorKind::Timeout,
            CdnError::Upstream { .. } => ErrorKind::UpstreamError,
            CdnError::NotFound { .. } => ErrorKind::NotFound,
            CdnError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Check if the orchestrator may retry the failed exchange
    pub fn is_retryable(&self) -> bool {
        matches!(self, CdnError::RateLimited { .. } | CdnError::Timeout { .. })
    }

    /// Vendor `Retry-After` hint in seconds, for rate limit errors
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            CdnError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Message surfaced to operators. Vendor text is passed through untouched.
    pub fn message(&self) -> String {
        match self {
            CdnError::Auth { message, .. }
            | CdnError::RateLimited { message, .. }
            | CdnError::Upstream { message, .. }
            | CdnError::InvalidInput { message }
            | CdnError::Internal { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CdnError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("JSON serialization failed: {}", error))
    }
}

impl From<reqwest::Error> for CdnError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::timeout("HTTP request", 0);
        }
        let status = error.status().map(|s| s.as_u16()).unwrap_or(0);
        let message = if error.is_decode() {
            format!("Undecodable vendor response: {}", error)
        } else {
            format!("HTTP request failed: {}", error)
        };
        Self::Upstream { provider: ProviderKind::None, status, message }
    }
}

impl From<config::ConfigError> for CdnError {
    fn from(error: config::ConfigError) -> Self {
        Self::internal(format!("Configuration loading failed: {}", error))
    }
}

impl From<validator::ValidationErrors> for CdnError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::internal(format!("Settings validation failed: {}", message))
    }
}
