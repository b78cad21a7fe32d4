//! Core error types

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AssistError>;

/// Errors produced by the assistant core.
///
/// The enum is `Clone` so that a failed stream can keep its error inside the
/// [`StreamReport`](crate::aggregator::StreamReport) it hands back to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistError {
    /// No usable credential, or an invalid local configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Network-level failure talking to the remote service.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The remote service answered with a non-success status.
    #[error("API error: {code} - {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The remote service rejected the credential.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The SSE stream broke after it was opened.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A payload from the remote service could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The remote service refused to produce content for safety reasons.
    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    /// The remote service answered successfully but without any text.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Caller supplied input that cannot be sent (e.g. blank prompt).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation was aborted through a cancel handle.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The remote service stopped delivering data in time.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The key-value store could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The tracing subscriber could not be installed.
    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),
}

/// Coarse classification of [`AssistError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid local configuration; nothing was sent.
    Configuration,
    /// Opening or continuing a remote call failed.
    Transport,
    /// The remote service blocked the content.
    Blocked,
    /// The caller supplied unusable input.
    Client,
    /// The caller aborted the operation.
    Cancelled,
    /// Local persistence or process setup failed.
    Storage,
}

impl AssistError {
    /// Create an API error without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error carrying the raw error payload.
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::HttpError(_)
            | Self::ApiError { .. }
            | Self::AuthenticationError(_)
            | Self::StreamError(_)
            | Self::ParseError(_)
            | Self::EmptyResponse(_)
            | Self::TimeoutError(_) => ErrorCategory::Transport,
            Self::ContentBlocked(_) => ErrorCategory::Blocked,
            Self::InvalidInput(_) => ErrorCategory::Client,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::StorageError(_) | Self::TelemetryInit(_) => ErrorCategory::Storage,
        }
    }

    /// Whether the error came from the remote call itself.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Short human-readable message without the variant prefix.
    ///
    /// This is the text placed into an errored turn.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { code, message, .. } => format!("{message} (status {code})"),
            Self::ConfigurationError(m)
            | Self::HttpError(m)
            | Self::AuthenticationError(m)
            | Self::StreamError(m)
            | Self::ParseError(m)
            | Self::ContentBlocked(m)
            | Self::EmptyResponse(m)
            | Self::InvalidInput(m)
            | Self::Cancelled(m)
            | Self::TimeoutError(m)
            | Self::StorageError(m)
            | Self::TelemetryInit(m) => m.clone(),
        }
    }

    /// Prefix transport failures with the name of the operation that issued them.
    ///
    /// Authentication, blocking and local errors are returned unchanged so their
    /// wording reaches the user as-is.
    pub fn in_operation(self, operation: &str) -> Self {
        match self {
            Self::HttpError(m) => {
                Self::HttpError(format!("Gemini API request for {operation} failed: {m}"))
            }
            Self::StreamError(m) => {
                Self::StreamError(format!("Gemini API request for {operation} failed: {m}"))
            }
            Self::ApiError {
                code,
                message,
                details,
            } => Self::ApiError {
                code,
                message: format!("Gemini API request for {operation} failed: {message}"),
                details,
            },
            other => other,
        }
    }
}
