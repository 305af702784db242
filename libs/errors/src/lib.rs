//! Unified error handling for the catalog transfer services
//!
//! This module provides the shared error type used at service boundaries,
//! plus a trait that service-specific error enums implement to get a common
//! error code, category and HTTP mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// ErrorInfo - API error response type
// ============================================================================

/// Standard error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (HTTP status or custom)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field-specific errors for validation
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_errors: HashMap<String, Vec<String>>,
}

impl ErrorInfo {
    /// Create a new ErrorInfo with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
            field_errors: HashMap::new(),
        }
    }

    /// Set the error code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Add a field error
    pub fn add_field_error(mut self, field: impl Into<String>, error: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(error.into());
        self
    }
}

// ============================================================================
// TransferError - Main error type
// ============================================================================

/// Main error type shared by the transfer service and its libraries
#[derive(Debug, Error)]
pub enum TransferError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // ======================================
    // Database Errors
    // ======================================
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection failed: {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    // ======================================
    // Reconciliation Errors
    // ======================================
    #[error("Fetch failed: {side}: {reason}")]
    FetchFailed { side: String, reason: String },

    #[error("Duplicate tag '{tag}' in {side} set")]
    DuplicateTag { side: String, tag: String },

    #[error("Unknown catalog: {0}")]
    UnknownCatalog(String),

    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ======================================
    // Service & Runtime Errors
    // ======================================
    #[error("Service startup failed: {0}")]
    StartupFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TransferError
pub type TransferResult<T> = Result<T, TransferError>;

impl TransferError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::UnknownCatalog(_) => 404,

            Self::ResourceBusy(_) => 409,

            Self::DuplicateTag { .. } => 422,

            Self::FetchFailed { .. } | Self::ConnectionFailed { .. } => 502,

            Self::StartupFailed(_) => 503,

            Self::Configuration(_)
            | Self::InvalidConfig { .. }
            | Self::MissingConfig(_)
            | Self::Database(_)
            | Self::Sql(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ResourceBusy(_)
                | Self::ConnectionFailed { .. }
                | Self::FetchFailed { .. }
        )
    }

    /// Convert to API ErrorInfo for HTTP responses
    pub fn to_error_info(&self) -> ErrorInfo {
        let mut error_info = ErrorInfo::new(self.to_string()).with_code(self.status_code());

        match self {
            Self::InvalidConfig { field, reason } => {
                error_info = error_info.add_field_error(field, reason);
            },
            Self::DuplicateTag { side, tag } => {
                error_info = error_info.add_field_error(side, format!("duplicate tag '{}'", tag));
            },
            Self::ConnectionFailed { endpoint, reason } => {
                error_info = error_info.with_details(format!("{}: {}", endpoint, reason));
            },
            _ => {},
        }

        error_info
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<figment::Error> for TransferError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

// ============================================================================
// TransferError implements TransferErrorTrait
// ============================================================================

impl TransferErrorTrait for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::MissingConfig(_) => "MISSING_CONFIG",

            Self::Database(_) => "DATABASE_ERROR",
            Self::Sql(_) => "SQL_ERROR",
            Self::ConnectionFailed { .. } => "CONNECTION_FAILED",

            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::DuplicateTag { .. } => "DUPLICATE_TAG",
            Self::UnknownCatalog(_) => "UNKNOWN_CATALOG",
            Self::ResourceBusy(_) => "RESOURCE_BUSY",

            Self::NotFound { .. } => "NOT_FOUND",

            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",

            Self::StartupFailed(_) => "STARTUP_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Other(_) => "OTHER_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } | Self::MissingConfig(_) => {
                ErrorCategory::Configuration
            },

            Self::Database(_) | Self::Sql(_) => ErrorCategory::Database,

            Self::ConnectionFailed { .. } => ErrorCategory::Connection,

            Self::FetchFailed { .. } => ErrorCategory::Network,

            Self::DuplicateTag { .. } => ErrorCategory::Validation,

            Self::NotFound { .. } | Self::UnknownCatalog(_) => ErrorCategory::NotFound,

            Self::ResourceBusy(_) => ErrorCategory::Conflict,

            Self::Io(_)
            | Self::Serialization(_)
            | Self::StartupFailed(_)
            | Self::Internal(_) => ErrorCategory::Internal,

            Self::Other(_) => ErrorCategory::Unknown,
        }
    }
}

// ============================================================================
// Error Trait - Architectural layer
// ============================================================================

/// Error category enum - used for classification and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    // Infrastructure layer
    Configuration,
    Database,
    Network,
    Connection,

    // Business logic layer
    Validation,
    NotFound,
    Conflict,

    // System level
    Internal,

    // Others
    Unknown,
}

/// Error capability trait
///
/// Each service keeps its own domain-specific error enum and gains a common
/// outward-facing interface by implementing this trait.
pub trait TransferErrorTrait: std::error::Error + Send + Sync + 'static {
    /// Get error code (for API and logs)
    fn error_code(&self) -> &'static str;

    /// Get error category
    fn category(&self) -> ErrorCategory;

    /// Whether the error is retryable (default implementation is category-based)
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Connection | ErrorCategory::Conflict
        )
    }

    /// Convert to HTTP status code
    #[cfg(feature = "axum-support")]
    fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self.category() {
            ErrorCategory::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::Network | ErrorCategory::Connection => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get log level
    fn log_level(&self) -> tracing::Level {
        use tracing::Level;
        match self.category() {
            ErrorCategory::Internal | ErrorCategory::Database => Level::ERROR,
            ErrorCategory::Network | ErrorCategory::Connection => Level::WARN,
            ErrorCategory::Validation | ErrorCategory::NotFound | ErrorCategory::Conflict => {
                Level::INFO
            },
            _ => Level::WARN,
        }
    }
}
