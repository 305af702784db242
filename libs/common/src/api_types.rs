//! Shared API models for the transfer services
//!
//! This module provides unified API request/response models and HTTP utilities
//! to ensure consistency across all service endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// ============================================================================
// Standard API Response Models
// ============================================================================

/// Standard success response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SuccessResponse<T> {
    /// Success indicator (always true)
    #[serde(default = "crate::serde_helpers::bool_true")]
    pub success: bool,
    /// Response data
    pub data: T,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<T> SuccessResponse<T> {
    /// Create a new success response
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the response
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    /// Success indicator (always false for errors)
    #[serde(default = "crate::serde_helpers::bool_false")]
    pub success: bool,
    /// Error information
    pub error: ErrorInfo,
}

/// Standard error information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
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
    /// Create a new error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
            field_errors: HashMap::new(),
        }
    }

    /// Create with specific code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }
}

impl From<errors::ErrorInfo> for ErrorInfo {
    fn from(info: errors::ErrorInfo) -> Self {
        Self {
            code: info.code,
            message: info.message,
            details: info.details,
            field_errors: info.field_errors,
        }
    }
}

// ============================================================================
// AppError - HTTP Error with proper status codes (requires axum feature)
// ============================================================================

#[cfg(feature = "axum")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Application error with HTTP status code
/// This type implements IntoResponse for seamless integration with axum handlers
#[cfg(feature = "axum")]
#[derive(Debug, Clone)]
pub struct AppError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error information
    pub error: ErrorInfo,
}

#[cfg(feature = "axum")]
impl AppError {
    /// Create a new error
    pub fn new(status: StatusCode, error: ErrorInfo) -> Self {
        Self { status, error }
    }
}

#[cfg(feature = "axum")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.error,
            }),
        )
            .into_response()
    }
}

#[cfg(feature = "axum")]
impl From<errors::TransferError> for AppError {
    fn from(err: errors::TransferError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_error_info().into())
    }
}

// ============================================================================
// Service Health & Status Models
// ============================================================================

/// Service health status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HealthStatus {
    /// Overall health status
    pub status: ServiceStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Timestamp of this check
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Individual component checks
    #[serde(default)]
    pub checks: HashMap<String, ComponentHealth>,
}

impl HealthStatus {
    /// Build a report whose overall status is the worst component status
    pub fn from_checks(
        service: impl Into<String>,
        version: impl Into<String>,
        uptime_seconds: u64,
        checks: HashMap<String, ComponentHealth>,
    ) -> Self {
        let status = checks
            .values()
            .map(|c| c.status)
            .fold(ServiceStatus::Healthy, ServiceStatus::worst);
        Self {
            status,
            service: service.into(),
            version: version.into(),
            uptime_seconds,
            timestamp: chrono::Utc::now(),
            checks,
        }
    }
}

/// Service status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl ServiceStatus {
    fn severity(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Unknown => 1,
            Self::Degraded => 2,
            Self::Unhealthy => 3,
        }
    }

    /// The more severe of two statuses
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// Component health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ComponentHealth {
    /// Component status
    pub status: ServiceStatus,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Check duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn healthy(duration_ms: u64) -> Self {
        Self {
            status: ServiceStatus::Healthy,
            message: None,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn unhealthy(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            message: Some(message.into()),
            duration_ms: Some(duration_ms),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
