//! Shared building blocks for the catalog transfer services
//!
//! Provides functions shared by every service binary, including:
//! - logging initialization
//! - API response envelopes and health types
//! - service bootstrap and shutdown handling
//! - MySQL pool setup

// Common modules
pub mod api_types;
pub mod logging;
pub mod serde_helpers;
pub mod service_bootstrap;
pub mod shutdown;

// Bootstrap modules
pub mod bootstrap_args;
#[cfg(feature = "mysql")]
pub mod bootstrap_database;

// Re-export commonly used API types
pub use api_types::{
    ComponentHealth, ErrorInfo, ErrorResponse, HealthStatus, ServiceStatus, SuccessResponse,
};

// Re-export AppError when axum feature is enabled
#[cfg(feature = "axum")]
pub use api_types::AppError;

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;

// Re-export CLI dependencies when cli feature is enabled
#[cfg(feature = "cli")]
pub use clap;

// Re-export clap derive macros separately for proper macro resolution
#[cfg(feature = "cli")]
pub use clap::{Args, Parser, Subcommand, ValueEnum};
