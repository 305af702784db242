//! transfersrv error type
//!
//! Handlers return `Result<_, TransferSrvError>`; the axum response goes
//! through `common::AppError` so every endpoint answers with the same
//! `ErrorResponse` envelope.

use axum::response::{IntoResponse, Response};
use catalog_recon::ReconError;
use common::AppError;
use errors::{ErrorCategory, TransferError, TransferErrorTrait};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferSrvError>;

#[derive(Error, Debug)]
pub enum TransferSrvError {
    #[error(transparent)]
    Recon(#[from] ReconError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TransferSrvError {
    fn from(err: anyhow::Error) -> Self {
        TransferSrvError::Internal(format!("{:#}", err))
    }
}

impl From<TransferSrvError> for TransferError {
    fn from(err: TransferSrvError) -> Self {
        match err {
            TransferSrvError::Recon(e) => e.into(),
            TransferSrvError::Transfer(e) => e,
            TransferSrvError::Internal(msg) => TransferError::Internal(msg),
        }
    }
}

impl TransferErrorTrait for TransferSrvError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Recon(ReconError::DuplicateTag { .. }) => "DUPLICATE_TAG",
            Self::Recon(ReconError::Fetch { .. }) => "FETCH_FAILED",
            Self::Recon(ReconError::Busy(_)) => "RESOURCE_BUSY",
            Self::Recon(ReconError::NotConfigured(_)) => "NOT_FOUND",
            Self::Recon(ReconError::UnknownCatalog(_)) => "UNKNOWN_CATALOG",
            Self::Transfer(e) => e.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Recon(ReconError::DuplicateTag { .. }) => ErrorCategory::Validation,
            Self::Recon(ReconError::Fetch { .. }) => ErrorCategory::Network,
            Self::Recon(ReconError::Busy(_)) => ErrorCategory::Conflict,
            Self::Recon(ReconError::NotConfigured(_) | ReconError::UnknownCatalog(_)) => {
                ErrorCategory::NotFound
            },
            Self::Transfer(e) => e.category(),
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<TransferSrvError> for AppError {
    fn from(err: TransferSrvError) -> Self {
        AppError::from(TransferError::from(err))
    }
}

impl IntoResponse for TransferSrvError {
    fn into_response(self) -> Response {
        let level = self.log_level();
        if level == tracing::Level::ERROR {
            tracing::error!("{}: {}", self.error_code(), self);
        } else if level == tracing::Level::WARN {
            tracing::warn!("{}: {}", self.error_code(), self);
        } else {
            tracing::debug!("{}: {}", self.error_code(), self);
        }
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use catalog_recon::{CatalogKind, Side};

    #[test]
    fn test_recon_errors_map_to_status() {
        let cases = [
            (
                ReconError::Busy(CatalogKind::Products),
                StatusCode::CONFLICT,
            ),
            (
                ReconError::Fetch {
                    side: Side::Source,
                    reason: "connection refused".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ReconError::DuplicateTag {
                    side: Side::Target,
                    tag: "T1".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ReconError::UnknownCatalog("widgets".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ReconError::NotConfigured(CatalogKind::Shops),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, status) in cases {
            let err = TransferSrvError::from(err);
            assert_eq!(err.http_status(), status, "{}", err);
            let app: AppError = err.into();
            assert_eq!(app.status, status);
        }
    }

    #[test]
    fn test_error_codes_and_retry() {
        let busy = TransferSrvError::from(ReconError::Busy(CatalogKind::Shops));
        assert_eq!(busy.error_code(), "RESOURCE_BUSY");
        assert!(busy.is_retryable());

        let dup = TransferSrvError::from(ReconError::DuplicateTag {
            side: Side::Source,
            tag: "A".to_string(),
        });
        assert!(!dup.is_retryable());

        let wrapped = TransferSrvError::from(TransferError::UnknownCatalog("x".to_string()));
        assert_eq!(wrapped.error_code(), "UNKNOWN_CATALOG");
        assert_eq!(wrapped.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_anyhow_becomes_internal() {
        let err: TransferSrvError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, TransferSrvError::Internal(_)));
        let app: AppError = err.into();
        assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
