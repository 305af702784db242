//! Error types for catalog-recon

use errors::TransferError;
use thiserror::Error;

use crate::catalog::CatalogKind;
use crate::diff::Side;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    #[error("Duplicate tag '{tag}' in {side} set")]
    DuplicateTag { side: Side, tag: String },

    #[error("Failed to fetch {side} set: {reason}")]
    Fetch { side: Side, reason: String },

    #[error("Reconciliation already running for catalog '{0}'")]
    Busy(CatalogKind),

    #[error("Catalog '{0}' is not configured")]
    NotConfigured(CatalogKind),

    #[error("Unknown catalog: {0}")]
    UnknownCatalog(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;

impl From<ReconError> for TransferError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::DuplicateTag { side, tag } => TransferError::DuplicateTag {
                side: side.to_string(),
                tag,
            },
            ReconError::Fetch { side, reason } => TransferError::FetchFailed {
                side: side.to_string(),
                reason,
            },
            ReconError::Busy(catalog) => TransferError::ResourceBusy(format!(
                "reconciliation already running for catalog '{}'",
                catalog
            )),
            ReconError::NotConfigured(catalog) => TransferError::NotFound {
                resource: format!("catalog '{}'", catalog),
            },
            ReconError::UnknownCatalog(name) => TransferError::UnknownCatalog(name),
        }
    }
}
