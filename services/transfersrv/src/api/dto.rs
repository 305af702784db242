//! Request and response bodies

use catalog_recon::{CatalogKind, DuplicatePolicy, RunReport, SyncOptions};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Success message of the legacy trigger endpoints
pub const LEGACY_SYNCED: &str = "DB synced";

/// Envelope returned by `GET /insert/{catalog}`
///
/// Field names are capitalized because existing callers parse them that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LegacySyncResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Message")]
    pub message: String,
}

impl LegacySyncResponse {
    /// A dry run wrote nothing, so it reports the plan instead of claiming a sync
    pub fn from_report(report: &RunReport) -> Self {
        if report.dry_run {
            Self {
                success: true,
                message: report.summary(),
            }
        } else if report.is_clean() {
            Self {
                success: true,
                message: LEGACY_SYNCED.to_string(),
            }
        } else {
            Self {
                success: false,
                message: report.summary(),
            }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Query parameters of `POST /api/v1/sync/{catalog}`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RunQuery {
    /// Compute the plan without touching the target (accepts true/false/1/0/yes/no)
    #[serde(
        default,
        deserialize_with = "common::serde_helpers::deserialize_optional_bool_flexible"
    )]
    pub dry_run: Option<bool>,
    /// `reject` or `first_wins`; the configured policy when absent
    #[param(value_type = Option<String>)]
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl RunQuery {
    /// Overlay the request on the configured defaults
    pub fn options(&self, defaults: SyncOptions) -> SyncOptions {
        let mut options = defaults;
        if let Some(dry_run) = self.dry_run {
            options = options.dry_run(dry_run);
        }
        if let Some(policy) = self.duplicate_policy {
            options = options.duplicate_policy(policy);
        }
        options
    }
}

/// Query parameters of `GET /api/v1/sync/{catalog}/plan`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlanQuery {
    /// `reject` or `first_wins`; the configured policy when absent
    #[param(value_type = Option<String>)]
    pub duplicate_policy: Option<DuplicatePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogStatus {
    pub catalog: CatalogKind,
    /// A run currently holds this catalog
    pub running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogList {
    pub catalogs: Vec<CatalogStatus>,
    pub defaults: SyncDefaults,
}

/// Options applied when a request does not override them
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncDefaults {
    pub dry_run: bool,
    pub duplicate_policy: DuplicatePolicy,
}

impl From<SyncOptions> for SyncDefaults {
    fn from(options: SyncOptions) -> Self {
        Self {
            dry_run: options.dry_run,
            duplicate_policy: options.duplicate_policy,
        }
    }
}
