//! Run reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::apply::ApplyReport;
use crate::catalog::CatalogKind;

/// Summary of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunReport {
    pub run_id: Uuid,
    pub catalog: CatalogKind,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_count: usize,
    pub target_count: usize,
    pub matched: usize,
    pub planned_inserts: usize,
    pub planned_deletes: usize,
    pub duplicates_skipped: usize,
    /// None for dry runs
    pub apply: Option<ApplyReport>,
}

impl RunReport {
    /// True when no mutation failed
    pub fn is_clean(&self) -> bool {
        self.apply.as_ref().map_or(true, ApplyReport::is_clean)
    }

    pub fn failed(&self) -> usize {
        self.apply.as_ref().map_or(0, |a| a.failed)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn summary(&self) -> String {
        match &self.apply {
            None => format!(
                "{} (dry run): {} to insert, {} to delete, {} matched",
                self.catalog, self.planned_inserts, self.planned_deletes, self.matched
            ),
            Some(apply) => format!(
                "{}: {} inserted, {} deleted, {} failed, {} matched",
                self.catalog, apply.inserted, apply.deleted, apply.failed, self.matched
            ),
        }
    }
}

/// Planned tags for a catalog, without applying anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlanPreview {
    pub catalog: CatalogKind,
    pub to_insert: Vec<String>,
    pub to_delete: Vec<String>,
    pub matched: usize,
    pub duplicates_skipped: usize,
}
