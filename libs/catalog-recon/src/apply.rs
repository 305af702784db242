//! Best-effort application of a reconciliation plan
//!
//! Each insert and delete is independent. A failure is logged, recorded and
//! skipped; nothing is retried or rolled back. The next run repairs what
//! this one missed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::diff::Reconciliation;
use crate::record::KeyedRecord;
use crate::traits::RecordTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Applied,
    /// Delete matched no rows (removed by someone else since the fetch)
    Missing,
    Failed,
}

/// Outcome of one mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecordOutcome {
    pub op: OperationKind,
    pub tag: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordOutcome {
    fn applied(op: OperationKind, tag: &str) -> Self {
        Self {
            op,
            tag: tag.to_string(),
            status: OutcomeStatus::Applied,
            error: None,
        }
    }

    fn failed(op: OperationKind, tag: &str, error: &anyhow::Error) -> Self {
        Self {
            op,
            tag: tag.to_string(),
            status: OutcomeStatus::Failed,
            error: Some(format!("{:#}", error)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApplyReport {
    pub inserted: usize,
    pub deleted: usize,
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Outcomes that failed, in execution order
    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
    }
}

/// Apply `plan` to `target`: inserts first, then deletes.
pub async fn apply_plan<R, T>(target: &T, plan: &Reconciliation<R>) -> ApplyReport
where
    R: KeyedRecord + Send + Sync,
    T: RecordTarget<R> + ?Sized,
{
    let name = target.name();
    let mut report = ApplyReport {
        outcomes: Vec::with_capacity(plan.planned_operations()),
        ..ApplyReport::default()
    };

    for record in &plan.to_insert {
        let tag = record.tag();
        match target.insert(record).await {
            Ok(()) => {
                report.inserted += 1;
                debug!("{}: Inserted '{}'", name, tag);
                report
                    .outcomes
                    .push(RecordOutcome::applied(OperationKind::Insert, tag));
            },
            Err(e) => {
                report.failed += 1;
                warn!("{}: Insert '{}' failed: {:#}", name, tag, e);
                report
                    .outcomes
                    .push(RecordOutcome::failed(OperationKind::Insert, tag, &e));
            },
        }
    }

    for tag in &plan.to_delete {
        match target.delete(tag).await {
            Ok(0) => {
                debug!("{}: Delete '{}' matched no rows", name, tag);
                report.outcomes.push(RecordOutcome {
                    status: OutcomeStatus::Missing,
                    ..RecordOutcome::applied(OperationKind::Delete, tag)
                });
            },
            Ok(rows) => {
                report.deleted += 1;
                debug!("{}: Deleted '{}' ({} rows)", name, tag, rows);
                report
                    .outcomes
                    .push(RecordOutcome::applied(OperationKind::Delete, tag));
            },
            Err(e) => {
                report.failed += 1;
                warn!("{}: Delete '{}' failed: {:#}", name, tag, e);
                report
                    .outcomes
                    .push(RecordOutcome::failed(OperationKind::Delete, tag, &e));
            },
        }
    }

    info!(
        "{}: Applied {} inserts, {} deletes, {} failed",
        name, report.inserted, report.deleted, report.failed
    );

    report
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::diff::{reconcile, DuplicatePolicy};
    use crate::memory_impl::MemoryCatalog;
    use crate::record::TargetKey;

    #[tokio::test]
    async fn test_apply_inserts_and_deletes() {
        let target: MemoryCatalog<String> = MemoryCatalog::new("target");
        target.seed(["b".to_string(), "c".to_string()]);

        let keys = vec![TargetKey::new("b"), TargetKey::new("c")];
        let plan = reconcile(
            vec!["a".to_string(), "b".to_string()],
            &keys,
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let report = apply_plan(&target, &plan).await;
        assert_eq!(report.inserted, 1);
        assert_eq!(report.deleted, 1);
        assert!(report.is_clean());
        assert_eq!(target.tags(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_stop_remaining() {
        let target: MemoryCatalog<String> = MemoryCatalog::new("target");
        target.seed(["z".to_string()]);
        target.fail_insert_for("b");

        let keys = vec![TargetKey::new("z")];
        let plan = reconcile(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            &keys,
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let report = apply_plan(&target, &plan).await;
        assert_eq!(report.inserted, 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].op, OperationKind::Insert);
        assert_eq!(failures[0].tag, "b");
        assert!(failures[0].error.is_some());

        assert_eq!(target.tags(), vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delete_is_recorded() {
        let target: MemoryCatalog<String> = MemoryCatalog::new("target");
        target.seed(["x".to_string(), "y".to_string()]);
        target.fail_delete_for("x");

        let keys = vec![TargetKey::new("x"), TargetKey::new("y")];
        let plan = reconcile(Vec::<String>::new(), &keys, DuplicatePolicy::Reject).unwrap();

        let report = apply_plan(&target, &plan).await;
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Failed);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Applied);
        assert_eq!(target.tags(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_of_vanished_row_is_missing() {
        let target: MemoryCatalog<String> = MemoryCatalog::new("target");

        let keys = vec![TargetKey::new("gone")];
        let plan = reconcile(Vec::<String>::new(), &keys, DuplicatePolicy::Reject).unwrap();

        let report = apply_plan(&target, &plan).await;
        assert_eq!(report.deleted, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Missing);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = RecordOutcome::applied(OperationKind::Insert, "p-1");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["op"], "insert");
        assert_eq!(json["status"], "applied");
        assert!(json.get("error").is_none());
    }
}
