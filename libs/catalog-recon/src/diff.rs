//! Tag-keyed reconciliation
//!
//! Computes which source records are missing from the target and which
//! target tags no longer exist in the source. Both sides are indexed by tag
//! in a hash set, so a run is O(n + m). This module never touches storage.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReconError, Result};
use crate::record::KeyedRecord;

/// Which side of a reconciliation a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// How to treat a tag that occurs more than once on one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort with `ReconError::DuplicateTag`
    #[default]
    Reject,
    /// Keep the first occurrence and skip the rest
    FirstWins,
}

/// Result of comparing a source set against a target set
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<R> {
    /// Source records whose tag is absent from the target, in source order
    pub to_insert: Vec<R>,
    /// Target tags absent from the source, in target order
    pub to_delete: Vec<String>,
    /// Tags present on both sides
    pub matched: usize,
    /// Repeated tags skipped under `DuplicatePolicy::FirstWins`
    pub duplicates_skipped: usize,
}

impl<R> Default for Reconciliation<R> {
    fn default() -> Self {
        Self {
            to_insert: Vec::new(),
            to_delete: Vec::new(),
            matched: 0,
            duplicates_skipped: 0,
        }
    }
}

impl<R> Reconciliation<R> {
    /// True when applying this plan would change nothing
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty()
    }

    pub fn planned_operations(&self) -> usize {
        self.to_insert.len() + self.to_delete.len()
    }
}

impl<R: KeyedRecord> Reconciliation<R> {
    /// Tags of the records planned for insertion
    pub fn insert_tags(&self) -> Vec<String> {
        self.to_insert.iter().map(|r| r.tag().to_string()).collect()
    }
}

/// Diff `source` against `target` by tag.
///
/// Source records are consumed so that `to_insert` can hand them to the
/// mutator without cloning. Matched pairs appear in neither list.
pub fn reconcile<S, T>(
    source: Vec<S>,
    target: &[T],
    policy: DuplicatePolicy,
) -> Result<Reconciliation<S>>
where
    S: KeyedRecord,
    T: KeyedRecord,
{
    let mut plan = Reconciliation::default();

    // Index target first; keep first-seen order for deletions
    let mut target_tags: HashSet<&str> = HashSet::with_capacity(target.len());
    let mut target_order: Vec<&str> = Vec::with_capacity(target.len());
    for record in target {
        let tag = record.tag();
        if !target_tags.insert(tag) {
            on_duplicate(Side::Target, tag, policy, &mut plan.duplicates_skipped)?;
            continue;
        }
        target_order.push(tag);
    }

    let mut source_tags: HashSet<String> = HashSet::with_capacity(source.len());
    for record in source {
        let tag = record.tag();
        if source_tags.contains(tag) {
            on_duplicate(Side::Source, tag, policy, &mut plan.duplicates_skipped)?;
            continue;
        }
        source_tags.insert(tag.to_string());

        if target_tags.contains(tag) {
            plan.matched += 1;
        } else {
            plan.to_insert.push(record);
        }
    }

    plan.to_delete = target_order
        .into_iter()
        .filter(|tag| !source_tags.contains(*tag))
        .map(str::to_string)
        .collect();

    debug!(
        "Reconciled {} source / {} target tags: {} to insert, {} to delete, {} matched",
        source_tags.len(),
        target_tags.len(),
        plan.to_insert.len(),
        plan.to_delete.len(),
        plan.matched
    );

    Ok(plan)
}

fn on_duplicate(
    side: Side,
    tag: &str,
    policy: DuplicatePolicy,
    skipped: &mut usize,
) -> Result<()> {
    match policy {
        DuplicatePolicy::Reject => Err(ReconError::DuplicateTag {
            side,
            tag: tag.to_string(),
        }),
        DuplicatePolicy::FirstWins => {
            debug!("Skipping duplicate {} tag '{}'", side, tag);
            *skipped += 1;
            Ok(())
        },
    }
}
