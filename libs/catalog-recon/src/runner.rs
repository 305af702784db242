//! Run orchestration
//!
//! A run is fetch source, fetch target keys, reconcile, then apply unless
//! dry. At most one run per catalog is active at a time; `RunGuard` hands out
//! an RAII permit per catalog and a second caller gets `ReconError::Busy`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::apply::apply_plan;
use crate::catalog::CatalogKind;
use crate::diff::{reconcile, DuplicatePolicy, Reconciliation, Side};
use crate::error::{ReconError, Result};
use crate::record::{KeyedRecord, TargetKey};
use crate::report::{PlanPreview, RunReport};
use crate::traits::{RecordSource, RecordTarget};

/// Single-flight guard keyed by catalog
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    active: Arc<Mutex<HashSet<CatalogKind>>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `catalog`, failing if a run already holds it
    pub fn try_acquire(&self, catalog: CatalogKind) -> Result<RunPermit> {
        let mut active = self.active.lock();
        if !active.insert(catalog) {
            return Err(ReconError::Busy(catalog));
        }
        Ok(RunPermit {
            active: Arc::clone(&self.active),
            catalog,
        })
    }

    pub fn is_running(&self, catalog: CatalogKind) -> bool {
        self.active.lock().contains(&catalog)
    }

    /// Catalogs with a run in flight, in declaration order
    pub fn active(&self) -> Vec<CatalogKind> {
        let active = self.active.lock();
        CatalogKind::ALL
            .iter()
            .copied()
            .filter(|c| active.contains(c))
            .collect()
    }
}

/// Releases its catalog on drop
#[derive(Debug)]
pub struct RunPermit {
    active: Arc<Mutex<HashSet<CatalogKind>>>,
    catalog: CatalogKind,
}

impl RunPermit {
    pub fn catalog(&self) -> CatalogKind {
        self.catalog
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.active.lock().remove(&self.catalog);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Compute and report the plan without mutating the target
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl SyncOptions {
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

/// Type-erased reconciliation job for one catalog
#[async_trait]
pub trait SyncJob: Send + Sync {
    fn catalog(&self) -> CatalogKind;

    /// Reconcile and, unless dry, apply
    async fn run(&self, options: SyncOptions) -> Result<RunReport>;

    /// Reconcile only and return the planned tags
    async fn plan(&self, policy: DuplicatePolicy) -> Result<PlanPreview>;
}

/// Reconciliation of one catalog between an injected source and target
pub struct CatalogSync<R> {
    catalog: CatalogKind,
    source: Arc<dyn RecordSource<R>>,
    target: Arc<dyn RecordTarget<R>>,
    guard: RunGuard,
}

impl<R> CatalogSync<R>
where
    R: KeyedRecord + Send + Sync + 'static,
{
    pub fn new(
        catalog: CatalogKind,
        source: Arc<dyn RecordSource<R>>,
        target: Arc<dyn RecordTarget<R>>,
    ) -> Self {
        Self {
            catalog,
            source,
            target,
            guard: RunGuard::new(),
        }
    }

    /// Share a guard with other jobs
    pub fn with_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    async fn fetch(&self) -> Result<(Vec<R>, Vec<TargetKey>)> {
        let source = self
            .source
            .fetch_all()
            .await
            .map_err(|e| ReconError::Fetch {
                side: Side::Source,
                reason: format!("{:#}", e),
            })?;
        debug!(
            "{}: {} source records from {}",
            self.catalog,
            source.len(),
            self.source.name()
        );

        let target = self
            .target
            .fetch_keys()
            .await
            .map_err(|e| ReconError::Fetch {
                side: Side::Target,
                reason: format!("{:#}", e),
            })?;
        debug!(
            "{}: {} target keys from {}",
            self.catalog,
            target.len(),
            self.target.name()
        );

        Ok((source, target))
    }

    async fn compute(&self, policy: DuplicatePolicy) -> Result<(Reconciliation<R>, usize, usize)> {
        let (source, target) = self.fetch().await?;
        let (source_count, target_count) = (source.len(), target.len());
        let plan = reconcile(source, &target, policy)?;
        Ok((plan, source_count, target_count))
    }
}

#[async_trait]
impl<R> SyncJob for CatalogSync<R>
where
    R: KeyedRecord + Send + Sync + 'static,
{
    fn catalog(&self) -> CatalogKind {
        self.catalog
    }

    async fn run(&self, options: SyncOptions) -> Result<RunReport> {
        let _permit = self.guard.try_acquire(self.catalog)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            "{}: Sync starting (run {}, dry_run={})",
            self.catalog, run_id, options.dry_run
        );

        let (plan, source_count, target_count) = self.compute(options.duplicate_policy).await?;
        info!(
            "{}: {} to insert, {} to delete, {} matched",
            self.catalog,
            plan.to_insert.len(),
            plan.to_delete.len(),
            plan.matched
        );

        let apply = if options.dry_run {
            None
        } else {
            Some(apply_plan(self.target.as_ref(), &plan).await)
        };

        let report = RunReport {
            run_id,
            catalog: self.catalog,
            dry_run: options.dry_run,
            started_at,
            finished_at: Utc::now(),
            source_count,
            target_count,
            matched: plan.matched,
            planned_inserts: plan.to_insert.len(),
            planned_deletes: plan.to_delete.len(),
            duplicates_skipped: plan.duplicates_skipped,
            apply,
        };

        info!("{} ({} ms)", report.summary(), report.duration_ms());
        Ok(report)
    }

    async fn plan(&self, policy: DuplicatePolicy) -> Result<PlanPreview> {
        let (plan, _, _) = self.compute(policy).await?;
        Ok(PlanPreview {
            catalog: self.catalog,
            to_insert: plan.insert_tags(),
            to_delete: plan.to_delete,
            matched: plan.matched,
            duplicates_skipped: plan.duplicates_skipped,
        })
    }
}

/// Configured jobs by catalog
#[derive(Default, Clone)]
pub struct SyncRegistry {
    jobs: HashMap<CatalogKind, Arc<dyn SyncJob>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job, replacing any previous job for the same catalog
    pub fn register(&mut self, job: Arc<dyn SyncJob>) {
        self.jobs.insert(job.catalog(), job);
    }

    pub fn get(&self, catalog: CatalogKind) -> Result<Arc<dyn SyncJob>> {
        self.jobs
            .get(&catalog)
            .cloned()
            .ok_or(ReconError::NotConfigured(catalog))
    }

    /// Look up by route name
    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn SyncJob>> {
        self.get(name.parse()?)
    }

    /// Registered catalogs, sorted
    pub fn catalogs(&self) -> Vec<CatalogKind> {
        let mut catalogs: Vec<CatalogKind> = self.jobs.keys().copied().collect();
        catalogs.sort();
        catalogs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl std::fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRegistry")
            .field("catalogs", &self.catalogs())
            .finish()
    }
}
