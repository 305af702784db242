//! End-to-end runs against in-memory stores

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::Arc;

use catalog_recon::{
    CatalogKind, CatalogSync, DuplicatePolicy, KeyedRecord, MemoryCatalog, OperationKind,
    OutcomeStatus, ReconError, Side, SyncJob, SyncOptions, SyncRegistry,
};

#[derive(Debug, Clone, PartialEq)]
struct Product {
    tag: String,
    title: String,
}

impl KeyedRecord for Product {
    fn tag(&self) -> &str {
        &self.tag
    }
}

fn product(tag: &str) -> Product {
    Product {
        tag: tag.to_string(),
        title: format!("Product {}", tag),
    }
}

fn setup(
    source_tags: &[&str],
    target_tags: &[&str],
) -> (
    Arc<MemoryCatalog<Product>>,
    Arc<MemoryCatalog<Product>>,
    CatalogSync<Product>,
) {
    let source = Arc::new(MemoryCatalog::new("source"));
    source.seed(source_tags.iter().map(|t| product(t)));
    let target = Arc::new(MemoryCatalog::new("target"));
    target.seed(target_tags.iter().map(|t| product(t)));

    let sync: CatalogSync<Product> =
        CatalogSync::new(CatalogKind::Products, source.clone(), target.clone());
    (source, target, sync)
}

#[tokio::test]
async fn test_run_converges_target_to_source() {
    let (source, target, sync) = setup(&["a", "b", "d"], &["b", "c"]);

    let report = sync.run(SyncOptions::default()).await.unwrap();

    assert_eq!(report.catalog, CatalogKind::Products);
    assert_eq!(report.source_count, 3);
    assert_eq!(report.target_count, 2);
    assert_eq!(report.matched, 1);
    assert_eq!(report.planned_inserts, 2);
    assert_eq!(report.planned_deletes, 1);
    assert!(report.is_clean());

    let apply = report.apply.unwrap();
    assert_eq!(apply.inserted, 2);
    assert_eq!(apply.deleted, 1);
    assert_eq!(target.tags(), source.tags());
    assert_eq!(target.get("a").unwrap().title, "Product a");
}

#[tokio::test]
async fn test_second_run_is_noop() {
    let (_source, target, sync) = setup(&["a", "b"], &["c"]);

    sync.run(SyncOptions::default()).await.unwrap();
    let second = sync.run(SyncOptions::default()).await.unwrap();

    assert_eq!(second.planned_inserts, 0);
    assert_eq!(second.planned_deletes, 0);
    assert_eq!(second.matched, 2);
    assert_eq!(target.stats().inserts, 2);
    assert_eq!(target.stats().deletes, 1);
}

#[tokio::test]
async fn test_dry_run_never_mutates() {
    let (_source, target, sync) = setup(&["a"], &["x", "y"]);

    let report = sync
        .run(SyncOptions::default().dry_run(true))
        .await
        .unwrap();

    assert!(report.dry_run);
    assert!(report.apply.is_none());
    assert_eq!(report.planned_inserts, 1);
    assert_eq!(report.planned_deletes, 2);
    assert_eq!(target.tags(), vec!["x".to_string(), "y".to_string()]);
    assert_eq!(target.stats().inserts, 0);
    assert_eq!(target.stats().deletes, 0);
}

#[tokio::test]
async fn test_source_fetch_failure_mutates_nothing() {
    let (source, target, sync) = setup(&["a"], &["x"]);
    source.set_fail_fetch(true);

    let err = sync.run(SyncOptions::default()).await.unwrap_err();

    assert!(matches!(err, ReconError::Fetch { side: Side::Source, .. }));
    assert_eq!(target.tags(), vec!["x".to_string()]);
    assert_eq!(target.stats().deletes, 0);
}

#[tokio::test]
async fn test_target_fetch_failure_mutates_nothing() {
    let (_source, target, sync) = setup(&["a"], &["x"]);
    target.set_fail_fetch(true);

    let err = sync.run(SyncOptions::default()).await.unwrap_err();

    assert!(matches!(err, ReconError::Fetch { side: Side::Target, .. }));
    assert_eq!(target.stats().inserts, 0);
    assert_eq!(target.stats().deletes, 0);
}

#[tokio::test]
async fn test_partial_failure_is_reported_per_record() {
    let (_source, target, sync) = setup(&["a", "b", "c"], &["x"]);
    target.fail_insert_for("b");

    let report = sync.run(SyncOptions::default()).await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.failed(), 1);

    let apply = report.apply.unwrap();
    assert_eq!(apply.inserted, 2);
    assert_eq!(apply.deleted, 1);

    let failed: Vec<_> = apply.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].op, OperationKind::Insert);
    assert_eq!(failed[0].tag, "b");

    assert_eq!(target.tags(), vec!["a".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn test_failed_record_is_repaired_by_next_run() {
    let (source, target, sync) = setup(&["a", "b"], &[]);
    target.fail_insert_for("b");
    sync.run(SyncOptions::default()).await.unwrap();
    assert!(!target.contains("b"));

    target.clear_failures();

    let report = sync.run(SyncOptions::default()).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.planned_inserts, 1);
    assert_eq!(target.tags(), source.tags());
}

#[tokio::test]
async fn test_busy_catalog_rejected() {
    let (_source, target, sync) = setup(&["a"], &[]);

    let permit = sync.guard().try_acquire(CatalogKind::Products).unwrap();
    let err = sync.run(SyncOptions::default()).await.unwrap_err();
    assert_eq!(err, ReconError::Busy(CatalogKind::Products));
    assert!(target.is_empty());

    drop(permit);
    assert!(sync.run(SyncOptions::default()).await.is_ok());
    assert!(target.contains("a"));
}

#[tokio::test]
async fn test_guard_released_after_failed_run() {
    let (source, _target, sync) = setup(&["a"], &[]);
    source.set_fail_fetch(true);
    assert!(sync.run(SyncOptions::default()).await.is_err());
    assert!(!sync.guard().is_running(CatalogKind::Products));
}

#[tokio::test]
async fn test_duplicate_source_tags_abort_under_reject() {
    let target = Arc::new(MemoryCatalog::<Product>::new("target"));
    target.seed([product("x")]);

    // MemoryCatalog is keyed by tag, so duplicates come from a custom source
    struct DupSource;

    #[async_trait::async_trait]
    impl catalog_recon::RecordSource<Product> for DupSource {
        fn name(&self) -> &str {
            "dup"
        }

        async fn fetch_all(&self) -> anyhow::Result<Vec<Product>> {
            Ok(vec![product("a"), product("a")])
        }
    }

    let sync: CatalogSync<Product> =
        CatalogSync::new(CatalogKind::Products, Arc::new(DupSource), target.clone());
    let err = sync.run(SyncOptions::default()).await.unwrap_err();
    assert!(matches!(err, ReconError::DuplicateTag { side: Side::Source, .. }));
    assert_eq!(target.tags(), vec!["x".to_string()]);

    let report = sync
        .run(SyncOptions::default().duplicate_policy(DuplicatePolicy::FirstWins))
        .await
        .unwrap();
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.planned_inserts, 1);
    assert_eq!(target.tags(), vec!["a".to_string()]);
}

#[tokio::test]
async fn test_plan_preview() {
    let (_source, target, sync) = setup(&["a", "b"], &["b", "z"]);

    let preview = sync.plan(DuplicatePolicy::Reject).await.unwrap();
    assert_eq!(preview.catalog, CatalogKind::Products);
    assert_eq!(preview.to_insert, vec!["a".to_string()]);
    assert_eq!(preview.to_delete, vec!["z".to_string()]);
    assert_eq!(preview.matched, 1);
    assert_eq!(target.stats().inserts, 0);
}

#[tokio::test]
async fn test_registry_dispatch() {
    let (_source, target, sync) = setup(&["a"], &[]);
    let mut registry = SyncRegistry::new();
    registry.register(Arc::new(sync));

    assert_eq!(registry.catalogs(), vec![CatalogKind::Products]);
    assert!(registry.get_by_name("shops").is_err());

    let job = registry.get_by_name("products").unwrap();
    let report = job.run(SyncOptions::default()).await.unwrap();
    assert_eq!(report.apply.unwrap().outcomes[0].status, OutcomeStatus::Applied);
    assert!(target.contains("a"));
}
