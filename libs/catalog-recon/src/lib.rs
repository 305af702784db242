//! Catalog reconciliation engine
//!
//! Converges a target catalog store towards an authoritative source by
//! business tag: tags only present in the source are inserted, tags only
//! present in the target are deleted. Matched tags are left untouched.
//!
//! # Key Components
//!
//! - **reconcile**: pure set difference by tag (`diff`)
//! - **RecordSource / RecordTarget**: storage seams implemented per backend
//! - **apply_plan**: best-effort mutation with per-record outcomes
//! - **CatalogSync / SyncRegistry**: one run per catalog, guarded by `RunGuard`
//! - **MemoryCatalog**: in-memory store for tests and dry experiments

pub mod apply;
pub mod catalog;
pub mod diff;
pub mod error;
pub mod memory_impl;
pub mod record;
pub mod report;
pub mod runner;
pub mod traits;

// Re-exports
pub use apply::{apply_plan, ApplyReport, OperationKind, OutcomeStatus, RecordOutcome};
pub use catalog::CatalogKind;
pub use diff::{reconcile, DuplicatePolicy, Reconciliation, Side};
pub use error::{ReconError, Result};
pub use memory_impl::MemoryCatalog;
pub use record::{KeyedRecord, TargetKey};
pub use report::{PlanPreview, RunReport};
pub use runner::{CatalogSync, RunGuard, RunPermit, SyncJob, SyncOptions, SyncRegistry};
pub use traits::{RecordSource, RecordTarget};
