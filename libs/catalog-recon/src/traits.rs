//! Storage seams
//!
//! Backends implement these per catalog. Errors are `anyhow` at this
//! boundary; the runner classifies them by side.

use async_trait::async_trait;

use crate::record::{KeyedRecord, TargetKey};

/// Authoritative side of a reconciliation
#[async_trait]
pub trait RecordSource<R>: Send + Sync
where
    R: KeyedRecord + Send + Sync,
{
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Fetch every live record
    async fn fetch_all(&self) -> anyhow::Result<Vec<R>>;
}

/// Consumer side of a reconciliation
#[async_trait]
pub trait RecordTarget<R>: Send + Sync
where
    R: KeyedRecord + Send + Sync,
{
    fn name(&self) -> &str;

    /// Fetch the tag of every stored row
    async fn fetch_keys(&self) -> anyhow::Result<Vec<TargetKey>>;

    /// Insert one source record
    async fn insert(&self, record: &R) -> anyhow::Result<()>;

    /// Delete rows by tag, returning rows affected
    async fn delete(&self, tag: &str) -> anyhow::Result<u64>;
}
