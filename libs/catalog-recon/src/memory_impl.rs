//! In-memory catalog store
//!
//! DashMap-backed implementation of both storage seams, with failure
//! injection. Used by the runner and HTTP tests in place of MySQL.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::record::{KeyedRecord, TargetKey};
use crate::traits::{RecordSource, RecordTarget};

/// In-memory catalog keyed by tag
pub struct MemoryCatalog<R> {
    name: String,
    records: DashMap<String, R>,
    fail_fetch: AtomicBool,
    fail_insert: DashSet<String>,
    fail_delete: DashSet<String>,
    inserts: AtomicU64,
    deletes: AtomicU64,
}

/// Counters for assertions in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub records: usize,
    pub inserts: u64,
    pub deletes: u64,
}

impl<R: KeyedRecord> MemoryCatalog<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: DashMap::new(),
            fail_fetch: AtomicBool::new(false),
            fail_insert: DashSet::new(),
            fail_delete: DashSet::new(),
            inserts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Store records directly, bypassing counters and failure injection
    pub fn seed(&self, records: impl IntoIterator<Item = R>) {
        for record in records {
            self.records.insert(record.tag().to_string(), record);
        }
    }

    /// Make every subsequent fetch fail
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_insert_for(&self, tag: impl Into<String>) {
        self.fail_insert.insert(tag.into());
    }

    pub fn fail_delete_for(&self, tag: impl Into<String>) {
        self.fail_delete.insert(tag.into());
    }

    /// Stored tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.records.iter().map(|e| e.key().clone()).collect();
        tags.sort();
        tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.records.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove all failure injection, keeping data
    pub fn clear_failures(&self) {
        self.fail_insert.clear();
        self.fail_delete.clear();
        self.fail_fetch.store(false, Ordering::SeqCst);
    }

    /// Clear all data and failure injection
    pub fn clear(&self) {
        self.records.clear();
        self.clear_failures();
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            records: self.records.len(),
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    fn check_fetch(&self) -> Result<()> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("{}: fetch failure injected", self.name);
        }
        Ok(())
    }
}

impl<R: KeyedRecord + Clone> MemoryCatalog<R> {
    pub fn get(&self, tag: &str) -> Option<R> {
        self.records.get(tag).map(|e| e.value().clone())
    }

    /// Records sorted by tag
    fn sorted_records(&self) -> Vec<R> {
        let mut records: Vec<(String, R)> = self
            .records
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records.into_iter().map(|(_, r)| r).collect()
    }
}

#[async_trait]
impl<R> RecordSource<R> for MemoryCatalog<R>
where
    R: KeyedRecord + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<R>> {
        self.check_fetch()?;
        Ok(self.sorted_records())
    }
}

#[async_trait]
impl<R> RecordTarget<R> for MemoryCatalog<R>
where
    R: KeyedRecord + Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_keys(&self) -> Result<Vec<TargetKey>> {
        self.check_fetch()?;
        Ok(self.tags().into_iter().map(TargetKey::new).collect())
    }

    async fn insert(&self, record: &R) -> Result<()> {
        let tag = record.tag();
        if self.fail_insert.contains(tag) {
            bail!("{}: insert failure injected for '{}'", self.name, tag);
        }
        if self.records.contains_key(tag) {
            return Err(anyhow!("{}: duplicate entry '{}' for key 'tag'", self.name, tag));
        }
        self.records.insert(tag.to_string(), record.clone());
        self.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, tag: &str) -> Result<u64> {
        if self.fail_delete.contains(tag) {
            bail!("{}: delete failure injected for '{}'", self.name, tag);
        }
        match self.records.remove(tag) {
            Some(_) => {
                self.deletes.fetch_add(1, Ordering::Relaxed);
                Ok(1)
            },
            None => Ok(0),
        }
    }
}
