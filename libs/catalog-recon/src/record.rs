//! Keyed record abstraction

use serde::{Deserialize, Serialize};

/// A record identified by a unique business tag
///
/// Tags are compared byte-for-byte. The rest of the record is opaque to the
/// reconciler.
pub trait KeyedRecord {
    fn tag(&self) -> &str;
}

impl KeyedRecord for String {
    fn tag(&self) -> &str {
        self.as_str()
    }
}

impl KeyedRecord for &str {
    fn tag(&self) -> &str {
        self
    }
}

impl<T: KeyedRecord + ?Sized> KeyedRecord for Box<T> {
    fn tag(&self) -> &str {
        (**self).tag()
    }
}

/// Tag-only projection of a target row
///
/// Targets never need their full rows for reconciliation; `name` is kept for
/// log lines only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetKey {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TargetKey {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl KeyedRecord for TargetKey {
    fn tag(&self) -> &str {
        &self.tag
    }
}
