//! MySQL stores for the production (source) and web (target) databases
//!
//! One source and one target per catalog. Each store only holds a pool
//! handle; pools are created once at startup and shared.

pub mod products;
pub mod shops;

use std::sync::Arc;

use anyhow::Context;
use catalog_recon::{CatalogKind, CatalogSync, RunGuard, SyncRegistry};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

pub use products::{MySqlProductSource, MySqlProductTarget, SourceProduct};
pub use shops::{MySqlShopSource, MySqlShopTarget, SourceShop};

/// Build the job registry for the enabled catalogs
///
/// All jobs share `guard`, so a catalog can never run twice at once even if
/// it is triggered from several entry points.
pub fn build_registry(
    catalogs: &[CatalogKind],
    source: &MySqlPool,
    target: &MySqlPool,
    guard: RunGuard,
) -> SyncRegistry {
    let mut registry = SyncRegistry::new();
    for catalog in catalogs {
        match catalog {
            CatalogKind::Products => {
                let sync: CatalogSync<SourceProduct> = CatalogSync::new(
                    CatalogKind::Products,
                    Arc::new(MySqlProductSource::new(source.clone())),
                    Arc::new(MySqlProductTarget::new(target.clone())),
                )
                .with_guard(guard.clone());
                registry.register(Arc::new(sync));
            },
            CatalogKind::Shops => {
                let sync: CatalogSync<SourceShop> = CatalogSync::new(
                    CatalogKind::Shops,
                    Arc::new(MySqlShopSource::new(source.clone())),
                    Arc::new(MySqlShopTarget::new(target.clone())),
                )
                .with_guard(guard.clone());
                registry.register(Arc::new(sync));
            },
        }
    }
    registry
}

/// Read a text column
pub(crate) fn text(row: &MySqlRow, column: &str) -> anyhow::Result<String> {
    row.try_get::<String, _>(column)
        .with_context(|| format!("column {}", column))
}

/// Read a nullable text column
pub(crate) fn opt_text(row: &MySqlRow, column: &str) -> anyhow::Result<Option<String>> {
    row.try_get::<Option<String>, _>(column)
        .with_context(|| format!("column {}", column))
}

/// Read a price column; queries cast prices to DOUBLE
pub(crate) fn price(row: &MySqlRow, column: &str) -> anyhow::Result<f32> {
    row.try_get::<f64, _>(column)
        .map(|v| v as f32)
        .with_context(|| format!("column {}", column))
}
