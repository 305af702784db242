//! Common test utilities and helpers
//!
//! Routers are built over in-memory catalogs, so no MySQL is needed.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use catalog_recon::{
    CatalogKind, CatalogSync, MemoryCatalog, RecordSource, RunGuard, SyncOptions, SyncRegistry,
};
use transfersrv::{
    api::create_routes,
    bootstrap,
    store::{SourceProduct, SourceShop},
    AppState,
};

/// Router plus handles on the stores behind it
pub struct TestApp {
    pub router: axum::Router,
    pub guard: RunGuard,
    pub product_source: Arc<MemoryCatalog<SourceProduct>>,
    pub product_target: Arc<MemoryCatalog<SourceProduct>>,
    pub shop_source: Arc<MemoryCatalog<SourceShop>>,
    pub shop_target: Arc<MemoryCatalog<SourceShop>>,
}

pub fn product(tag: &str) -> SourceProduct {
    SourceProduct {
        title: format!("Product {}", tag),
        description: format!("Description of {}", tag),
        mrp: 120.0,
        selling_price: 99.5,
        tag: tag.to_string(),
        date_created: "2026-03-01 09:30:00".to_string(),
        image_name: Some(format!("{}_1.jpg", tag)),
    }
}

pub fn shop(tag: &str) -> SourceShop {
    SourceShop {
        name: format!("Shop {}", tag),
        address: "12 Market Road".to_string(),
        phone: "555-0100".to_string(),
        tag: tag.to_string(),
        date_created: "2026-03-01 09:30:00".to_string(),
    }
}

fn state_for(registry: SyncRegistry, guard: RunGuard, defaults: SyncOptions) -> Arc<AppState> {
    Arc::new(AppState::new(bootstrap::service_info(), registry, defaults).with_guard(guard))
}

/// Both catalogs over fresh in-memory stores
pub fn create_test_app(defaults: SyncOptions) -> TestApp {
    let guard = RunGuard::new();
    let product_source = Arc::new(MemoryCatalog::<SourceProduct>::new("mem.product_details"));
    let product_target = Arc::new(MemoryCatalog::<SourceProduct>::new("mem.product"));
    let shop_source = Arc::new(MemoryCatalog::<SourceShop>::new("mem.shop_details"));
    let shop_target = Arc::new(MemoryCatalog::<SourceShop>::new("mem.shop"));

    let products: CatalogSync<SourceProduct> = CatalogSync::new(
        CatalogKind::Products,
        product_source.clone(),
        product_target.clone(),
    )
    .with_guard(guard.clone());
    let shops: CatalogSync<SourceShop> =
        CatalogSync::new(CatalogKind::Shops, shop_source.clone(), shop_target.clone())
            .with_guard(guard.clone());

    let mut registry = SyncRegistry::new();
    registry.register(Arc::new(products));
    registry.register(Arc::new(shops));

    TestApp {
        router: create_routes(state_for(registry, guard.clone(), defaults)),
        guard,
        product_source,
        product_target,
        shop_source,
        shop_target,
    }
}

/// Create a test router with default options
pub fn create_test_router() -> TestApp {
    create_test_app(SyncOptions::default())
}

/// Products only, reading from an arbitrary source
pub fn create_products_router(
    source: Arc<dyn RecordSource<SourceProduct>>,
    target: Arc<MemoryCatalog<SourceProduct>>,
) -> axum::Router {
    let guard = RunGuard::new();
    let products: CatalogSync<SourceProduct> =
        CatalogSync::new(CatalogKind::Products, source, target).with_guard(guard.clone());

    let mut registry = SyncRegistry::new();
    registry.register(Arc::new(products));
    create_routes(state_for(registry, guard, SyncOptions::default()))
}

/// Source that returns its records verbatim, repeats included
pub struct ListSource {
    pub records: Vec<SourceProduct>,
}

#[async_trait]
impl RecordSource<SourceProduct> for ListSource {
    fn name(&self) -> &str {
        "list"
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<SourceProduct>> {
        Ok(self.records.clone())
    }
}
