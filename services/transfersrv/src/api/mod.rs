//! HTTP API for transfersrv
//!
//! Legacy trigger routes (`/insert/*`) keep their original envelope; the
//! versioned routes use the shared `SuccessResponse`/`ErrorResponse` types.

pub mod dto;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Create all API routes with state
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Legacy triggers
        .route("/insert/products", get(handlers::insert_products))
        .route("/insert/shops", get(handlers::insert_shops))
        // Versioned API
        .route("/api/v1/catalogs", get(handlers::list_catalogs))
        .route("/api/v1/sync/{catalog}", post(handlers::run_sync))
        .route("/api/v1/sync/{catalog}/plan", get(handlers::plan_sync))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::list_catalogs,
        handlers::run_sync,
        handlers::plan_sync,
        handlers::insert_products,
        handlers::insert_shops,
    ),
    components(schemas(
        dto::LegacySyncResponse,
        dto::CatalogList,
        dto::CatalogStatus,
        dto::SyncDefaults,
        catalog_recon::RunReport,
        catalog_recon::PlanPreview,
        catalog_recon::ApplyReport,
        catalog_recon::RecordOutcome,
        catalog_recon::CatalogKind,
        catalog_recon::DuplicatePolicy,
        common::ErrorResponse,
        common::ErrorInfo,
    )),
    tags(
        (name = "transfersrv", description = "Service health"),
        (name = "sync", description = "Catalog reconciliation"),
        (name = "legacy", description = "Original trigger endpoints")
    )
)]
pub struct ApiDoc;
