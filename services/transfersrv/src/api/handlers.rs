//! Request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use catalog_recon::{CatalogKind, PlanPreview, RunReport};
use common::{HealthStatus, SuccessResponse};
use errors::TransferErrorTrait;
use tracing::{info, warn};

use super::dto::{CatalogList, CatalogStatus, LegacySyncResponse, PlanQuery, RunQuery};
use crate::app_state::AppState;
use crate::error::{Result, TransferSrvError};

/// Service health with a ping per database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = SuccessResponse<HealthStatus>)
    ),
    tag = "transfersrv"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<HealthStatus>> {
    Json(SuccessResponse::new(state.health().await))
}

/// Configured catalogs and whether each one is running
#[utoipa::path(
    get,
    path = "/api/v1/catalogs",
    responses(
        (status = 200, description = "Configured catalogs", body = SuccessResponse<CatalogList>)
    ),
    tag = "sync"
)]
pub async fn list_catalogs(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<CatalogList>> {
    let catalogs = state
        .registry
        .catalogs()
        .into_iter()
        .map(|catalog| CatalogStatus {
            catalog,
            running: state.guard.is_running(catalog),
        })
        .collect();

    Json(SuccessResponse::new(CatalogList {
        catalogs,
        defaults: state.defaults.into(),
    }))
}

/// Reconcile one catalog and apply the result unless `dry_run`
///
/// Individual insert or delete failures do not fail the request; they are
/// listed in `apply.outcomes` and the report is marked unclean.
#[utoipa::path(
    post,
    path = "/api/v1/sync/{catalog}",
    params(
        ("catalog" = String, Path, description = "Catalog name: products or shops"),
        RunQuery
    ),
    responses(
        (status = 200, description = "Run finished", body = SuccessResponse<RunReport>),
        (status = 404, description = "Unknown or disabled catalog"),
        (status = 409, description = "A run is already active for this catalog"),
        (status = 422, description = "Duplicate tags under the reject policy"),
        (status = 502, description = "Source or target fetch failed; nothing was changed")
    ),
    tag = "sync"
)]
pub async fn run_sync(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
    Query(query): Query<RunQuery>,
) -> Result<Json<SuccessResponse<RunReport>>> {
    let job = state.registry.get_by_name(&catalog)?;
    let options = query.options(state.defaults);

    let report = job.run(options).await?;
    if !report.is_clean() {
        warn!("{}", report.summary());
    }

    Ok(Json(
        SuccessResponse::new(report.clone())
            .with_metadata("summary", serde_json::Value::String(report.summary())),
    ))
}

/// Reconcile without applying and list the planned tags
#[utoipa::path(
    get,
    path = "/api/v1/sync/{catalog}/plan",
    params(
        ("catalog" = String, Path, description = "Catalog name: products or shops"),
        PlanQuery
    ),
    responses(
        (status = 200, description = "Planned inserts and deletes", body = SuccessResponse<PlanPreview>),
        (status = 404, description = "Unknown or disabled catalog"),
        (status = 422, description = "Duplicate tags under the reject policy"),
        (status = 502, description = "Source or target fetch failed")
    ),
    tag = "sync"
)]
pub async fn plan_sync(
    State(state): State<Arc<AppState>>,
    Path(catalog): Path<String>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<SuccessResponse<PlanPreview>>> {
    let job = state.registry.get_by_name(&catalog)?;
    let policy = query
        .duplicate_policy
        .unwrap_or(state.defaults.duplicate_policy);
    let preview = job.plan(policy).await?;
    Ok(Json(SuccessResponse::new(preview)))
}

/// Legacy product trigger
#[utoipa::path(
    get,
    path = "/insert/products",
    responses(
        (status = 200, description = "Run finished; Success is false if any record failed", body = LegacySyncResponse),
        (status = 409, description = "Already running", body = LegacySyncResponse),
        (status = 502, description = "Fetch failed", body = LegacySyncResponse)
    ),
    tag = "legacy"
)]
pub async fn insert_products(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<LegacySyncResponse>) {
    legacy_sync(&state, CatalogKind::Products).await
}

/// Legacy shop trigger
#[utoipa::path(
    get,
    path = "/insert/shops",
    responses(
        (status = 200, description = "Run finished; Success is false if any record failed", body = LegacySyncResponse),
        (status = 409, description = "Already running", body = LegacySyncResponse),
        (status = 502, description = "Fetch failed", body = LegacySyncResponse)
    ),
    tag = "legacy"
)]
pub async fn insert_shops(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<LegacySyncResponse>) {
    legacy_sync(&state, CatalogKind::Shops).await
}

/// Run with the configured defaults and answer in the legacy envelope
async fn legacy_sync(
    state: &AppState,
    catalog: CatalogKind,
) -> (StatusCode, Json<LegacySyncResponse>) {
    info!("{}: legacy trigger", catalog);

    let result = match state.registry.get(catalog) {
        Ok(job) => job.run(state.defaults).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => (StatusCode::OK, Json(LegacySyncResponse::from_report(&report))),
        Err(e) => {
            let err = TransferSrvError::from(e);
            warn!("{}: sync failed: {}", catalog, err);
            (err.http_status(), Json(LegacySyncResponse::failure(err.to_string())))
        },
    }
}
