//! Catalog Transfer Service (`transfersrv`)
//!
//! Serves the reconciliation API, or runs a single catalog from the command
//! line.

use std::future::IntoFuture;

use clap::Parser;
use tracing::{error, info, warn};
#[cfg(feature = "swagger-ui")]
use utoipa::OpenApi;
#[cfg(feature = "swagger-ui")]
use utoipa_swagger_ui::SwaggerUi;

use catalog_recon::{CatalogKind, SyncOptions};
use common::bootstrap_database::setup_mysql_pool;
use common::service_bootstrap::{self, ServiceInfo};
use common::shutdown::shutdown_with_deadline;
use errors::{TransferError, TransferResult};
use transfersrv::{
    api::create_routes,
    bootstrap::{self, Args, Command},
    config::TransferConfig,
};

#[tokio::main]
async fn main() -> TransferResult<()> {
    service_bootstrap::load_development_env();

    let args = Args::parse();
    let service_info = bootstrap::service_info();

    // Logging settings come from the config, so load it before validating
    let config = TransferConfig::load(args.service.config.as_deref())?;
    bootstrap::initialize_logging(&args.service, &service_info, &config)?;
    if !args.service.no_color {
        service_bootstrap::print_startup_banner(&service_info);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }
    bootstrap::describe_configuration(&config);

    // Validation mode: validate and exit
    if args.service.validate {
        info!("Validation completed successfully");
        return Ok(());
    }

    match args.command() {
        Command::Serve => serve(&args, service_info, &config).await,
        Command::Run { catalog, dry_run } => run_once(service_info, &config, catalog, dry_run).await,
        Command::Check => check(&config).await,
    }
}

async fn serve(
    args: &Args,
    service_info: ServiceInfo,
    config: &TransferConfig,
) -> TransferResult<()> {
    let bind_address = bootstrap::determine_bind_address(
        args.service.bind_address.as_deref(),
        config,
        &service_info,
    );

    let databases = bootstrap::connect_databases(config).await?;
    let state = bootstrap::build_state(service_info, config, &databases);

    let guard = state.guard.clone();
    let app = create_routes(state);

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        SwaggerUi::new("/docs").url("/openapi.json", transfersrv::api::ApiDoc::openapi()),
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| TransferError::StartupFailed(format!("bind {}: {}", bind_address, e)))?;
    info!("Transfer Server online at http://{}", bind_address);
    #[cfg(feature = "swagger-ui")]
    info!("API docs at http://{}/docs", bind_address);

    // In-flight runs get a bounded window to finish after the signal
    let (trigger, deadline) = shutdown_with_deadline(config.api.shutdown_grace());
    let server = axum::serve(listener, app).with_graceful_shutdown(trigger);

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| TransferError::Internal(format!("server error: {}", e)))?;
        },
        _ = deadline => {
            warn!(
                "Shutdown grace of {}s elapsed; abandoning runs for {:?}",
                config.api.shutdown_grace_secs,
                guard.active()
            );
        },
    }

    info!("Transfer Server stopped");
    Ok(())
}

/// One run; the JSON report goes to stdout
async fn run_once(
    service_info: ServiceInfo,
    config: &TransferConfig,
    catalog: CatalogKind,
    dry_run: bool,
) -> TransferResult<()> {
    let databases = bootstrap::connect_databases(config).await?;
    let state = bootstrap::build_state(service_info, config, &databases);

    let job = state.registry.get(catalog).map_err(TransferError::from)?;
    let mut options: SyncOptions = config.sync.options();
    if dry_run {
        options = options.dry_run(true);
    }
    let report = job.run(options).await.map_err(TransferError::from)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_clean() {
        Ok(())
    } else {
        for failure in report.apply.iter().flat_map(|a| a.failures()) {
            warn!(
                "{:?} {} failed: {}",
                failure.op,
                failure.tag,
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
        Err(TransferError::Internal(format!(
            "{}: {} operation(s) failed",
            catalog,
            report.failed()
        )))
    }
}

/// Ping both databases once
async fn check(config: &TransferConfig) -> TransferResult<()> {
    let mut failed = Vec::new();
    for (name, settings) in [("source_db", &config.source_db), ("target_db", &config.target_db)] {
        match setup_mysql_pool(settings).await {
            Ok(pool) => {
                info!("{}: OK ({})", name, settings.endpoint());
                pool.close().await;
            },
            Err(e) => {
                error!("{}: {}", name, e);
                failed.push(name);
            },
        }
    }

    if failed.is_empty() {
        info!("All checks passed");
        Ok(())
    } else {
        Err(TransferError::StartupFailed(format!(
            "unreachable: {}",
            failed.join(", ")
        )))
    }
}
