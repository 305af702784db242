//! Service startup: command line, logging, configuration, database pools

use std::sync::Arc;

use catalog_recon::{CatalogKind, RunGuard};
use clap::{Parser, Subcommand};
use common::bootstrap_args::ServiceArgs;
use common::bootstrap_database::setup_mysql_with_retry;
use common::service_bootstrap::{self, ServiceInfo};
use errors::{TransferError, TransferResult};
use sqlx::mysql::MySqlPool;
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::config::{TransferConfig, DEFAULT_PORT};
use crate::store;

/// Connection attempts per database at startup
const DB_CONNECT_RETRIES: u32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "transfersrv",
    version = env!("CARGO_PKG_VERSION"),
    about = "Catalog transfer service: reconciles the web database against production"
)]
pub struct Args {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP service (default)
    Serve,
    /// Reconcile one catalog once, print the report and exit
    Run {
        /// products or shops
        #[arg(long)]
        catalog: CatalogKind,
        /// Compute the plan without touching the target
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and ping both databases
    Check,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

pub fn service_info() -> ServiceInfo {
    ServiceInfo::new(
        "transfersrv",
        "Catalog Transfer Service - production to web database reconciliation",
        DEFAULT_PORT,
    )
    .with_version(env!("CARGO_PKG_VERSION"))
}

/// Initialize logging from the loaded config and command-line overrides
pub fn initialize_logging(
    args: &ServiceArgs,
    service_info: &ServiceInfo,
    config: &TransferConfig,
) -> TransferResult<()> {
    service_bootstrap::init_logging(
        service_info,
        Some(&config.logging),
        args.log_level_override(),
        !args.no_color,
    )
    .map_err(|e| TransferError::Configuration(format!("Failed to init logging: {}", e)))
}

/// Log a summary of a validated configuration
pub fn describe_configuration(config: &TransferConfig) {
    info!("Service: {}", config.service.name);
    info!("Source database: {}", config.source_db.endpoint());
    info!("Target database: {}", config.target_db.endpoint());
    let catalogs: Vec<&str> = config.catalogs().iter().map(|c| c.as_str()).collect();
    info!("Catalogs: {}", catalogs.join(", "));
    debug!(
        "Sync defaults: dry_run={}, duplicate_policy={:?}",
        config.sync.dry_run, config.sync.duplicate_policy
    );
}

/// Determine bind address
/// Priority: CLI > Config (non-default) > SERVICE_PORT/TRANSFERSRV_PORT env > Default
pub fn determine_bind_address(
    cli_arg: Option<&str>,
    config: &TransferConfig,
    service_info: &ServiceInfo,
) -> String {
    if let Some(addr) = cli_arg {
        info!("Using bind address from command line: {}", addr);
        return addr.to_string();
    }

    let port = service_bootstrap::get_service_port(config.api.port, service_info);
    format!("{}:{}", config.api.host, port)
}

/// Source and target pools
pub struct Databases {
    pub source: MySqlPool,
    pub target: MySqlPool,
}

pub async fn connect_databases(config: &TransferConfig) -> TransferResult<Databases> {
    info!("Connecting to source database");
    let source = setup_mysql_with_retry(&config.source_db, DB_CONNECT_RETRIES).await?;
    info!("Connecting to target database");
    let target = setup_mysql_with_retry(&config.target_db, DB_CONNECT_RETRIES).await?;
    Ok(Databases { source, target })
}

/// Wire the MySQL stores into the handler state
pub fn build_state(
    service_info: ServiceInfo,
    config: &TransferConfig,
    databases: &Databases,
) -> Arc<AppState> {
    let guard = RunGuard::new();
    let registry = store::build_registry(
        &config.catalogs(),
        &databases.source,
        &databases.target,
        guard.clone(),
    );
    info!("Registered {} catalog job(s)", registry.len());

    Arc::new(
        AppState::new(service_info, registry, config.sync.options())
            .with_guard(guard)
            .with_database("source_db", databases.source.clone())
            .with_database("target_db", databases.target.clone()),
    )
}
