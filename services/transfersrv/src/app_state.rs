//! Shared state for the HTTP handlers

use std::collections::HashMap;
use std::time::Instant;

use catalog_recon::{RunGuard, SyncOptions, SyncRegistry};
use common::service_bootstrap::ServiceInfo;
use common::{ComponentHealth, HealthStatus};
use sqlx::mysql::MySqlPool;

pub struct AppState {
    pub service: ServiceInfo,
    pub registry: SyncRegistry,
    /// Applied to runs that do not override them
    pub defaults: SyncOptions,
    /// Shared with every registered job
    pub guard: RunGuard,
    /// Pools reported by `/health`, by component name
    databases: Vec<(String, MySqlPool)>,
    start_time: Instant,
}

impl AppState {
    pub fn new(service: ServiceInfo, registry: SyncRegistry, defaults: SyncOptions) -> Self {
        Self {
            service,
            registry,
            defaults,
            guard: RunGuard::new(),
            databases: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn with_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_database(mut self, name: impl Into<String>, pool: MySqlPool) -> Self {
        self.databases.push((name.into(), pool));
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Ping every registered database
    pub async fn health(&self) -> HealthStatus {
        let mut checks: HashMap<String, ComponentHealth> = HashMap::new();
        for (name, pool) in &self.databases {
            checks.insert(
                name.clone(),
                common::bootstrap_database::check_health(pool).await,
            );
        }
        HealthStatus::from_checks(
            &self.service.name,
            &self.service.version,
            self.uptime_seconds(),
            checks,
        )
    }
}
