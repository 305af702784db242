//! transfersrv configuration
//!
//! Layered with figment: built-in defaults, then the config file (YAML, TOML
//! or JSON by extension), then `TRANSFER_` environment variables using `__`
//! as the section separator (`TRANSFER_SOURCE_DB__PASSWORD`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog_recon::{CatalogKind, DuplicatePolicy, SyncOptions};
use common::bootstrap_database::MySqlSettings;
use common::service_bootstrap::LoggingSettings;
use errors::{TransferError, TransferResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default drain window for in-flight runs on shutdown
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Config file used when neither `--config` nor `CONFIG_FILE` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/transfersrv.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TRANSFER_";

/// Default HTTP port, same as the legacy transfer server
pub const DEFAULT_PORT: u16 = 9001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub name: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: "transfersrv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub host: String,
    pub port: u16,
    /// How long shutdown waits for in-flight runs before abandoning them
    pub shutdown_grace_secs: u64,
}

impl ApiSection {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

/// Reconciliation defaults applied to every triggered run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Plan only; requests can still ask for a dry run explicitly
    pub dry_run: bool,
    pub duplicate_policy: DuplicatePolicy,
    /// Catalogs served by this instance
    pub catalogs: Vec<CatalogKind>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            dry_run: false,
            duplicate_policy: DuplicatePolicy::default(),
            catalogs: CatalogKind::ALL.to_vec(),
        }
    }
}

impl SyncSection {
    pub fn options(&self) -> SyncOptions {
        SyncOptions::default()
            .dry_run(self.dry_run)
            .duplicate_policy(self.duplicate_policy)
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub service: ServiceSection,
    pub api: ApiSection,
    /// Authoritative production database
    pub source_db: MySqlSettings,
    /// Web database that receives the catalog
    pub target_db: MySqlSettings,
    pub logging: LoggingSettings,
    pub sync: SyncSection,
}

impl TransferConfig {
    /// Resolve the config file and load all layers
    ///
    /// An explicit path must exist. The default path is optional so the
    /// service can run purely from environment variables.
    pub fn load(path: Option<&str>) -> TransferResult<Self> {
        let figment = match path {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(TransferError::MissingConfig(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::base().merge(Self::file_provider(path)?)
            },
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::base().merge(Self::file_provider(&default)?)
                } else {
                    Self::base()
                }
            },
        };

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Defaults only, no file or environment
    fn base() -> Figment {
        Figment::from(Serialized::defaults(TransferConfig::default()))
    }

    fn file_provider(path: &Path) -> TransferResult<Figment> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TransferError::InvalidConfig {
                field: "config".to_string(),
                reason: format!("{} has no file extension", path.display()),
            })?;

        let figment = match extension {
            "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
            "toml" => Figment::new().merge(Toml::file(path)),
            "json" => Figment::new().merge(Json::file(path)),
            _ => {
                return Err(TransferError::InvalidConfig {
                    field: "config".to_string(),
                    reason: format!("unsupported config format: {}", extension),
                })
            },
        };
        Ok(figment)
    }

    fn extract(figment: Figment) -> TransferResult<Self> {
        figment
            .extract()
            .map_err(|e| TransferError::Configuration(format!("Failed to load configuration: {}", e)))
    }

    /// Check every section, reporting the first problem found
    pub fn validate(&self) -> TransferResult<()> {
        if self.service.name.trim().is_empty() {
            return Err(TransferError::InvalidConfig {
                field: "service.name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.api.port == 0 {
            return Err(TransferError::InvalidConfig {
                field: "api.port".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        for (section, db) in [("source_db", &self.source_db), ("target_db", &self.target_db)] {
            if let Some((field, reason)) = db.problems().into_iter().next() {
                return Err(TransferError::InvalidConfig {
                    field: format!("{}.{}", section, field),
                    reason,
                });
            }
        }

        if self.sync.catalogs.is_empty() {
            return Err(TransferError::InvalidConfig {
                field: "sync.catalogs".to_string(),
                reason: "at least one catalog must be enabled".to_string(),
            });
        }

        Ok(())
    }

    /// Enabled catalogs in declaration order, without repeats
    pub fn catalogs(&self) -> Vec<CatalogKind> {
        let mut catalogs = Vec::with_capacity(self.sync.catalogs.len());
        for catalog in &self.sync.catalogs {
            if !catalogs.contains(catalog) {
                catalogs.push(*catalog);
            }
        }
        catalogs
    }
}
