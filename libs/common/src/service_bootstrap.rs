//! Unified service bootstrap utilities
//!
//! Provides common initialization functionality for the service binaries,
//! including startup banners, logging initialization, and environment setup.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::logging::{self, LogConfig};

/// Service metadata for startup
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service name (e.g., "transfersrv")
    pub name: String,
    /// Service version
    pub version: String,
    /// Service description
    pub description: String,
    /// Default port
    pub default_port: u16,
}

impl ServiceInfo {
    /// Create new service info
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_port: u16) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: description.into(),
            default_port,
        }
    }

    /// Override the version (services pass their own CARGO_PKG_VERSION)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Print unified startup banner
pub fn print_startup_banner(service: &ServiceInfo) {
    let banner = r#"
 ████████╗██████╗  █████╗ ███╗   ██╗███████╗███████╗███████╗██████╗
 ╚══██╔══╝██╔══██╗██╔══██╗████╗  ██║██╔════╝██╔════╝██╔════╝██╔══██╗
    ██║   ██████╔╝███████║██╔██╗ ██║███████╗█████╗  █████╗  ██████╔╝
    ██║   ██╔══██╗██╔══██║██║╚██╗██║╚════██║██╔══╝  ██╔══╝  ██╔══██╗
    ██║   ██║  ██║██║  ██║██║ ╚████║███████║██║     ███████╗██║  ██║
    ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═══╝╚══════╝╚═╝     ╚══════╝╚═╝  ╚═╝
    "#;

    info!("{}", banner);
    info!("");
    info!(" {} v{}", service.name.to_uppercase(), service.version);
    info!(" {}", service.description);
    info!(" Default Port: {}", service.default_port);
    info!("");
}

/// Logging section shared by service configs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive when RUST_LOG is unset
    pub level: String,
    /// Log root directory (TRANSFER_LOG_DIR overrides)
    pub dir: String,
    /// Write JSON to the log file
    pub json: bool,
    /// Enable the rolling file layer
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            json: false,
            file: true,
        }
    }
}

/// Initialize logging for a service
///
/// Log root directory priority:
/// 1. TRANSFER_LOG_DIR environment variable
/// 2. `settings.dir`
/// 3. Default "logs"
///
/// `level_override` (from the command line) replaces `settings.level` and
/// also wins over `RUST_LOG`.
pub fn init_logging(
    service: &ServiceInfo,
    settings: Option<&LoggingSettings>,
    level_override: Option<&str>,
    ansi: bool,
) -> anyhow::Result<()> {
    let defaults = LoggingSettings::default();
    let settings = settings.unwrap_or(&defaults);

    logging::init_log_root(Some(settings.dir.as_str()));
    let log_dir = logging::get_log_root().join(&service.name);

    let log_config = LogConfig {
        service_name: service.name.clone(),
        log_dir,
        level: settings.level.clone(),
        level_override: level_override.map(str::to_string),
        enable_file: settings.file,
        enable_json: settings.json,
        ansi,
    };

    logging::init_with_config(log_config)
}

/// Load environment variables in development mode
///
/// In debug builds, reads .env file and sets environment variables.
/// In release builds, this is a no-op (production environments should set variables externally).
pub fn load_development_env() {
    #[cfg(debug_assertions)]
    {
        if let Ok(content) = std::fs::read_to_string(".env") {
            for (key, value) in parse_env_lines(&content) {
                // Only set if not already set
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

/// Parse `KEY=VALUE` lines, skipping comments and blanks
fn parse_env_lines(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches('"')))
        .collect()
}

/// Helper to get service port from configuration or environment
///
/// An explicit non-default config port wins; otherwise `SERVICE_PORT`, then
/// `{NAME}_PORT`, then the config port or the service default.
pub fn get_service_port(config_port: u16, service: &ServiceInfo) -> u16 {
    let is_default = config_port == 0 || config_port == service.default_port;

    if is_default {
        if let Some(p) = env_port("SERVICE_PORT") {
            return p;
        }

        let env_var = format!("{}_PORT", service.name.to_uppercase());
        if let Some(p) = env_port(&env_var) {
            return p;
        }
    }

    if config_port > 0 {
        config_port
    } else {
        service.default_port
    }
}

fn env_port(var: &str) -> Option<u16> {
    std::env::var(var).ok().and_then(|p| p.parse::<u16>().ok())
}
