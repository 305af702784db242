//! Unified logging for the transfer services
//!
//! Console output uses a compact `timestamp [LEVEL] message` format. An
//! optional daily-rolling file layer writes through a non-blocking appender,
//! either in the same format or as JSON.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Environment variable overriding the log root directory
pub const LOG_DIR_ENV: &str = "TRANSFER_LOG_DIR";

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2026-10-16T00:50:44.809123Z [INFO] products: Sync starting`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Keeps the non-blocking writers flushing for the life of the process
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

// ============================================================================
// Log Root Directory Configuration
// ============================================================================

/// Priority: `TRANSFER_LOG_DIR` env > config dir > "logs"
static LOG_ROOT: OnceLock<PathBuf> = OnceLock::new();

fn resolve_log_root(env_dir: Option<String>, config_dir: Option<&str>) -> PathBuf {
    env_dir
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| config_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize the log root directory once, before any file layer is created
pub fn init_log_root(config_dir: Option<&str>) {
    LOG_ROOT.get_or_init(|| resolve_log_root(std::env::var(LOG_DIR_ENV).ok(), config_dir));
}

/// Configured log root, or the env/default fallback if `init_log_root` was
/// never called
pub fn get_log_root() -> PathBuf {
    LOG_ROOT
        .get()
        .cloned()
        .unwrap_or_else(|| resolve_log_root(std::env::var(LOG_DIR_ENV).ok(), None))
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name, used as the log file prefix
    pub service_name: String,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Filter directive used when `RUST_LOG` is not set (e.g. "info")
    pub level: String,
    /// Level given on the command line; wins over `RUST_LOG`
    pub level_override: Option<String>,
    /// Write a daily-rolling log file in addition to the console
    pub enable_file: bool,
    /// Use JSON for the file layer
    pub enable_json: bool,
    /// Colored console output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            log_dir: get_log_root(),
            level: "info".to_string(),
            level_override: None,
            enable_file: true,
            enable_json: false,
            ansi: true,
        }
    }
}

/// Filter directives. Priority: command-line level > `RUST_LOG` > configured
/// level. Plain levels keep sqlx statement logging turned down.
fn filter_directives(
    override_level: Option<&str>,
    rust_log: Option<String>,
    level: &str,
) -> String {
    if let Some(cli) = override_level.filter(|s| !s.trim().is_empty()) {
        return format!("{},sqlx=warn", cli);
    }
    match rust_log.filter(|s| !s.trim().is_empty()) {
        Some(env) => env,
        None => format!("{},sqlx=warn", level),
    }
}

fn store_guard(guard: WorkerGuard) {
    let guards = GUARDS.get_or_init(|| Mutex::new(Vec::new()));
    match guards.lock() {
        Ok(mut guards) => guards.push(guard),
        Err(poisoned) => poisoned.into_inner().push(guard),
    }
}

fn build_file_layer<S>(config: &LogConfig) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    std::fs::create_dir_all(&config.log_dir)?;
    let appender = tracing_appender::rolling::daily(
        &config.log_dir,
        format!("{}.log", config.service_name),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    store_guard(guard);

    let layer = if config.enable_json {
        fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .event_format(BracketedLevelFormat)
            .boxed()
    };
    Ok(layer)
}

/// Initialize logging system with configuration
pub fn init_with_config(config: LogConfig) -> anyhow::Result<()> {
    let directives = filter_directives(
        config.level_override.as_deref(),
        std::env::var("RUST_LOG").ok(),
        &config.level,
    );
    let env_filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", directives, e))?;

    let console_layer = fmt::layer()
        .with_ansi(config.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = if config.enable_file {
        Some(build_file_layer(&config)?)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    if config.enable_file {
        tracing::info!("Logging: {} @ {:?}", config.service_name, config.log_dir);
    }
    tracing::debug!("Log filter: {}", directives);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::INFO), "[INFO]");
        assert_eq!(format_level(&Level::ERROR), "[ERROR]");
    }

    #[test]
    fn test_log_root_priority() {
        assert_eq!(
            resolve_log_root(Some("/var/log/transfer".to_string()), Some("cfg")),
            PathBuf::from("/var/log/transfer")
        );
        assert_eq!(resolve_log_root(None, Some("cfg")), PathBuf::from("cfg"));
        assert_eq!(
            resolve_log_root(Some("  ".to_string()), None),
            PathBuf::from("logs")
        );
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(None, None, "debug"), "debug,sqlx=warn");
        assert_eq!(
            filter_directives(None, Some("transfersrv=trace".to_string()), "info"),
            "transfersrv=trace"
        );
        assert_eq!(filter_directives(None, Some(String::new()), "warn"), "warn,sqlx=warn");
    }

    #[test]
    fn test_command_line_level_beats_rust_log() {
        assert_eq!(
            filter_directives(Some("debug"), Some("transfersrv=trace".to_string()), "info"),
            "debug,sqlx=warn"
        );
        assert_eq!(
            filter_directives(Some(" "), Some("warn".to_string()), "info"),
            "warn"
        );
    }

    #[test]
    fn test_file_layer_creates_log_dir() {
        let root = tempfile::tempdir().unwrap();
        let config = LogConfig {
            service_name: "transfersrv".to_string(),
            log_dir: root.path().join("transfersrv"),
            enable_json: true,
            ..Default::default()
        };
        let layer = build_file_layer::<tracing_subscriber::Registry>(&config);
        assert!(layer.is_ok());
        assert!(config.log_dir.is_dir());
    }
}
