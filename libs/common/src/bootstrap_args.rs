//! Common command-line arguments for the service binaries
//!
//! Provides a unified argument structure that services flatten into their own CLI

#[cfg(feature = "cli")]
use clap::Args;

/// Common service startup arguments
///
/// Standard options for configuration, logging, and validation.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Args))]
pub struct ServiceArgs {
    /// Configuration file (YAML, TOML or JSON)
    #[cfg_attr(
        feature = "cli",
        clap(short = 'c', long = "config", env = "CONFIG_FILE", global = true)
    )]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[cfg_attr(feature = "cli", clap(short = 'l', long, global = true))]
    pub log_level: Option<String>,

    /// Optional bind address override (e.g., 127.0.0.1:9001)
    #[cfg_attr(feature = "cli", clap(short = 'b', long, env = "BIND_ADDRESS"))]
    pub bind_address: Option<String>,

    /// Enable debug mode with verbose output
    #[cfg_attr(feature = "cli", clap(long, global = true))]
    pub debug: bool,

    /// Disable colored output (useful for log files)
    #[cfg_attr(feature = "cli", clap(long, global = true))]
    pub no_color: bool,

    /// Only validate configuration without starting service
    #[cfg_attr(feature = "cli", clap(long))]
    pub validate: bool,
}

impl ServiceArgs {
    /// Effective log level override: explicit flag, else "debug" in debug mode
    pub fn log_level_override(&self) -> Option<&str> {
        match &self.log_level {
            Some(level) => Some(level.as_str()),
            None if self.debug => Some("debug"),
            None => None,
        }
    }
}
