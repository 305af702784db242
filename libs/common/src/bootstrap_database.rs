//! MySQL connection setup
//!
//! Pool creation with a startup ping and retry, shared by every service that
//! talks to a catalog database.

use std::fmt;
use std::time::{Duration, Instant};

use errors::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, info, warn};

use crate::api_types::ComponentHealth;

/// Connection settings for one MySQL database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Pool size upper bound
    pub max_open: u32,
    /// Connections kept open while idle
    pub max_idle: u32,
    pub connect_timeout_secs: u64,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            max_open: 10,
            max_idle: 2,
            connect_timeout_secs: 10,
        }
    }
}

// Never print the password
impl fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("max_open", &self.max_open)
            .field("max_idle", &self.max_idle)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl MySqlSettings {
    /// `user@host:port/database`, safe for logs
    pub fn endpoint(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_open)
            .min_connections(self.max_idle.min(self.max_open))
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Field problems as `(field, reason)` pairs; empty when valid
    pub fn problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();
        if self.host.trim().is_empty() {
            problems.push(("host", "must not be empty".to_string()));
        }
        if self.port == 0 {
            problems.push(("port", "must be greater than 0".to_string()));
        }
        if self.user.trim().is_empty() {
            problems.push(("user", "must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            problems.push(("database", "must not be empty".to_string()));
        }
        if self.max_open == 0 {
            problems.push(("max_open", "must be greater than 0".to_string()));
        }
        if self.max_idle > self.max_open {
            problems.push((
                "max_idle",
                format!("{} exceeds max_open {}", self.max_idle, self.max_open),
            ));
        }
        problems
    }
}

/// Create a pool and verify it with `SELECT 1`
pub async fn setup_mysql_pool(settings: &MySqlSettings) -> TransferResult<MySqlPool> {
    let endpoint = settings.endpoint();
    info!("MySQL: {}", endpoint);

    let pool = settings
        .pool_options()
        .connect_with(settings.connect_options())
        .await
        .map_err(|e| TransferError::ConnectionFailed {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

    ping(&pool).await.map_err(|e| TransferError::ConnectionFailed {
        endpoint: endpoint.clone(),
        reason: e.to_string(),
    })?;

    debug!("MySQL pool ready: {}", endpoint);
    Ok(pool)
}

/// Create a pool, retrying with a linear backoff
pub async fn setup_mysql_with_retry(
    settings: &MySqlSettings,
    max_retries: u32,
) -> TransferResult<MySqlPool> {
    let mut last_error = None;

    for attempt in 1..=max_retries.max(1) {
        debug!("DB attempt {}/{}", attempt, max_retries);

        match setup_mysql_pool(settings).await {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                warn!("DB attempt {} failed: {}", attempt, e);
                last_error = Some(e);

                if attempt < max_retries {
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                }
            },
        }
    }

    Err(last_error.unwrap_or_else(|| {
        TransferError::Database("Failed to connect to database after all retries".to_string())
    }))
}

/// Round-trip a trivial query
pub async fn ping(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Ping a pool and report it as a health component
pub async fn check_health(pool: &MySqlPool) -> ComponentHealth {
    let start = Instant::now();
    let result = ping(pool).await;
    let elapsed = start.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentHealth::healthy(elapsed),
        Err(e) => ComponentHealth::unhealthy(e.to_string(), elapsed),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn valid() -> MySqlSettings {
        MySqlSettings {
            user: "sync".to_string(),
            password: "secret".to_string(),
            database: "smartshop".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = MySqlSettings::default();
        assert_eq!(settings.port, 3306);
        assert_eq!(settings.max_open, 10);
        assert_eq!(settings.connect_timeout_secs, 10);
    }

    #[test]
    fn test_endpoint_and_debug_hide_password() {
        let settings = valid();
        assert_eq!(settings.endpoint(), "sync@127.0.0.1:3306/smartshop");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_problems() {
        assert!(valid().problems().is_empty());

        let settings = MySqlSettings {
            host: String::new(),
            port: 0,
            max_open: 2,
            max_idle: 5,
            ..valid()
        };
        let fields: Vec<&str> = settings.problems().iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["host", "port", "max_idle"]);

        let fields: Vec<&str> = MySqlSettings::default()
            .problems()
            .iter()
            .map(|(f, _)| *f)
            .collect();
        assert_eq!(fields, vec!["user", "database"]);
    }

    #[tokio::test]
    async fn test_unreachable_database_fails() {
        let settings = MySqlSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout_secs: 1,
            max_idle: 0,
            ..valid()
        };
        let err = setup_mysql_pool(&settings).await.unwrap_err();
        assert!(matches!(err, TransferError::ConnectionFailed { .. }));
    }
}
