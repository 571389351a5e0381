/// Database connection pool management
///
/// The pool is created once at startup and handed to every repository. The
/// target database comes either from a URL or from discrete connection
/// parameters (host, port, user, password, dbname, sslmode).
///
/// # Example
///
/// ```no_run
/// use argus_shared::db::pool::{create_pool, ConnectionParams, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let params = ConnectionParams {
///         host: "localhost".to_string(),
///         port: 5432,
///         user: "argus".to_string(),
///         password: "argus".to_string(),
///         dbname: "argus".to_string(),
///         sslmode: "disable".to_string(),
///     };
///
///     let config = DatabaseConfig {
///         max_connections: 20,
///         ..DatabaseConfig::from_params(&params)?
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info, warn};

/// Discrete connection parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

impl ConnectionParams {
    /// `key=value` connection string, empty parts skipped
    ///
    /// The password is replaced by `***` when `redact` is set.
    pub fn connection_string(&self, redact: bool) -> String {
        let port = if self.port == 0 {
            String::new()
        } else {
            self.port.to_string()
        };
        let password = if redact && !self.password.is_empty() {
            "***"
        } else {
            self.password.as_str()
        };

        [
            ("host", self.host.as_str()),
            ("port", port.as_str()),
            ("user", self.user.as_str()),
            ("password", password),
            ("dbname", self.dbname.as_str()),
            ("sslmode", self.sslmode.as_str()),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let mut options = PgConnectOptions::new();

        if !self.host.is_empty() {
            options = options.host(&self.host);
        }
        if self.port != 0 {
            options = options.port(self.port);
        }
        if !self.user.is_empty() {
            options = options.username(&self.user);
        }
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.dbname.is_empty() {
            options = options.database(&self.dbname);
        }
        if !self.sslmode.is_empty() {
            options = options.ssl_mode(PgSslMode::from_str(&self.sslmode)?);
        }

        Ok(options)
    }
}

/// Configuration for the database connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub options: PgConnectOptions,

    /// Callers wait for a free connection once this many are in use
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long to wait for a connection before failing (seconds)
    pub acquire_timeout_seconds: u64,

    pub idle_timeout_seconds: Option<u64>,

    pub max_lifetime_seconds: Option<u64>,

    pub test_before_acquire: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            options: PgConnectOptions::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
        }
    }
}

impl DatabaseConfig {
    pub fn from_url(url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            options: PgConnectOptions::from_str(url)?,
            ..Default::default()
        })
    }

    pub fn from_params(params: &ConnectionParams) -> Result<Self, sqlx::Error> {
        debug!(target_db = %params.connection_string(true), "database parameters");
        Ok(Self {
            options: params.connect_options()?,
            ..Default::default()
        })
    }
}

/// Creates the pool and verifies connectivity with [`health_check`]
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .test_before_acquire(config.test_before_acquire);

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        pool_options = pool_options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        pool_options = pool_options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = pool_options.connect_with(config.options).await?;

    health_check(&pool).await?;

    info!("Database connection pool created");
    Ok(pool)
}

/// Runs `SELECT 1`
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        Ok(())
    } else {
        warn!("Database health check returned unexpected value: {}", result.0);
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Waits for checked-out connections to be returned, then closes the pool
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}
