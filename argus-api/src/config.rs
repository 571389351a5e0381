/// Configuration management for the API server
///
/// Settings come from the process environment; a `.env` file is loaded first
/// when present.
///
/// # Environment Variables
///
/// - `SERVER_HOST` / `SERVER_PORT`: bind address (default `0.0.0.0:8080`,
///   a leading `:` on the port is accepted)
/// - `ENVIRONMENT`: `develop` (default) or `production`
/// - `EXPOSE_ERROR_DETAILS`: put internal error text in responses
///   (default: on unless production)
/// - `CORS_ORIGINS`: comma-separated origins (default `*`)
/// - `DATABASE_URL`, or `POSTGRES_HOST`/`POSTGRES_PORT`/`POSTGRES_USER`/
///   `POSTGRES_PASSWORD`/`POSTGRES_DATABASE`/`POSTGRES_SSLMODE`
/// - `POSTGRES_POOL_MAX`: pool size (default 10)
/// - `SIGNING_KEY`: HMAC secret for tokens (required)
/// - `ACCESS_TOKEN_TTL_HOURS` / `REFRESH_TOKEN_TTL_HOURS`: 168 / 5040
/// - `MINIO_ENDPOINT`, `MINIO_ACCESS_KEY`, `MINIO_SECRET_KEY`,
///   `MINIO_BUCKET_NAME`, `MINIO_REGION`, `MINIO_MAX_FILE_SIZE`
///
/// # Example
///
/// ```no_run
/// use argus_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use argus_shared::{
    db::pool::{ConnectionParams, DatabaseConfig},
    storage::S3Settings,
};
use std::{env, str::FromStr};

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,

    /// Include internal error text in the `data` field of error envelopes
    pub expose_error_details: bool,

    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Used verbatim when set; otherwise `params` are assembled
    pub url: Option<String>,
    pub params: ConnectionParams,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_key: String,
    pub access_ttl_hours: i64,
    pub refresh_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub s3: S3Settings,

    /// Upload limit in bytes
    pub max_file_size: usize,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let environment = or("ENVIRONMENT", "develop");
        let production = environment.eq_ignore_ascii_case("production");

        let expose_error_details = match var("EXPOSE_ERROR_DETAILS") {
            Some(v) => parse_bool(&v)
                .with_context(|| format!("EXPOSE_ERROR_DETAILS has invalid value {v:?}"))?,
            None => !production,
        };

        let port = or("SERVER_PORT", "8080");
        let port = port
            .trim_start_matches(':')
            .parse::<u16>()
            .with_context(|| format!("SERVER_PORT has invalid value {port:?}"))?;

        let cors_origins = or("CORS_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let signing_key = var("SIGNING_KEY")
            .ok_or_else(|| anyhow::anyhow!("SIGNING_KEY environment variable is required"))?;

        let pg_port = or("POSTGRES_PORT", "5432");
        let params = ConnectionParams {
            host: or("POSTGRES_HOST", "localhost"),
            port: pg_port
                .parse()
                .with_context(|| format!("POSTGRES_PORT has invalid value {pg_port:?}"))?,
            user: or("POSTGRES_USER", ""),
            password: or("POSTGRES_PASSWORD", ""),
            dbname: or("POSTGRES_DATABASE", ""),
            sslmode: or("POSTGRES_SSLMODE", "disable"),
        };

        Ok(Self {
            server: ServerConfig {
                host: or("SERVER_HOST", "0.0.0.0"),
                port,
                environment,
                expose_error_details,
                cors_origins,
            },
            database: DatabaseSettings {
                url: var("DATABASE_URL"),
                params,
                max_connections: parse_or(&var, "POSTGRES_POOL_MAX", 10)?,
            },
            auth: AuthConfig {
                signing_key,
                access_ttl_hours: parse_or(&var, "ACCESS_TOKEN_TTL_HOURS", 168)?,
                refresh_ttl_hours: parse_or(&var, "REFRESH_TOKEN_TTL_HOURS", 5040)?,
            },
            storage: StorageConfig {
                s3: S3Settings {
                    endpoint: or("MINIO_ENDPOINT", "localhost:9000"),
                    access_key: or("MINIO_ACCESS_KEY", ""),
                    secret_key: or("MINIO_SECRET_KEY", ""),
                    bucket: or("MINIO_BUCKET_NAME", "argus"),
                    region: or("MINIO_REGION", "us-east-1"),
                },
                max_file_size: parse_or(&var, "MINIO_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }
}

impl AuthConfig {
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.access_ttl_hours)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.refresh_ttl_hours)
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_hours * 3600
    }
}

impl DatabaseSettings {
    /// Pool settings, from `DATABASE_URL` or the individual parameters
    pub fn pool_config(&self) -> Result<DatabaseConfig, sqlx::Error> {
        let mut config = match &self.url {
            Some(url) => DatabaseConfig::from_url(url)?,
            None => DatabaseConfig::from_params(&self.params)?,
        };
        config.max_connections = self.max_connections;
        config.min_connections = config.min_connections.min(self.max_connections);
        Ok(config)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
