/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool built from a URL or discrete parameters
/// - `migrations`: embedded schema migrations
/// - `repository`: generic CRUD over any [`repository::Entity`]
/// - `value`: typed bind values, filters and the [`value::Patch`] update field
/// - `error`: [`error::RepoError`]
///
/// # Example
///
/// ```no_run
/// use argus_shared::db::pool::{create_pool, DatabaseConfig};
/// use argus_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_url(&std::env::var("DATABASE_URL")?)?;
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod value;
