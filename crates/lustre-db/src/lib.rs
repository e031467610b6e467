use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Relative to this crate's Cargo.toml: the workspace `migrations/` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    /// Pool limits from the `LUSTRE_DB_*` settings.
    #[must_use]
    pub fn from_app_config(config: &lustre_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate record: {0}")]
    Conflict(String),
    #[error("corrupt stored value in {column}: {reason}")]
    Decode { column: &'static str, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Unique violations become [`DbError::Conflict`]; anything else is
    /// wrapped as-is.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(db_err.message().to_string())
            }
            _ => DbError::Sqlx(err),
        }
    }
}

/// Open a Postgres pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Apply pending migrations and return how many ran.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migration_count(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migration_count(pool).await;

    Ok(usize::try_from((after - before).max(0)).unwrap_or(0))
}

// Zero on a fresh database, where `_sqlx_migrations` does not exist yet.
async fn applied_migration_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trip a `SELECT 1` through the pool.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database does not answer.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}


pub mod favorites;
pub mod orders;
pub mod products;
pub mod seed;
pub mod shipping_rates;

pub use favorites::{add_favorite, list_favorites, remove_favorite};
pub use orders::{
    create_order, get_order_by_order_id, list_orders, update_order_status, NewOrder, OrderRow,
};
pub use products::{
    create_product, delete_product, get_product, get_products_by_ids, list_products,
    list_products_by_category, update_product, NewProduct, ProductRow, ProductUpdate,
};
pub use seed::seed_shipping_rates;
pub use shipping_rates::{
    create_shipping_rate, delete_shipping_rate, get_shipping_rate_by_country,
    list_shipping_rates, update_shipping_rate, ShippingRateRow, ShippingRateUpdate,
};
