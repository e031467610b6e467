//! Database operations for the `shipping_rates` table.

use chrono::{DateTime, Utc};
use lustre_core::{ShippingRate, ShippingRateConfig};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `shipping_rates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShippingRateRow {
    pub id: Uuid,
    pub name: String,
    pub country_code: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShippingRateRow> for ShippingRate {
    fn from(row: ShippingRateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            country_code: row.country_code,
            price: row.price,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShippingRateUpdate {
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub price: Option<Decimal>,
}

/// Returns all shipping rates ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shipping_rates(pool: &PgPool) -> Result<Vec<ShippingRateRow>, DbError> {
    let rows = sqlx::query_as::<_, ShippingRateRow>(
        "SELECT id, name, country_code, price, created_at, updated_at \
         FROM shipping_rates \
         ORDER BY name, country_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the cheapest rate for `country_code`, or `None` if the country has
/// no rate of its own.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_shipping_rate_by_country(
    pool: &PgPool,
    country_code: &str,
) -> Result<Option<ShippingRateRow>, DbError> {
    let row = sqlx::query_as::<_, ShippingRateRow>(
        "SELECT id, name, country_code, price, created_at, updated_at \
         FROM shipping_rates \
         WHERE country_code = $1 \
         ORDER BY price, name \
         LIMIT 1",
    )
    .bind(country_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a shipping rate.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if the country already has a rate with the
/// same name, or [`DbError::Sqlx`] for any other failure.
pub async fn create_shipping_rate(
    pool: &PgPool,
    rate: &ShippingRateConfig,
) -> Result<ShippingRateRow, DbError> {
    let row = sqlx::query_as::<_, ShippingRateRow>(
        "INSERT INTO shipping_rates (id, name, country_code, price) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, country_code, price, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&rate.name)
    .bind(&rate.country_code)
    .bind(rate.price)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)?;

    Ok(row)
}

/// Applies a sparse update to a shipping rate.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no rate has `id`, [`DbError::Conflict`] if
/// the new (country, name) pair is taken, or [`DbError::Sqlx`] otherwise.
pub async fn update_shipping_rate(
    pool: &PgPool,
    id: Uuid,
    update: &ShippingRateUpdate,
) -> Result<ShippingRateRow, DbError> {
    let row = sqlx::query_as::<_, ShippingRateRow>(
        "UPDATE shipping_rates \
         SET name         = COALESCE($2, name), \
             country_code = COALESCE($3, country_code), \
             price        = COALESCE($4, price), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING id, name, country_code, price, created_at, updated_at",
    )
    .bind(id)
    .bind(&update.name)
    .bind(&update.country_code)
    .bind(update.price)
    .fetch_optional(pool)
    .await
    .map_err(DbError::from_write)?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a shipping rate.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no rate has `id`, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn delete_shipping_rate(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM shipping_rates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
