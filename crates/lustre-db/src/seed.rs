use lustre_core::ShippingRateConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert shipping rates from config into the database.
///
/// Rates are keyed by `(country_code, name)`; an existing rate has its price
/// replaced. Returns the number of rates processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_shipping_rates(
    pool: &PgPool,
    rates: &[ShippingRateConfig],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for rate in rates {
        sqlx::query(
            "INSERT INTO shipping_rates (id, name, country_code, price) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (country_code, name) DO UPDATE SET \
                 price = EXCLUDED.price, \
                 updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(&rate.name)
        .bind(&rate.country_code)
        .bind(rate.price)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
