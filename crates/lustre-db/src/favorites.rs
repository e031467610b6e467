//! Database operations for the `favorites` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Returns the favorited product ids for `user_id`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_favorites(pool: &PgPool, user_id: &str) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT product_id FROM favorites \
         WHERE user_id = $1 \
         ORDER BY created_at, product_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Marks a product as a favorite. Adding an existing favorite is a no-op.
///
/// Returns `true` when a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn add_favorite(pool: &PgPool, user_id: &str, product_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, product_id) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_foreign_key_violation() {
                return DbError::NotFound;
            }
        }
        DbError::Sqlx(e)
    })?;

    Ok(result.rows_affected() > 0)
}

/// Removes a favorite. Returns `true` when a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn remove_favorite(
    pool: &PgPool,
    user_id: &str,
    product_id: Uuid,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
