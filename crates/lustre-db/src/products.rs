//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use lustre_core::{ParsedProduct, Product, ProductSize};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, name, description, price, cost, category, product_type, \
     image_url, video_url, stock, sizes, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub category: String,
    pub product_type: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub stock: i32,
    pub sizes: Json<Vec<ProductSize>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            cost: row.cost,
            category: row.category,
            product_type: row.product_type,
            image_url: row.image_url,
            video_url: row.video_url,
            stock: row.stock,
            sizes: row.sizes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new product. The id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub category: String,
    pub product_type: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub stock: i32,
    pub sizes: Vec<ProductSize>,
}

impl From<&ParsedProduct> for NewProduct {
    fn from(parsed: &ParsedProduct) -> Self {
        Self {
            name: parsed.name.clone(),
            description: parsed.description.clone(),
            price: parsed.price,
            cost: Some(parsed.cost),
            category: parsed.category.clone(),
            product_type: None,
            image_url: parsed.image_url.clone(),
            video_url: parsed.video_url.clone(),
            stock: parsed.stock,
            sizes: parsed.sizes.clone(),
        }
    }
}

/// Sparse update. `None` keeps the stored value; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Option<Decimal>>,
    pub category: Option<String>,
    pub product_type: Option<Option<String>>,
    pub image_url: Option<String>,
    pub video_url: Option<Option<String>>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<ProductSize>>,
}

impl ProductUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.cost.is_none()
            && self.category.is_none()
            && self.product_type.is_none()
            && self.image_url.is_none()
            && self.video_url.is_none()
            && self.stock.is_none()
            && self.sizes.is_none()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all products, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the products in `category`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_category(
    pool: &PgPool,
    category: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE category = $1 \
         ORDER BY created_at DESC, id"
    ))
    .bind(category)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the products whose ids are in `ids`, in no particular order.
/// Unknown ids are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_products_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<ProductRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a product and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (for example a `CHECK`
/// violation on a negative price or stock).
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (id, name, description, price, cost, category, product_type, \
              image_url, video_url, stock, sizes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.cost)
    .bind(&product.category)
    .bind(&product.product_type)
    .bind(&product.image_url)
    .bind(&product.video_url)
    .bind(product.stock)
    .bind(Json(&product.sizes))
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)?;

    Ok(row)
}

/// Applies a sparse update and returns the updated row.
///
/// Uses `COALESCE` and supplied-flags in a single `UPDATE … RETURNING`, so an
/// empty update only bumps `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    update: &ProductUpdate,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name         = COALESCE($2, name), \
             description  = COALESCE($3, description), \
             price        = COALESCE($4, price), \
             cost         = CASE WHEN $5::BOOL THEN $6 ELSE cost END, \
             category     = COALESCE($7, category), \
             product_type = CASE WHEN $8::BOOL THEN $9 ELSE product_type END, \
             image_url    = COALESCE($10, image_url), \
             video_url    = CASE WHEN $11::BOOL THEN $12 ELSE video_url END, \
             stock        = COALESCE($13, stock), \
             sizes        = COALESCE($14, sizes), \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.price)
    .bind(update.cost.is_some())
    .bind(update.cost.flatten())
    .bind(&update.category)
    .bind(update.product_type.is_some())
    .bind(update.product_type.clone().flatten())
    .bind(&update.image_url)
    .bind(update.video_url.is_some())
    .bind(update.video_url.clone().flatten())
    .bind(update.stock)
    .bind(update.sizes.as_ref().map(Json))
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
