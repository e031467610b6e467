//! Database operations for the `orders` table.

use chrono::{DateTime, Utc};
use lustre_core::{OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ORDER_COLUMNS: &str = "id, order_id, email, items, subtotal, taxes, shipping, total, \
     status, payment_status, shipping_address, created_at, updated_at";

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    /// Human-readable reference, `ORD-<millis>-<suffix>`.
    pub order_id: String,
    pub email: String,
    pub items: Json<Vec<OrderItem>>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: String,
    pub payment_status: String,
    pub shipping_address: Json<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Parsed `status` column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if the stored value is not a known status.
    pub fn order_status(&self) -> Result<OrderStatus, DbError> {
        self.status
            .parse::<OrderStatus>()
            .map_err(|e| DbError::Decode {
                column: "status",
                reason: e.to_string(),
            })
    }

    /// Parsed `payment_status` column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if the stored value is not a known status.
    pub fn payment_status(&self) -> Result<PaymentStatus, DbError> {
        self.payment_status
            .parse::<PaymentStatus>()
            .map_err(|e| DbError::Decode {
                column: "payment_status",
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
}

/// Returns all orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, limit: Option<i64>) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         ORDER BY created_at DESC, id \
         LIMIT COALESCE($1, 9223372036854775807)"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns an order by its human-readable reference, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_order_id(
    pool: &PgPool,
    order_id: &str,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new order with `pending` status and payment status.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if `order_id` is already taken, or
/// [`DbError::Sqlx`] for any other failure.
pub async fn create_order(pool: &PgPool, order: &NewOrder) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (id, order_id, email, items, subtotal, taxes, shipping, total, \
              status, payment_status, shipping_address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&order.order_id)
    .bind(&order.email)
    .bind(Json(&order.items))
    .bind(order.subtotal)
    .bind(order.taxes)
    .bind(order.shipping)
    .bind(order.total)
    .bind(OrderStatus::Pending.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(Json(&order.shipping_address))
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)?;

    Ok(row)
}

/// Sets an order's status and, when given, its payment status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order has `order_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: &str,
    status: OrderStatus,
    payment_status: Option<PaymentStatus>,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders \
         SET status         = $2, \
             payment_status = COALESCE($3, payment_status), \
             updated_at     = NOW() \
         WHERE order_id = $1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(status.as_str())
    .bind(payment_status.map(PaymentStatus::as_str))
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
