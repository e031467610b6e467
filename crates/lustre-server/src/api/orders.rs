use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use lustre_core::{OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct OrderView {
    pub id: Uuid,
    pub order_id: String,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<lustre_db::OrderRow> for OrderView {
    type Error = lustre_db::DbError;

    fn try_from(row: lustre_db::OrderRow) -> Result<Self, Self::Error> {
        let status = row.order_status()?;
        let payment_status = row.payment_status()?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            email: row.email,
            items: row.items.0,
            subtotal: row.subtotal,
            taxes: row.taxes,
            shipping: row.shipping,
            total: row.total,
            status,
            payment_status,
            shipping_address: row.shipping_address.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    pub status: String,
    pub payment_status: Option<String>,
}

fn to_views(rows: Vec<lustre_db::OrderRow>, req_id: &str) -> Result<Vec<OrderView>, ApiError> {
    rows.into_iter()
        .map(|row| OrderView::try_from(row).map_err(|e| map_db_error(req_id.to_owned(), &e)))
        .collect()
}

/// GET /api/v1/orders: newest first (admin).
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let rows = lustre_db::list_orders(&state.pool, Some(normalize_limit(query.limit)))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = to_views(rows, &req_id.0)?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/orders/{order_id}: order confirmation lookup.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let rid = &req_id.0;
    let row = lustre_db::get_order_by_order_id(&state.pool, &order_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("order '{order_id}' not found")))?;

    let view = OrderView::try_from(row).map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// PATCH /api/v1/orders/{order_id}/status (admin).
pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let rid = &req_id.0;

    let status: OrderStatus = body
        .status
        .trim()
        .parse()
        .map_err(|e: lustre_core::CoreError| ApiError::new(rid, "validation_error", e.to_string()))?;
    let payment_status = body
        .payment_status
        .as_deref()
        .map(|s| s.trim().parse::<PaymentStatus>())
        .transpose()
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    let row = lustre_db::update_order_status(&state.pool, &order_id, status, payment_status)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(%order_id, %status, "order status updated");
    let view = OrderView::try_from(row).map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(Json(ApiResponse::new(view, req_id.0)))
}
