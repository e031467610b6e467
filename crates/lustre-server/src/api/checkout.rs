//! `POST /api/v1/checkout`: validates the buyer, reprices the cart from the
//! catalog, resolves shipping, and records a pending order.

use axum::{extract::State, http::StatusCode, Extension, Json};
use lustre_core::{CartLineRequest, CheckoutError, CheckoutForm, OrderItem};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    cart::map_checkout_error, load_products, load_shipping_rates, map_db_error,
    orders::OrderView, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutRequest {
    #[serde(flatten)]
    pub form: CheckoutForm,
    #[serde(default)]
    pub items: Vec<CartLineRequest>,
}

pub(super) async fn checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>), ApiError> {
    let rid = &req_id.0;
    let form = body.form;

    if body.items.iter().all(|line| line.quantity == 0) {
        return Err(map_checkout_error(rid, &CheckoutError::EmptyCart));
    }
    form.validate()
        .map_err(|fields| map_checkout_error(rid, &CheckoutError::Validation(fields)))?;
    let selected = form
        .selected_rate_id()
        .map_err(|e| map_checkout_error(rid, &e))?;

    let ids: Vec<Uuid> = body.items.iter().map(|l| l.product_id).collect();
    let catalog = load_products(&state.pool, &ids, rid).await?;
    let cart = lustre_core::price_cart(&body.items, &catalog)
        .map_err(|e| map_checkout_error(rid, &e))?;

    let country = form.country.trim().to_ascii_uppercase();
    let rates = load_shipping_rates(&state.pool, rid).await?;
    let (totals, rate) = lustre_core::quote(&cart, &rates, &country, selected)
        .map_err(|e| map_checkout_error(rid, &e))?;

    let mut shipping_address = form.shipping_address();
    shipping_address.country = country;

    let order = lustre_db::NewOrder {
        order_id: lustre_core::generate_order_id(),
        email: form.email.trim().to_owned(),
        items: cart.items().iter().map(OrderItem::from).collect(),
        subtotal: totals.subtotal,
        taxes: totals.tax,
        shipping: totals.shipping,
        total: totals.total,
        shipping_address,
    };

    let row = lustre_db::create_order(&state.pool, &order)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        order_id = %row.order_id,
        total = %row.total,
        shipping_rate = %rate.name,
        "order created"
    );

    let view = OrderView::try_from(row).map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view, req_id.0))))
}
