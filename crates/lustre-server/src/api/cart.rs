//! `POST /api/v1/cart/quote`: prices a client-held cart against the catalog.

use axum::{extract::State, Extension, Json};
use lustre_core::{
    available_rates, quote, CartLineRequest, CheckoutError, CheckoutTotals, ShippingRate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{load_products, load_shipping_rates, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CartLineRequest>,
    pub country: Option<String>,
    pub shipping_rate_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuoteLine {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ShippingQuote {
    pub country: String,
    pub rate: ShippingRate,
    pub available_rates: Vec<ShippingRate>,
    #[serde(flatten)]
    pub totals: CheckoutTotals,
}

#[derive(Debug, Serialize)]
pub(super) struct CartQuote {
    pub items: Vec<QuoteLine>,
    pub count: u32,
    pub subtotal: Decimal,
    pub shipping: Option<ShippingQuote>,
}

/// Maps checkout failures to API errors. Shared with the checkout handler.
pub(super) fn map_checkout_error(request_id: &str, error: &CheckoutError) -> ApiError {
    match error {
        CheckoutError::Validation(fields) => {
            let details = serde_json::to_value(fields).unwrap_or_default();
            ApiError::new(request_id, "validation_error", error.to_string()).with_details(details)
        }
        CheckoutError::UnknownProduct(_) | CheckoutError::UnknownSize { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        CheckoutError::EmptyCart
        | CheckoutError::NoShippingRate { .. }
        | CheckoutError::UnknownShippingRate(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
    }
}

pub(super) async fn quote_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<CartQuote>>, ApiError> {
    let rid = &req_id.0;

    let ids: Vec<Uuid> = body.items.iter().map(|l| l.product_id).collect();
    let catalog = load_products(&state.pool, &ids, rid).await?;
    let cart = lustre_core::price_cart(&body.items, &catalog)
        .map_err(|e| map_checkout_error(rid, &e))?;

    let country = body
        .country
        .as_deref()
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty());

    let shipping = match country {
        Some(country) if !cart.is_empty() => {
            let rates = load_shipping_rates(&state.pool, rid).await?;
            let (totals, rate) = quote(&cart, &rates, &country, body.shipping_rate_id)
                .map_err(|e| map_checkout_error(rid, &e))?;
            Some(ShippingQuote {
                available_rates: available_rates(&rates, &country)
                    .into_iter()
                    .cloned()
                    .collect(),
                country,
                rate,
                totals,
            })
        }
        _ => None,
    };

    let items = cart
        .items()
        .iter()
        .map(|line| QuoteLine {
            product_id: line.product_id,
            name: line.name.clone(),
            size: line.size_label().map(ToOwned::to_owned),
            quantity: line.quantity,
            unit_price: line.unit_price(),
            line_total: line.line_total(),
            image_url: line.image_url.clone(),
        })
        .collect();

    Ok(Json(ApiResponse::new(
        CartQuote {
            items,
            count: cart.count(),
            subtotal: cart.total(),
            shipping,
        },
        req_id.0,
    )))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{
        admin_auth, body_json, dec, json_request, seed_product, seed_rates, send, test_app,
    };
    use rust_decimal::Decimal;
    use axum::http::StatusCode;
    use serde_json::json;

    #[sqlx::test(migrations = "../../migrations")]
    async fn quote_merges_lines_and_uses_size_prices(pool: sqlx::PgPool) {
        let print = seed_product(&pool, "Koi", "Art Prints", 100, 5, &[("8\" x 10\"", 89)]).await;
        let app = test_app(pool, admin_auth());

        let body = json!({
            "items": [
                { "product_id": print.id, "size": "8\" x 10\"", "quantity": 1 },
                { "product_id": print.id, "size": "8\" x 10\"", "quantity": 2 },
                { "product_id": print.id, "quantity": 1 }
            ]
        });
        let response = send(&app, json_request("POST", "/api/v1/cart/quote", &body, None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json["data"]["items"].as_array().expect("items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["quantity"], 3);
        assert_eq!(dec(&items[0]["line_total"]), Decimal::from(267));
        assert_eq!(json["data"]["count"], 4);
        assert_eq!(dec(&json["data"]["subtotal"]), Decimal::from(367));
        assert!(json["data"]["shipping"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn quote_with_country_adds_tax_and_intl_fallback(pool: sqlx::PgPool) {
        let print = seed_product(&pool, "Heron", "Art Prints", 50, 5, &[]).await;
        seed_rates(&pool).await;
        let app = test_app(pool, admin_auth());

        let body = json!({
            "items": [{ "product_id": print.id, "quantity": 2 }],
            "country": "jp"
        });
        let response = send(&app, json_request("POST", "/api/v1/cart/quote", &body, None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let shipping = &json["data"]["shipping"];
        assert_eq!(shipping["country"], "JP");
        assert_eq!(shipping["rate"]["country_code"], "INTL");
        assert_eq!(dec(&shipping["subtotal"]), Decimal::from(100));
        assert_eq!(dec(&shipping["tax"]), Decimal::from(10));
        assert_eq!(dec(&shipping["shipping"]), Decimal::from(30));
        assert_eq!(dec(&shipping["total"]), Decimal::from(140));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn quote_rejects_unknown_products(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());
        let body = json!({ "items": [{ "product_id": uuid::Uuid::new_v4(), "quantity": 1 }] });
        let response = send(&app, json_request("POST", "/api/v1/cart/quote", &body, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
