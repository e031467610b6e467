use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use lustre_core::{shipping::is_valid_country_code, ShippingRate, ShippingRateConfig};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{load_shipping_rates, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RateQuery {
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateRateRequest {
    pub name: String,
    pub country_code: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateRateRequest {
    pub name: Option<String>,
    pub country_code: Option<String>,
    pub price: Option<Decimal>,
}

fn validate_name(req_id: &str, name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::new(req_id, "validation_error", "name must not be empty"));
    }
    Ok(())
}

fn normalize_country(req_id: &str, code: &str) -> Result<String, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    if is_valid_country_code(&code) {
        Ok(code)
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("country_code must be INTL or a two-letter code, got '{code}'"),
        ))
    }
}

fn validate_price(req_id: &str, price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::new(req_id, "validation_error", "price must not be negative"));
    }
    Ok(())
}

/// GET /api/v1/shipping/rates[?country=]: with a country, only the rates
/// offered there (its own plus `INTL`).
pub(super) async fn list_rates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RateQuery>,
) -> Result<Json<ApiResponse<Vec<ShippingRate>>>, ApiError> {
    let rates = load_shipping_rates(&state.pool, &req_id.0).await?;

    let data = match query.country.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(country) => lustre_core::available_rates(&rates, &country.to_ascii_uppercase())
            .into_iter()
            .cloned()
            .collect(),
        None => rates,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn create_rate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateRateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShippingRate>>), ApiError> {
    let rid = &req_id.0;
    validate_name(rid, &body.name)?;
    validate_price(rid, body.price)?;

    let config = ShippingRateConfig {
        name: body.name.trim().to_owned(),
        country_code: normalize_country(rid, &body.country_code)?,
        price: body.price,
    };

    let row = lustre_db::create_shipping_rate(&state.pool, &config)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ShippingRate::from(row), req_id.0)),
    ))
}

pub(super) async fn update_rate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRateRequest>,
) -> Result<Json<ApiResponse<ShippingRate>>, ApiError> {
    let rid = &req_id.0;

    if let Some(ref name) = body.name {
        validate_name(rid, name)?;
    }
    if let Some(price) = body.price {
        validate_price(rid, price)?;
    }
    let country_code = body
        .country_code
        .as_deref()
        .map(|c| normalize_country(rid, c))
        .transpose()?;

    let update = lustre_db::ShippingRateUpdate {
        name: body.name.map(|n| n.trim().to_owned()),
        country_code,
        price: body.price,
    };

    let row = lustre_db::update_shipping_rate(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(ShippingRate::from(row), req_id.0)))
}

pub(super) async fn delete_rate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    lustre_db::delete_shipping_rate(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}
