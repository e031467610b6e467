//! Catalog handlers.
//!
//! - `GET    /api/v1/products[?category=]` (public)
//! - `GET    /api/v1/products/{id}` (public)
//! - `POST   /api/v1/products` (admin)
//! - `PATCH  /api/v1/products/{id}` (admin, sparse)
//! - `DELETE /api/v1/products/{id}` (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use lustre_core::{import::normalize_image_url, Product, ProductSize};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub category: String,
    pub product_type: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
}

// Outer None = field absent (keep), Some(None) = explicit null (clear).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub cost: Option<Option<Decimal>>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub product_type: Option<Option<String>>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub video_url: Option<Option<String>>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<ProductSize>>,
}

#[allow(clippy::option_option)]
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validation(req_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(req_id, "validation_error", message)
}

fn validate_text(req_id: &str, field: &str, value: &str) -> Result<(), ApiError> {
    let len = value.trim().chars().count();
    if len == 0 || len > 200 {
        return Err(validation(req_id, format!("{field} must be 1-200 characters")));
    }
    Ok(())
}

fn validate_price(req_id: &str, field: &str, value: Decimal) -> Result<(), ApiError> {
    if value.is_sign_negative() {
        return Err(validation(req_id, format!("{field} must not be negative")));
    }
    Ok(())
}

fn validate_stock(req_id: &str, value: i32) -> Result<(), ApiError> {
    if value < 0 {
        return Err(validation(req_id, "stock must not be negative"));
    }
    Ok(())
}

fn validate_sizes(req_id: &str, sizes: &[ProductSize]) -> Result<(), ApiError> {
    for (i, size) in sizes.iter().enumerate() {
        if size.label.trim().is_empty() {
            return Err(validation(req_id, format!("sizes[{i}].label must not be empty")));
        }
        if size.price <= Decimal::ZERO {
            return Err(validation(req_id, format!("sizes[{i}].price must be positive")));
        }
        validate_price(req_id, &format!("sizes[{i}].cost"), size.cost)?;
        if sizes[..i].iter().any(|s| s.label == size.label) {
            return Err(validation(
                req_id,
                format!("duplicate size label '{}'", size.label),
            ));
        }
    }
    Ok(())
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

    let rows = match category {
        Some(category) => lustre_db::list_products_by_category(&state.pool, category).await,
        None => lustre_db::list_products(&state.pool).await,
    }
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(Product::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let row = lustre_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", format!("product {id} not found")))?;

    Ok(Json(ApiResponse::new(Product::from(row), req_id.0)))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let rid = &req_id.0;

    validate_text(rid, "name", &body.name)?;
    validate_text(rid, "category", &body.category)?;
    validate_text(rid, "image_url", &body.image_url)?;
    validate_price(rid, "price", body.price)?;
    if let Some(cost) = body.cost {
        validate_price(rid, "cost", cost)?;
    }
    validate_stock(rid, body.stock)?;
    validate_sizes(rid, &body.sizes)?;

    let storage_url = state.config.storage_url.as_deref();
    let product = lustre_db::NewProduct {
        name: body.name.trim().to_owned(),
        description: body.description.trim().to_owned(),
        price: body.price,
        cost: body.cost,
        category: body.category.trim().to_owned(),
        product_type: body.product_type,
        image_url: normalize_image_url(body.image_url.trim(), storage_url),
        video_url: body.video_url.filter(|v| !v.trim().is_empty()),
        stock: body.stock,
        sizes: body.sizes,
    };

    let row = lustre_db::create_product(&state.pool, &product)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(product_id = %row.id, name = %row.name, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(Product::from(row), req_id.0)),
    ))
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;

    if let Some(ref name) = body.name {
        validate_text(rid, "name", name)?;
    }
    if let Some(ref category) = body.category {
        validate_text(rid, "category", category)?;
    }
    if let Some(ref image_url) = body.image_url {
        validate_text(rid, "image_url", image_url)?;
    }
    if let Some(price) = body.price {
        validate_price(rid, "price", price)?;
    }
    if let Some(Some(cost)) = body.cost {
        validate_price(rid, "cost", cost)?;
    }
    if let Some(stock) = body.stock {
        validate_stock(rid, stock)?;
    }
    if let Some(ref sizes) = body.sizes {
        validate_sizes(rid, sizes)?;
    }

    let storage_url = state.config.storage_url.as_deref();
    let update = lustre_db::ProductUpdate {
        name: body.name.map(|n| n.trim().to_owned()),
        description: body.description.map(|d| d.trim().to_owned()),
        price: body.price,
        cost: body.cost,
        category: body.category.map(|c| c.trim().to_owned()),
        product_type: body.product_type,
        image_url: body
            .image_url
            .map(|url| normalize_image_url(url.trim(), storage_url)),
        video_url: body.video_url,
        stock: body.stock,
        sizes: body.sizes,
    };

    if update.is_empty() {
        return Err(validation(rid, "no fields to update"));
    }

    let row = lustre_db::update_product(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(Product::from(row), req_id.0)))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    lustre_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(product_id = %id, "product deleted");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{
        admin_auth, body_json, empty_request, json_request, seed_product, send, test_app,
        TEST_API_KEY,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let body: super::UpdateProductRequest =
            serde_json::from_value(json!({ "video_url": null, "stock": 3 })).expect("parse");
        assert_eq!(body.video_url, Some(None));
        assert_eq!(body.cost, None);
        assert_eq!(body.stock, Some(3));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_products_filters_by_category(pool: sqlx::PgPool) {
        seed_product(&pool, "Wave", "Art Prints", 80, 3, &[]).await;
        seed_product(&pool, "Fan", "Objects", 40, 9, &[]).await;

        let app = test_app(pool, admin_auth());
        let all = body_json(send(&app, empty_request("GET", "/api/v1/products", None)).await).await;
        assert_eq!(all["data"].as_array().map(Vec::len), Some(2));

        let response = send(
            &app,
            empty_request("GET", "/api/v1/products?category=Objects", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "Fan");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_product_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());
        let uri = format!("/api/v1/products/{}", uuid::Uuid::new_v4());
        let response = send(&app, empty_request("GET", &uri, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_product_requires_admin(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());
        let body = json!({
            "name": "Crane",
            "price": "120",
            "category": "Art Prints",
            "image_url": "crane.jpg",
            "stock": 4
        });

        let response = send(&app, json_request("POST", "/api/v1/products", &body, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            json_request("POST", "/api/v1/products", &body, Some(TEST_API_KEY)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "Crane");
        assert_eq!(
            json["data"]["image_url"],
            "https://cdn.example.com/storage/v1/object/public/product-images/products/crane.jpg"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_product_rejects_negative_stock(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());
        let body = json!({
            "name": "Crane",
            "price": "120",
            "category": "Art Prints",
            "image_url": "crane.jpg",
            "stock": -1
        });
        let response = send(
            &app,
            json_request("POST", "/api/v1/products", &body, Some(TEST_API_KEY)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn update_and_delete_product(pool: sqlx::PgPool) {
        let product = seed_product(&pool, "Moon", "Art Prints", 60, 2, &[]).await;
        let app = test_app(pool, admin_auth());
        let uri = format!("/api/v1/products/{}", product.id);

        let response = send(
            &app,
            json_request("PATCH", &uri, &json!({ "stock": 11 }), Some(TEST_API_KEY)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["stock"], 11);
        assert_eq!(json["data"]["name"], "Moon");

        let response = send(
            &app,
            json_request("PATCH", &uri, &json!({}), Some(TEST_API_KEY)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, empty_request("DELETE", &uri, Some(TEST_API_KEY))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, empty_request("DELETE", &uri, Some(TEST_API_KEY))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
