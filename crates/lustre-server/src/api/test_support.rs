//! Shared fixtures for router tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use lustre_core::{AppConfig, Environment, ProductSize, ShippingRateConfig};
use rust_decimal::Decimal;
use tower::ServiceExt;

use super::{build_app, default_rate_limits, AppState};
use crate::middleware::AuthState;

pub(crate) const TEST_API_KEY: &str = "test-admin-key";
pub(crate) const TEST_PASSWORD: &str = "correct horse";

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://unused".to_string()),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
        log_level: "info".to_string(),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
        admin_password: Some(TEST_PASSWORD.to_string()),
        session_secret: Some("test-secret".to_string()),
        storage_url: Some("https://cdn.example.com".to_string()),
        shipping_rates_path: PathBuf::from("../../config/shipping_rates.yaml"),
        local_state_dir: PathBuf::from(".lustre"),
        llm_api_key: None,
        llm_base_url: "https://api.openai.com/v1".to_string(),
        llm_model: "gpt-4o-mini".to_string(),
        llm_timeout_secs: 5,
        import_concurrency: 2,
    }
}

/// Auth with one bearer key and the test admin password.
pub(crate) fn admin_auth() -> AuthState {
    AuthState::new(
        HashSet::from([TEST_API_KEY.to_string()]),
        Some(TEST_PASSWORD),
        "test-secret",
        false,
    )
}

pub(crate) fn test_state(pool: sqlx::PgPool, auth: AuthState) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        copywriter: None,
        auth,
    }
}

pub(crate) fn test_app(pool: sqlx::PgPool, auth: AuthState) -> Router {
    build_app(test_state(pool, auth), default_rate_limits())
}

pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    body: &serde_json::Value,
    bearer: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub(crate) fn empty_request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

/// Inserts a product with the given sizes (label, price) and returns it.
pub(crate) async fn seed_product(
    pool: &sqlx::PgPool,
    name: &str,
    category: &str,
    price: i64,
    stock: i32,
    sizes: &[(&str, i64)],
) -> lustre_core::Product {
    let product = lustre_db::NewProduct {
        name: name.to_string(),
        description: format!("{name} description"),
        price: Decimal::from(price),
        cost: Some(Decimal::from(price / 2)),
        category: category.to_string(),
        product_type: None,
        image_url: format!("https://cdn.example.com/{}.jpg", name.to_lowercase().replace(' ', "-")),
        video_url: None,
        stock,
        sizes: sizes
            .iter()
            .map(|(label, p)| ProductSize {
                label: (*label).to_string(),
                price: Decimal::from(*p),
                cost: Decimal::ZERO,
            })
            .collect(),
    };
    lustre_db::create_product(pool, &product)
        .await
        .expect("seed product")
        .into()
}

/// Seeds a US standard rate (8.00) and the INTL fallback (30.00).
pub(crate) async fn seed_rates(pool: &sqlx::PgPool) {
    let rates = [
        ShippingRateConfig {
            name: "US Standard".to_string(),
            country_code: "US".to_string(),
            price: Decimal::from(8),
        },
        ShippingRateConfig {
            name: "International".to_string(),
            country_code: "INTL".to_string(),
            price: Decimal::from(30),
        },
    ];
    lustre_db::seed_shipping_rates(pool, &rates)
        .await
        .expect("seed rates");
}

/// Reads a decimal serialized as a JSON string.
pub(crate) fn dec(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("decimal string")
        .parse()
        .expect("decimal")
}
