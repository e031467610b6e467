mod admin;
mod cart;
mod checkout;
mod descriptions;
mod favorites;
mod import;
mod orders;
mod products;
mod shipping;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use lustre_copywriter::CopywriterClient;
use lustre_core::AppConfig;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin, AuthState, RateLimitState, RequestId,
};

/// Raw CSV uploads may be up to 5 MiB; leave headroom so oversized files reach
/// the upload check and get a readable error instead of a bare 413.
const IMPORT_BODY_LIMIT: usize = 6 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub copywriter: Option<Arc<CopywriterClient>>,
    pub auth: AuthState,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &lustre_db::DbError) -> ApiError {
    match error {
        lustre_db::DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        lustre_db::DbError::Conflict(_) => {
            ApiError::new(request_id, "conflict", "a matching record already exists")
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

/// Loads the catalog rows referenced by `ids` as domain products.
pub(super) async fn load_products(
    pool: &PgPool,
    ids: &[uuid::Uuid],
    request_id: &str,
) -> Result<Vec<lustre_core::Product>, ApiError> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let rows = lustre_db::get_products_by_ids(pool, &unique)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;
    Ok(rows.into_iter().map(lustre_core::Product::from).collect())
}

/// Loads every shipping rate as a domain rate.
pub(super) async fn load_shipping_rates(
    pool: &PgPool,
    request_id: &str,
) -> Result<Vec<lustre_core::ShippingRate>, ApiError> {
    let rows = lustre_db::list_shipping_rates(pool)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;
    Ok(rows.into_iter().map(lustre_core::ShippingRate::from).collect())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-filename"),
        ])
}

fn public_router(login_limit: RateLimitState) -> Router<AppState> {
    let login = Router::new()
        .route("/api/v1/admin/session", post(admin::create_session))
        .route_layer(axum::middleware::from_fn_with_state(
            login_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route("/api/v1/shipping/rates", get(shipping::list_rates))
        .route("/api/v1/cart/quote", post(cart::quote_cart))
        .route("/api/v1/checkout", post(checkout::checkout))
        .route("/api/v1/orders/{order_id}", get(orders::get_order))
        .route("/api/v1/favorites/{user_id}", get(favorites::list_favorites))
        .route(
            "/api/v1/favorites/{user_id}/{product_id}",
            put(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route(
            "/api/v1/admin/session",
            get(admin::get_session).delete(admin::delete_session),
        )
        .merge(login)
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", post(products::create_product))
        .route(
            "/api/v1/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route(
            "/api/v1/products/import",
            post(import::import_products).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route(
            "/api/v1/products/import/template",
            get(import::import_template),
        )
        .route(
            "/api/v1/products/description",
            post(descriptions::generate_description),
        )
        .route("/api/v1/orders", get(orders::list_orders))
        .route(
            "/api/v1/orders/{order_id}/status",
            patch(orders::update_order_status),
        )
        .route("/api/v1/shipping/rates", post(shipping::create_rate))
        .route(
            "/api/v1/shipping/rates/{id}",
            patch(shipping::update_rate).delete(shipping::delete_rate),
        )
        .route("/api/v1/admin/dashboard", get(admin::dashboard))
        .route_layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(auth, require_admin)),
        )
}

/// Independent request budgets: password attempts on the login route never
/// consume the admin API's allowance, and vice versa.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub admin: RateLimitState,
    pub login: RateLimitState,
}

pub fn build_app(state: AppState, limits: RateLimits) -> Router {
    let auth = state.auth.clone();

    Router::new()
        .merge(public_router(limits.login))
        .merge(admin_router(auth, limits.admin))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match lustre_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[must_use]
pub fn default_rate_limits() -> RateLimits {
    RateLimits {
        admin: RateLimitState::new(120, Duration::from_secs(60)),
        login: RateLimitState::new(10, Duration::from_secs(60)),
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::test_support::{body_json, send, test_app};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("conflict", StatusCode::CONFLICT),
            ("upstream_error", StatusCode::BAD_GATEWAY),
            ("service_unavailable", StatusCode::SERVICE_UNAVAILABLE),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(ApiError::new("r", code, "m").into_response().status(), status);
        }
    }

    #[test]
    fn db_not_found_and_conflict_keep_their_meaning() {
        let not_found = map_db_error("r".into(), &lustre_db::DbError::NotFound);
        assert_eq!(not_found.error.code, "not_found");
        let conflict = map_db_error("r".into(), &lustre_db::DbError::Conflict("dup".into()));
        assert_eq!(conflict.error.code, "conflict");
        let other = map_db_error("r".into(), &lustre_db::DbError::Sqlx(sqlx::Error::PoolTimedOut));
        assert_eq!(other.error.code, "internal_error");
    }

    #[test]
    fn error_details_are_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::new("r", "bad_request", "m")).expect("json");
        assert!(json["error"].get("details").is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_database_ok(pool: sqlx::PgPool) {
        let app = test_app(pool, AuthState::disabled());
        let response = send(
            &app,
            Request::get("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["database"], "ok");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn request_id_header_is_echoed(pool: sqlx::PgPool) {
        let app = test_app(pool, AuthState::disabled());
        let response = send(
            &app,
            Request::get("/api/v1/health")
                .header("x-request-id", "req-from-client")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-from-client")
        );
        let json = body_json(response).await;
        assert_eq!(json["meta"]["request_id"], "req-from-client");
    }
}
