//! Admin password session and dashboard aggregates.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use lustre_core::{DashboardSummary, Product};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionState {
    pub authenticated: bool,
}

/// GET /api/v1/admin/session: whether the caller holds admin credentials.
pub(super) async fn get_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Json<ApiResponse<SessionState>> {
    let authenticated = state.auth.enabled && state.auth.is_admin_request(&headers);
    Json(ApiResponse::new(SessionState { authenticated }, req_id.0))
}

/// POST /api/v1/admin/session: exchanges the admin password for a session cookie.
pub(super) async fn create_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rid = &req_id.0;

    let Some(cookie) = state.auth.session_cookie() else {
        return Err(ApiError::new(
            rid,
            "service_unavailable",
            "admin password not configured",
        ));
    };

    if !state.auth.verify_password(&body.password) {
        tracing::warn!("admin login rejected");
        return Err(ApiError::new(rid, "unauthorized", "invalid password"));
    }

    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::new(rid, "internal_error", "failed to build session cookie"))?;

    tracing::info!("admin session opened");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::new(
            SessionState {
                authenticated: true,
            },
            req_id.0,
        )),
    ))
}

/// DELETE /api/v1/admin/session: expires the session cookie.
pub(super) async fn delete_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let cookie = HeaderValue::from_str(&state.auth.clear_session_cookie()).map_err(|_| {
        ApiError::new(&req_id.0, "internal_error", "failed to build session cookie")
    })?;

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::new(
            SessionState {
                authenticated: false,
            },
            req_id.0,
        )),
    ))
}

/// GET /api/v1/admin/dashboard: catalog aggregates for the admin overview.
pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let rows = lustre_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let products: Vec<Product> = rows.into_iter().map(Product::from).collect();

    Ok(Json(ApiResponse::new(
        lustre_core::dashboard(&products),
        req_id.0,
    )))
}
