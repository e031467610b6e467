//! Server-side favorites keyed by an opaque user id.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const MAX_USER_ID_LEN: usize = 200;

#[derive(Debug, Serialize)]
pub(super) struct FavoriteState {
    pub product_id: Uuid,
    pub favorited: bool,
    pub changed: bool,
}

fn validate_user_id(req_id: &str, user_id: &str) -> Result<(), ApiError> {
    if user_id.trim().is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("user id must be 1-{MAX_USER_ID_LEN} characters"),
        ));
    }
    Ok(())
}

pub(super) async fn list_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Uuid>>>, ApiError> {
    validate_user_id(&req_id.0, &user_id)?;
    let ids = lustre_db::list_favorites(&state.pool, &user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(ids, req_id.0)))
}

pub(super) async fn add_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, product_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<FavoriteState>>, ApiError> {
    let rid = &req_id.0;
    validate_user_id(rid, &user_id)?;

    let changed = lustre_db::add_favorite(&state.pool, &user_id, product_id)
        .await
        .map_err(|e| match e {
            lustre_db::DbError::NotFound => {
                ApiError::new(rid, "not_found", format!("product {product_id} not found"))
            }
            other => map_db_error(rid.clone(), &other),
        })?;

    Ok(Json(ApiResponse::new(
        FavoriteState {
            product_id,
            favorited: true,
            changed,
        },
        req_id.0,
    )))
}

pub(super) async fn remove_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, product_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<FavoriteState>>, ApiError> {
    validate_user_id(&req_id.0, &user_id)?;

    let changed = lustre_db::remove_favorite(&state.pool, &user_id, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        FavoriteState {
            product_id,
            favorited: false,
            changed,
        },
        req_id.0,
    )))
}
