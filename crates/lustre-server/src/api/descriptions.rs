//! `POST /api/v1/products/description`: drafts product copy with the LLM client.

use axum::{extract::State, Extension, Json};
use lustre_copywriter::{CopywriterError, DescriptionRequest};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct DescriptionResponse {
    pub description: String,
    pub model: String,
}

pub(super) async fn generate_description(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DescriptionRequest>,
) -> Result<Json<ApiResponse<DescriptionResponse>>, ApiError> {
    let rid = &req_id.0;

    let Some(client) = state.copywriter.as_ref() else {
        return Err(ApiError::new(
            rid,
            "service_unavailable",
            "description drafting is not configured",
        ));
    };

    if body.name.trim().is_empty() {
        return Err(ApiError::new(rid, "validation_error", "Product name is required"));
    }

    let description = client.generate_description(&body).await.map_err(|e| {
        tracing::error!(error = %e, "description generation failed");
        match e {
            CopywriterError::ApiError { status, .. } => ApiError::new(
                rid,
                "upstream_error",
                format!("description provider returned status {status}"),
            ),
            _ => ApiError::new(rid, "upstream_error", "failed to generate description"),
        }
    })?;

    Ok(Json(ApiResponse::new(
        DescriptionResponse {
            description,
            model: client.model().to_owned(),
        },
        req_id.0,
    )))
}
