//! Bulk CSV import.
//!
//! The request body is the raw CSV text; the client-side filename travels in the
//! `x-filename` header so the upload checks can see it.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use futures::{stream, StreamExt};
use lustre_core::{import::ImportTemplate, ImportReport, ImportSummary, ParsedProduct};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

const FILENAME_HEADER: &str = "x-filename";

#[derive(Debug, Deserialize)]
pub(super) struct ImportQuery {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ImportResult {
    pub success: bool,
    pub dry_run: bool,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ImportQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<ImportResult>>, ApiError> {
    let rid = &req_id.0;

    let filename = headers
        .get(FILENAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(rid, "bad_request", "x-filename header is required"))?;

    lustre_core::validate_csv_upload(filename, body.len() as u64)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    let text = std::str::from_utf8(&body)
        .map_err(|_| ApiError::new(rid, "validation_error", "CSV file must be UTF-8 text"))?;

    let report = lustre_core::parse_csv(text, state.config.storage_url.as_deref())
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    tracing::info!(
        filename,
        parsed = report.imported,
        skipped = report.skipped,
        dry_run = query.dry_run,
        "csv import parsed"
    );

    if !report.success() {
        return Err(
            ApiError::new(rid, "validation_error", "CSV parsing failed").with_details(
                serde_json::json!({ "errors": report.errors, "skipped": report.skipped }),
            ),
        );
    }

    let failed_products = if query.dry_run {
        Vec::new()
    } else {
        persist_products(&state, &report).await
    };

    let summary = ImportSummary::new(&report, failed_products);
    Ok(Json(ApiResponse::new(
        ImportResult {
            success: summary.imported > 0,
            dry_run: query.dry_run,
            summary,
        },
        req_id.0,
    )))
}

/// Inserts every parsed product and returns `"<name> (<reason>)"` for each
/// insert that failed.
async fn persist_products(state: &AppState, report: &ImportReport) -> Vec<String> {
    let concurrency = state.config.import_concurrency.max(1);

    let inserts: Vec<_> = report
        .products
        .iter()
        .map(|product| insert_one(state, product))
        .collect();
    let results: Vec<Option<String>> = stream::iter(inserts)
        .buffered(concurrency)
        .collect()
        .await;

    results.into_iter().flatten().collect()
}

async fn insert_one(state: &AppState, product: &ParsedProduct) -> Option<String> {
    let new_product = lustre_db::NewProduct::from(product);
    match lustre_db::create_product(&state.pool, &new_product).await {
        Ok(row) => {
            tracing::debug!(product_id = %row.id, name = %row.name, "imported product");
            None
        }
        Err(e) => {
            tracing::warn!(name = %product.name, error = %e, "failed to import product");
            Some(format!("{} ({e})", product.name))
        }
    }
}

pub(super) async fn import_template(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ImportTemplate>> {
    Json(ApiResponse::new(lustre_core::import_template(), req_id.0))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{admin_auth, body_json, send, test_app, TEST_API_KEY};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };

    fn csv_request(filename: Option<&str>, uri: &str, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/csv")
            .header(header::AUTHORIZATION, format!("Bearer {TEST_API_KEY}"));
        if let Some(name) = filename {
            builder = builder.header("x-filename", name);
        }
        builder.body(Body::from(body.to_owned())).expect("request")
    }

    const CSV: &str = "name,category,stock,imageUrl,price_8x10,cost_8x10,price_24x36\n\
        Koi Pond,Art Prints,5,koi.jpg,89,30,189\n\
        ,Art Prints,5,nameless.jpg,89,30,\n\
        Heron,Art Prints,2,heron.gif,50,,\n";

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_persists_valid_rows_and_reports_errors(pool: sqlx::PgPool) {
        let app = test_app(pool.clone(), admin_auth());
        let response = send(
            &app,
            csv_request(Some("products.csv"), "/api/v1/products/import", CSV),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["success"], true);
        assert_eq!(json["data"]["imported"], 1);
        assert_eq!(json["data"]["failed"], 0);
        assert_eq!(json["data"]["skipped"], 2);
        let errors = json["data"]["errors"].as_array().expect("errors");
        assert_eq!(errors[0], "Row 3: Missing required field \"name\"");
        assert!(errors[1]
            .as_str()
            .is_some_and(|e| e.starts_with("Row 4: Invalid imageUrl \"heron.gif\"")));

        let stored = lustre_db::list_products(&pool).await.expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Koi Pond");
        assert_eq!(stored[0].sizes.0.len(), 2);
        assert_eq!(stored[0].price, rust_decimal::Decimal::from(139));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn dry_run_does_not_write(pool: sqlx::PgPool) {
        let app = test_app(pool.clone(), admin_auth());
        let response = send(
            &app,
            csv_request(
                Some("products.csv"),
                "/api/v1/products/import?dry_run=true",
                CSV,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["dry_run"], true);
        assert_eq!(json["data"]["imported"], 1);
        assert!(lustre_db::list_products(&pool).await.expect("list").is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_rejects_missing_headers_and_bad_filenames(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());

        let response = send(
            &app,
            csv_request(None, "/api/v1/products/import", CSV),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            csv_request(Some("products.xlsx"), "/api/v1/products/import", CSV),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "File must be a CSV (.csv extension)"
        );

        let response = send(
            &app,
            csv_request(
                Some("products.csv"),
                "/api/v1/products/import",
                "name,category\nWave,Art Prints\n",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "Missing required headers: stock, imageUrl"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn import_with_no_parsable_rows_is_rejected(pool: sqlx::PgPool) {
        let app = test_app(pool.clone(), admin_auth());
        let csv = "name,category,stock,imageUrl,price_8x10\n\
            ,Art Prints,5,a.jpg,10\n\
            Heron,Art Prints,2,heron.gif,50\n";

        for uri in [
            "/api/v1/products/import",
            "/api/v1/products/import?dry_run=true",
        ] {
            let response = send(&app, csv_request(Some("products.csv"), uri, csv)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"]["code"], "validation_error");
            assert_eq!(json["error"]["message"], "CSV parsing failed");
            assert_eq!(json["error"]["details"]["skipped"], 2);
            let errors = json["error"]["details"]["errors"].as_array().expect("errors");
            assert_eq!(errors[0], "Row 2: Missing required field \"name\"");
        }

        assert!(lustre_db::list_products(&pool).await.expect("list").is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn template_lists_size_columns(pool: sqlx::PgPool) {
        let app = test_app(pool, admin_auth());
        let response = send(
            &app,
            Request::get("/api/v1/products/import/template")
                .header(header::AUTHORIZATION, format!("Bearer {TEST_API_KEY}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let sizes = json["data"]["size_columns"].as_array().expect("sizes");
        assert_eq!(sizes.len(), 8);
        assert_eq!(sizes[0]["price_column"], "price_8x10");
    }
}
