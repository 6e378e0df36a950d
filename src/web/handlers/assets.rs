use crate::models::{validate_folder, AssetKey, BatchResult, ResourceType, UploadRequest};
use crate::services::{catalog, deletion, folders};
use crate::web::error::{ApiError, ApiResult};
use crate::web::extractors::{CurrentOperator, JsonBody};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct UploadBody {
    #[serde(default)]
    files: Vec<UploadRequest>,
    #[serde(default)]
    folder: Option<String>,
}

/// POST /upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    CurrentOperator(operator): CurrentOperator,
    JsonBody(body): JsonBody<UploadBody>,
) -> ApiResult<Json<BatchResult>> {
    if body.files.is_empty() {
        return Err(ApiError::validation("At least one file is required"));
    }
    let folder = body
        .folder
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::validation("Folder is required"))?;
    validate_folder(folder)?;

    let max_batch = state.config.upload.max_batch_size;
    if body.files.len() > max_batch {
        return Err(ApiError::validation(format!(
            "Batch size exceeds maximum of {}",
            max_batch
        )));
    }

    tracing::info!(operator = %operator, folder = %folder, items = body.files.len(), "Upload batch received");
    let folder = folder.to_string();
    let result = state.uploads.submit(body.files, &folder).await;
    tracing::info!(
        folder = %folder,
        uploaded = result.uploaded.len(),
        skipped = result.skipped.len(),
        failed = result.failed.len(),
        "Upload batch classified"
    );

    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct ListParams {
    folder: Option<String>,
}

/// GET /list
pub async fn list(
    State(state): State<Arc<AppState>>,
    _operator: CurrentOperator,
    Query(params): Query<ListParams>,
) -> Response {
    let folder = params
        .folder
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| state.config.listing.default_folder.clone());
    if let Err(e) = validate_folder(&folder) {
        return ApiError::from(e).into_response();
    }

    match catalog::list(state.store.as_ref(), &folder, state.config.listing.page_size).await {
        Ok(resources) => Json(serde_json::json!({ "resources": resources })).into_response(),
        Err(e) => {
            tracing::error!(folder = %folder, "List error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "resources": [], "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct DeleteBody {
    #[serde(default, rename = "publicId")]
    public_id: String,
    #[serde(default)]
    folder: String,
    #[serde(default, rename = "resource_type", alias = "resourceType")]
    resource_type: Option<ResourceType>,
}

/// POST /delete
pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentOperator(operator): CurrentOperator,
    JsonBody(body): JsonBody<DeleteBody>,
) -> ApiResult<Response> {
    let public_id = body.public_id.trim();
    let folder = body.folder.trim();
    if public_id.is_empty() || folder.is_empty() {
        return Err(ApiError::validation("Public ID and folder required"));
    }
    let key = AssetKey::new(folder, public_id)?;
    let resource_type = body.resource_type.unwrap_or_default();

    tracing::debug!(operator = %operator, key = %key, "Delete requested");
    let outcome = deletion::delete(state.store.as_ref(), &key, resource_type).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "result": outcome.as_str(),
    }))
    .into_response())
}

/// GET /folders
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    _operator: CurrentOperator,
) -> Response {
    match folders::list_folders(state.store.as_ref()).await {
        Ok(folders) => Json(serde_json::json!({ "folders": folders })).into_response(),
        Err(e) => {
            tracing::error!("Error fetching folders: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}
