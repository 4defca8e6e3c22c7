use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::{json_body, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::services::EntityService;

/// GET /api/data/:entity/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let (entity, id) = path_params(path)?;
    let record = EntityService::resolve(&state, &entity)?.get(&staff, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/data/:entity/:id - partial update; absent fields keep their value
pub async fn update(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<(String, i64)>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let (entity, id) = path_params(path)?;
    let service = EntityService::resolve(&state, &entity)?;
    let payload = json_body(payload)?;

    let record = service.update(&staff, id, &payload).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/data/:entity/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let (entity, id) = path_params(path)?;
    EntityService::resolve(&state, &entity)?.delete(&staff, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
