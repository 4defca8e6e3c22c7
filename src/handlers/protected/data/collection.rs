use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::app::AppState;
use crate::entities::{EntityDef, ENTITIES};
use crate::handlers::{json_body, path_params, query_params};
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::services::{parse_list_params, EntityService};

/// GET /api/entities - registry description for building forms
pub async fn describe() -> ApiResult<&'static [EntityDef]> {
    Ok(ApiResponse::success(ENTITIES))
}

/// GET /api/data/:entity - filtered, paginated list
///
/// Query: `search`, `from`, `to`, `order=column [asc|desc]`, `limit`,
/// `offset`, plus `<field>=value` for any filterable field.
pub async fn list(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Vec<Value>> {
    let entity = path_params(path)?;
    let query = query_params(query)?;
    let service = EntityService::resolve(&state, &entity)?;

    let params = parse_list_params(service.entity(), &query, &state)?;
    let (records, total) = service.list(&staff, &params).await?;

    Ok(ApiResponse::success(records).with_meta(json!({
        "total": total,
        "limit": params.limit,
        "offset": params.offset,
    })))
}

/// POST /api/data/:entity - create one record, 201 with the stored row
pub async fn create(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let entity = path_params(path)?;
    let service = EntityService::resolve(&state, &entity)?;
    let payload = json_body(payload)?;

    let record = service.create(&staff, &payload).await?;
    Ok(ApiResponse::created(record))
}
