use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{json_body, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::services::{parse_list_params, EntityService};

/// Legacy `action` body posted by the older frontend screens
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub action: String,
    pub id: Option<Value>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn parse(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "getall" | "list" => Some(Operation::List),
            "get" | "show" => Some(Operation::Get),
            "add" | "create" => Some(Operation::Create),
            "update" | "edit" => Some(Operation::Update),
            "delete" | "remove" => Some(Operation::Delete),
            _ => None,
        }
    }
}

/// POST /api/dispatch/:entity - route a legacy `{action, id, data, filters}`
/// body onto the same operations as the REST endpoints
pub async fn dispatch(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let entity = path_params(path)?;
    let request = json_body(payload)?;
    let service = EntityService::resolve(&state, &entity)?;

    let operation = Operation::parse(&request.action)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown action '{}'", request.action)))?;
    tracing::debug!(entity = %entity, action = %request.action, "Dispatching legacy action");

    match operation {
        Operation::List => {
            let query = filters_to_query(&request.filters);
            let params = parse_list_params(service.entity(), &query, &state)?;
            let (records, total) = service.list(&staff, &params).await?;
            Ok(ApiResponse::success(Value::Array(records)).with_meta(json!({
                "total": total,
                "limit": params.limit,
                "offset": params.offset,
            })))
        }
        Operation::Get => {
            let id = record_id(request.id.as_ref())?;
            Ok(ApiResponse::success(service.get(&staff, id).await?))
        }
        Operation::Create => Ok(ApiResponse::created(service.create(&staff, &request.data).await?)),
        Operation::Update => {
            let id = record_id(request.id.as_ref())?;
            Ok(ApiResponse::success(service.update(&staff, id, &request.data).await?))
        }
        Operation::Delete => {
            let id = record_id(request.id.as_ref())?;
            service.delete(&staff, id).await?;
            Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
        }
    }
}

/// Accepts `7` or `"7"`
fn record_id(id: Option<&Value>) -> Result<i64, ApiError> {
    let parsed = match id {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    match parsed {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request("A positive integer id is required")),
    }
}

/// Flatten filter values into the same shape as a query string
fn filters_to_query(filters: &Map<String, Value>) -> HashMap<String, String> {
    filters
        .iter()
        .filter_map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), s))
        })
        .collect()
}
