// handlers/mod.rs - Two handler tiers
//
// Public (no auth) → Protected (bearer token + per-page permissions)
pub mod protected;
pub mod public;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Unwrap a JSON body, turning axum's rejection into the API error envelope
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(ApiError::from)
}

pub(crate) fn query_params<T: DeserializeOwned>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(v)| v).map_err(ApiError::from)
}

pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(v)| v)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
