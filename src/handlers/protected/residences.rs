// POST /api/residences/:id/advance - move a residence file to its next stage

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Extension,
};
use serde_json::Value;
use sqlx::Row;

use crate::app::AppState;
use crate::database::QueryBuilder;
use crate::entities::{self, registry::RESIDENCE_STAGES};
use crate::error::ApiError;
use crate::handlers::path_params;
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::{require, Action};

/// Stage following `current`; a missing stage counts as the first one
fn next_stage(current: Option<&str>) -> Result<&'static str, ApiError> {
    let stage = current.unwrap_or(RESIDENCE_STAGES[0]);
    let position = RESIDENCE_STAGES
        .iter()
        .position(|s| *s == stage)
        .ok_or_else(|| ApiError::conflict(format!("Residence is in unknown stage '{}'", stage)))?;
    RESIDENCE_STAGES
        .get(position + 1)
        .copied()
        .ok_or_else(|| ApiError::conflict("Residence is already completed"))
}

pub async fn advance(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let id = path_params(path)?;
    require(&state, &staff, "residences", Action::Edit).await?;

    let residences = entities::find("residences")
        .ok_or_else(|| ApiError::internal_server_error("residences entity is not registered"))?;
    let builder = QueryBuilder::new(residences);

    let mut tx = state.pool.begin().await?;
    let current: Option<Option<String>> =
        sqlx::query_scalar("SELECT stage FROM residences WHERE residence_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(current) = current else {
        return Err(ApiError::not_found(format!("residences {} not found", id)));
    };

    let next = next_stage(current.as_deref())?;
    sqlx::query("UPDATE residences SET stage = $1 WHERE residence_id = $2")
        .bind(next)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let stmt = builder.by_id(id);
    let record: Value = stmt.query().fetch_one(&mut *tx).await?.try_get("row")?;
    tx.commit().await?;

    tracing::info!(staff_id = staff.staff_id, residence_id = id, stage = next, "Residence advanced");
    Ok(ApiResponse::success(record))
}
