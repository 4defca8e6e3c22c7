// GET/PUT /api/roles/:id/permissions - per-role permission matrix

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::app::AppState;
use crate::entities;
use crate::error::{ApiError, FieldErrors};
use crate::handlers::{json_body, path_params};
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::{require, Action, Grants};

const PAGE: &str = "permissions";

/// One row of the matrix: whether each action is granted
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PageAccess {
    pub view: bool,
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
}

impl PageAccess {
    fn from_actions(actions: Option<&BTreeSet<Action>>) -> Self {
        let has = |a: Action| actions.map(|set| set.contains(&a)).unwrap_or(false);
        Self {
            view: has(Action::View),
            add: has(Action::Add),
            edit: has(Action::Edit),
            delete: has(Action::Delete),
        }
    }
}

/// Expand grants over every known page, ungranted pages all false
fn matrix_for(grants: &Grants) -> BTreeMap<&'static str, PageAccess> {
    entities::pages()
        .into_iter()
        .map(|page| (page, PageAccess::from_actions(grants.get(page))))
        .collect()
}

/// Parse `{page: [actions]}`, collecting every unknown page or action
fn parse_grants(body: &Value) -> Result<Grants, ApiError> {
    let Some(object) = body.as_object() else {
        return Err(ApiError::field_error("_payload", "expected an object of page: [actions]"));
    };

    let pages = entities::pages();
    let mut grants = Grants::new();
    let mut errors = FieldErrors::new();

    for (page, actions) in object {
        if !pages.contains(&page.as_str()) {
            errors.insert(page.clone(), "unknown page".to_string());
            continue;
        }
        let Some(list) = actions.as_array() else {
            errors.insert(page.clone(), "expected an array of actions".to_string());
            continue;
        };

        let mut set = BTreeSet::new();
        for action in list {
            match action.as_str().map(str::parse::<Action>) {
                Some(Ok(a)) => {
                    set.insert(a);
                }
                Some(Err(e)) => {
                    errors.insert(page.clone(), e);
                }
                None => {
                    errors.insert(page.clone(), "actions must be strings".to_string());
                }
            }
        }
        if !set.is_empty() {
            grants.insert(page.clone(), set);
        }
    }

    if errors.is_empty() {
        Ok(grants)
    } else {
        Err(ApiError::unprocessable_entity("Validation failed", errors))
    }
}

/// GET /api/roles/:id/permissions
pub async fn matrix(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<BTreeMap<&'static str, PageAccess>> {
    let role_id = path_params(path)?;
    require(&state, &staff, PAGE, Action::View).await?;

    if !state.permissions.role_exists(role_id).await? {
        return Err(ApiError::not_found(format!("Role {} not found", role_id)));
    }
    let grants = state.permissions.grants_for_role(role_id).await?;
    Ok(ApiResponse::success(matrix_for(&grants)))
}

/// PUT /api/roles/:id/permissions - replace every grant of the role
pub async fn replace(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<BTreeMap<&'static str, PageAccess>> {
    let role_id = path_params(path)?;
    require(&state, &staff, PAGE, Action::Edit).await?;
    let grants = parse_grants(&json_body(payload)?)?;

    state.permissions.replace_for_role(role_id, &grants).await?;
    tracing::info!(staff_id = staff.staff_id, role_id, pages = grants.len(), "Role permissions replaced");

    Ok(ApiResponse::success(matrix_for(&grants)))
}
