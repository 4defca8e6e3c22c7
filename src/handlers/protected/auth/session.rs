use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::issue_token;
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::Grants;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
}

/// GET /api/auth/whoami - identity carried by the caller's token
///
/// ```json
/// { "success": true, "data": { "staff_id": 7, "name": "Amina", "email": "amina@agency.test", "role_id": 2, "expires_at": 1792400000 } }
/// ```
pub async fn whoami(Extension(staff): Extension<AuthStaff>) -> ApiResult<AuthStaff> {
    Ok(ApiResponse::success(staff))
}

/// PUT /api/auth/refresh - a fresh token for the same identity
pub async fn refresh(State(state): State<AppState>, Extension(staff): Extension<AuthStaff>) -> ApiResult<TokenResponse> {
    let (token, claims) = issue_token(staff.claims.subject(), &state.config.security)?;
    tracing::debug!(staff_id = staff.staff_id, "Token refreshed");

    Ok(ApiResponse::success(TokenResponse {
        token,
        expires_in: claims.expires_in(),
    }))
}

/// GET /api/auth/permissions - the caller's grants as `{page: [actions]}`
pub async fn my_permissions(State(state): State<AppState>, Extension(staff): Extension<AuthStaff>) -> ApiResult<Grants> {
    let grants = state.permissions.grants_for_role(staff.role_id).await?;
    Ok(ApiResponse::success(grants))
}
