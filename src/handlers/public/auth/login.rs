// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::app::AppState;
use crate::auth::{issue_token, verify_missing, verify_password, TokenSubject};
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct StaffProfile {
    pub staff_id: i64,
    pub staff_name: String,
    pub staff_email: String,
    pub role_id: i64,
    pub role_name: Option<String>,
    pub branch_id: Option<i64>,
}

#[derive(Debug, FromRow)]
struct StaffLogin {
    #[sqlx(flatten)]
    profile: StaffProfile,
    password: String,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub staff: StaffProfile,
}

/// Authenticate staff credentials and return a bearer token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = json_body(payload)?;
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let staff: Option<StaffLogin> = sqlx::query_as(
        "SELECT s.staff_id, s.staff_name, s.staff_email, s.role_id, r.role_name, s.branch_id, \
                s.password, s.status \
         FROM staff s LEFT JOIN roles r ON r.role_id = s.role_id \
         WHERE lower(s.staff_email) = $1",
    )
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    let stored = staff.as_ref().map(|s| s.password.clone());
    let password = request.password;
    let cost = state.config.security.bcrypt_cost;
    let verified = tokio::task::spawn_blocking(move || match stored {
        Some(hash) => verify_password(&password, &hash),
        None => verify_missing(&password, cost),
    })
    .await
    .map_err(|e| ApiError::internal_server_error(format!("Password check failed: {}", e)))?;

    let Some(staff) = staff else {
        tracing::warn!(email = %email, "Login failed: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };
    if !verified {
        tracing::warn!(staff_id = staff.profile.staff_id, "Login failed: wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if staff.status.as_deref().unwrap_or("active") != "active" {
        tracing::warn!(staff_id = staff.profile.staff_id, "Login refused: account inactive");
        return Err(ApiError::forbidden("Account is inactive"));
    }

    let profile = staff.profile;
    let subject = TokenSubject {
        staff_id: profile.staff_id,
        name: profile.staff_name.clone(),
        email: profile.staff_email.clone(),
        role_id: profile.role_id,
    };
    let (token, claims) = issue_token(subject, &state.config.security)?;

    tracing::info!(staff_id = profile.staff_id, role_id = profile.role_id, "Staff logged in");
    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        staff: profile,
    }))
}
