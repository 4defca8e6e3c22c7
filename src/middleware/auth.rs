use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{verify_token, Claims};
use crate::error::ApiError;

/// Authenticated staff context extracted from the bearer token
#[derive(Clone, Debug, Serialize)]
pub struct AuthStaff {
    pub staff_id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub expires_at: i64,
    #[serde(skip)]
    pub claims: Claims,
}

impl From<Claims> for AuthStaff {
    fn from(claims: Claims) -> Self {
        Self {
            staff_id: claims.sub,
            name: claims.name.clone(),
            email: claims.email.clone(),
            role_id: claims.role_id,
            expires_at: claims.exp,
            claims,
        }
    }
}

/// JWT authentication middleware that validates tokens and injects [`AuthStaff`]
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(|msg| {
        tracing::warn!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = verify_token(token, &state.config.security).map_err(|e| {
        tracing::warn!("Rejected token for {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    let staff = AuthStaff::from(claims);
    tracing::debug!(staff_id = staff.staff_id, role_id = staff.role_id, "Authenticated request");
    request.extensions_mut().insert(staff);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or("Authorization header must use Bearer token format")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty bearer token");
    }
    Ok(token)
}
