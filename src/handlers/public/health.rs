// handlers/public/health.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET / - service name, version and endpoint index
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "endpoints": {
                "public": ["GET /", "GET /health", "POST /auth/login"],
                "auth": ["GET /api/auth/whoami", "PUT /api/auth/refresh", "GET /api/auth/permissions"],
                "data": [
                    "GET /api/entities",
                    "GET /api/data/:entity",
                    "POST /api/data/:entity",
                    "GET /api/data/:entity/:id",
                    "PUT /api/data/:entity/:id",
                    "DELETE /api/data/:entity/:id",
                    "POST /api/dispatch/:entity"
                ],
                "domain": [
                    "POST /api/residences/:id/advance",
                    "GET /api/customers/:id/balance",
                    "GET /api/roles/:id/permissions",
                    "PUT /api/roles/:id/permissions"
                ],
                "analytics": ["GET /api/analytics/summary", "GET /api/analytics/monthly", "GET /api/analytics/staff"],
                "chat": [
                    "GET /api/chat/conversations",
                    "GET /api/chat/unread",
                    "GET /api/chat/:staff_id",
                    "POST /api/chat/:staff_id"
                ]
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "status": "ok", "database": "ok" } })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "database": e.to_string() }
                })),
            )
        }
    }
}
