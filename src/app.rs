use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, Environment};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::permissions::{PermissionStore, PgPermissionStore};

/// Shared handles every handler receives
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub permissions: Arc<dyn PermissionStore>,
}

impl AppState {
    /// State backed by the database permission table
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let permissions = Arc::new(PgPermissionStore::new(pool.clone()));
        Self {
            pool,
            config: Arc::new(config),
            permissions,
        }
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionStore>) -> Self {
        self.permissions = permissions;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.api.max_request_size_bytes;
    let request_logging = state.config.api.enable_request_logging;

    let app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::auth::login_post))
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    if request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{analytics, auth, chat, customers, data, permissions, residences};

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/refresh", put(auth::refresh))
        .route("/api/auth/permissions", get(auth::my_permissions))
        // Registry description for form building
        .route("/api/entities", get(data::describe))
        // Per-entity CRUD
        .route("/api/data/:entity", get(data::list).post(data::create))
        .route(
            "/api/data/:entity/:id",
            get(data::show).put(data::update).delete(data::remove),
        )
        .route("/api/dispatch/:entity", post(data::dispatch))
        // Domain operations
        .route("/api/residences/:id/advance", post(residences::advance))
        .route("/api/customers/:id/balance", get(customers::balance))
        .route(
            "/api/roles/:id/permissions",
            get(permissions::matrix).put(permissions::replace),
        )
        // Analytics
        .route("/api/analytics/summary", get(analytics::summary))
        .route("/api/analytics/monthly", get(analytics::monthly))
        .route("/api/analytics/staff", get(analytics::staff))
        // Chat
        .route("/api/chat/conversations", get(chat::conversations))
        .route("/api/chat/unread", get(chat::unread))
        .route("/api/chat/:staff_id", get(chat::thread).post(chat::send))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
