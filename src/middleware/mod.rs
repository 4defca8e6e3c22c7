pub mod auth;
pub mod response;

pub use auth::{extract_bearer, jwt_auth_middleware, AuthStaff};
pub use response::{ApiResponse, ApiResult};
