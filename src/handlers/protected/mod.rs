// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware injects `Extension<AuthStaff>`; each
// handler then checks its page permission before touching data.

pub mod analytics;
pub mod auth;
pub mod chat;
pub mod customers;
pub mod data;
pub mod permissions;
pub mod residences;
