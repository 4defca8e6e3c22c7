// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: none (/, /health, /auth/*)

pub mod auth;
mod health;

pub use health::{health, root};
