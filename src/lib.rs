pub mod analytics;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod services;

pub use app::{router, AppState};
