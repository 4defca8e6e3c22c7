use anyhow::Context;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

pub fn handle(password: &str, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    let hash = hash_password(password, config.security.bcrypt_cost).context("hashing password")?;
    output_success(output_format, "Password hashed", Some(json!({ "hash": hash })))
}
