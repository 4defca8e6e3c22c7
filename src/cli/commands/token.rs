use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{issue_token, TokenSubject};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "Staff id (token subject)")]
    pub staff_id: i64,
    #[arg(long, help = "Role id checked against the permission table")]
    pub role_id: i64,
    #[arg(long, default_value = "", help = "Display name")]
    pub name: String,
    #[arg(long, default_value = "", help = "Email address")]
    pub email: String,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let subject = TokenSubject {
        staff_id: args.staff_id,
        name: args.name,
        email: args.email,
        role_id: args.role_id,
    };
    let (token, claims) = issue_token(subject, &config.security).context("issuing token (is JWT_SECRET set?)")?;

    output_success(
        output_format,
        "Token issued",
        Some(json!({ "token": token, "expires_at": claims.exp, "jti": claims.jti })),
    )
}
