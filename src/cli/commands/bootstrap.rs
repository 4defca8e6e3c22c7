use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::entities;
use crate::permissions::Action;

#[derive(Debug, Args)]
pub struct BootstrapArgs {
    #[arg(long, help = "Staff display name")]
    pub name: String,
    #[arg(long, help = "Login email")]
    pub email: String,
    #[arg(long, help = "Login password")]
    pub password: String,
    #[arg(long, default_value = "Administrator", help = "Role to create or reuse")]
    pub role: String,
}

/// Create (or reuse) a role holding every page/action, then its first
/// staff member, in one transaction
pub async fn handle(args: BootstrapArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let email = args.email.trim().to_lowercase();
    if args.name.trim().is_empty() || email.is_empty() || args.password.is_empty() {
        anyhow::bail!("name, email and password are required");
    }

    let hash = hash_password(&args.password, config.security.bcrypt_cost).context("hashing password")?;
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;
    let mut tx = pool.begin().await?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT role_id FROM roles WHERE role_name = $1")
        .bind(&args.role)
        .fetch_optional(&mut *tx)
        .await?;
    let role_id = match existing {
        Some(id) => id,
        None => {
            sqlx::query_scalar("INSERT INTO roles (role_name) VALUES ($1) RETURNING role_id")
                .bind(&args.role)
                .fetch_one(&mut *tx)
                .await?
        }
    };

    sqlx::query("DELETE FROM permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;
    let pages = entities::pages();
    for page in &pages {
        for action in Action::ALL {
            sqlx::query("INSERT INTO permissions (role_id, page_name, action) VALUES ($1, $2, $3)")
                .bind(role_id)
                .bind(*page)
                .bind(action.as_str())
                .execute(&mut *tx)
                .await?;
        }
    }

    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM staff WHERE lower(staff_email) = $1)")
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;
    if taken {
        anyhow::bail!("a staff member with email {} already exists", email);
    }

    let staff_id: i64 = sqlx::query_scalar(
        "INSERT INTO staff (staff_name, staff_email, password, role_id, status) \
         VALUES ($1, $2, $3, $4, 'active') RETURNING staff_id",
    )
    .bind(args.name.trim())
    .bind(&email)
    .bind(&hash)
    .bind(role_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(staff_id, role_id, "Bootstrapped admin");

    output_success(
        output_format,
        "Admin created",
        Some(json!({
            "staff_id": staff_id,
            "role_id": role_id,
            "role": args.role,
            "pages": pages.len(),
        })),
    )
}
