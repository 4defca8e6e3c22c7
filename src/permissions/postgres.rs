use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{Action, Grants, PermissionStore};
use crate::database::DatabaseError;

/// Permission matrix stored in `permissions(role_id, page_name, action)`
#[derive(Clone)]
pub struct PgPermissionStore {
    pool: PgPool,
}

impl PgPermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn allows(&self, role_id: i64, page: &str, action: Action) -> Result<bool, DatabaseError> {
        let allowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE role_id = $1 AND page_name = $2 AND action = $3)",
        )
        .bind(role_id)
        .bind(page)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(allowed)
    }

    async fn grants_for_role(&self, role_id: i64) -> Result<Grants, DatabaseError> {
        let rows = sqlx::query("SELECT page_name, action FROM permissions WHERE role_id = $1 ORDER BY page_name")
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?;

        let mut grants = Grants::new();
        for row in rows {
            let page: String = row.try_get("page_name")?;
            let action: String = row.try_get("action")?;
            match action.parse::<Action>() {
                Ok(action) => {
                    grants.entry(page).or_default().insert(action);
                }
                Err(e) => tracing::warn!("Ignoring permission row for role {} on '{}': {}", role_id, page, e),
            }
        }

        Ok(grants)
    }

    async fn role_exists(&self, role_id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE role_id = $1)")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn replace_for_role(&self, role_id: i64, grants: &Grants) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let role_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE role_id = $1)")
            .bind(role_id)
            .fetch_one(&mut *tx)
            .await?;
        if !role_exists {
            return Err(DatabaseError::NotFound(format!("Role {} not found", role_id)));
        }

        sqlx::query("DELETE FROM permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for (page, actions) in grants {
            for action in actions {
                sqlx::query("INSERT INTO permissions (role_id, page_name, action) VALUES ($1, $2, $3)")
                    .bind(role_id)
                    .bind(page)
                    .bind(action.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::info!("Replaced permissions for role {}", role_id);
        Ok(())
    }
}
