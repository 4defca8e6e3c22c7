//! Role/page/action permission matrix.
//!
//! A staff member may perform `action` on `page` only when a row
//! `(role_id, page_name, action)` exists. There is no implicit superuser.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::app::AppState;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::AuthStaff;

pub use memory::MemoryPermissionStore;
pub use postgres::PgPermissionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Add, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" | "read" => Ok(Action::View),
            "add" | "create" => Ok(Action::Add),
            "edit" | "update" => Ok(Action::Edit),
            "delete" | "remove" => Ok(Action::Delete),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// Page name -> allowed actions
pub type Grants = BTreeMap<String, BTreeSet<Action>>;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn allows(&self, role_id: i64, page: &str, action: Action) -> Result<bool, DatabaseError>;

    async fn grants_for_role(&self, role_id: i64) -> Result<Grants, DatabaseError>;

    async fn role_exists(&self, role_id: i64) -> Result<bool, DatabaseError>;

    /// Replace every grant of `role_id` atomically
    async fn replace_for_role(&self, role_id: i64, grants: &Grants) -> Result<(), DatabaseError>;
}

/// Deny with 403 unless the caller's role holds `(page, action)`
pub async fn require(state: &AppState, staff: &AuthStaff, page: &str, action: Action) -> Result<(), ApiError> {
    if state.permissions.allows(staff.role_id, page, action).await? {
        return Ok(());
    }

    tracing::warn!(
        staff_id = staff.staff_id,
        role_id = staff.role_id,
        page,
        action = action.as_str(),
        "Permission denied"
    );
    Err(ApiError::forbidden(format!("Permission denied: {} on {}", action, page)))
}
