use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Action, Grants, PermissionStore};
use crate::database::DatabaseError;

/// Permission matrix held in memory, for tests and offline tooling.
/// A role exists once it has been granted something or added with
/// [`MemoryPermissionStore::with_role`].
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    roles: RwLock<HashMap<i64, Grants>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A role with no grants
    pub fn with_role(mut self, role_id: i64) -> Self {
        self.roles.get_mut().entry(role_id).or_default();
        self
    }

    /// Builder-style grant, before the store is shared
    pub fn with_grant(mut self, role_id: i64, page: &str, actions: &[Action]) -> Self {
        self.roles
            .get_mut()
            .entry(role_id)
            .or_default()
            .entry(page.to_string())
            .or_default()
            .extend(actions.iter().copied());
        self
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn allows(&self, role_id: i64, page: &str, action: Action) -> Result<bool, DatabaseError> {
        let roles = self.roles.read().await;
        Ok(roles
            .get(&role_id)
            .and_then(|grants| grants.get(page))
            .map(|actions| actions.contains(&action))
            .unwrap_or(false))
    }

    async fn grants_for_role(&self, role_id: i64) -> Result<Grants, DatabaseError> {
        let roles = self.roles.read().await;
        Ok(roles.get(&role_id).cloned().unwrap_or_default())
    }

    async fn role_exists(&self, role_id: i64) -> Result<bool, DatabaseError> {
        Ok(self.roles.read().await.contains_key(&role_id))
    }

    async fn replace_for_role(&self, role_id: i64, grants: &Grants) -> Result<(), DatabaseError> {
        let mut roles = self.roles.write().await;
        if !roles.contains_key(&role_id) {
            return Err(DatabaseError::NotFound(format!("Role {} not found", role_id)));
        }
        let cleaned: Grants = grants
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(page, actions)| (page.clone(), actions.clone()))
            .collect();
        roles.insert(role_id, cleaned);
        Ok(())
    }
}
