//! In-memory assignment repository
//!
//! Backs the engine in tests and lightweight embeddings. Same observable
//! contract as the MySQL implementation, minus durability.

use crate::domain::{Action, PermissionPair, ResourceKey, Role, RolePermission};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AssignmentRepository;

type RowKey = (Role, ResourceKey, Action);

#[derive(Default)]
pub struct MemoryAssignmentRepository {
    rows: RwLock<BTreeMap<RowKey, RolePermission>>,
}

impl MemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for MemoryAssignmentRepository {
    async fn is_allowed(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
    ) -> Result<bool> {
        let rows = self.rows.read().await;
        Ok(rows.contains_key(&(role, resource.clone(), action)))
    }

    async fn insert(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
        granted_by: Option<Uuid>,
    ) -> Result<bool> {
        let mut rows = self.rows.write().await;
        let key = (role, resource.clone(), action);
        if rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(
            key,
            RolePermission {
                role,
                resource: resource.clone(),
                action,
                granted_at: Utc::now(),
                granted_by,
            },
        );
        Ok(true)
    }

    async fn delete(&self, role: Role, resource: &ResourceKey, action: Action) -> Result<bool> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(&(role, resource.clone(), action)).is_some())
    }

    async fn list_for_role(&self, role: Role) -> Result<Vec<PermissionPair>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| row.role == role)
            .map(|row| PermissionPair::new(row.resource.clone(), row.action))
            .collect())
    }

    async fn list_pairs(&self) -> Result<std::collections::BTreeSet<PermissionPair>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .map(|row| PermissionPair::new(row.resource.clone(), row.action))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<RolePermission>> {
        let rows = self.rows.read().await;
        Ok(rows.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> ResourceKey {
        ResourceKey::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let repo = MemoryAssignmentRepository::new();
        let resource = key("project.projects");

        assert!(repo
            .insert(Role::Manager, &resource, Action::Read, None)
            .await
            .unwrap());
        assert!(!repo
            .insert(Role::Manager, &resource, Action::Read, None)
            .await
            .unwrap());

        assert!(repo
            .is_allowed(Role::Manager, &resource, Action::Read)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = MemoryAssignmentRepository::new();
        let resource = key("sales.orders");

        repo.insert(Role::Viewer, &resource, Action::Read, None)
            .await
            .unwrap();
        assert!(repo.delete(Role::Viewer, &resource, Action::Read).await.unwrap());
        assert!(!repo.delete(Role::Viewer, &resource, Action::Read).await.unwrap());
        assert!(!repo
            .is_allowed(Role::Viewer, &resource, Action::Read)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_pairs_is_distinct_across_roles() {
        let repo = MemoryAssignmentRepository::new();
        let resource = key("payroll.runs");

        repo.insert(Role::Admin, &resource, Action::Read, None)
            .await
            .unwrap();
        repo.insert(Role::Manager, &resource, Action::Read, None)
            .await
            .unwrap();

        let pairs = repo.list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_role_filters() {
        let repo = MemoryAssignmentRepository::new();
        let a = key("attendance.records");
        let b = key("reports.exports");

        repo.insert(Role::Manager, &a, Action::Approve, None)
            .await
            .unwrap();
        repo.insert(Role::Viewer, &b, Action::Read, None).await.unwrap();

        let pairs = repo.list_for_role(Role::Manager).await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].resource.as_str(), "attendance.records");
    }
}
