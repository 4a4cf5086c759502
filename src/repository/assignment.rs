//! Assignment repository: durable (role, resource, action) rows
//!
//! The store is the source of truth for authorization decisions. All
//! mutation goes through `insert`/`delete` (each its own atomic row
//! operation); there are no multi-row transactions to roll back, which is
//! what makes reconciler passes safely cancellable and resumable.

use crate::domain::{Action, PermissionPair, ResourceKey, Role, RolePermission};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::BTreeSet;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Whether an explicit row exists for the tuple. Administrative bypass
    /// lives in the service/guard layer, not here.
    async fn is_allowed(&self, role: Role, resource: &ResourceKey, action: Action)
        -> Result<bool>;

    /// Idempotent insert. Returns true if a row was newly created.
    async fn insert(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
        granted_by: Option<Uuid>,
    ) -> Result<bool>;

    /// Idempotent delete. Returns true if a row existed.
    async fn delete(&self, role: Role, resource: &ResourceKey, action: Action) -> Result<bool>;

    /// All pairs granted to a role, for snapshot materialization.
    async fn list_for_role(&self, role: Role) -> Result<Vec<PermissionPair>>;

    /// Distinct (resource, action) pairs across all roles: the reconciler's
    /// existing set.
    async fn list_pairs(&self) -> Result<BTreeSet<PermissionPair>>;

    /// Full rows, for display and operator tooling.
    async fn list_all(&self) -> Result<Vec<RolePermission>>;
}

pub struct MySqlAssignmentRepository {
    pool: MySqlPool,
}

impl MySqlAssignmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for MySqlAssignmentRepository {
    async fn is_allowed(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
    ) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM role_permissions WHERE role = ? AND resource = ? AND action = ?)",
        )
        .bind(role)
        .bind(resource)
        .bind(action)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    async fn insert(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
        granted_by: Option<Uuid>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT IGNORE INTO role_permissions (role, resource, action, granted_by) VALUES (?, ?, ?, ?)",
        )
        .bind(role)
        .bind(resource)
        .bind(action)
        .bind(granted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, role: Role, resource: &ResourceKey, action: Action) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM role_permissions WHERE role = ? AND resource = ? AND action = ?",
        )
        .bind(role)
        .bind(resource)
        .bind(action)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_role(&self, role: Role) -> Result<Vec<PermissionPair>> {
        let pairs = sqlx::query_as::<_, PermissionPair>(
            "SELECT resource, action FROM role_permissions WHERE role = ? ORDER BY resource, action",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    async fn list_pairs(&self) -> Result<BTreeSet<PermissionPair>> {
        let pairs = sqlx::query_as::<_, PermissionPair>(
            "SELECT DISTINCT resource, action FROM role_permissions",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs.into_iter().collect())
    }

    async fn list_all(&self) -> Result<Vec<RolePermission>> {
        let rows = sqlx::query_as::<_, RolePermission>(
            "SELECT role, resource, action, granted_at, granted_by FROM role_permissions \
             ORDER BY role, resource, action",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
