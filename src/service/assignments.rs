//! Assignment store operations
//!
//! Wraps the repository with catalog checks and cache invalidation. Every
//! mutation invalidates the affected role's snapshot before returning; a
//! grant or revoke that does not propagate to the cache is a correctness
//! bug, not a tuning choice.

use crate::cache::PermissionCache;
use crate::catalog::Catalog;
use crate::domain::{Action, PermissionPair, ResourceKey, Role, RolePermission};
use crate::error::{AppError, Result};
use crate::repository::AssignmentRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

pub struct AssignmentService<R: AssignmentRepository> {
    catalog: Arc<Catalog>,
    repo: Arc<R>,
    cache: Arc<PermissionCache<R>>,
}

impl<R: AssignmentRepository> Clone for AssignmentService<R> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            repo: Arc::clone(&self.repo),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R: AssignmentRepository> AssignmentService<R> {
    pub fn new(catalog: Arc<Catalog>, repo: Arc<R>, cache: Arc<PermissionCache<R>>) -> Self {
        Self { catalog, repo, cache }
    }

    /// Whether the role holds the permission. The administrative role is
    /// allowed everything without consulting the store.
    pub async fn is_allowed(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
    ) -> Result<bool> {
        if role.is_admin() {
            return Ok(true);
        }
        self.repo.is_allowed(role, resource, action).await
    }

    /// Grant `action` on `resource` to `role`. Idempotent; returns whether a
    /// new row was created. The pair must be declared by the catalog.
    pub async fn grant(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
        granted_by: Option<Uuid>,
    ) -> Result<bool> {
        let supported = self.catalog.actions_for(resource)?;
        if !supported.contains(&action) {
            return Err(AppError::Validation(format!(
                "action {action} is not supported by resource {resource}"
            )));
        }

        let inserted = self.repo.insert(role, resource, action, granted_by).await?;
        // Invalidate unconditionally: cheap, and keeps the discipline
        // independent of whether the row already existed.
        self.cache.invalidate(role);

        if inserted {
            tracing::info!(%role, %resource, %action, "permission granted");
        }
        Ok(inserted)
    }

    /// Revoke a grant. Idempotent; returns whether a row existed. No catalog
    /// check: orphaned rows must stay revocable.
    pub async fn revoke(&self, role: Role, resource: &ResourceKey, action: Action) -> Result<bool> {
        let removed = self.repo.delete(role, resource, action).await?;
        self.cache.invalidate(role);

        if removed {
            tracing::info!(%role, %resource, %action, "permission revoked");
        }
        Ok(removed)
    }

    pub async fn list_for_role(&self, role: Role) -> Result<Vec<PermissionPair>> {
        self.repo.list_for_role(role).await
    }

    pub async fn list_pairs(&self) -> Result<BTreeSet<PermissionPair>> {
        self.repo.list_pairs().await
    }

    pub async fn list_all(&self) -> Result<Vec<RolePermission>> {
        self.repo.list_all().await
    }
}
