//! Request-time permission guard
//!
//! The single choke point every protected operation calls before
//! proceeding. The administrative bypass lives here and only here; call
//! sites never re-implement it.

use crate::cache::PermissionCache;
use crate::catalog::Catalog;
use crate::domain::{Action, ResourceKey, Role, UserContext};
use crate::error::{AppError, Result};
use crate::repository::AssignmentRepository;
use std::sync::Arc;

pub struct Guard<R: AssignmentRepository> {
    catalog: Arc<Catalog>,
    cache: Arc<PermissionCache<R>>,
}

impl<R: AssignmentRepository> Guard<R> {
    pub fn new(catalog: Arc<Catalog>, cache: Arc<PermissionCache<R>>) -> Self {
        Self { catalog, cache }
    }

    /// Require `action` on `resource` for the request's user.
    ///
    /// Evaluation order: no identity fails `Unauthenticated`; the
    /// administrative role succeeds unconditionally; an undeclared resource
    /// fails `UnknownResource` (programmer error, loud); otherwise the
    /// role's cached snapshot decides. Absence of failure is the only
    /// success signal.
    pub async fn require_permission(
        &self,
        ctx: &UserContext,
        resource: &ResourceKey,
        action: Action,
    ) -> Result<()> {
        let identity = ctx.identity().ok_or(AppError::Unauthenticated)?;

        if identity.role.is_admin() {
            return Ok(());
        }

        self.catalog.actions_for(resource)?;

        let snapshot = self.cache.get(identity.role).await?;
        if snapshot.allows(resource, action) {
            Ok(())
        } else {
            tracing::debug!(role = %identity.role, %resource, %action, "permission denied");
            Err(AppError::Forbidden {
                resource: resource.clone(),
                action,
            })
        }
    }

    /// Require the user's role to be one of `allowed`. The administrative
    /// role always passes.
    pub fn require_role(&self, ctx: &UserContext, allowed: &[Role]) -> Result<()> {
        let identity = ctx.identity().ok_or(AppError::Unauthenticated)?;

        if identity.role.is_admin() || allowed.contains(&identity.role) {
            Ok(())
        } else {
            tracing::debug!(role = %identity.role, ?allowed, "role denied");
            Err(AppError::ForbiddenRole(identity.role))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{AssignmentRepository, MemoryAssignmentRepository};
    use uuid::Uuid;

    fn key(raw: &str) -> ResourceKey {
        ResourceKey::new(raw).unwrap()
    }

    async fn guard_with_manager_read() -> Guard<MemoryAssignmentRepository> {
        let repo = Arc::new(MemoryAssignmentRepository::new());
        repo.insert(Role::Manager, &key("project.projects"), Action::Read, None)
            .await
            .unwrap();

        let catalog = Arc::new(
            Catalog::builder()
                .resource("project.projects", "Projects", &[Action::Read, Action::Write])
                .build()
                .unwrap(),
        );
        let cache = Arc::new(PermissionCache::new(repo));
        Guard::new(catalog, cache)
    }

    fn ctx(role: Role) -> UserContext {
        UserContext::authenticated(Uuid::new_v4(), role)
    }

    #[tokio::test]
    async fn test_unauthenticated_never_forbidden() {
        let guard = guard_with_manager_read().await;
        let result = guard
            .require_permission(&UserContext::anonymous(), &key("project.projects"), Action::Read)
            .await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_permitted_pair_succeeds() {
        let guard = guard_with_manager_read().await;
        assert!(guard
            .require_permission(&ctx(Role::Manager), &key("project.projects"), Action::Read)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unpermitted_pair_is_forbidden() {
        let guard = guard_with_manager_read().await;
        let result = guard
            .require_permission(&ctx(Role::Manager), &key("project.projects"), Action::Write)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Forbidden { action: Action::Write, .. })
        ));
    }

    #[tokio::test]
    async fn test_admin_bypass_skips_catalog_and_cache() {
        let guard = guard_with_manager_read().await;
        // Not even declared in the catalog: the bypass is unconditional.
        assert!(guard
            .require_permission(&ctx(Role::Admin), &key("nonexistent.resource"), Action::Delete)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_undeclared_resource_fails_loudly_for_non_admin() {
        let guard = guard_with_manager_read().await;
        let result = guard
            .require_permission(&ctx(Role::Manager), &key("nonexistent.resource"), Action::Read)
            .await;
        assert!(matches!(result, Err(AppError::UnknownResource(_))));
    }

    #[tokio::test]
    async fn test_require_role_allows_listed_roles_and_admin() {
        let guard = guard_with_manager_read().await;

        assert!(guard
            .require_role(&ctx(Role::Manager), &[Role::Manager, Role::Employee])
            .is_ok());
        assert!(guard.require_role(&ctx(Role::Admin), &[Role::Manager]).is_ok());
        assert!(matches!(
            guard.require_role(&ctx(Role::Viewer), &[Role::Manager]),
            Err(AppError::ForbiddenRole(Role::Viewer))
        ));
        assert!(matches!(
            guard.require_role(&UserContext::anonymous(), &[Role::Manager]),
            Err(AppError::Unauthenticated)
        ));
    }
}
