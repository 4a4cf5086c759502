//! The authorization engine instance
//!
//! One `AuthzEngine` is constructed at process start and passed explicitly
//! to every call site; there is no ambient global state. It wires the
//! immutable catalog, the assignment store, the per-role permission cache,
//! the guard, and the reconciler around a shared repository handle.

use crate::cache::PermissionCache;
use crate::catalog::Catalog;
use crate::domain::{Action, ResourceKey, Role, UserContext};
use crate::error::Result;
use crate::guard::Guard;
use crate::reconciler::{DriftRecord, ReconcileOutcome, Reconciler};
use crate::repository::{AssignmentRepository, MySqlAssignmentRepository};
use crate::service::AssignmentService;
use std::sync::Arc;
use uuid::Uuid;

/// Engine over the production MySQL store.
pub type MySqlAuthzEngine = AuthzEngine<MySqlAssignmentRepository>;

pub struct AuthzEngine<R: AssignmentRepository> {
    catalog: Arc<Catalog>,
    assignments: AssignmentService<R>,
    guard: Guard<R>,
    reconciler: Reconciler<R>,
}

impl<R: AssignmentRepository> AuthzEngine<R> {
    pub fn new(catalog: Catalog, repo: R) -> Self {
        Self::with_shared(Arc::new(catalog), Arc::new(repo))
    }

    /// Build from shared handles. Useful when the embedding application
    /// keeps its own references to the catalog or store.
    pub fn with_shared(catalog: Arc<Catalog>, repo: Arc<R>) -> Self {
        let cache = Arc::new(PermissionCache::new(Arc::clone(&repo)));
        let assignments =
            AssignmentService::new(Arc::clone(&catalog), repo, Arc::clone(&cache));
        let guard = Guard::new(Arc::clone(&catalog), cache);
        let reconciler = Reconciler::new(Arc::clone(&catalog), assignments.clone());

        Self {
            catalog,
            assignments,
            guard,
            reconciler,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn assignments(&self) -> &AssignmentService<R> {
        &self.assignments
    }

    pub fn guard(&self) -> &Guard<R> {
        &self.guard
    }

    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    // Convenience pass-throughs for the common call-site operations.

    pub async fn require_permission(
        &self,
        ctx: &UserContext,
        resource: &ResourceKey,
        action: Action,
    ) -> Result<()> {
        self.guard.require_permission(ctx, resource, action).await
    }

    pub fn require_role(&self, ctx: &UserContext, allowed: &[Role]) -> Result<()> {
        self.guard.require_role(ctx, allowed)
    }

    pub async fn grant(
        &self,
        role: Role,
        resource: &ResourceKey,
        action: Action,
        granted_by: Option<Uuid>,
    ) -> Result<bool> {
        self.assignments.grant(role, resource, action, granted_by).await
    }

    pub async fn revoke(&self, role: Role, resource: &ResourceKey, action: Action) -> Result<bool> {
        self.assignments.revoke(role, resource, action).await
    }

    pub async fn sync(&self) -> Result<ReconcileOutcome> {
        self.reconciler.sync().await
    }

    pub async fn validate(&self) -> Result<DriftRecord> {
        self.reconciler.validate().await
    }
}
