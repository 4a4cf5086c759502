//! Catalog/store reconciliation
//!
//! Makes the assignment store consistent with the catalog, deterministically
//! and idempotently. Planning is side-effect free; applying grants each
//! missing pair to the administrative role as its own atomic row, so a pass
//! can be cancelled mid-way and safely re-run. Orphaned rows are reported,
//! never auto-deleted: a missing catalog entry may be a rename in flight, and
//! an operator decides.

use crate::catalog::Catalog;
use crate::domain::{PermissionPair, Role};
use crate::error::{AppError, Result};
use crate::repository::AssignmentRepository;
use crate::service::AssignmentService;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Discrepancies between the catalog and the assignment store, sorted for
/// deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftRecord {
    /// Declared by the catalog, absent from the store.
    pub missing: Vec<PermissionPair>,
    /// Present in the store, no longer declared by the catalog.
    pub orphaned: Vec<PermissionPair>,
}

impl DriftRecord {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.orphaned.is_empty()
    }
}

impl fmt::Display for DriftRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} missing, {} orphaned",
            self.missing.len(),
            self.orphaned.len()
        )
    }
}

/// A computed reconciliation plan. Applying verifies the desired set still
/// matches before mutating anything.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    pub drift: DriftRecord,
    desired: BTreeSet<PermissionPair>,
}

/// Result of an apply pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    /// Rows newly granted to the administrative role.
    pub granted: usize,
    pub drift: DriftRecord,
}

pub struct Reconciler<R: AssignmentRepository> {
    catalog: Arc<Catalog>,
    assignments: AssignmentService<R>,
}

impl<R: AssignmentRepository> Reconciler<R> {
    pub fn new(catalog: Arc<Catalog>, assignments: AssignmentService<R>) -> Self {
        Self { catalog, assignments }
    }

    /// Compute the drift between catalog and store. Side-effect free.
    pub async fn plan(&self) -> Result<ReconcilePlan> {
        let desired: BTreeSet<PermissionPair> = self.catalog.desired_pairs().collect();
        let existing = self.assignments.list_pairs().await?;

        let missing = desired.difference(&existing).cloned().collect();
        let orphaned = existing.difference(&desired).cloned().collect();

        Ok(ReconcilePlan {
            drift: DriftRecord { missing, orphaned },
            desired,
        })
    }

    /// Apply a previously computed plan: grant every missing pair to the
    /// administrative role. New resources start with no access for any other
    /// role. Halts on the first store error; rows granted so far are kept
    /// and a re-run picks up where it stopped.
    pub async fn apply(&self, plan: &ReconcilePlan) -> Result<ReconcileOutcome> {
        let desired: BTreeSet<PermissionPair> = self.catalog.desired_pairs().collect();
        if desired != plan.desired {
            return Err(AppError::ReconciliationConflict(
                "catalog changed since the plan was computed".to_string(),
            ));
        }

        let mut granted = 0;
        for pair in &plan.drift.missing {
            if self
                .assignments
                .grant(Role::Admin, &pair.resource, pair.action, None)
                .await?
            {
                granted += 1;
            }
        }

        if granted > 0 {
            tracing::info!(granted, "reconciliation applied");
        } else {
            tracing::info!("assignment store already consistent with catalog");
        }
        for pair in &plan.drift.orphaned {
            tracing::warn!(%pair, "orphaned assignment row (not deleted)");
        }

        Ok(ReconcileOutcome {
            granted,
            drift: plan.drift.clone(),
        })
    }

    /// Plan and apply in one pass.
    pub async fn sync(&self) -> Result<ReconcileOutcome> {
        let plan = self.plan().await?;
        self.apply(&plan).await
    }

    /// Report-only consistency check; mutates nothing. Callers treat a
    /// non-clean record as a failure.
    pub async fn validate(&self) -> Result<DriftRecord> {
        Ok(self.plan().await?.drift)
    }
}
