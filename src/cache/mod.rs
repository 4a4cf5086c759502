//! In-process permission cache
//!
//! Per-role snapshots of effective permissions, memoized after the first
//! guard check and rebuilt from the assignment store after invalidation.
//! There is no TTL: invalidation is explicit and every mutating store path
//! must trigger it.
//!
//! Freshness discipline: each role has a monotonically increasing epoch.
//! `invalidate` bumps the epoch before dropping the snapshot; `get` stamps a
//! snapshot with the epoch observed before the store read and refuses to
//! publish or return it if the epoch moved during the build. A rebuild
//! therefore never resurrects state read before the latest invalidation, and
//! concurrent readers only ever see a complete snapshot (the `Arc` is swapped
//! whole, never mutated in place).

use crate::domain::{Action, PermissionPair, ResourceKey, Role};
use crate::error::Result;
use crate::repository::AssignmentRepository;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An immutable view of one role's effective permissions.
#[derive(Debug)]
pub struct RolePermissionSnapshot {
    role: Role,
    permitted: HashMap<ResourceKey, BTreeSet<Action>>,
    version: u64,
    built_at: DateTime<Utc>,
}

impl RolePermissionSnapshot {
    fn new(role: Role, version: u64, pairs: Vec<PermissionPair>) -> Self {
        let mut permitted: HashMap<ResourceKey, BTreeSet<Action>> = HashMap::new();
        for pair in pairs {
            permitted.entry(pair.resource).or_default().insert(pair.action);
        }
        Self {
            role,
            permitted,
            version,
            built_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn allows(&self, resource: &ResourceKey, action: Action) -> bool {
        self.permitted
            .get(resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Freshness token: the role's invalidation epoch this snapshot was
    /// built against.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.permitted.values().map(|actions| actions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty()
    }
}

pub struct PermissionCache<R: AssignmentRepository> {
    repo: Arc<R>,
    epochs: DashMap<Role, Arc<AtomicU64>>,
    snapshots: DashMap<Role, Arc<RolePermissionSnapshot>>,
}

impl<R: AssignmentRepository> PermissionCache<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            epochs: DashMap::new(),
            snapshots: DashMap::new(),
        }
    }

    fn epoch_counter(&self, role: Role) -> Arc<AtomicU64> {
        self.epochs
            .entry(role)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    /// A valid (non-stale) snapshot for the role, built from the store on
    /// first access or after invalidation.
    pub async fn get(&self, role: Role) -> Result<Arc<RolePermissionSnapshot>> {
        loop {
            let epoch = self.epoch_counter(role);
            let observed = epoch.load(Ordering::Acquire);

            if let Some(snapshot) = self.snapshots.get(&role) {
                if snapshot.version == observed {
                    return Ok(Arc::clone(&snapshot));
                }
            }

            let pairs = self.repo.list_for_role(role).await?;
            let snapshot = Arc::new(RolePermissionSnapshot::new(role, observed, pairs));

            // An invalidation may have landed while the store read was in
            // flight; publishing would resurrect pre-invalidation state.
            if epoch.load(Ordering::Acquire) == observed {
                self.snapshots.insert(role, Arc::clone(&snapshot));
                return Ok(snapshot);
            }

            tracing::debug!(%role, "snapshot invalidated mid-build, rebuilding");
        }
    }

    /// Drop the role's snapshot; the next `get` rebuilds from the store.
    pub fn invalidate(&self, role: Role) {
        // Epoch first: an in-flight build compares against it before
        // publishing.
        self.epoch_counter(role).fetch_add(1, Ordering::AcqRel);
        self.snapshots.remove(&role);
        tracing::debug!(%role, "permission cache invalidated");
    }

    pub fn invalidate_all(&self) {
        for role in Role::ALL {
            self.invalidate(role);
        }
    }
}
