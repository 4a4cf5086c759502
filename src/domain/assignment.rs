//! Persisted assignment rows and (resource, action) pairs

use super::{Action, ResourceKey};
use crate::domain::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// A (resource, action) pair, the unit the catalog and the store are
/// compared over.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromRow,
)]
pub struct PermissionPair {
    pub resource: ResourceKey,
    pub action: Action,
}

impl PermissionPair {
    pub fn new(resource: ResourceKey, action: Action) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for PermissionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// A persisted grant of an action on a resource to a role.
///
/// `granted_by` is NULL for reconciler-issued grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub role: Role,
    pub resource: ResourceKey,
    pub action: Action,
    pub granted_at: DateTime<Utc>,
    pub granted_by: Option<Uuid>,
}
