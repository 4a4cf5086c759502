//! Declarative resource/action catalog
//!
//! The catalog is authored in code, validated once at load, and immutable for
//! the life of the process. It is the desired state the reconciler drives the
//! assignment store toward, and the authority the guard consults for
//! unknown-resource failures.

use crate::domain::{Action, PermissionPair, ResourceKey, RESOURCE_KEY_REGEX};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use validator::Validate;

/// A protected resource and the actions it supports.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDef {
    pub key: ResourceKey,
    pub label: String,
    pub actions: BTreeSet<Action>,
}

/// Raw builder input for a resource, validated before the catalog is built.
#[derive(Debug, Clone, Validate)]
struct ResourceSpec {
    #[validate(length(min = 1, max = 128), custom(function = "validate_resource_key"))]
    key: String,
    #[validate(length(min = 1, max = 255))]
    label: String,
    #[validate(length(min = 1))]
    actions: Vec<Action>,
}

fn validate_resource_key(key: &str) -> std::result::Result<(), validator::ValidationError> {
    if RESOURCE_KEY_REGEX.is_match(key) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_resource_key"))
    }
}

/// The immutable catalog. Safe to share across threads without
/// synchronization; lookups never perform I/O.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    index: HashMap<ResourceKey, usize>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The declarative catalog of the business application's protected
    /// resources. Keys are stable; never reuse one for a different meaning
    /// once assignments reference it.
    pub fn standard() -> Result<Self> {
        use Action::{Approve, Delete, Read, Write};

        Self::builder()
            .resource("attendance.records", "Attendance Records", &[Read, Write, Approve])
            .resource(
                "attendance.timesheets",
                "Timesheets",
                &[Read, Write, Delete, Approve],
            )
            .resource("payroll.runs", "Payroll Runs", &[Read, Write, Approve])
            .resource("salary.management", "Salary Management", &[Read, Write])
            .resource("project.projects", "Projects", &[Read, Write, Delete])
            .resource("project.tasks", "Project Tasks", &[Read, Write, Delete])
            .resource("sales.leads", "Sales Leads", &[Read, Write, Delete])
            .resource("sales.orders", "Sales Orders", &[Read, Write, Approve])
            .resource("reports.exports", "Report Exports", &[Read])
            .resource("admin.users", "User Administration", &[Read, Write, Delete])
            .resource("admin.roles", "Role Administration", &[Read, Write])
            .build()
    }

    /// Resources in declaration order.
    pub fn list_resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    /// Actions supported by a resource. Fails with `UnknownResource` for a
    /// key that was never declared.
    pub fn actions_for(&self, key: &ResourceKey) -> Result<&BTreeSet<Action>> {
        self.index
            .get(key)
            .map(|&i| &self.resources[i].actions)
            .ok_or_else(|| AppError::UnknownResource(key.to_string()))
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    /// Every (resource, action) pair the catalog declares: the reconciler's
    /// desired set.
    pub fn desired_pairs(&self) -> impl Iterator<Item = PermissionPair> + '_ {
        self.resources.iter().flat_map(|def| {
            def.actions
                .iter()
                .map(|&action| PermissionPair::new(def.key.clone(), action))
        })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Builder collecting resource specs; all validation happens in `build`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    specs: Vec<ResourceSpec>,
}

impl CatalogBuilder {
    pub fn resource(mut self, key: &str, label: &str, actions: &[Action]) -> Self {
        self.specs.push(ResourceSpec {
            key: key.to_string(),
            label: label.to_string(),
            actions: actions.to_vec(),
        });
        self
    }

    pub fn build(self) -> Result<Catalog> {
        let mut resources = Vec::with_capacity(self.specs.len());
        let mut index = HashMap::with_capacity(self.specs.len());

        for spec in self.specs {
            spec.validate()?;
            let key = ResourceKey::new(&spec.key)?;
            if index.contains_key(&key) {
                return Err(AppError::Validation(format!(
                    "duplicate resource key: {key}"
                )));
            }
            index.insert(key.clone(), resources.len());
            resources.push(ResourceDef {
                key,
                label: spec.label,
                actions: spec.actions.into_iter().collect(),
            });
        }

        Ok(Catalog { resources, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_catalog() -> Catalog {
        Catalog::builder()
            .resource("project.projects", "Projects", &[Action::Read, Action::Write])
            .resource("reports.exports", "Report Exports", &[Action::Read])
            .build()
            .unwrap()
    }

    #[test]
    fn test_list_resources_preserves_order() {
        let catalog = small_catalog();
        let keys: Vec<_> = catalog
            .list_resources()
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, vec!["project.projects", "reports.exports"]);
    }

    #[test]
    fn test_actions_for_known_resource() {
        let catalog = small_catalog();
        let key = ResourceKey::new("project.projects").unwrap();
        let actions = catalog.actions_for(&key).unwrap();
        assert!(actions.contains(&Action::Read));
        assert!(actions.contains(&Action::Write));
        assert!(!actions.contains(&Action::Delete));
    }

    #[test]
    fn test_actions_for_unknown_resource() {
        let catalog = small_catalog();
        let key = ResourceKey::new("payroll.runs").unwrap();
        assert!(matches!(
            catalog.actions_for(&key),
            Err(AppError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = Catalog::builder()
            .resource("sales.leads", "Sales Leads", &[Action::Read])
            .resource("sales.leads", "Leads Again", &[Action::Write])
            .build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = Catalog::builder()
            .resource("SalesLeads", "Sales Leads", &[Action::Read])
            .build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_empty_actions_rejected() {
        let result = Catalog::builder()
            .resource("sales.leads", "Sales Leads", &[])
            .build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_desired_pairs_enumerates_catalog() {
        let catalog = small_catalog();
        let pairs: Vec<_> = catalog.desired_pairs().collect();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&PermissionPair::new(
            ResourceKey::new("project.projects").unwrap(),
            Action::Write
        )));
    }

    #[test]
    fn test_standard_catalog_loads() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 11);
        let key = ResourceKey::new("salary.management").unwrap();
        let actions = catalog.actions_for(&key).unwrap();
        assert_eq!(
            actions.iter().copied().collect::<Vec<_>>(),
            vec![Action::Read, Action::Write]
        );
    }
}
