//! Actions, roles, resource keys, and the request user context

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of operation kinds a resource can support.
///
/// Stored lowercase in the database and in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
    Approve,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Write, Action::Delete, Action::Approve];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
            Action::Approve => "approve",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            "delete" => Ok(Action::Delete),
            "approve" => Ok(Action::Approve),
            other => Err(AppError::Validation(format!("unknown action: {other}"))),
        }
    }
}

/// The closed set of roles known to the application.
///
/// `Admin` is the administrative role: implicitly allowed everything, the
/// single bypass predicate is [`Role::is_admin`]. Stored UPPERCASE.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Employee, Role::Viewer];

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
            Role::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "EMPLOYEE" => Ok(Role::Employee),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(AppError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// Identifies a protected domain object class (e.g. `project.projects`,
/// `salary.management`).
///
/// Validated once at construction: dotted lowercase segments, never empty.
/// Keys are globally unique and never reused for a different meaning once
/// assignments reference them. Rows decoded from the store skip re-validation
/// since the store is written only through validated paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(raw: &str) -> Result<Self, AppError> {
        if RESOURCE_KEY_REGEX.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::Validation(format!("invalid resource key: {raw:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ResourceKey::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// An authenticated principal, as supplied by the external identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Per-request user context. The engine never verifies credentials itself;
/// an absent identity simply means the request is unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    identity: Option<Identity>,
}

impl UserContext {
    pub fn authenticated(user_id: Uuid, role: Role) -> Self {
        Self {
            identity: Some(Identity { user_id, role }),
        }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.map(|i| i.role)
    }
}

// Regex for resource key validation
lazy_static::lazy_static! {
    pub static ref RESOURCE_KEY_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]*)+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("read", Action::Read)]
    #[case("write", Action::Write)]
    #[case("delete", Action::Delete)]
    #[case("approve", Action::Approve)]
    fn test_action_round_trip(#[case] raw: &str, #[case] action: Action) {
        assert_eq!(raw.parse::<Action>().unwrap(), action);
        assert_eq!(action.as_str(), raw);
    }

    #[test]
    fn test_action_parse_rejects_unknown() {
        assert!("execute".parse::<Action>().is_err());
        assert!("Read".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_serde_lowercase() {
        let json = serde_json::to_string(&Action::Approve).unwrap();
        assert_eq!(json, "\"approve\"");
    }

    #[rstest]
    #[case("ADMIN", Role::Admin)]
    #[case("MANAGER", Role::Manager)]
    #[case("EMPLOYEE", Role::Employee)]
    #[case("VIEWER", Role::Viewer)]
    fn test_role_round_trip(#[case] raw: &str, #[case] role: Role) {
        assert_eq!(raw.parse::<Role>().unwrap(), role);
        assert_eq!(role.as_str(), raw);
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Manager.is_admin());
        assert!(!Role::Employee.is_admin());
        assert!(!Role::Viewer.is_admin());
    }

    #[test]
    fn test_resource_key_regex() {
        // Valid keys
        assert!(RESOURCE_KEY_REGEX.is_match("project.projects"));
        assert!(RESOURCE_KEY_REGEX.is_match("salary.management"));
        assert!(RESOURCE_KEY_REGEX.is_match("attendance.time_sheets"));
        assert!(RESOURCE_KEY_REGEX.is_match("a.b.c"));

        // Invalid keys
        assert!(!RESOURCE_KEY_REGEX.is_match("project"));
        assert!(!RESOURCE_KEY_REGEX.is_match("Project.Projects"));
        assert!(!RESOURCE_KEY_REGEX.is_match(".projects"));
        assert!(!RESOURCE_KEY_REGEX.is_match("project."));
        assert!(!RESOURCE_KEY_REGEX.is_match("1project.records"));
        assert!(!RESOURCE_KEY_REGEX.is_match(""));
    }

    #[test]
    fn test_resource_key_new_validates() {
        assert!(ResourceKey::new("payroll.runs").is_ok());
        assert!(matches!(
            ResourceKey::new("payroll"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resource_key_deserialize_validates() {
        let ok: Result<ResourceKey, _> = serde_json::from_str("\"sales.leads\"");
        assert!(ok.is_ok());
        let bad: Result<ResourceKey, _> = serde_json::from_str("\"Sales Leads\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_user_context_identity() {
        let user_id = Uuid::new_v4();
        let ctx = UserContext::authenticated(user_id, Role::Manager);
        assert_eq!(ctx.role(), Some(Role::Manager));
        assert_eq!(ctx.identity().unwrap().user_id, user_id);

        let anon = UserContext::anonymous();
        assert!(anon.identity().is_none());
        assert!(anon.role().is_none());
    }
}
