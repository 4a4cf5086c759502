//! Route-level enforcement for protected call sites

mod require_permission;

pub use require_permission::{require_permission_middleware, RequirePermissionState};
