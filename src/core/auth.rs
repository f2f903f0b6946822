//! Authorization seam.
//!
//! Authentication happens upstream; the engine only asks whether an already
//! identified caller may perform an elevated action.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control.
    Admin,
    /// Operations manager.
    Manager,
    /// Field staff.
    FieldTech,
}

/// The identified user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// User identifier, recorded in audit events.
    pub id: String,
    /// Granted role.
    pub role: Role,
}

impl Caller {
    /// Build a caller.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Decides elevated permissions.
pub trait Authorizer: Send + Sync {
    /// Whether `caller` may move jobs already claimed by another worker.
    fn can_override_reassignment(&self, caller: &Caller) -> bool;
}

/// Grants overrides to admins and managers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn can_override_reassignment(&self, caller: &Caller) -> bool {
        matches!(caller.role, Role::Admin | Role::Manager)
    }
}
