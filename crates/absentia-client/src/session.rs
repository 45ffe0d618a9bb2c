//! Session context — explicit identity for the policy.
//!
//! The signed-in user's id, roles and confirmation state travel with the
//! client and feed [`capabilities_for`](absentia_common::capabilities::capabilities_for)
//! directly. Nothing is stashed in ambient storage and read back ad hoc;
//! components receive the context they need.

use absentia_common::capabilities::Actor;
use absentia_common::models::user::{Role, User};

/// The signed-in user's identity, as reported by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: String,
    pub name: String,
    pub roles: Vec<Role>,
    pub is_confirmed: bool,
    pub group: Option<String>,
}

impl SessionContext {
    pub fn from_profile(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            roles: user.roles,
            is_confirmed: user.is_confirmed,
            group: user.group,
        }
    }

    /// Policy-facing view of the session.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id.clone(),
            roles: self.roles.clone(),
            is_confirmed: self.is_confirmed,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
