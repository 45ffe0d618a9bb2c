//! Capability policy — the single source of truth for role-gated actions.
//!
//! UI affordances consult the computed capability set, never raw role
//! strings. The set is a pure function of the acting user and (optionally)
//! the targeted entity, re-derived on every render; nothing is cached
//! across role changes. The server remains the authoritative enforcer —
//! this policy only keeps forbidden actions from being offered.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::models::request::ConfirmationType;
use crate::models::user::Role;

bitflags! {
    /// Actions a signed-in user may be offered.
    ///
    /// Each capability is a single bit. Role grants combine via OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: i64 {
        /// List own requests (student)
        const VIEW_OWN_REQUESTS        = 1 << 0;
        /// List every request with any filter (dean)
        const VIEW_ALL_REQUESTS        = 1 << 1;
        /// Read-only listing of confirmed students, optionally by group (teacher)
        const VIEW_GROUP_STUDENTS      = 1 << 2;
        /// List every account with any filter (dean)
        const VIEW_ALL_USERS           = 1 << 3;
        /// Submit a new request (student)
        const CREATE_REQUEST           = 1 << 4;
        /// Resubmit a request, resetting it to pending
        const EDIT_REQUEST             = 1 << 5;
        /// Approve or reject a pending request (dean)
        const DECIDE_REQUEST           = 1 << 6;
        /// Change another account's role set (dean)
        const MANAGE_USER_ROLES        = 1 << 7;
        /// Change a student's group (dean)
        const MANAGE_USER_GROUP        = 1 << 8;
        /// Confirm or unconfirm an account (dean)
        const MANAGE_USER_CONFIRMATION = 1 << 9;
        /// Download the approved-requests spreadsheet (dean)
        const EXPORT_APPROVED_REQUESTS = 1 << 10;
    }
}

/// The acting user, as carried in the session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub roles: Vec<Role>,
    /// Unconfirmed accounts get no capabilities at all.
    pub is_confirmed: bool,
}

impl Actor {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The entity an action would target, when capabilities depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// An absence request and its submitting student.
    Request {
        owner_id: &'a str,
        confirmation_type: ConfirmationType,
    },
    /// A portal account.
    Account { user_id: &'a str },
}

/// Compute the capability set for `actor`, optionally refined by a target.
///
/// Resolution:
/// 1. Union the grants of every role the actor holds.
/// 2. A student gains `EDIT_REQUEST` on a request they own, unless it is
///    educational — those are editable only by a dean. Status does not
///    matter: resubmitting an approved or rejected request reopens review.
/// 3. Self-protection: `DECIDE_REQUEST` is stripped on a request the actor
///    owns, and `MANAGE_USER_ROLES` / `MANAGE_USER_CONFIRMATION` are
///    stripped on the actor's own account, whatever roles they hold.
pub fn capabilities_for(actor: &Actor, subject: Option<Subject<'_>>) -> Capabilities {
    if !actor.is_confirmed {
        return Capabilities::empty();
    }

    let mut caps = Capabilities::empty();
    if actor.has_role(Role::Student) {
        caps |= Capabilities::VIEW_OWN_REQUESTS | Capabilities::CREATE_REQUEST;
    }
    if actor.has_role(Role::Teacher) {
        caps |= Capabilities::VIEW_GROUP_STUDENTS;
    }
    if actor.has_role(Role::Dean) {
        caps |= Capabilities::VIEW_ALL_REQUESTS
            | Capabilities::VIEW_ALL_USERS
            | Capabilities::EDIT_REQUEST
            | Capabilities::DECIDE_REQUEST
            | Capabilities::MANAGE_USER_ROLES
            | Capabilities::MANAGE_USER_GROUP
            | Capabilities::MANAGE_USER_CONFIRMATION
            | Capabilities::EXPORT_APPROVED_REQUESTS;
    }

    match subject {
        Some(Subject::Request {
            owner_id,
            confirmation_type,
        }) => {
            let owned = owner_id == actor.user_id;
            if owned
                && actor.has_role(Role::Student)
                && confirmation_type != ConfirmationType::Educational
            {
                caps |= Capabilities::EDIT_REQUEST;
            }
            if owned {
                caps -= Capabilities::DECIDE_REQUEST;
            }
        }
        Some(Subject::Account { user_id }) => {
            if user_id == actor.user_id {
                caps -= Capabilities::MANAGE_USER_ROLES | Capabilities::MANAGE_USER_CONFIRMATION;
            }
        }
        None => {}
    }

    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str, roles: &[Role]) -> Actor {
        Actor {
            user_id: id.to_owned(),
            roles: roles.to_vec(),
            is_confirmed: true,
        }
    }

    fn request<'a>(owner_id: &'a str, confirmation_type: ConfirmationType) -> Subject<'a> {
        Subject::Request {
            owner_id,
            confirmation_type,
        }
    }

    #[test]
    fn student_base_capabilities() {
        let caps = capabilities_for(&actor("s1", &[Role::Student]), None);
        assert_eq!(
            caps,
            Capabilities::VIEW_OWN_REQUESTS | Capabilities::CREATE_REQUEST
        );
    }

    #[test]
    fn student_may_edit_owned_family_request() {
        let caps = capabilities_for(
            &actor("s1", &[Role::Student]),
            Some(request("s1", ConfirmationType::Family)),
        );
        assert!(caps.contains(Capabilities::EDIT_REQUEST));
    }

    #[test]
    fn student_may_not_edit_owned_educational_request() {
        let caps = capabilities_for(
            &actor("s1", &[Role::Student]),
            Some(request("s1", ConfirmationType::Educational)),
        );
        assert!(!caps.contains(Capabilities::EDIT_REQUEST));
    }

    #[test]
    fn student_may_not_edit_someone_elses_request() {
        let caps = capabilities_for(
            &actor("s1", &[Role::Student]),
            Some(request("s2", ConfirmationType::Family)),
        );
        assert!(!caps.contains(Capabilities::EDIT_REQUEST));
    }

    #[test]
    fn teacher_only_lists_group_students() {
        let caps = capabilities_for(&actor("t1", &[Role::Teacher]), None);
        assert_eq!(caps, Capabilities::VIEW_GROUP_STUDENTS);
    }

    #[test]
    fn dean_edits_any_request_including_educational() {
        let caps = capabilities_for(
            &actor("d1", &[Role::Dean]),
            Some(request("s9", ConfirmationType::Educational)),
        );
        assert!(caps.contains(Capabilities::EDIT_REQUEST));
        assert!(caps.contains(Capabilities::DECIDE_REQUEST));
    }

    #[test]
    fn dean_may_not_decide_own_request() {
        let caps = capabilities_for(
            &actor("d1", &[Role::Dean]),
            Some(request("d1", ConfirmationType::Medical)),
        );
        assert!(!caps.contains(Capabilities::DECIDE_REQUEST));
        // Editing own requests stays allowed.
        assert!(caps.contains(Capabilities::EDIT_REQUEST));
    }

    #[test]
    fn dean_may_not_manage_own_account() {
        let caps = capabilities_for(
            &actor("d1", &[Role::Dean]),
            Some(Subject::Account { user_id: "d1" }),
        );
        assert!(!caps.contains(Capabilities::MANAGE_USER_ROLES));
        assert!(!caps.contains(Capabilities::MANAGE_USER_CONFIRMATION));
        // Group changes on own account were never restricted.
        assert!(caps.contains(Capabilities::MANAGE_USER_GROUP));
    }

    #[test]
    fn roles_union_and_dean_supersedes_teacher() {
        let caps = capabilities_for(&actor("td", &[Role::Teacher, Role::Dean]), None);
        assert!(caps.contains(Capabilities::VIEW_GROUP_STUDENTS));
        assert!(caps.contains(Capabilities::VIEW_ALL_USERS));
        assert!(caps.contains(Capabilities::DECIDE_REQUEST));
    }

    #[test]
    fn unconfirmed_actor_has_no_capabilities() {
        let mut unconfirmed = actor("s1", &[Role::Student, Role::Dean]);
        unconfirmed.is_confirmed = false;
        assert_eq!(capabilities_for(&unconfirmed, None), Capabilities::empty());
    }
}
