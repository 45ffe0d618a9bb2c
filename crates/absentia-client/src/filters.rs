//! Listing filters — fetch parameters as a pure function of view state.
//!
//! Changing any field of a filter is what triggers a refetch; the query
//! it serializes to is fully determined by the struct, so "same filter,
//! same request" holds by construction. Unset values serialize as empty
//! strings, which the server treats as "no filter".

use absentia_common::models::request::{ConfirmationType, Status};
use absentia_common::models::user::Role;

/// Default listing page size, matching the portal UI.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Server-side sort orders for request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAsc,
    CreatedDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAsc => "CreatedAsc",
            Self::CreatedDesc => "CreatedDesc",
        }
    }
}

/// Filter, sort and pagination state for a request listing.
///
/// Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFilter {
    pub confirmation_type: Option<ConfirmationType>,
    pub status: Option<Status>,
    pub sort: Option<SortOrder>,
    /// Submitter display-name substring; meaningful for dean listings only.
    pub user_name: String,
    pub page: u32,
    pub size: u32,
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self {
            confirmation_type: None,
            status: None,
            sort: None,
            user_name: String::new(),
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl RequestFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmation_type(mut self, confirmation_type: ConfirmationType) -> Self {
        self.confirmation_type = Some(confirmation_type);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Query parameters in the exact shape the API expects.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "confirmationType",
                self.confirmation_type
                    .map(|t| t.as_str().to_owned())
                    .unwrap_or_default(),
            ),
            (
                "status",
                self.status.map(|s| s.as_str().to_owned()).unwrap_or_default(),
            ),
            (
                "sort",
                self.sort.map(|s| s.as_str().to_owned()).unwrap_or_default(),
            ),
            ("userName", self.user_name.clone()),
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ]
    }
}

/// Filter and pagination state for a user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub only_confirmed: bool,
    /// Restrict to accounts holding any of these roles; empty means all.
    pub roles: Vec<Role>,
    /// Group substring; empty means all groups.
    pub group: String,
    pub page: u32,
    pub size: u32,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            only_confirmed: false,
            roles: Vec::new(),
            group: String::new(),
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The teacher view: confirmed students only, optionally one group.
    pub fn confirmed_students() -> Self {
        Self {
            only_confirmed: true,
            roles: vec![Role::Student],
            ..Self::default()
        }
    }

    pub fn only_confirmed(mut self, only_confirmed: bool) -> Self {
        self.only_confirmed = only_confirmed;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Query parameters in the exact shape the API expects. Role filters
    /// serialize as repeated `onlyTheseRoles` entries and are omitted
    /// entirely when unset.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("onlyConfirmed", self.only_confirmed.to_string())];
        for role in &self.roles {
            query.push(("onlyTheseRoles", role.as_str().to_owned()));
        }
        query.push(("group", self.group.clone()));
        query.push(("page", self.page.to_string()));
        query.push(("size", self.size.to_string()));
        query
    }
}
