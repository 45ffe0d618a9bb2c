//! User and credential models.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Portal roles. A user holds one or more; capabilities resolve over the
/// union, with Dean superseding Teacher wherever they overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
    Dean,
}

impl Role {
    /// Wire spelling of the role, used in query parameters and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Dean => "Dean",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Self::Student),
            "Teacher" => Ok(Self::Teacher),
            "Dean" => Ok(Self::Dean),
            _ => Err(format!("{s:?} is not a valid role")),
        }
    }
}

/// A portal account as the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Full display name.
    pub name: String,

    /// Never empty — the server and the role-assignment check both enforce it.
    pub roles: Vec<Role>,

    /// Unconfirmed accounts can view their own profile and nothing else.
    pub is_confirmed: bool,

    /// Study group; present and meaningful only when the user is a student.
    #[serde(default)]
    pub group: Option<String>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Login payload. The server answers with a bearer token.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 6, message = "Login must be at least 6 characters"))]
    pub login: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Registration payload. Accounts start unconfirmed; a dean confirms them.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 6, message = "Login must be at least 6 characters"))]
    pub login: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,

    /// Required (non-empty) when registering as a student.
    pub group: String,
}
