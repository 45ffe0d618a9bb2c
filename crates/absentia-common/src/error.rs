//! Field-scoped validation errors.
//!
//! A `ValidationError` is local and pre-submission: it blocks the call
//! before anything reaches the transport, and it names the single form
//! field the failure is attributed to. Transport-level failures live in
//! the client crate's error type.

use thiserror::Error;

/// The form field a validation failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ConfirmationType,
    DateFrom,
    DateTo,
    Files,
    Roles,
    Group,
    Login,
    Password,
    Name,
}

impl Field {
    /// Wire name of the field, as the API and the forms spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmationType => "confirmationType",
            Self::DateFrom => "dateFrom",
            Self::DateTo => "dateTo",
            Self::Files => "files",
            Self::Roles => "roles",
            Self::Group => "group",
            Self::Login => "login",
            Self::Password => "password",
            Self::Name => "name",
        }
    }

    /// Resolve a field from either its wire name or a Rust struct field name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "confirmationType" | "confirmation_type" => Some(Self::ConfirmationType),
            "dateFrom" | "date_from" => Some(Self::DateFrom),
            "dateTo" | "date_to" => Some(Self::DateTo),
            "files" => Some(Self::Files),
            "roles" => Some(Self::Roles),
            "group" => Some(Self::Group),
            "login" => Some(Self::Login),
            "password" => Some(Self::Password),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
///
/// Validation is first-failure-wins: the first rule a payload breaks is
/// the one reported, and nothing is sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
