//! Local validation — ordered, first failure wins, never contacts the server.

use validator::Validate;

use crate::error::{Field, ValidationError};
use crate::models::request::{ConfirmationType, RequestDraft, parse_wire_date};
use crate::models::user::{RegisterRequest, Role};

/// Attachment cap per request.
pub const MAX_ATTACHMENTS: usize = 5;

/// Validate an in-progress create or edit before submission.
///
/// `existing_attachments` is the number of documents already stored
/// server-side (0 for a create). Rules run in a fixed order and the first
/// failure is returned; a failing draft never reaches the transport.
///
/// The confirmation type itself is a closed enum here, so the "known
/// type" rule holds by construction.
pub fn validate_draft(
    draft: &RequestDraft,
    existing_attachments: usize,
) -> Result<(), ValidationError> {
    let date_from = parse_wire_date(draft.date_from.trim())
        .ok_or_else(|| ValidationError::new(Field::DateFrom, "Enter a valid start date"))?;

    let date_to_raw = draft
        .date_to
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if draft.confirmation_type.requires_date_to() && date_to_raw.is_none() {
        return Err(ValidationError::new(Field::DateTo, "Enter an end date"));
    }

    let total = existing_attachments + draft.files.len();
    if draft.confirmation_type.requires_attachment() && total == 0 {
        return Err(ValidationError::new(
            Field::Files,
            "Attach at least one document",
        ));
    }
    if total > MAX_ATTACHMENTS {
        return Err(ValidationError::new(
            Field::Files,
            format!("No more than {MAX_ATTACHMENTS} documents per request"),
        ));
    }

    // The whole batch is rejected on the first unrecognized file; there is
    // no partial acceptance.
    for file in &draft.files {
        if !file.kind().is_accepted() {
            return Err(ValidationError::new(
                Field::Files,
                format!(
                    "{}: only PDF, JPEG or PNG documents are accepted",
                    file.file_name
                ),
            ));
        }
    }

    // Medical requests are exempt: their end date is advisory.
    if draft.confirmation_type != ConfirmationType::Medical {
        if let Some(raw) = date_to_raw {
            let date_to = parse_wire_date(raw)
                .ok_or_else(|| ValidationError::new(Field::DateTo, "Enter a valid end date"))?;
            if date_from > date_to {
                return Err(ValidationError::new(
                    Field::DateFrom,
                    "The start date cannot be later than the end date",
                ));
            }
        }
    }

    Ok(())
}

/// Validate a credential payload, mapping the first `validator` failure to
/// a field-scoped error.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ValidationError> {
    payload.validate().map_err(first_error)
}

/// Validate a registration: the derived field rules plus the group
/// requirement for student accounts.
pub fn validate_registration(payload: &RegisterRequest) -> Result<(), ValidationError> {
    validate_payload(payload)?;
    if payload.role == Role::Student && payload.group.trim().is_empty() {
        return Err(ValidationError::new(
            Field::Group,
            "Students must belong to a group",
        ));
    }
    Ok(())
}

/// Role updates must leave the account with at least one role. Checked
/// locally; an offending update never reaches the server.
pub fn validate_role_assignment(roles: &[Role]) -> Result<(), ValidationError> {
    if roles.is_empty() {
        return Err(ValidationError::new(
            Field::Roles,
            "A user must keep at least one role",
        ));
    }
    Ok(())
}

/// Group assignments must be non-empty.
pub fn validate_group(group: &str) -> Result<(), ValidationError> {
    if group.trim().is_empty() {
        return Err(ValidationError::new(Field::Group, "Enter a group"));
    }
    Ok(())
}

fn first_error(errors: validator::ValidationErrors) -> ValidationError {
    errors
        .field_errors()
        .iter()
        .next()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for '{field}'"));
            ValidationError::new(Field::from_name(field).unwrap_or(Field::Name), message)
        })
        .unwrap_or_else(|| ValidationError::new(Field::Name, "Invalid payload"))
}
