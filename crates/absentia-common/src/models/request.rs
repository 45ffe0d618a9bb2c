//! Absence request models and drafts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sniff::{FileKind, detect_file_kind};

/// Review status of a request.
///
/// A request is created `Pending` and becomes terminal once a dean decides
/// it — except that a successful edit transitions any status back to
/// `Pending`, reopening review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

/// Category of a request; drives the field and attachment requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationType {
    #[default]
    Medical,
    Family,
    Educational,
}

impl ConfirmationType {
    /// Family and educational absences must declare an end date.
    pub fn requires_date_to(&self) -> bool {
        matches!(self, Self::Family | Self::Educational)
    }

    /// Medical and educational absences must carry at least one document.
    pub fn requires_attachment(&self) -> bool {
        matches!(self, Self::Medical | Self::Educational)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medical => "Medical",
            Self::Family => "Family",
            Self::Educational => "Educational",
        }
    }
}

/// A dean's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The status a decided request ends up in.
    pub fn status(&self) -> Status {
        match self {
            Self::Approved => Status::Approved,
            Self::Rejected => Status::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.status().as_str()
    }
}

/// An absence request as the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRequest {
    pub id: String,

    pub status: Status,

    pub confirmation_type: ConfirmationType,

    #[serde(with = "iso_date")]
    pub date_from: NaiveDate,

    /// Advisory for medical requests, required otherwise.
    #[serde(with = "iso_date::option", default)]
    pub date_to: Option<NaiveDate>,

    /// Submitting student's display name; populated for dean and teacher
    /// listings, absent when a student lists their own requests.
    #[serde(default)]
    pub user_name: Option<String>,

    /// Stored documents — base64-encoded raw bytes with no declared type.
    /// Light listings omit this; the detail fetch includes it.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Server reply to a create call.
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    pub id: String,
}

/// A candidate attachment picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Sniffed content kind; declared extensions are not trusted.
    pub fn kind(&self) -> FileKind {
        detect_file_kind(&self.bytes)
    }
}

/// An in-progress create or edit, not yet validated or submitted.
///
/// Submitting an edit wholesale-replaces the stored attachment set: when
/// the draft carries new files, the previously stored documents are
/// discarded by the server, never merged.
#[derive(Debug, Clone, Default)]
pub struct RequestDraft {
    pub confirmation_type: ConfirmationType,

    /// ISO date string as entered in the form (`YYYY-MM-DD`).
    pub date_from: String,

    /// Optional for medical requests; an empty string counts as unset.
    pub date_to: Option<String>,

    pub files: Vec<UploadFile>,
}

/// Parse a wire date that may arrive bare (`2024-02-01`) or with a time
/// suffix (`2024-02-01T00:00:00`); the time part is dropped.
pub fn parse_wire_date(s: &str) -> Option<NaiveDate> {
    let date = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

pub(crate) mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(date: &NaiveDate, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(de)?;
        super::parse_wire_date(&s).ok_or_else(|| de::Error::custom(format!("invalid date: {s:?}")))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            ser: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, ser),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            de: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(de)?.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => crate::models::request::parse_wire_date(s)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date: {s:?}"))),
            }
        }
    }
}
