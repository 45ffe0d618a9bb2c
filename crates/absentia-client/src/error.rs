//! Error types for the portal client.
//!
//! Local validation failures and policy denials are raised before any
//! transport call; everything else maps a failed HTTP exchange. A failed
//! mutation never patches the local directory — callers reconcile only on
//! success.

use thiserror::Error;

use absentia_common::capabilities::Capabilities;
use absentia_common::error::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    /// A draft or payload failed local validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The policy does not grant the acting user this capability.
    #[error("operation requires the {capability:?} capability")]
    Forbidden { capability: Capabilities },

    /// The session token was rejected (401); the caller should drop the
    /// session and return to sign-in.
    #[error("session is no longer valid")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// An error from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored attachment was not valid base64.
    #[error("attachment decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// A generic error string.
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
