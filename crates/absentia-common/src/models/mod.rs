//! Core domain models shared between the client SDK and any embedder.
//!
//! These are the "truth" types — what the API serializes and the UI
//! renders. Field names follow the wire format (camelCase).

pub mod request;
pub mod user;

/// Re-export all model types for convenience.
pub use request::*;
pub use user::*;
