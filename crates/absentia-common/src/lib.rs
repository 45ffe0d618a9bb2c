//! # absentia-common
//!
//! Domain foundation for the absence-request portal client: models, the
//! capability policy, draft validation and attachment content sniffing.
//! No I/O happens here — everything is pure and re-derivable from its
//! inputs, which is what makes the policy and the validation rules
//! unit-testable without a server.

pub mod capabilities;
pub mod error;
pub mod models;
pub mod sniff;
pub mod validation;
