//! The remote collaborator surface the portal client consumes.

use async_trait::async_trait;
use chrono::NaiveDate;

use absentia_common::models::request::{AbsenceRequest, Created, Decision, RequestDraft};
use absentia_common::models::user::{Role, User};

use crate::directory::Page;
use crate::error::Result;
use crate::filters::{RequestFilter, UserFilter};

/// Authenticated portal API boundary.
///
/// [`crate::rest::RestClient`] is the production implementation; tests
/// substitute in-memory fakes. Every call resolves to exactly one
/// success-or-failure outcome and nothing retries automatically.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// The caller's own requests (server-scoped for students).
    async fn fetch_own_requests(&self, filter: &RequestFilter) -> Result<Page<AbsenceRequest>>;

    /// Every request, with any filter (dean only, server-enforced).
    async fn fetch_all_requests(&self, filter: &RequestFilter) -> Result<Page<AbsenceRequest>>;

    /// One request with its stored attachment payloads.
    async fn fetch_request(&self, id: &str) -> Result<AbsenceRequest>;

    /// Create a request from a validated draft; the server assigns the id
    /// and the request starts pending.
    async fn create_request(&self, draft: &RequestDraft) -> Result<Created>;

    /// Replace a request's fields and attachments; the server resets its
    /// status to pending.
    async fn update_request(&self, id: &str, draft: &RequestDraft) -> Result<()>;

    /// Approve or reject a pending request (dean only, server-enforced).
    async fn decide_request(&self, id: &str, decision: Decision) -> Result<()>;

    async fn fetch_users(&self, filter: &UserFilter) -> Result<Page<User>>;

    async fn set_user_confirmation(&self, id: &str, confirmed: bool) -> Result<()>;

    async fn set_user_roles(&self, id: &str, roles: &[Role]) -> Result<()>;

    async fn set_user_group(&self, id: &str, group: &str) -> Result<()>;

    /// Approved requests for the range as a spreadsheet blob.
    async fn export_approved_requests(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<u8>>;
}
