//! High-level portal client — capability-gated operations over the API.
//!
//! Every mutating operation runs the same gauntlet: the policy first (an
//! action the capability set does not contain fails with `Forbidden`
//! before any transport), local validation second, the API call last.
//! Reconciliation into a [`Directory`] happens only after success.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{Months, NaiveDate};
use tracing::info;

use absentia_common::capabilities::{Capabilities, Subject, capabilities_for};
use absentia_common::error::{Field, ValidationError};
use absentia_common::models::request::{AbsenceRequest, Decision, RequestDraft};
use absentia_common::models::user::{LoginRequest, RegisterRequest, Role, User};
use absentia_common::sniff::detect_file_kind;
use absentia_common::validation::{
    validate_draft, validate_group, validate_payload, validate_registration,
    validate_role_assignment,
};

use crate::api::PortalApi;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::filters::{RequestFilter, UserFilter};
use crate::rest::RestClient;
use crate::session::SessionContext;

/// Name under which the approved-requests spreadsheet is saved.
pub const EXPORT_FILE_NAME: &str = "requests.xlsx";

/// A stored attachment decoded and named for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDownload {
    /// `file_{n}.{ext}` with the extension recovered by sniffing.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The approved-requests export, ready for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The signed-in portal client: an API handle plus the session context
/// that feeds the capability policy.
pub struct PortalClient<A> {
    api: A,
    session: SessionContext,
}

impl PortalClient<RestClient> {
    /// Sign in and build a client: log in, attach the token, load the
    /// profile into the session context.
    pub async fn sign_in(login: &str, password: &str, base_url: Option<&str>) -> Result<Self> {
        let credentials = LoginRequest {
            login: login.to_owned(),
            password: password.to_owned(),
        };
        validate_payload(&credentials)?;

        let response = RestClient::anonymous(base_url)?.login(&credentials).await?;
        let rest = RestClient::new(response.token, base_url)?;
        let profile = rest.profile().await?;
        info!(user = %profile.name, "signed in");
        Ok(Self::with_session(rest, SessionContext::from_profile(profile)))
    }

    /// Register a new account. Accounts start unconfirmed; a dean confirms
    /// them before the portal opens up.
    pub async fn register(payload: &RegisterRequest, base_url: Option<&str>) -> Result<()> {
        validate_registration(payload)?;
        RestClient::anonymous(base_url)?.register(payload).await
    }

    /// Invalidate the session server-side.
    pub async fn sign_out(self) -> Result<()> {
        self.api.logout().await
    }
}

impl<A: PortalApi> PortalClient<A> {
    /// Wrap an already-authenticated API with a session context.
    pub fn with_session(api: A, session: SessionContext) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Capabilities of the signed-in user, optionally against a target.
    pub fn capabilities(&self, subject: Option<Subject<'_>>) -> Capabilities {
        capabilities_for(&self.session.actor(), subject)
    }

    fn require(&self, capability: Capabilities, subject: Option<Subject<'_>>) -> Result<()> {
        if self.capabilities(subject).contains(capability) {
            Ok(())
        } else {
            Err(Error::Forbidden { capability })
        }
    }

    // ── Listings ──────────────────────────────────────────────────────────────

    /// Load the request listing the session is allowed to see: deans get
    /// every request, students their own. The directory records the
    /// outcome; transport failures also propagate so the caller can
    /// surface them.
    pub async fn load_requests(
        &self,
        directory: &mut Directory<AbsenceRequest>,
        filter: &RequestFilter,
    ) -> Result<()> {
        let caps = self.capabilities(None);
        let all = caps.contains(Capabilities::VIEW_ALL_REQUESTS);
        if !all && !caps.contains(Capabilities::VIEW_OWN_REQUESTS) {
            return Err(Error::Forbidden {
                capability: Capabilities::VIEW_OWN_REQUESTS,
            });
        }

        let token = directory.begin_fetch();
        let outcome = if all {
            self.api.fetch_all_requests(filter).await
        } else {
            self.api.fetch_own_requests(filter).await
        };
        match outcome {
            Ok(page) => {
                directory.publish(token, page);
                Ok(())
            }
            Err(error) => {
                if directory.publish_error(token, &error) {
                    Err(error)
                } else {
                    // A newer fetch superseded this one; its failure is moot.
                    Ok(())
                }
            }
        }
    }

    /// Load the user listing. Deans pass any filter; teachers are forced
    /// onto the confirmed-students scope (keeping their group search and
    /// pagination).
    pub async fn load_users(
        &self,
        directory: &mut Directory<User>,
        filter: &UserFilter,
    ) -> Result<()> {
        let caps = self.capabilities(None);
        let effective = if caps.contains(Capabilities::VIEW_ALL_USERS) {
            filter.clone()
        } else if caps.contains(Capabilities::VIEW_GROUP_STUDENTS) {
            UserFilter {
                group: filter.group.clone(),
                page: filter.page,
                size: filter.size,
                ..UserFilter::confirmed_students()
            }
        } else {
            return Err(Error::Forbidden {
                capability: Capabilities::VIEW_GROUP_STUDENTS,
            });
        };

        let token = directory.begin_fetch();
        match self.api.fetch_users(&effective).await {
            Ok(page) => {
                directory.publish(token, page);
                Ok(())
            }
            Err(error) => {
                if directory.publish_error(token, &error) {
                    Err(error)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// One request with its stored attachments.
    pub async fn request_details(&self, id: &str) -> Result<AbsenceRequest> {
        self.api.fetch_request(id).await
    }

    // ── Request mutations ─────────────────────────────────────────────────────

    /// Validate and submit a new request, then fetch the stored version so
    /// the caller can append it to the directory.
    pub async fn submit_request(&self, draft: &RequestDraft) -> Result<AbsenceRequest> {
        self.require(Capabilities::CREATE_REQUEST, None)?;
        validate_draft(draft, 0)?;
        let created = self.api.create_request(draft).await?;
        info!(id = %created.id, "request created");
        self.api.fetch_request(&created.id).await
    }

    /// Validate and submit an edit. The server resets the request to
    /// pending and replaces its attachment set wholesale; reconcile with
    /// [`Directory::apply_edit`] on success.
    pub async fn edit_request(
        &self,
        request: &AbsenceRequest,
        owner_id: &str,
        draft: &RequestDraft,
    ) -> Result<()> {
        let subject = Subject::Request {
            owner_id,
            confirmation_type: request.confirmation_type,
        };
        self.require(Capabilities::EDIT_REQUEST, Some(subject))?;
        validate_draft(draft, request.files.len())?;
        self.api.update_request(&request.id, draft).await?;
        info!(id = %request.id, "request edited, back to pending review");
        Ok(())
    }

    /// Approve or reject a request. Pass the owner id when it is known so
    /// the self-decision guard applies client-side; reconcile with
    /// [`Directory::apply_decision`] on success.
    pub async fn decide_request(
        &self,
        request: &AbsenceRequest,
        owner_id: Option<&str>,
        decision: Decision,
    ) -> Result<()> {
        let subject = owner_id.map(|owner_id| Subject::Request {
            owner_id,
            confirmation_type: request.confirmation_type,
        });
        self.require(Capabilities::DECIDE_REQUEST, subject)?;
        self.api.decide_request(&request.id, decision).await?;
        info!(id = %request.id, ?decision, "request decided");
        Ok(())
    }

    // ── User management ───────────────────────────────────────────────────────

    /// Confirm or unconfirm an account; forbidden on one's own.
    pub async fn confirm_account(&self, user_id: &str, confirmed: bool) -> Result<()> {
        self.require(
            Capabilities::MANAGE_USER_CONFIRMATION,
            Some(Subject::Account { user_id }),
        )?;
        self.api.set_user_confirmation(user_id, confirmed).await
    }

    /// Replace an account's role set; forbidden on one's own, and an empty
    /// set is rejected locally.
    pub async fn set_user_roles(&self, user_id: &str, roles: &[Role]) -> Result<()> {
        self.require(
            Capabilities::MANAGE_USER_ROLES,
            Some(Subject::Account { user_id }),
        )?;
        validate_role_assignment(roles)?;
        self.api.set_user_roles(user_id, roles).await
    }

    /// Change a student's group.
    pub async fn set_user_group(&self, user_id: &str, group: &str) -> Result<()> {
        self.require(
            Capabilities::MANAGE_USER_GROUP,
            Some(Subject::Account { user_id }),
        )?;
        validate_group(group)?;
        self.api.set_user_group(user_id, group).await
    }

    // ── Export ────────────────────────────────────────────────────────────────

    /// Download the approved-requests spreadsheet for the range.
    pub async fn export_approved(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<SpreadsheetExport> {
        self.require(Capabilities::EXPORT_APPROVED_REQUESTS, None)?;
        if date_from > date_to {
            return Err(ValidationError::new(
                Field::DateFrom,
                "The start date cannot be later than the end date",
            )
            .into());
        }
        let bytes = self.api.export_approved_requests(date_from, date_to).await?;
        Ok(SpreadsheetExport {
            file_name: EXPORT_FILE_NAME.to_owned(),
            bytes,
        })
    }
}

/// Decode a request's stored attachments and name them for saving. The
/// extension and MIME type come from sniffing the decoded bytes — the
/// store keeps no trustworthy declared type.
pub fn attachment_downloads(request: &AbsenceRequest) -> Result<Vec<AttachmentDownload>> {
    request
        .files
        .iter()
        .enumerate()
        .map(|(index, encoded)| {
            let bytes = B64.decode(encoded)?;
            let kind = detect_file_kind(&bytes);
            Ok(AttachmentDownload {
                file_name: format!("file_{}.{}", index + 1, kind.extension()),
                mime_type: kind.mime_type(),
                bytes,
            })
        })
        .collect()
}

/// Suggested export range: the trailing month up to `today`.
pub fn default_export_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        today.checked_sub_months(Months::new(1)).unwrap_or(today),
        today,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use absentia_common::models::request::{ConfirmationType, Created, Status, UploadFile};

    use crate::directory::Page;

    const PDF: &[u8] = &[0x25, 0x50, 0x44, 0x46, 0x2D, 0x31, 0x2E, 0x34];

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        last_user_filter: Mutex<Option<UserFilter>>,
    }

    impl FakeApi {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_owned());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn stored_request(id: &str) -> AbsenceRequest {
        AbsenceRequest {
            id: id.to_owned(),
            status: Status::Pending,
            confirmation_type: ConfirmationType::Family,
            date_from: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            date_to: Some(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()),
            user_name: None,
            files: Vec::new(),
        }
    }

    #[async_trait]
    impl PortalApi for FakeApi {
        async fn fetch_own_requests(&self, _: &RequestFilter) -> Result<Page<AbsenceRequest>> {
            self.record("fetch_own_requests");
            Ok(Page { items: vec![], total_pages: 1 })
        }

        async fn fetch_all_requests(&self, _: &RequestFilter) -> Result<Page<AbsenceRequest>> {
            self.record("fetch_all_requests");
            Ok(Page { items: vec![], total_pages: 1 })
        }

        async fn fetch_request(&self, id: &str) -> Result<AbsenceRequest> {
            self.record("fetch_request");
            Ok(stored_request(id))
        }

        async fn create_request(&self, _: &RequestDraft) -> Result<Created> {
            self.record("create_request");
            Ok(Created { id: "new-1".to_owned() })
        }

        async fn update_request(&self, _: &str, _: &RequestDraft) -> Result<()> {
            self.record("update_request");
            Ok(())
        }

        async fn decide_request(&self, _: &str, _: Decision) -> Result<()> {
            self.record("decide_request");
            Ok(())
        }

        async fn fetch_users(&self, filter: &UserFilter) -> Result<Page<User>> {
            self.record("fetch_users");
            *self.last_user_filter.lock().unwrap() = Some(filter.clone());
            Ok(Page { items: vec![], total_pages: 1 })
        }

        async fn set_user_confirmation(&self, _: &str, _: bool) -> Result<()> {
            self.record("set_user_confirmation");
            Ok(())
        }

        async fn set_user_roles(&self, _: &str, _: &[Role]) -> Result<()> {
            self.record("set_user_roles");
            Ok(())
        }

        async fn set_user_group(&self, _: &str, _: &str) -> Result<()> {
            self.record("set_user_group");
            Ok(())
        }

        async fn export_approved_requests(&self, _: NaiveDate, _: NaiveDate) -> Result<Vec<u8>> {
            self.record("export_approved_requests");
            Ok(vec![0x50, 0x4B])
        }
    }

    fn portal(user_id: &str, roles: &[Role]) -> PortalClient<FakeApi> {
        PortalClient::with_session(
            FakeApi::default(),
            SessionContext {
                user_id: user_id.to_owned(),
                name: "Test User".to_owned(),
                roles: roles.to_vec(),
                is_confirmed: true,
                group: None,
            },
        )
    }

    fn family_draft() -> RequestDraft {
        RequestDraft {
            confirmation_type: ConfirmationType::Family,
            date_from: "2024-02-01".to_owned(),
            date_to: Some("2024-02-05".to_owned()),
            files: vec![UploadFile::new("scan.pdf", PDF.to_vec())],
        }
    }

    #[tokio::test]
    async fn reversed_dates_never_reach_the_transport() {
        let portal = portal("s1", &[Role::Student]);
        let mut draft = family_draft();
        draft.date_from = "2024-02-01".to_owned();
        draft.date_to = Some("2024-01-30".to_owned());

        let err = portal.submit_request(&draft).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError { field: Field::DateFrom, .. })
        ));
        assert!(portal.api().calls().is_empty());
    }

    #[tokio::test]
    async fn empty_role_update_never_reaches_the_transport() {
        let portal = portal("d1", &[Role::Dean]);
        let err = portal.set_user_roles("u2", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError { field: Field::Roles, .. })
        ));
        assert!(portal.api().calls().is_empty());
    }

    #[tokio::test]
    async fn submit_creates_then_fetches_the_stored_request() {
        let portal = portal("s1", &[Role::Student]);
        let stored = portal.submit_request(&family_draft()).await.unwrap();
        assert_eq!(stored.id, "new-1");
        assert_eq!(portal.api().calls(), vec!["create_request", "fetch_request"]);
    }

    #[tokio::test]
    async fn student_cannot_decide() {
        let portal = portal("s1", &[Role::Student]);
        let err = portal
            .decide_request(&stored_request("r-1"), Some("s2"), Decision::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        assert!(portal.api().calls().is_empty());
    }

    #[tokio::test]
    async fn dean_cannot_decide_an_owned_request() {
        let portal = portal("d1", &[Role::Dean]);
        let err = portal
            .decide_request(&stored_request("r-1"), Some("d1"), Decision::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        portal
            .decide_request(&stored_request("r-1"), Some("s7"), Decision::Rejected)
            .await
            .unwrap();
        assert_eq!(portal.api().calls(), vec!["decide_request"]);
    }

    #[tokio::test]
    async fn student_cannot_edit_an_educational_request() {
        let student = portal("s1", &[Role::Student]);
        let mut request = stored_request("r-1");
        request.confirmation_type = ConfirmationType::Educational;

        let mut draft = family_draft();
        draft.confirmation_type = ConfirmationType::Educational;

        let err = student.edit_request(&request, "s1", &draft).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        // A dean edits the same request without the ownership restriction.
        let dean = portal("d1", &[Role::Dean]);
        dean.edit_request(&request, "s1", &draft).await.unwrap();
        assert_eq!(dean.api().calls(), vec!["update_request"]);
    }

    #[tokio::test]
    async fn unconfirmed_accounts_cannot_submit() {
        let mut portal = portal("s1", &[Role::Student]);
        portal.session.is_confirmed = false;
        let err = portal.submit_request(&family_draft()).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
    }

    #[tokio::test]
    async fn listing_scope_follows_capabilities() {
        let mut dir = Directory::new();
        let student = portal("s1", &[Role::Student]);
        student.load_requests(&mut dir, &RequestFilter::new()).await.unwrap();
        assert_eq!(student.api().calls(), vec!["fetch_own_requests"]);

        let dean = portal("d1", &[Role::Dean]);
        dean.load_requests(&mut dir, &RequestFilter::new()).await.unwrap();
        assert_eq!(dean.api().calls(), vec!["fetch_all_requests"]);
    }

    #[tokio::test]
    async fn teacher_user_listing_is_forced_to_confirmed_students() {
        let portal = portal("t1", &[Role::Teacher]);
        let mut dir = Directory::new();
        let filter = UserFilter::new().group("IS-31").page(2);
        portal.load_users(&mut dir, &filter).await.unwrap();

        let sent = portal.api().last_user_filter.lock().unwrap().clone().unwrap();
        assert!(sent.only_confirmed);
        assert_eq!(sent.roles, vec![Role::Student]);
        assert_eq!(sent.group, "IS-31");
        assert_eq!(sent.page, 2);
    }

    #[tokio::test]
    async fn dean_user_filter_passes_through_unchanged() {
        let portal = portal("d1", &[Role::Dean]);
        let mut dir = Directory::new();
        let filter = UserFilter::new().role(Role::Teacher);
        portal.load_users(&mut dir, &filter).await.unwrap();

        let sent = portal.api().last_user_filter.lock().unwrap().clone().unwrap();
        assert_eq!(sent, filter);
    }

    #[tokio::test]
    async fn export_checks_range_then_names_the_download() {
        let portal = portal("d1", &[Role::Dean]);
        let from = NaiveDate::from_ymd_opt(2024, 7, 6).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap();

        let err = portal.export_approved(from, to).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(portal.api().calls().is_empty());

        let export = portal.export_approved(to, from).await.unwrap();
        assert_eq!(export.file_name, EXPORT_FILE_NAME);
        assert!(!export.bytes.is_empty());
    }

    #[test]
    fn attachments_are_named_by_sniffed_kind() {
        let mut request = stored_request("r-1");
        request.files = vec![B64.encode(PDF), B64.encode(b"mystery bytes")];

        let downloads = attachment_downloads(&request).unwrap();
        assert_eq!(downloads[0].file_name, "file_1.pdf");
        assert_eq!(downloads[0].mime_type, "application/pdf");
        assert_eq!(downloads[1].file_name, "file_2.unknown");
        assert_eq!(downloads[1].mime_type, "application/octet-stream");
    }

    #[test]
    fn attachment_download_rejects_bad_base64() {
        let mut request = stored_request("r-1");
        request.files = vec!["not base64!!".to_owned()];
        assert!(matches!(
            attachment_downloads(&request).unwrap_err(),
            Error::Decode(_)
        ));
    }

    #[test]
    fn default_range_is_the_trailing_month() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 6).unwrap();
        let (from, to) = default_export_range(today);
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap());
        assert_eq!(to, today);
    }
}
