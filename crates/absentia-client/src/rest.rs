//! Async REST client for the portal API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use absentia_common::models::request::{AbsenceRequest, Created, Decision, RequestDraft};
use absentia_common::models::user::{LoginRequest, LoginResponse, RegisterRequest, Role, User};

use crate::api::PortalApi;
use crate::directory::Page;
use crate::error::{Error, Result};
use crate::filters::{RequestFilter, UserFilter};

const DEFAULT_BASE: &str = "http://localhost:8080/api";

/// Async portal REST client.
///
/// ```rust,no_run
/// use absentia_client::rest::RestClient;
///
/// #[tokio::main]
/// async fn main() -> absentia_client::Result<()> {
///     let rest = RestClient::new("my-session-token", None)?;
///     let profile = rest.profile().await?;
///     println!("{}", profile.name);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Client with a bearer token attached to every call.
    pub fn new(token: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        let token = {
            let t = token.into();
            if t.starts_with("Bearer ") { t } else { format!("Bearer {t}") }
        };
        let client = Client::builder()
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&token)
                        .map_err(|e| Error::Other(e.to_string()))?,
                );
                h
            })
            .build()?;

        Ok(Self {
            client,
            base_url: normalize(base_url),
        })
    }

    /// Unauthenticated client — only good for [`login`](Self::login) and
    /// [`register`](Self::register).
    pub fn anonymous(base_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: normalize(base_url),
        })
    }

    // ── Auth ──────────────────────────────────────────────────────────────────

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        let resp = self
            .client
            .post(self.url("/User/login"))
            .json(credentials)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<()> {
        let resp = self
            .client
            .post(self.url("/User/register"))
            .json(payload)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let resp = self.client.post(self.url("/User/logout")).send().await?;
        check(resp).await?;
        Ok(())
    }

    /// The signed-in user's account, the source of identity truth for the
    /// session context.
    pub async fn profile(&self) -> Result<User> {
        self.get("/User/profile", &[]).await
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(path, "GET");
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn put_query(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        debug!(path, "PUT");
        let resp = self.client.put(self.url(path)).query(query).send().await?;
        check(resp).await?;
        Ok(())
    }

    fn multipart(draft: &RequestDraft) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new()
            .text("DateFrom", draft.date_from.trim().to_owned());
        if let Some(date_to) = draft.date_to.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            form = form.text("DateTo", date_to.to_owned());
        }
        form = form.text("ConfirmationType", draft.confirmation_type.as_str());
        for file in &draft.files {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(file.kind().mime_type())?;
            form = form.part("Files", part);
        }
        Ok(form)
    }
}

fn normalize(base_url: Option<&str>) -> String {
    base_url.unwrap_or(DEFAULT_BASE).trim_end_matches('/').to_owned()
}

/// Map a non-success response to an error, extracting the server-supplied
/// message when the body carries one. 401 invalidates the session.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    if !status.is_success() {
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
            .unwrap_or_else(|| status.to_string());
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp)
}

fn spreadsheet_stamp(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

// ── Wire envelopes ────────────────────────────────────────────────────────────
//
// Listing endpoints wrap their payloads in a result envelope; the light
// request list sits one level deeper. These shapes exist only to be
// flattened into [`Page`] values.

#[derive(serde::Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(serde::Deserialize)]
struct Pagination {
    count: u32,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestList {
    list_light_requests: Vec<AbsenceRequest>,
}

#[derive(serde::Deserialize)]
struct RequestsPayload {
    requests: RequestList,
    pagination: Pagination,
}

impl From<RequestsPayload> for Page<AbsenceRequest> {
    fn from(payload: RequestsPayload) -> Self {
        Page {
            items: payload.requests.list_light_requests,
            total_pages: payload.pagination.count,
        }
    }
}

#[derive(serde::Deserialize)]
struct UsersPayload {
    users: Vec<User>,
    pagination: Pagination,
}

#[async_trait]
impl PortalApi for RestClient {
    async fn fetch_own_requests(&self, filter: &RequestFilter) -> Result<Page<AbsenceRequest>> {
        let payload: RequestsPayload = self.get("/User/requests", &filter.to_query()).await?;
        Ok(payload.into())
    }

    async fn fetch_all_requests(&self, filter: &RequestFilter) -> Result<Page<AbsenceRequest>> {
        let envelope: Envelope<RequestsPayload> =
            self.get("/Request/all", &filter.to_query()).await?;
        Ok(envelope.value.into())
    }

    async fn fetch_request(&self, id: &str) -> Result<AbsenceRequest> {
        self.get(&format!("/Request/{id}"), &[]).await
    }

    async fn create_request(&self, draft: &RequestDraft) -> Result<Created> {
        debug!(files = draft.files.len(), "POST /Request/create");
        let resp = self
            .client
            .post(self.url("/Request/create"))
            .multipart(Self::multipart(draft)?)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn update_request(&self, id: &str, draft: &RequestDraft) -> Result<()> {
        debug!(id, files = draft.files.len(), "PUT /Request/update");
        let resp = self
            .client
            .put(self.url(&format!("/Request/update/{id}")))
            .multipart(Self::multipart(draft)?)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn decide_request(&self, id: &str, decision: Decision) -> Result<()> {
        self.put_query(
            "/Admin/confirm-request",
            &[
                ("requestId", id.to_owned()),
                ("status", decision.as_str().to_owned()),
            ],
        )
        .await
    }

    async fn fetch_users(&self, filter: &UserFilter) -> Result<Page<User>> {
        let envelope: Envelope<UsersPayload> = self.get("/Admin/users", &filter.to_query()).await?;
        Ok(Page {
            items: envelope.value.users,
            total_pages: envelope.value.pagination.count,
        })
    }

    async fn set_user_confirmation(&self, id: &str, confirmed: bool) -> Result<()> {
        self.put_query(
            "/Admin/confirm-account",
            &[
                ("userId", id.to_owned()),
                ("isConfirmed", confirmed.to_string()),
            ],
        )
        .await
    }

    async fn set_user_roles(&self, id: &str, roles: &[Role]) -> Result<()> {
        debug!(id, "PUT /Admin/role");
        let resp = self
            .client
            .put(self.url("/Admin/role"))
            .json(&json!({ "id": id, "roles": roles }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn set_user_group(&self, id: &str, group: &str) -> Result<()> {
        self.put_query(
            "/Admin/changeGroup",
            &[("userId", id.to_owned()), ("newGroup", group.to_owned())],
        )
        .await
    }

    async fn export_approved_requests(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<u8>> {
        debug!(%date_from, %date_to, "GET /Admin/download-requests");
        let resp = self
            .client
            .get(self.url("/Admin/download-requests"))
            .query(&[
                ("dateFrom", spreadsheet_stamp(date_from)),
                ("dateTo", spreadsheet_stamp(date_to)),
            ])
            .send()
            .await?;
        Ok(check(resp).await?.bytes().await?.to_vec())
    }
}
