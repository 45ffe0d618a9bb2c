//! Paginated in-memory directory with local reconciliation.
//!
//! A directory holds the one page the UI is currently showing. The page
//! changes in exactly three ways: a fresh fetch replaces it, a successful
//! mutation patches one entity in place, and a freshly created request is
//! appended. Fetches are sequence-numbered so that only the latest issued
//! fetch may publish its result — a response arriving after a newer fetch
//! was issued is discarded, never applied.

use tracing::{debug, warn};

use absentia_common::models::request::{AbsenceRequest, Decision, RequestDraft, Status};
use absentia_common::models::request::parse_wire_date;
use absentia_common::models::user::{Role, User};

use crate::error::Error;

/// Loading state of a directory instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Error,
}

/// One fetched page of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

/// Entities addressable by their server-assigned id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for AbsenceRequest {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Token identifying one issued fetch. Publishing with a superseded token
/// leaves the directory untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a fetch that is never published leaves the directory loading"]
pub struct FetchToken(u64);

#[derive(Debug)]
pub struct Directory<T> {
    phase: Phase,
    items: Vec<T>,
    total_pages: u32,
    latest: u64,
}

impl<T: Keyed> Default for Directory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Directory<T> {
    pub fn new() -> Self {
        Self {
            phase: Phase::Loading,
            items: Vec::new(),
            total_pages: 1,
            latest: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Register a fetch triggered by a filter, page or page-size change,
    /// or by a retry. Any fetch still in flight is superseded by the
    /// returned token.
    pub fn begin_fetch(&mut self) -> FetchToken {
        self.latest += 1;
        self.phase = Phase::Loading;
        FetchToken(self.latest)
    }

    /// Publish a fetched page. Applies only while `token` is still the
    /// latest issued; returns whether the page was applied.
    pub fn publish(&mut self, token: FetchToken, page: Page<T>) -> bool {
        if token.0 != self.latest {
            debug!(token = token.0, latest = self.latest, "discarding stale page fetch");
            return false;
        }
        self.items = page.items;
        self.total_pages = page.total_pages;
        self.phase = Phase::Ready;
        true
    }

    /// Record a failed fetch. The previously shown items stay in place so
    /// a retry can redraw them; only the phase changes. A failure from a
    /// superseded fetch is irrelevant and ignored entirely.
    pub fn publish_error(&mut self, token: FetchToken, error: &Error) -> bool {
        if token.0 != self.latest {
            debug!(token = token.0, latest = self.latest, "discarding stale fetch failure");
            return false;
        }
        warn!(%error, "page fetch failed");
        self.phase = Phase::Error;
        true
    }

    /// Patch one entity in place after a successful mutation. Only the
    /// fields the closure touches change; ordering and every other entity
    /// stay exactly as fetched. Returns false when the id is not on the
    /// current page.
    pub fn patch(&mut self, id: &str, apply: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.key() == id) {
            Some(item) => {
                apply(item);
                true
            }
            None => false,
        }
    }

    /// Append a newly created entity so its creator sees it immediately.
    /// The page is not re-sorted or re-paginated until the next real
    /// fetch; server order is a display convenience, not a correctness
    /// property here.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }
}

impl Directory<AbsenceRequest> {
    /// Reconcile a successful dean decision: only the matched request's
    /// status changes.
    pub fn apply_decision(&mut self, id: &str, decision: Decision) -> bool {
        self.patch(id, |request| request.status = decision.status())
    }

    /// Reconcile a successful edit: the submitted dates land in place and
    /// the request returns to pending review. Attachment contents are not
    /// mirrored here — light listings do not carry them.
    pub fn apply_edit(&mut self, id: &str, draft: &RequestDraft) -> bool {
        self.patch(id, |request| {
            if let Some(date_from) = parse_wire_date(&draft.date_from) {
                request.date_from = date_from;
            }
            request.date_to = draft.date_to.as_deref().and_then(parse_wire_date);
            request.status = Status::Pending;
        })
    }
}

impl Directory<User> {
    /// Reconcile a successful account confirmation toggle.
    pub fn apply_confirmation(&mut self, id: &str, confirmed: bool) -> bool {
        self.patch(id, |user| user.is_confirmed = confirmed)
    }

    /// Reconcile a successful role update.
    pub fn apply_roles(&mut self, id: &str, roles: &[Role]) -> bool {
        self.patch(id, |user| user.roles = roles.to_vec())
    }

    /// Reconcile a successful group change.
    pub fn apply_group(&mut self, id: &str, group: &str) -> bool {
        self.patch(id, |user| user.group = Some(group.to_owned()))
    }
}
