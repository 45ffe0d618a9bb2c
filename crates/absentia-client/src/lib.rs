//! Portal client SDK for the absence-request service.
//!
//! Students submit leave requests with attached documents, teachers browse
//! their groups, deans review and decide. This crate wraps the remote REST
//! API in a typed client, derives the allowed actions from the session's
//! capability set, and keeps a paginated in-memory directory consistent
//! with mutation results without refetching.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use absentia_client::{Directory, PortalClient, RequestFilter};
//!
//! #[tokio::main]
//! async fn main() -> absentia_client::Result<()> {
//!     let portal = PortalClient::sign_in("s.ivanov", "secret123", None).await?;
//!
//!     let mut requests = Directory::new();
//!     portal.load_requests(&mut requests, &RequestFilter::new()).await?;
//!     for request in requests.items() {
//!         println!("{} {:?}", request.id, request.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod directory;
pub mod error;
pub mod filters;
pub mod portal;
pub mod rest;
pub mod session;

pub use api::PortalApi;
pub use directory::{Directory, FetchToken, Keyed, Page, Phase};
pub use error::{Error, Result};
pub use filters::{DEFAULT_PAGE_SIZE, RequestFilter, SortOrder, UserFilter};
pub use portal::{
    AttachmentDownload, EXPORT_FILE_NAME, PortalClient, SpreadsheetExport, attachment_downloads,
    default_export_range,
};
pub use rest::RestClient;
pub use session::SessionContext;
