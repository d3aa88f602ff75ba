//! Routing rules of the hotel site, independent of any browser.
//!
//! Which URLs map to which page, which links may be swapped in-page, what the
//! content-fragment endpoint is asked and what it must answer.

pub use url::Url;

pub mod admin;
mod fragment;
mod page_key;
mod policy;
mod server_router;

pub use fragment::{Fragment, FragmentError, FragmentPayload, fragment_url};
pub use page_key::PageKey;
pub use policy::{LinkCandidate, Rejection, SpaPolicy, SpaTarget};
pub use server_router::{FragmentHandler, FragmentQuery, FragmentResponse, FragmentServer};

/// History state attached to every entry the router pushes or replaces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub page: PageKey,
}

impl HistoryEntry {
    pub fn new(page: PageKey) -> Self {
        Self { page }
    }
}
