//! Server-side registry behind the content-fragment endpoint.
//!
//! Page renderers are registered per [`PageKey`] and stored in a matchit
//! router under `/{page}`. A request's query string is parsed, the matching
//! renderer runs, and the answer is serialized in the wire shape the client
//! router expects.

use matchit::Router;
use std::{future::Future, pin::Pin};

use concierge_utils::query_param;

use crate::{Fragment, PageKey};

/// Type alias for fragment renderers.
///
/// A renderer receives the parsed query and resolves to the fragment, or to
/// `None` when there is nothing to show (unknown slug, unpublished page).
pub type FragmentHandler = Box<
    dyn Fn(FragmentQuery) -> Pin<Box<dyn Future<Output = Option<Fragment>> + Send>>
        + Send
        + Sync,
>;

/// Parsed `page`/`slug` query of a fragment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentQuery {
    pub page: PageKey,
    pub slug: Option<String>,
}

impl FragmentQuery {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Option<Self> {
        let page = query_param(query, "page").map(decode)?;

        if page.is_empty() {
            return None;
        }

        let slug = query_param(query, "slug")
            .map(decode)
            .filter(|slug| !slug.is_empty());

        Some(Self {
            page: PageKey::from_segment(&page),
            slug,
        })
    }
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(value)
}

/// Status code and JSON body to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentResponse {
    pub status: u16,
    pub body: String,
}

impl FragmentResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

pub struct FragmentServer {
    router: Router<FragmentHandler>,
}

impl std::fmt::Debug for FragmentServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentServer")
            .field("router", &"<Router<FragmentHandler>>")
            .finish()
    }
}

impl Default for FragmentServer {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentServer {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Register the renderer of one page.
    ///
    /// # Panics
    ///
    /// Panics if the page was already registered.
    pub fn page<F, Fut>(mut self, page: PageKey, handler: F) -> Self
    where
        F: Fn(FragmentQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Fragment>> + Send + 'static,
    {
        let boxed: FragmentHandler = Box::new(move |query| Box::pin(handler(query)));
        let path = format!("/{page}");

        if let Err(e) = self.router.insert(path, boxed) {
            panic!("Failed to register fragment page '{page}': {e}");
        }

        self
    }

    pub fn has_page(&self, page: &PageKey) -> bool {
        self.router.at(&format!("/{page}")).is_ok()
    }

    /// Answer one request given its raw query string.
    pub async fn handle_query(&self, query: &str) -> FragmentResponse {
        let Some(query) = FragmentQuery::parse(query) else {
            return FragmentResponse::error(400, "missing page parameter");
        };

        let path = format!("/{}", query.page);

        let Ok(matched) = self.router.at(&path) else {
            return FragmentResponse::error(404, "unknown page");
        };

        let page = query.page.clone();

        match (matched.value)(query).await {
            Some(fragment) => match serde_json::to_string(&fragment) {
                Ok(body) => FragmentResponse { status: 200, body },
                Err(_) => FragmentResponse::error(500, "could not encode fragment"),
            },
            None => FragmentResponse::error(404, &format!("no content for page {page}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_query_parse() {
        assert_eq!(
            FragmentQuery::parse("page=room&slug=deluxe%20suite"),
            Some(FragmentQuery {
                page: PageKey::Room,
                slug: Some("deluxe suite".to_owned()),
            })
        );
        assert_eq!(
            FragmentQuery::parse("page=gym&slug="),
            Some(FragmentQuery {
                page: PageKey::Gym,
                slug: None,
            })
        );
        assert_eq!(FragmentQuery::parse("slug=x"), None);
        assert_eq!(FragmentQuery::parse("page="), None);
    }
}
