//! The content-fragment contract shared by the client router and the server.
//!
//! Request: `GET <endpoint>?page=<PageKey>[&slug=<string>]`.
//! Response: `{ "html": string, "title"?: string, "error"?: string }`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PageKey, SpaTarget};

/// A page body ready to be injected between the persistent header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Every way a fragment fetch can fail. All of them end in a hard navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("fragment endpoint answered with status {status}")]
    Http { status: u16 },
    #[error("fragment endpoint reported an error: {0}")]
    Server(String),
    #[error("fragment payload has no html")]
    MissingHtml,
    #[error("fragment payload could not be decoded: {0}")]
    Decode(String),
    #[error("fragment request failed: {0}")]
    Transport(String),
}

/// The payload exactly as it arrives on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentPayload {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FragmentPayload {
    /// Validate a raw response. Non-2xx, undecodable JSON, an `error` field
    /// or a missing `html` field are all failures.
    pub fn parse(status: u16, body: &str) -> Result<Fragment, FragmentError> {
        if !(200..300).contains(&status) {
            return Err(FragmentError::Http { status });
        }

        let payload: FragmentPayload =
            serde_json::from_str(body).map_err(|e| FragmentError::Decode(e.to_string()))?;

        payload.into_fragment()
    }

    pub fn into_fragment(self) -> Result<Fragment, FragmentError> {
        if let Some(error) = self.error {
            return Err(FragmentError::Server(error));
        }

        let html = self.html.ok_or(FragmentError::MissingHtml)?;

        Ok(Fragment {
            html,
            title: self.title.filter(|title| !title.is_empty()),
        })
    }
}

/// Build the endpoint URL for a navigation target. The `room` page also
/// forwards the slug found under `slug_param` in the target's query string.
pub fn fragment_url(endpoint: &str, target: &SpaTarget, slug_param: &str) -> String {
    let mut url = format!(
        "{endpoint}?page={}",
        urlencoding::encode(target.page.as_str())
    );

    if target.page == PageKey::Room {
        let slug = target
            .url
            .query_pairs()
            .find(|(key, _)| key == slug_param)
            .map(|(_, value)| value.into_owned());

        if let Some(slug) = slug.filter(|slug| !slug.is_empty()) {
            url.push_str("&slug=");
            url.push_str(&urlencoding::encode(&slug));
        }
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn target(href: &str) -> SpaTarget {
        let url = Url::parse(href).unwrap();
        let page = PageKey::from_path(url.path());
        SpaTarget { url, page }
    }

    #[test]
    fn test_fragment_url() {
        assert_eq!(
            fragment_url("/api/content.php", &target("https://h.test/gym.php"), "room"),
            "/api/content.php?page=gym"
        );
        assert_eq!(
            fragment_url(
                "/api/content.php",
                &target("https://h.test/room.php?room=deluxe%20suite&x=1"),
                "room"
            ),
            "/api/content.php?page=room&slug=deluxe%20suite"
        );
        assert_eq!(
            fragment_url("/api/content.php", &target("https://h.test/room.php"), "room"),
            "/api/content.php?page=room"
        );
        assert_eq!(
            fragment_url("/api/content.php", &target("https://h.test/gym.php?room=x"), "room"),
            "/api/content.php?page=gym"
        );
    }

    #[test]
    fn test_payload_validation() {
        assert_eq!(
            FragmentPayload::parse(200, r#"{"html":"<p>hi</p>","title":"Gym"}"#),
            Ok(Fragment::new("<p>hi</p>").with_title("Gym"))
        );
        assert_eq!(
            FragmentPayload::parse(200, r#"{"html":"<p>hi</p>"}"#),
            Ok(Fragment::new("<p>hi</p>"))
        );
        assert_eq!(
            FragmentPayload::parse(500, r#"{"html":"<p>hi</p>"}"#),
            Err(FragmentError::Http { status: 500 })
        );
        assert_eq!(
            FragmentPayload::parse(200, r#"{"title":"Gym"}"#),
            Err(FragmentError::MissingHtml)
        );
        assert_eq!(
            FragmentPayload::parse(200, r#"{"html":"x","error":"boom"}"#),
            Err(FragmentError::Server("boom".to_owned()))
        );
        assert!(matches!(
            FragmentPayload::parse(200, "<html>"),
            Err(FragmentError::Decode(_))
        ));
    }
}
