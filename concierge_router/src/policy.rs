use serde::{Deserialize, Serialize};
use url::Url;

use crate::PageKey;

/// The facts about an anchor that decide whether it is handled in-page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCandidate<'a> {
    /// Raw `href` attribute, before resolution.
    pub href: &'a str,
    pub target: Option<&'a str>,
    pub download: bool,
    pub opted_out: bool,
}

impl<'a> LinkCandidate<'a> {
    pub fn new(href: &'a str) -> Self {
        Self {
            href,
            ..Self::default()
        }
    }
}

/// A navigation the router is allowed to perform without a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaTarget {
    pub url: Url,
    pub page: PageKey,
}

/// Why a link was left to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    FragmentOnly,
    /// An anchor into the document already shown.
    SamePageAnchor,
    Scheme(String),
    Unresolvable,
    CrossOrigin,
    Target(String),
    Download,
    OptedOut,
    Admin,
    Denied(String),
    NotAllowed(PageKey),
}

/// Which pages may be swapped in-place.
///
/// Deny-list entries are matched as substrings of both the page key and the
/// lower-cased path and always win over the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaPolicy {
    pub allow: Vec<PageKey>,
    pub deny: Vec<String>,
    pub admin_segment: String,
    pub opt_out_attribute: String,
}

impl Default for SpaPolicy {
    fn default() -> Self {
        Self {
            allow: PageKey::KNOWN.to_vec(),
            deny: ["admin", "booking", "checkout", "payment", "login", "logout", "account"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            admin_segment: "admin".to_owned(),
            opt_out_attribute: "data-no-spa".to_owned(),
        }
    }
}

const IGNORED_SCHEMES: [&str; 3] = ["javascript:", "mailto:", "tel:"];

impl SpaPolicy {
    /// Decide whether a clicked link is handled in-page, resolving its
    /// `href` against the current document URL.
    pub fn evaluate(
        &self,
        link: &LinkCandidate<'_>,
        current: &Url,
    ) -> Result<SpaTarget, Rejection> {
        let href = link.href.trim();

        if href.is_empty() {
            return Err(Rejection::Empty);
        }

        if href.starts_with('#') {
            return Err(Rejection::FragmentOnly);
        }

        let lowered = href.to_ascii_lowercase();
        if let Some(scheme) = IGNORED_SCHEMES.iter().find(|s| lowered.starts_with(**s)) {
            return Err(Rejection::Scheme((*scheme).to_owned()));
        }

        if let Some(target) = link.target {
            let target = target.trim().to_ascii_lowercase();
            if target == "_blank" || target == "_parent" {
                return Err(Rejection::Target(target));
            }
        }

        if link.download {
            return Err(Rejection::Download);
        }

        if link.opted_out {
            return Err(Rejection::OptedOut);
        }

        let url = current.join(href).map_err(|_| Rejection::Unresolvable)?;

        if url.fragment().is_some()
            && url.origin() == current.origin()
            && url.path() == current.path()
            && url.query() == current.query()
        {
            return Err(Rejection::SamePageAnchor);
        }

        self.classify(url, current)
    }

    /// Apply the origin, admin and list checks to an already resolved URL.
    /// Used directly for history traversal, where there is no anchor.
    pub fn classify(&self, url: Url, current: &Url) -> Result<SpaTarget, Rejection> {
        if url.origin() != current.origin() {
            return Err(Rejection::CrossOrigin);
        }

        let path = url.path().to_ascii_lowercase();

        if !self.admin_segment.is_empty()
            && path.split('/').any(|segment| segment == self.admin_segment)
        {
            return Err(Rejection::Admin);
        }

        // Case-folding is only for the deny and admin checks: the page key
        // must match what `PageKey::from_path` gives for the same URL on load.
        let page = PageKey::from_path(url.path());

        if let Some(denied) = self
            .deny
            .iter()
            .filter(|entry| !entry.is_empty())
            .find(|entry| page.as_str().contains(entry.as_str()) || path.contains(entry.as_str()))
        {
            return Err(Rejection::Denied(denied.clone()));
        }

        if !self.allow.contains(&page) {
            return Err(Rejection::NotAllowed(page));
        }

        Ok(SpaTarget { url, page })
    }

    pub fn is_eligible(&self, link: &LinkCandidate<'_>, current: &Url) -> bool {
        self.evaluate(link, current).is_ok()
    }
}
