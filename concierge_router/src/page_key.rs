use std::fmt;

use concierge_utils::{last_segment, split_path, strip_php_suffix};
use serde::{Deserialize, Serialize};

/// Canonical identifier of a navigable page, derived from its URL path.
///
/// Anything that is not one of the known site pages is kept verbatim in
/// [`PageKey::Other`] so that deny-list checks and logging still see it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageKey {
    /// The landing page (`/`, `/index.php`).
    Index,
    /// Grid of every room.
    RoomsGallery,
    /// Curated room showcase.
    RoomsShowcase,
    /// Detail page of a single room, selected by a slug in the query string.
    Room,
    /// Restaurant page.
    Restaurant,
    /// Events page.
    Events,
    /// Gym page.
    Gym,
    /// Conference page.
    Conference,
    /// Any other path segment.
    Other(String),
}

impl PageKey {
    /// Every page the site knows how to render as a fragment.
    pub const KNOWN: [PageKey; 8] = [
        PageKey::Index,
        PageKey::RoomsGallery,
        PageKey::RoomsShowcase,
        PageKey::Room,
        PageKey::Restaurant,
        PageKey::Events,
        PageKey::Gym,
        PageKey::Conference,
    ];

    /// Derive the page key of a URL path.
    ///
    /// The query string and fragment are ignored, the leading slash and a
    /// trailing `.php` are stripped, an empty path or `index` is the landing
    /// page, and otherwise the last path segment names the page.
    pub fn from_path(path: &str) -> Self {
        let (path, _, _) = split_path(path);
        let trimmed = strip_php_suffix(path.trim_start_matches('/'));

        if trimmed.is_empty() || trimmed == "index" {
            return PageKey::Index;
        }

        if trimmed == "room" {
            return PageKey::Room;
        }

        Self::from_segment(strip_php_suffix(last_segment(trimmed)))
    }

    /// Map a bare segment (`"rooms-gallery"`) to its key.
    pub fn from_segment(segment: &str) -> Self {
        match segment {
            "" | "index" => PageKey::Index,
            "rooms-gallery" => PageKey::RoomsGallery,
            "rooms-showcase" => PageKey::RoomsShowcase,
            "room" => PageKey::Room,
            "restaurant" => PageKey::Restaurant,
            "events" => PageKey::Events,
            "gym" => PageKey::Gym,
            "conference" => PageKey::Conference,
            other => PageKey::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PageKey::Index => "index",
            PageKey::RoomsGallery => "rooms-gallery",
            PageKey::RoomsShowcase => "rooms-showcase",
            PageKey::Room => "room",
            PageKey::Restaurant => "restaurant",
            PageKey::Events => "events",
            PageKey::Gym => "gym",
            PageKey::Conference => "conference",
            PageKey::Other(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PageKey::Other(_))
    }

    /// Whether a menu entry pointing at `self` should be highlighted while
    /// `current` is displayed. A single room highlights the gallery entry.
    pub fn highlights_for(&self, current: &PageKey) -> bool {
        self == current || (*self == PageKey::RoomsGallery && *current == PageKey::Room)
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PageKey {
    fn from(value: String) -> Self {
        PageKey::from_segment(&value)
    }
}

impl From<PageKey> for String {
    fn from(value: PageKey) -> Self {
        value.as_str().to_owned()
    }
}
