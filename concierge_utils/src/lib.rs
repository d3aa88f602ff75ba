#![allow(missing_docs)]

use std::cell::Cell;

/// Monotonic counter scoped to one owner (one router, one tab).
///
/// Each navigation takes a ticket with [`Sequence::next`]; a late result
/// compares its ticket with [`Sequence::is_latest`] before touching the page.
#[derive(Debug, Default)]
pub struct Sequence {
    last: Cell<u64>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let next = self.last.get() + 1;
        self.last.set(next);
        next
    }

    pub fn current(&self) -> u64 {
        self.last.get()
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.last.get() == ticket
    }

    pub fn reset(&self, value: Option<u64>) {
        self.last.set(value.unwrap_or(0));
    }
}

/// Split `path?query#fragment` into its three parts.
pub fn split_path(href: &str) -> (&str, &str, &str) {
    let (rest, fragment) = match href.find('#') {
        Some(pos) => (&href[..pos], &href[pos + 1..]),
        None => (href, ""),
    };

    match rest.find('?') {
        Some(pos) => (&rest[..pos], &rest[pos + 1..], fragment),
        None => (rest, "", fragment),
    }
}

/// First raw value of `name` in a query string (no leading `?`).
pub fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
}

pub fn strip_php_suffix(segment: &str) -> &str {
    segment.strip_suffix(".php").unwrap_or(segment)
}

pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_tickets() {
        let seq = Sequence::new();
        let first = seq.next();
        let second = seq.next();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));

        seq.reset(None);
        assert_eq!(seq.current(), 0);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/room.php?room=a#top"), ("/room.php", "room=a", "top"));
        assert_eq!(split_path("/gym.php"), ("/gym.php", "", ""));
        assert_eq!(split_path("/#only"), ("/", "", "only"));
        assert_eq!(split_path("/x?y"), ("/x", "y", ""));
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("room=deluxe-suite&x=1", "room"), Some("deluxe-suite"));
        assert_eq!(query_param("?x=1&room=b", "room"), Some("b"));
        assert_eq!(query_param("flag&room", "room"), Some(""));
        assert_eq!(query_param("x=1", "room"), None);
        assert_eq!(query_param("", "room"), None);
    }

    #[test]
    fn test_segments() {
        assert_eq!(strip_php_suffix("gym.php"), "gym");
        assert_eq!(strip_php_suffix("gym"), "gym");
        assert_eq!(last_segment("a/b/c"), "c");
        assert_eq!(last_segment("a/b/"), "b");
        assert_eq!(last_segment(""), "");
    }
}
