//! One-shot visibility reveals.

use std::rc::Rc;

use concierge::{Host, ObserveOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealOptions {
    /// Fraction of the element that must be visible.
    pub threshold: f64,
    pub root_margin: String,
    pub revealed_class: String,
}

impl Default for RevealOptions {
    fn default() -> Self {
        let observe = ObserveOptions::default();
        Self {
            threshold: observe.threshold,
            root_margin: observe.root_margin,
            revealed_class: "revealed".to_owned(),
        }
    }
}

impl RevealOptions {
    fn observe_options(&self) -> ObserveOptions {
        ObserveOptions {
            threshold: self.threshold,
            root_margin: self.root_margin.clone(),
        }
    }
}

/// Adds the revealed class to an element the first time it scrolls into
/// view, then stops watching it.
pub struct RevealEngine<H: Host> {
    host: Rc<H>,
    options: RevealOptions,
}

impl<H: Host> std::fmt::Debug for RevealEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealEngine")
            .field("options", &self.options)
            .finish()
    }
}

impl<H: Host> RevealEngine<H> {
    pub fn new(host: Rc<H>, options: RevealOptions) -> Self {
        Self { host, options }
    }

    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    pub fn observe(&self, node: &H::Node) {
        let host = Rc::downgrade(&self.host);
        let target = node.clone();
        let class = self.options.revealed_class.clone();

        self.host.observe_once(
            node,
            &self.options.observe_options(),
            Box::new(move || {
                if let Some(host) = host.upgrade() {
                    host.add_class(&target, &class);
                }
            }),
        );
    }

    pub fn reveal_now(&self, node: &H::Node) {
        self.host.add_class(node, &self.options.revealed_class);
    }

    pub fn is_revealed(&self, node: &H::Node) -> bool {
        self.host.has_class(node, &self.options.revealed_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge::Dom;
    use concierge::testing::TestHost;

    #[test]
    fn test_reveals_once_visible() {
        let host = Rc::new(TestHost::page(
            "https://hotel.test/",
            r#"<section id="rooms"></section>"#,
        ));
        let engine = RevealEngine::new(host.clone(), RevealOptions::default());
        let section = host.element_by_id("rooms").unwrap();

        engine.observe(&section);
        assert!(!engine.is_revealed(&section));
        assert_eq!(
            host.observe_options(section),
            Some(ObserveOptions {
                threshold: 0.1,
                root_margin: "0px 0px -50px 0px".to_owned(),
            })
        );

        assert!(host.reveal(section));
        assert!(engine.is_revealed(&section));

        // The observation is one-shot.
        assert!(!host.reveal(section));
        assert!(host.observed().is_empty());
    }

    #[test]
    fn test_custom_class() {
        let host = Rc::new(TestHost::page("https://hotel.test/", r#"<div id="card"></div>"#));
        let options = RevealOptions {
            revealed_class: "in-view".to_owned(),
            ..RevealOptions::default()
        };
        let engine = RevealEngine::new(host.clone(), options);
        let card = host.element_by_id("card").unwrap();

        engine.reveal_now(&card);
        assert!(host.has_class(&card, "in-view"));
        assert!(!host.has_class(&card, "revealed"));
    }
}
