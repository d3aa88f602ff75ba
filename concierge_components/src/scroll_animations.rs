//! Registers `[data-animate]` elements with the reveal engine.
//!
//! Every scan is a fresh query of the live document. Bound elements carry a
//! marker attribute so repeated scans over the same DOM are no-ops, and
//! elements brought in by a swap are unmarked and get bound on the next scan.

use std::rc::Rc;

use concierge::{Host, Reinit};
use serde::{Deserialize, Serialize};

use crate::reveal::{RevealEngine, RevealOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollAnimationOptions {
    pub selector: String,
    pub bound_attribute: String,
    pub delay_attribute: String,
    /// Viewports narrower than this reveal everything immediately.
    pub mobile_breakpoint: f64,
    pub reveal: RevealOptions,
}

impl Default for ScrollAnimationOptions {
    fn default() -> Self {
        Self {
            selector: "[data-animate]".to_owned(),
            bound_attribute: "data-animate-bound".to_owned(),
            delay_attribute: "data-delay".to_owned(),
            mobile_breakpoint: 768.0,
            reveal: RevealOptions::default(),
        }
    }
}

pub struct ScrollAnimationRegistrar<H: Host> {
    host: Rc<H>,
    engine: RevealEngine<H>,
    options: ScrollAnimationOptions,
}

impl<H: Host> std::fmt::Debug for ScrollAnimationRegistrar<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollAnimationRegistrar")
            .field("options", &self.options)
            .finish()
    }
}

impl<H: Host> ScrollAnimationRegistrar<H> {
    pub fn new(host: Rc<H>, options: ScrollAnimationOptions) -> Self {
        let engine = RevealEngine::new(host.clone(), options.reveal.clone());
        Self {
            host,
            engine,
            options,
        }
    }

    pub fn engine(&self) -> &RevealEngine<H> {
        &self.engine
    }

    pub fn is_mobile(&self) -> bool {
        self.host.viewport_width() < self.options.mobile_breakpoint
    }

    /// Bind every animated element not bound yet. Returns how many were
    /// bound by this call.
    pub fn scan(&self) -> usize {
        let mobile = self.is_mobile();
        let mut bound = 0;

        for node in self.host.query_selector_all(&self.options.selector) {
            if self.host.has_attribute(&node, &self.options.bound_attribute) {
                continue;
            }
            self.host.set_attribute(&node, &self.options.bound_attribute, "");

            if let Some(delay) = self.delay_of(&node) {
                self.host
                    .set_style(&node, "transition-delay", &format!("{delay}ms"));
            }

            if mobile {
                self.engine.reveal_now(&node);
            } else {
                self.engine.observe(&node);
            }
            bound += 1;
        }

        concierge::debug_log!("scroll animations: bound {} element(s), mobile: {}", bound, mobile);
        bound
    }

    fn delay_of(&self, node: &H::Node) -> Option<u32> {
        let raw = self.host.attribute(node, &self.options.delay_attribute)?;
        match raw.trim().trim_end_matches("ms").parse::<u32>() {
            Ok(delay) => Some(delay),
            Err(_) => {
                concierge::warn_log!("ignoring {}={:?}", self.options.delay_attribute, raw);
                None
            }
        }
    }
}

impl<H: Host> Reinit for ScrollAnimationRegistrar<H> {
    fn name(&self) -> &str {
        "scroll-animations"
    }

    fn reinit(&self) {
        self.scan();
    }
}
