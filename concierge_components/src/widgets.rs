//! Scroll-driven chrome: the shrinking header and the scroll-to-top button.
//!
//! Both look their element up again on every [`bind`](HeaderScrollEffect::bind)
//! and drop the listeners of the previous binding.

use std::cell::RefCell;
use std::rc::Rc;

use concierge::{Host, Listener, ScrollBehavior};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub header_selector: String,
    pub header_scrolled_class: String,
    pub header_threshold: f64,
    pub scroll_top_id: String,
    pub scroll_top_visible_class: String,
    pub scroll_top_threshold: f64,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            header_selector: "header".to_owned(),
            header_scrolled_class: "scrolled".to_owned(),
            header_threshold: 50.0,
            scroll_top_id: "scroll-to-top".to_owned(),
            scroll_top_visible_class: "visible".to_owned(),
            scroll_top_threshold: 400.0,
        }
    }
}

/// Toggles `class` on `node` whenever the page scrolls across `threshold`.
fn track_scroll<H: Host>(host: &Rc<H>, node: H::Node, class: String, threshold: f64) -> Listener {
    let apply: Rc<dyn Fn()> = {
        let host = Rc::downgrade(host);
        Rc::new(move || {
            if let Some(host) = host.upgrade() {
                host.toggle_class(&node, &class, host.scroll_y() > threshold);
            }
        })
    };

    apply();
    host.on_scroll(apply)
}

pub struct HeaderScrollEffect<H: Host> {
    host: Rc<H>,
    options: WidgetOptions,
    listener: RefCell<Option<Listener>>,
}

impl<H: Host> std::fmt::Debug for HeaderScrollEffect<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderScrollEffect")
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<H: Host> HeaderScrollEffect<H> {
    pub fn new(host: Rc<H>, options: WidgetOptions) -> Self {
        Self {
            host,
            options,
            listener: RefCell::new(None),
        }
    }

    /// Returns whether a header was found.
    pub fn bind(&self) -> bool {
        self.listener.borrow_mut().take();

        let Some(header) = self.host.query_selector(&self.options.header_selector) else {
            return false;
        };
        let listener = track_scroll(
            &self.host,
            header,
            self.options.header_scrolled_class.clone(),
            self.options.header_threshold,
        );
        *self.listener.borrow_mut() = Some(listener);
        true
    }

    pub fn is_bound(&self) -> bool {
        self.listener.borrow().is_some()
    }
}

pub struct ScrollToTopButton<H: Host> {
    host: Rc<H>,
    options: WidgetOptions,
    listeners: RefCell<Vec<Listener>>,
}

impl<H: Host> std::fmt::Debug for ScrollToTopButton<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollToTopButton")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<H: Host> ScrollToTopButton<H> {
    pub fn new(host: Rc<H>, options: WidgetOptions) -> Self {
        Self {
            host,
            options,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Returns whether the button was found.
    pub fn bind(&self) -> bool {
        self.listeners.borrow_mut().clear();

        let Some(button) = self.host.element_by_id(&self.options.scroll_top_id) else {
            return false;
        };

        let click = {
            let host = Rc::downgrade(&self.host);
            self.host.on_click(
                &button,
                Rc::new(move || {
                    if let Some(host) = host.upgrade() {
                        host.scroll_to_top(ScrollBehavior::Smooth);
                    }
                }),
            )
        };
        let scroll = track_scroll(
            &self.host,
            button,
            self.options.scroll_top_visible_class.clone(),
            self.options.scroll_top_threshold,
        );

        *self.listeners.borrow_mut() = vec![click, scroll];
        true
    }
}
