use std::rc::Rc;

use crate::host::Host;

/// The full-page loading overlay. Purely presentational; a missing overlay
/// element makes every call a no-op.
pub struct LoaderIndicator<H: Host> {
    host: Rc<H>,
    selector: String,
    active_class: String,
}

impl<H: Host> std::fmt::Debug for LoaderIndicator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderIndicator")
            .field("selector", &self.selector)
            .field("active_class", &self.active_class)
            .finish()
    }
}

impl<H: Host> LoaderIndicator<H> {
    pub fn new(host: Rc<H>, selector: impl Into<String>, active_class: impl Into<String>) -> Self {
        Self {
            host,
            selector: selector.into(),
            active_class: active_class.into(),
        }
    }

    pub fn show(&self) {
        if let Some(loader) = self.host.query_selector(&self.selector) {
            self.host.add_class(&loader, &self.active_class);
        }
    }

    pub fn hide(&self) {
        if let Some(loader) = self.host.query_selector(&self.selector) {
            self.host.remove_class(&loader, &self.active_class);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.host
            .query_selector(&self.selector)
            .is_some_and(|loader| self.host.has_class(&loader, &self.active_class))
    }
}
