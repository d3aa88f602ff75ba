//! Stack-based overlay dialogs.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use concierge::{Host, Listener, Reinit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalOptions {
    pub active_class: String,
    /// Put on `<body>` while any modal is open.
    pub scroll_lock_class: String,
    pub open_attribute: String,
    pub close_attribute: String,
    pub close_key: String,
    pub system_modal_id: String,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            active_class: "active".to_owned(),
            scroll_lock_class: "modal-open".to_owned(),
            open_attribute: "data-modal-open".to_owned(),
            close_attribute: "data-modal-close".to_owned(),
            close_key: "Escape".to_owned(),
            system_modal_id: "system-message-modal".to_owned(),
        }
    }
}

/// Opens and closes modals by element id.
///
/// The last modal opened is the first closed by the close key. Trigger
/// buttons are re-queried on every [`Reinit::reinit`], and stack entries
/// whose element was swapped out are dropped at the same time.
pub struct ModalController<H: Host> {
    host: Rc<H>,
    options: ModalOptions,
    stack: RefCell<Vec<String>>,
    triggers: RefCell<Vec<Listener>>,
    this: Weak<Self>,
    _key: Listener,
}

impl<H: Host> std::fmt::Debug for ModalController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalController")
            .field("stack", &self.stack.borrow())
            .field("triggers", &self.triggers.borrow().len())
            .finish()
    }
}

impl<H: Host> ModalController<H> {
    pub fn new(host: Rc<H>, options: ModalOptions) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let key = {
                let this = this.clone();
                let close_key = options.close_key.clone();
                host.on_key(Rc::new(move |key: &str| {
                    if key == close_key
                        && let Some(this) = this.upgrade()
                    {
                        this.close_top();
                    }
                }))
            };

            Self {
                host,
                options,
                stack: RefCell::new(Vec::new()),
                triggers: RefCell::new(Vec::new()),
                this: this.clone(),
                _key: key,
            }
        })
    }

    /// Open the modal with element id `id`, moving it to the top of the
    /// stack if it was already open.
    pub fn open(&self, id: &str) -> bool {
        let Some(modal) = self.host.element_by_id(id) else {
            concierge::warn_log!("no modal with id {:?}", id);
            return false;
        };

        {
            let mut stack = self.stack.borrow_mut();
            stack.retain(|open| open != id);
            stack.push(id.to_owned());
        }

        self.host.add_class(&modal, &self.options.active_class);
        if let Some(body) = self.host.body() {
            self.host.add_class(&body, &self.options.scroll_lock_class);
        }
        true
    }

    /// Returns whether `id` was open.
    pub fn close(&self, id: &str) -> bool {
        let was_open = {
            let mut stack = self.stack.borrow_mut();
            let before = stack.len();
            stack.retain(|open| open != id);
            stack.len() != before
        };

        if let Some(modal) = self.host.element_by_id(id) {
            self.host.remove_class(&modal, &self.options.active_class);
        }
        self.release_lock_if_idle();
        was_open
    }

    pub fn close_top(&self) -> Option<String> {
        let top = self.stack.borrow().last().cloned()?;
        self.close(&top);
        Some(top)
    }

    pub fn close_all(&self) {
        while self.close_top().is_some() {}
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.stack.borrow().iter().any(|open| open == id)
    }

    /// Open modal ids, oldest first.
    pub fn open_modals(&self) -> Vec<String> {
        self.stack.borrow().clone()
    }

    /// Show `message` in the shared system message modal, building it on
    /// first use.
    pub fn show_message(&self, title: &str, message: &str) -> bool {
        let Some(modal) = self.system_modal() else {
            return false;
        };

        if let Some(heading) = self.host.query_within(&modal, ".modal-title").first() {
            self.host.set_text(heading, title);
        }
        if let Some(body) = self.host.query_within(&modal, ".modal-message").first() {
            self.host.set_text(body, message);
        }

        self.open(&self.options.system_modal_id)
    }

    fn system_modal(&self) -> Option<H::Node> {
        let id = &self.options.system_modal_id;
        if let Some(modal) = self.host.element_by_id(id) {
            return Some(modal);
        }

        let body = self.host.body()?;
        let modal = self.host.create_element("div")?;
        self.host.set_attribute(&modal, "id", id);
        self.host.set_attribute(&modal, "class", "modal");
        self.host.set_attribute(&modal, "role", "dialog");
        self.host.set_attribute(&modal, "aria-modal", "true");
        self.host.set_inner_html(
            &modal,
            &format!(
                concat!(
                    r#"<div class="modal-content">"#,
                    r#"<button type="button" class="modal-close" {}="{}" aria-label="Close">×</button>"#,
                    r#"<h3 class="modal-title"></h3>"#,
                    r#"<p class="modal-message"></p>"#,
                    r#"</div>"#,
                ),
                self.options.close_attribute, id
            ),
        );
        self.host.append_child(&body, &modal);

        concierge::debug_log!("built #{}", id);
        self.bind_triggers();
        Some(modal)
    }

    fn release_lock_if_idle(&self) {
        if self.stack.borrow().is_empty()
            && let Some(body) = self.host.body()
        {
            self.host.remove_class(&body, &self.options.scroll_lock_class);
        }
    }

    /// Forget modals whose element left the document.
    fn prune(&self) {
        let host = &self.host;
        self.stack.borrow_mut().retain(|id| {
            host.element_by_id(id)
                .is_some_and(|modal| host.is_connected(&modal))
        });
        self.release_lock_if_idle();
    }

    fn bind_triggers(&self) {
        let mut listeners = Vec::new();

        for trigger in self.host.query_selector_all(&format!("[{}]", self.options.open_attribute)) {
            let Some(id) = self.host.attribute(&trigger, &self.options.open_attribute) else {
                continue;
            };
            let this = self.weak();
            listeners.push(self.host.on_click(
                &trigger,
                Rc::new(move || {
                    if let Some(this) = this.upgrade() {
                        this.open(&id);
                    }
                }),
            ));
        }

        let close_selector = format!("[{}]", self.options.close_attribute);
        for trigger in self.host.query_selector_all(&close_selector) {
            let id = self
                .host
                .attribute(&trigger, &self.options.close_attribute)
                .filter(|id| !id.is_empty());
            let this = self.weak();
            listeners.push(self.host.on_click(
                &trigger,
                Rc::new(move || {
                    let Some(this) = this.upgrade() else {
                        return;
                    };
                    match &id {
                        Some(id) => {
                            this.close(id);
                        }
                        None => {
                            this.close_top();
                        }
                    }
                }),
            ));
        }

        // Replacing the vector drops and detaches the previous listeners.
        *self.triggers.borrow_mut() = listeners;
    }

    fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }
}

impl<H: Host> Reinit for ModalController<H> {
    fn name(&self) -> &str {
        "modals"
    }

    fn reinit(&self) {
        self.prune();
        self.bind_triggers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge::Dom;
    use concierge::testing::TestHost;

    const PAGE: &str = concat!(
        r#"<button id="book" data-modal-open="booking-modal">Book</button>"#,
        r#"<div id="booking-modal" class="modal">"#,
        r#"<button id="book-close" data-modal-close="booking-modal">Close</button>"#,
        r#"<button id="terms" data-modal-open="terms-modal">Terms</button>"#,
        r#"</div>"#,
        r#"<div id="terms-modal" class="modal"><button id="terms-close" data-modal-close>Close</button></div>"#,
    );

    fn controller() -> (Rc<TestHost>, Rc<ModalController<TestHost>>) {
        let host = Rc::new(TestHost::page("https://hotel.test/", PAGE));
        let modals = ModalController::new(host.clone(), ModalOptions::default());
        modals.reinit();
        (host, modals)
    }

    fn locked(host: &TestHost) -> bool {
        host.has_class(&host.body().unwrap(), "modal-open")
    }

    #[test]
    fn test_scroll_lock_released_when_stack_empties() {
        let (host, modals) = controller();

        assert!(modals.open("booking-modal"));
        assert!(modals.open("terms-modal"));
        assert_eq!(modals.open_modals(), vec!["booking-modal", "terms-modal"]);
        assert!(locked(&host));

        assert!(modals.close("booking-modal"));
        assert!(locked(&host));
        assert!(!host.has_class(&host.element_by_id("booking-modal").unwrap(), "active"));

        assert!(modals.close("terms-modal"));
        assert!(!locked(&host));
        assert!(!modals.close("terms-modal"));
    }

    #[test]
    fn test_escape_closes_last_opened() {
        let (host, modals) = controller();
        modals.open("booking-modal");
        modals.open("terms-modal");

        host.press_key("Enter");
        assert_eq!(modals.open_modals().len(), 2);

        host.press_key("Escape");
        assert_eq!(modals.open_modals(), vec!["booking-modal"]);

        host.press_key("Escape");
        assert!(modals.open_modals().is_empty());
        assert!(!locked(&host));
    }

    #[test]
    fn test_unknown_modal_is_not_opened() {
        let (host, modals) = controller();

        assert!(!modals.open("missing"));
        assert!(modals.open_modals().is_empty());
        assert!(!locked(&host));
    }

    #[test]
    fn test_triggers() {
        let (host, modals) = controller();

        host.click(host.element_by_id("book").unwrap());
        assert!(modals.is_open("booking-modal"));

        host.click(host.element_by_id("terms").unwrap());
        assert!(modals.is_open("terms-modal"));

        // A close trigger without a value closes the top modal.
        host.click(host.element_by_id("terms-close").unwrap());
        assert_eq!(modals.open_modals(), vec!["booking-modal"]);

        host.click(host.element_by_id("book-close").unwrap());
        assert!(modals.open_modals().is_empty());
    }

    #[test]
    fn test_reinit_does_not_duplicate_triggers() {
        let (host, modals) = controller();
        let listeners = host.click_listeners();

        modals.reinit();
        modals.reinit();

        assert_eq!(host.click_listeners(), listeners);
        assert_eq!(host.click(host.element_by_id("book").unwrap()), 1);
    }

    #[test]
    fn test_reinit_prunes_swapped_out_modals() {
        let (host, modals) = controller();
        modals.open("booking-modal");

        let body = host.body().unwrap();
        host.set_inner_html(&body, r#"<p>Gym</p>"#);
        modals.reinit();

        assert!(modals.open_modals().is_empty());
        assert!(!locked(&host));
        assert_eq!(host.click_listeners(), 0);
    }

    #[test]
    fn test_system_message_modal_is_built_once() {
        let (host, modals) = controller();

        assert!(modals.show_message("Booking", "Your room is reserved."));
        assert!(modals.is_open("system-message-modal"));
        modals.close_top();

        assert!(modals.show_message("Payment", "Card declined."));
        assert_eq!(host.query_selector_all("#system-message-modal").len(), 1);

        let modal = host.element_by_id("system-message-modal").unwrap();
        assert!(host.has_class(&modal, "active"));
        let title = host.query_within(&modal, ".modal-title")[0];
        let message = host.query_within(&modal, ".modal-message")[0];
        assert_eq!(host.text(&title), "Payment");
        assert_eq!(host.text(&message), "Card declined.");

        let close = host.query_within(&modal, ".modal-close")[0];
        host.click(close);
        assert!(!modals.is_open("system-message-modal"));
        assert!(!locked(&host));
    }
}
