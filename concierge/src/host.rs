//! Everything the router and its components need from the browser.
//!
//! The core never touches `web_sys` directly; it is generic over [`Host`].
//! `crate::web::WebHost` implements it for wasm32 and
//! `crate::testing::TestHost` implements it in memory.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use concierge_router::{Fragment, FragmentError, HistoryEntry};
use futures_util::future::LocalBoxFuture;

/// A future that may hold `Rc`s and must be driven on the page's event loop.
pub type LocalFuture<T> = LocalBoxFuture<'static, T>;

/// Detaches an event listener when dropped.
#[must_use = "dropping a Listener detaches it immediately"]
pub struct Listener {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Listener {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A listener that was never attached.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    /// Keep the listener attached for the lifetime of the page. The detach
    /// handle may own the callback itself, so it is leaked rather than dropped.
    pub fn forget(mut self) {
        if let Some(detach) = self.detach.take() {
            let _ = Box::leak(detach);
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Options of a one-shot visibility observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserveOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_owned(),
        }
    }
}

/// Document access. `Node` is a cheap handle to an element.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn body(&self) -> Option<Self::Node>;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn query_selector(&self, selector: &str) -> Option<Self::Node> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Lower-case tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    );
    fn replace_node(&self, old: &Self::Node, new: &Self::Node);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);

    fn toggle_class(&self, node: &Self::Node, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn inner_html(&self, node: &Self::Node) -> String;
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);

    /// `complete && naturalWidth > 0` for an image element.
    fn image_ready(&self, node: &Self::Node) -> bool;

    /// Resolves on the image's next `load` or `error` event.
    fn image_settled(&self, node: &Self::Node) -> LocalFuture<()>;

    /// Resolves on the node's next `transitionend` event.
    fn transition_end(&self, node: &Self::Node) -> LocalFuture<()>;

    /// Call `on_visible` once, the first time the node enters the viewport,
    /// then stop observing it.
    fn observe_once(
        &self,
        node: &Self::Node,
        options: &ObserveOptions,
        on_visible: Box<dyn FnOnce()>,
    );

    fn on_click(&self, node: &Self::Node, handler: Rc<dyn Fn()>) -> Listener;
}

/// Window, location and history access.
pub trait Window {
    fn href(&self) -> String;
    fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str);
    fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str);

    /// Full browser navigation.
    fn assign(&self, url: &str);
    fn reload(&self);

    fn scroll_to_top(&self, behavior: ScrollBehavior);
    fn scroll_y(&self) -> f64;
    fn viewport_width(&self) -> f64;

    fn title(&self) -> String;
    fn set_title(&self, title: &str);

    fn on_scroll(&self, handler: Rc<dyn Fn()>) -> Listener;

    /// Document-level `keydown`; the handler receives `KeyboardEvent.key`.
    fn on_key(&self, handler: Rc<dyn Fn(&str)>) -> Listener;
}

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalFuture<()>;

    /// Run a detached task on the page's event loop.
    fn spawn(&self, task: LocalFuture<()>);
}

pub trait FragmentSource {
    fn fetch_fragment(&self, url: &str) -> LocalFuture<Result<Fragment, FragmentError>>;
}

pub trait Host: Dom + Window + Timer + FragmentSource + 'static {}

impl<T> Host for T where T: Dom + Window + Timer + FragmentSource + 'static {}
