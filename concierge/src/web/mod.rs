//! [`Host`](crate::host::Host) over the real browser. Only compiled for
//! wasm32.

mod bootstrap;
mod listeners;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use concierge_router::{Fragment, FragmentError, FragmentPayload, HistoryEntry};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AddEventListenerOptions, Element, EventTarget, HtmlElement, HtmlImageElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, NodeList,
    ScrollToOptions, TransitionEvent,
};

use crate::host::{
    Dom, FragmentSource, Listener, LocalFuture, ObserveOptions, ScrollBehavior, Timer, Window,
};

pub use bootstrap::{config_from_window, config_value_from_window};
pub use listeners::install;

type Pending = Rc<RefCell<Vec<(Element, Box<dyn FnOnce()>)>>>;

/// One `IntersectionObserver` per distinct set of options, shared by every
/// element observed with them.
struct SharedObserver {
    options: ObserveOptions,
    observer: IntersectionObserver,
    pending: Pending,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl std::fmt::Debug for SharedObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedObserver")
            .field("options", &self.options)
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl SharedObserver {
    fn new(options: &ObserveOptions) -> Option<Self> {
        let pending: Pending = Rc::new(RefCell::new(Vec::new()));

        let callback = {
            let pending = pending.clone();
            Closure::wrap(Box::new(
                move |entries: js_sys::Array, observer: IntersectionObserver| {
                    for entry in entries.iter() {
                        let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                            continue;
                        };
                        if !entry.is_intersecting() {
                            continue;
                        }

                        let target = entry.target();
                        observer.unobserve(&target);

                        let ready = {
                            let mut pending = pending.borrow_mut();
                            pending
                                .iter()
                                .position(|(node, _)| *node == target)
                                .map(|index| pending.remove(index).1)
                        };
                        if let Some(on_visible) = ready {
                            on_visible();
                        }
                    }
                },
            ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>)
        };

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init).ok()?;

        Some(Self {
            options: options.clone(),
            observer,
            pending,
            _callback: callback,
        })
    }

    /// Stop watching elements that left the document before they were seen.
    fn prune(&self) {
        self.pending.borrow_mut().retain(|(node, _)| {
            if node.is_connected() {
                return true;
            }
            self.observer.unobserve(node);
            false
        });
    }

    fn observe(&self, node: &Element, on_visible: Box<dyn FnOnce()>) {
        self.prune();
        self.pending.borrow_mut().push((node.clone(), on_visible));
        self.observer.observe(node);
    }
}

/// The browser window and its document.
#[derive(Debug, Clone)]
pub struct WebHost {
    window: web_sys::Window,
    document: web_sys::Document,
    observers: Rc<RefCell<Vec<SharedObserver>>>,
}

impl WebHost {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No global window object")?;
        let document = window.document().ok_or("No document object")?;
        Ok(Self {
            window,
            document,
            observers: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// Elements registered with [`Dom::observe_once`] that have not been seen
    /// yet and are still in the document.
    pub fn pending_observations(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .map(|shared| {
                shared.prune();
                shared.pending.borrow().len()
            })
            .sum()
    }

    pub fn window(&self) -> &web_sys::Window {
        &self.window
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };

    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Resolves on the first of `events` fired at `target`. The listeners are
/// attached before this returns.
fn next_event(target: &EventTarget, events: &[&str]) -> LocalFuture<()> {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        for event in events {
            let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
                event, &resolve, &options,
            );
        }
    });

    let future = JsFuture::from(promise);
    Box::pin(async move {
        let _ = future.await;
    })
}

/// Attach `callback` to `event` on `target`; the returned guard removes it.
fn listen<E>(
    target: &EventTarget,
    event: &'static str,
    callback: impl FnMut(E) + 'static,
) -> Listener
where
    E: wasm_bindgen::convert::FromWasmAbi + 'static,
{
    let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(E)>);

    if target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .is_err()
    {
        return Listener::detached();
    }

    let target = target.clone();
    Listener::new(move || {
        let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    })
}

fn history_state(entry: &HistoryEntry) -> JsValue {
    serde_json::to_string(entry)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

fn transport(error: JsValue) -> FragmentError {
    FragmentError::Transport(format!("{error:?}"))
}

impl Dom for WebHost {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(selector))
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        elements(root.query_selector_all(selector))
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let children = node.children();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .collect()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn insert_before(&self, parent: &Element, child: &Element, reference: Option<&Element>) {
        let reference: Option<&web_sys::Node> = reference.map(|reference| reference.as_ref());
        let _ = parent.insert_before(child, reference);
    }

    fn replace_node(&self, old: &Element, new: &Element) {
        if let Some(parent) = old.parent_node() {
            let _ = parent.replace_child(new, old);
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_attribute(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn attributes(&self, node: &Element) -> Vec<(String, String)> {
        node.get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| node.get_attribute(&name).map(|value| (name, value)))
            .collect()
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn image_ready(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlImageElement>()
            .is_some_and(|image| image.complete() && image.natural_width() > 0)
    }

    fn image_settled(&self, node: &Element) -> LocalFuture<()> {
        next_event(node, &["load", "error"])
    }

    /// Resolves when the opacity transition of `node` itself ends. Bubbled
    /// `transitionend` events from descendants are ignored, and the listener
    /// is removed once the future completes or is dropped.
    fn transition_end(&self, node: &Element) -> LocalFuture<()> {
        let mut resolver = None;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| resolver = Some(resolve));
        let Some(resolve) = resolver else {
            return Box::pin(async {});
        };

        let own: JsValue = node.clone().into();
        let listener = listen(node, "transitionend", move |event: TransitionEvent| {
            let from_node = event.target().is_some_and(|target| JsValue::from(target) == own);
            if from_node && event.property_name() == "opacity" {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });

        let future = JsFuture::from(promise);
        Box::pin(async move {
            let _ = future.await;
            drop(listener);
        })
    }

    fn observe_once(
        &self,
        node: &Element,
        options: &ObserveOptions,
        on_visible: Box<dyn FnOnce()>,
    ) {
        let mut observers = self.observers.borrow_mut();

        if !observers.iter().any(|shared| shared.options == *options) {
            match SharedObserver::new(options) {
                Some(shared) => observers.push(shared),
                None => {
                    drop(observers);
                    crate::warn_log!("IntersectionObserver unavailable, revealing immediately");
                    on_visible();
                    return;
                }
            }
        }

        if let Some(shared) = observers.iter().find(|shared| shared.options == *options) {
            shared.observe(node, on_visible);
        }
    }

    fn on_click(&self, node: &Element, handler: Rc<dyn Fn()>) -> Listener {
        listen(node, "click", move |_: web_sys::MouseEvent| handler())
    }
}

impl Window for WebHost {
    fn href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str) {
        if let Ok(history) = self.window.history() {
            let _ = history.push_state_with_url(&history_state(entry), title, Some(url));
        }
    }

    fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str) {
        if let Ok(history) = self.window.history() {
            let _ = history.replace_state_with_url(&history_state(entry), title, Some(url));
        }
    }

    fn assign(&self, url: &str) {
        let _ = self.window.location().assign(url);
    }

    fn reload(&self) {
        let _ = self.window.location().reload();
    }

    fn scroll_to_top(&self, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn on_scroll(&self, handler: Rc<dyn Fn()>) -> Listener {
        listen(&self.window, "scroll", move |_: web_sys::Event| handler())
    }

    fn on_key(&self, handler: Rc<dyn Fn(&str)>) -> Listener {
        listen(&self.document, "keydown", move |event: web_sys::KeyboardEvent| {
            handler(&event.key())
        })
    }
}

impl Timer for WebHost {
    fn sleep(&self, duration: Duration) -> LocalFuture<()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        Box::pin(gloo_timers::future::TimeoutFuture::new(millis))
    }

    fn spawn(&self, task: LocalFuture<()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

impl FragmentSource for WebHost {
    fn fetch_fragment(&self, url: &str) -> LocalFuture<Result<Fragment, FragmentError>> {
        let request = self.window.fetch_with_str(url);

        Box::pin(async move {
            let response: web_sys::Response = JsFuture::from(request)
                .await
                .map_err(transport)?
                .dyn_into()
                .map_err(transport)?;

            let status = response.status();
            let text = JsFuture::from(response.text().map_err(transport)?)
                .await
                .map_err(transport)?;

            FragmentPayload::parse(status, &text.as_string().unwrap_or_default())
        })
    }
}
