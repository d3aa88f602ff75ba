//! An in-memory [`Host`](crate::host::Host) for native tests.
//!
//! The document is a small node arena filled by a forgiving HTML parser and
//! queried with a subset of CSS selectors (tag, `#id`, `.class`, `[attr]`,
//! `[attr=value]`, descendant combinator, comma groups). Everything the
//! router does to the window, the timer and the network is recorded so tests
//! can assert on it.
//!
//! Timers resolve immediately. Fetches resolve immediately unless held with
//! [`TestHost::hold_fetches`], in which case they wait for
//! [`TestHost::release_fetch`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use concierge_router::{Fragment, FragmentError, HistoryEntry, Url};
use futures_util::FutureExt;
use futures_util::future::{self, poll_fn};
use futures_util::task::noop_waker;

use crate::host::{
    Dom, FragmentSource, Listener, LocalFuture, ObserveOptions, ScrollBehavior, Timer, Window,
};

/// Handle to a node of the in-memory document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const DOCUMENT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

const VOID_TAGS: [&str; 8] = ["area", "br", "hr", "img", "input", "link", "meta", "source"];
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

#[derive(Debug)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// A script built with `create_element`; runs when first connected.
    runnable: bool,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<NodeData>,
    styles: HashMap<NodeId, Vec<(String, String)>>,
    style_log: Vec<(NodeId, String, String)>,
    executed_scripts: Vec<String>,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Tree::default();
        let document = tree.alloc(NodeKind::Document, false);
        let body = tree.alloc(
            NodeKind::Element {
                tag: "body".to_owned(),
                attributes: Vec::new(),
            },
            false,
        );
        tree.push_child(document, body);
        tree
    }

    fn alloc(&mut self, kind: NodeKind, runnable: bool) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            runnable,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_owned(),
                None => attributes.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            attributes.retain(|(key, _)| key != name);
        }
    }

    fn classes(&self, id: NodeId) -> Vec<String> {
        self.attribute(id, "class")
            .map(|classes| classes.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);

        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(index) if index <= children.len() => children.insert(index, child),
            _ => children.push(child),
        }

        if self.is_connected(child) {
            self.run_scripts(child);
        }
    }

    fn run_scripts(&mut self, root: NodeId) {
        let mut candidates = vec![root];
        candidates.extend(self.descendants(root));

        for id in candidates {
            if self.nodes[id.0].runnable && self.tag(id) == Some("script") {
                self.nodes[id.0].runnable = false;
                let source = self.text(id);
                self.executed_scripts.push(source);
            }
        }
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == DOCUMENT {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// Pre-order descendants, excluding `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }

        out
    }

    fn text(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Comment(_) => String::new(),
            _ => self
                .node(id)
                .children
                .iter()
                .map(|child| self.text(*child))
                .collect(),
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Document => self.serialize_children(id, out),
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
                out.push('>');

                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }

                self.serialize_children(id, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, id: NodeId, out: &mut String) {
        for child in &self.node(id).children {
            self.serialize(*child, out);
        }
    }

    fn parse_into(&mut self, parent: NodeId, html: &str) {
        let mut open = vec![parent];
        let mut rest = html;

        while !rest.is_empty() {
            let top = open.last().copied().unwrap_or(parent);

            if let Some(after) = rest.strip_prefix("<!--") {
                let (comment, remainder) = after.split_once("-->").unwrap_or((after, ""));
                let node = self.alloc(NodeKind::Comment(comment.to_owned()), false);
                self.push_child(top, node);
                rest = remainder;
            } else if let Some(after) = rest.strip_prefix("</") {
                let (name, remainder) = after.split_once('>').unwrap_or((after, ""));
                let name = name.trim().to_ascii_lowercase();
                if let Some(position) = open
                    .iter()
                    .rposition(|id| self.tag(*id) == Some(name.as_str()))
                    && position > 0
                {
                    open.truncate(position);
                }
                rest = remainder;
            } else if rest.starts_with("<!") {
                rest = rest.split_once('>').map_or("", |(_, remainder)| remainder);
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (tag, attributes, self_closing, remainder) = parse_start_tag(&rest[1..]);
                let raw_text = RAW_TEXT_TAGS.contains(&tag.as_str());
                let void = VOID_TAGS.contains(&tag.as_str());
                let closing = format!("</{tag}");

                let node = self.alloc(NodeKind::Element { tag, attributes }, false);
                self.push_child(top, node);
                rest = remainder;

                if raw_text {
                    let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
                    if end > 0 {
                        let text = self.alloc(NodeKind::Text(rest[..end].to_owned()), false);
                        self.push_child(node, text);
                    }
                    rest = rest[end..].split_once('>').map_or("", |(_, remainder)| remainder);
                } else if !self_closing && !void {
                    open.push(node);
                }
            } else {
                let end = rest
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| *c == '<')
                    .map_or(rest.len(), |(index, _)| index);
                let text = self.alloc(NodeKind::Text(rest[..end].to_owned()), false);
                self.push_child(top, text);
                rest = &rest[end..];
            }
        }
    }

    fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        selector.groups.iter().any(|chain| self.matches_chain(id, chain))
    }

    fn matches_chain(&self, id: NodeId, chain: &[Compound]) -> bool {
        let Some((last, mut remaining)) = chain.split_last() else {
            return false;
        };

        if !self.matches_compound(id, last) {
            return false;
        }

        let mut current = self.node(id).parent;
        while let Some((needed, rest)) = remaining.split_last() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = self.node(ancestor).parent;
                if self.matches_compound(ancestor, needed) {
                    break;
                }
            }
            remaining = rest;
        }

        true
    }

    fn matches_compound(&self, id: NodeId, compound: &Compound) -> bool {
        let Some(tag) = self.tag(id) else {
            return false;
        };

        if compound.tag.as_deref().is_some_and(|wanted| wanted != tag) {
            return false;
        }

        if let Some(wanted) = &compound.id
            && self.attribute(id, "id") != Some(wanted.as_str())
        {
            return false;
        }

        let classes = self.classes(id);
        if !compound.classes.iter().all(|class| classes.contains(class)) {
            return false;
        }

        compound.attributes.iter().all(|(name, value)| {
            match (self.attribute(id, name), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

fn parse_start_tag(input: &str) -> (String, Vec<(String, String)>, bool, &str) {
    let name_end = input
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(input.len());
    let tag = input[..name_end].to_ascii_lowercase();
    let mut rest = &input[name_end..];
    let mut attributes: Vec<(String, String)> = Vec::new();

    loop {
        rest = rest.trim_start();

        if let Some(remainder) = rest.strip_prefix("/>") {
            return (tag, attributes, true, remainder);
        }
        if let Some(remainder) = rest.strip_prefix('>') {
            return (tag, attributes, false, remainder);
        }
        if rest.is_empty() {
            return (tag, attributes, false, rest);
        }
        if let Some(remainder) = rest.strip_prefix(['/', '=']) {
            rest = remainder;
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            match after.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after[1..];
                    let end = inner.find(quote).unwrap_or(inner.len());
                    rest = inner.get(end + 1..).unwrap_or("");
                    inner[..end].to_owned()
                }
                _ => {
                    let end = after
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(after.len());
                    rest = &after[end..];
                    after[..end].to_owned()
                }
            }
        } else {
            String::new()
        };

        if !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

#[derive(Debug)]
struct Selector {
    groups: Vec<Vec<Compound>>,
}

impl Selector {
    fn parse(selector: &str) -> Self {
        let groups = selector
            .split(',')
            .map(|group| group.split_whitespace().map(parse_compound).collect::<Vec<_>>())
            .filter(|chain| !chain.is_empty())
            .collect();

        Selector { groups }
    }
}

fn parse_compound(input: &str) -> Compound {
    let is_marker = |c: char| matches!(c, '#' | '.' | '[');
    let mut compound = Compound::default();

    let tag_end = input.find(is_marker).unwrap_or(input.len());
    let tag = &input[..tag_end];
    if !tag.is_empty() && tag != "*" {
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    let mut rest = &input[tag_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        match marker {
            '[' => {
                let (inner, remainder) = body.split_once(']').unwrap_or((body, ""));
                let attribute = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim().to_ascii_lowercase(),
                        Some(value.trim().trim_matches(['"', '\'']).to_owned()),
                    ),
                    None => (inner.trim().to_ascii_lowercase(), None),
                };
                compound.attributes.push(attribute);
                rest = remainder;
            }
            _ => {
                let end = body.find(is_marker).unwrap_or(body.len());
                let name = body[..end].to_owned();
                if marker == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &body[end..];
            }
        }
    }

    compound
}

/// What an image element does once it is asked to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBehavior {
    /// Already decoded: `complete && naturalWidth > 0`.
    Ready,
    /// Fires `load` (or `error`) as soon as it is awaited.
    Loads,
    /// Never fires anything.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Replace,
}

/// One `pushState`/`replaceState` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub action: HistoryAction,
    pub entry: HistoryEntry,
    pub title: String,
    pub url: String,
}

#[derive(Debug)]
struct WindowState {
    href: String,
    title: String,
    history: Vec<HistoryRecord>,
    assigned: Vec<String>,
    reloads: usize,
    scrolls: Vec<ScrollBehavior>,
    scroll_y: f64,
    viewport_width: f64,
}

type ClickHandler = (usize, NodeId, Rc<dyn Fn()>);

#[derive(Default)]
struct Listeners {
    next_id: usize,
    clicks: Vec<ClickHandler>,
    scrolls: Vec<(usize, Rc<dyn Fn()>)>,
    keys: Vec<(usize, Rc<dyn Fn(&str)>)>,
}

impl Listeners {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

struct Observation {
    node: NodeId,
    options: ObserveOptions,
    on_visible: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct Gate {
    open: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl Gate {
    fn open(&self) {
        self.open.set(true);
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }

    fn wait(self: Rc<Self>) -> impl Future<Output = ()> {
        poll_fn(move |cx| {
            if self.open.get() {
                Poll::Ready(())
            } else {
                *self.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

fn poll_once(task: &mut LocalFuture<()>) -> Poll<()> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    task.as_mut().poll(&mut cx)
}

/// In-memory browser. See the module documentation.
pub struct TestHost {
    tree: RefCell<Tree>,
    window: RefCell<WindowState>,
    listeners: Rc<RefCell<Listeners>>,
    observations: RefCell<Vec<Observation>>,
    images: RefCell<HashMap<String, ImageBehavior>>,
    default_image: Cell<ImageBehavior>,
    image_waits: Cell<usize>,
    transitions_fire: Cell<bool>,
    transition_waits: Cell<usize>,
    sleeps: RefCell<Vec<Duration>>,
    tasks: RefCell<Vec<LocalFuture<()>>>,
    responses: RefCell<HashMap<String, Result<Fragment, FragmentError>>>,
    fetches: RefCell<Vec<String>>,
    holding: Cell<bool>,
    gates: RefCell<Vec<Rc<Gate>>>,
}

impl fmt::Debug for TestHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHost")
            .field("href", &self.window.borrow().href)
            .field("nodes", &self.tree.borrow().nodes.len())
            .field("fetches", &self.fetches.borrow().len())
            .field("pending_tasks", &self.tasks.borrow().len())
            .finish()
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    /// An empty page at `https://hotel.test/`.
    pub fn new() -> Self {
        Self {
            tree: RefCell::new(Tree::new()),
            window: RefCell::new(WindowState {
                href: "https://hotel.test/".to_owned(),
                title: String::new(),
                history: Vec::new(),
                assigned: Vec::new(),
                reloads: 0,
                scrolls: Vec::new(),
                scroll_y: 0.0,
                viewport_width: 1280.0,
            }),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            observations: RefCell::new(Vec::new()),
            images: RefCell::new(HashMap::new()),
            default_image: Cell::new(ImageBehavior::Loads),
            image_waits: Cell::new(0),
            transitions_fire: Cell::new(true),
            transition_waits: Cell::new(0),
            sleeps: RefCell::new(Vec::new()),
            tasks: RefCell::new(Vec::new()),
            responses: RefCell::new(HashMap::new()),
            fetches: RefCell::new(Vec::new()),
            holding: Cell::new(false),
            gates: RefCell::new(Vec::new()),
        }
    }

    /// A page at `href` whose `<body>` holds `body_html`.
    pub fn page(href: &str, body_html: &str) -> Self {
        let host = Self::new();
        host.set_href(href);
        host.tree.borrow_mut().parse_into(BODY, body_html);
        host
    }

    /// Move the location without any history call, as the browser does
    /// before dispatching `popstate`.
    pub fn set_href(&self, href: &str) {
        self.window.borrow_mut().href = href.to_owned();
    }

    pub fn set_viewport_width(&self, width: f64) {
        self.window.borrow_mut().viewport_width = width;
    }

    pub fn body_html(&self) -> String {
        self.inner_html(&BODY)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().serialize(node, &mut out);
        out
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.tree
            .borrow()
            .styles
            .get(&node)
            .and_then(|styles| styles.iter().find(|(name, _)| name == property))
            .map(|(_, value)| value.clone())
    }

    /// Every value ever assigned to `property` on `node`, oldest first.
    pub fn style_history(&self, node: NodeId, property: &str) -> Vec<String> {
        self.tree
            .borrow()
            .style_log
            .iter()
            .filter(|(id, name, _)| *id == node && name == property)
            .map(|(_, _, value)| value.clone())
            .collect()
    }

    /// Sources of scripts that ran, in execution order.
    pub fn executed_scripts(&self) -> Vec<String> {
        self.tree.borrow().executed_scripts.clone()
    }

    pub fn respond(&self, request: &str, response: Result<Fragment, FragmentError>) {
        self.responses.borrow_mut().insert(request.to_owned(), response);
    }

    /// Requested fragment URLs, in order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }

    /// Make subsequent fetches wait for [`TestHost::release_fetch`].
    pub fn hold_fetches(&self, hold: bool) {
        self.holding.set(hold);
    }

    /// Let the `index`-th held fetch resolve.
    pub fn release_fetch(&self, index: usize) {
        let gate = self.gates.borrow().get(index).cloned();
        if let Some(gate) = gate {
            gate.open();
        }
    }

    pub fn release_fetches(&self) {
        let gates = self.gates.borrow().clone();
        for gate in gates {
            gate.open();
        }
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.window.borrow().history.clone()
    }

    pub fn pushes(&self) -> Vec<HistoryRecord> {
        self.window
            .borrow()
            .history
            .iter()
            .filter(|record| record.action == HistoryAction::Push)
            .cloned()
            .collect()
    }

    /// URLs passed to hard navigations.
    pub fn assigned(&self) -> Vec<String> {
        self.window.borrow().assigned.clone()
    }

    pub fn reloads(&self) -> usize {
        self.window.borrow().reloads
    }

    pub fn scrolls(&self) -> Vec<ScrollBehavior> {
        self.window.borrow().scrolls.clone()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn set_image(&self, src: &str, behavior: ImageBehavior) {
        self.images.borrow_mut().insert(src.to_owned(), behavior);
    }

    pub fn set_default_image(&self, behavior: ImageBehavior) {
        self.default_image.set(behavior);
    }

    /// How many times a load/error wait was started on an image.
    pub fn image_waits(&self) -> usize {
        self.image_waits.get()
    }

    pub fn set_transitions_fire(&self, fire: bool) {
        self.transitions_fire.set(fire);
    }

    pub fn transition_waits(&self) -> usize {
        self.transition_waits.get()
    }

    /// Nodes with a pending visibility observation.
    pub fn observed(&self) -> Vec<NodeId> {
        self.observations
            .borrow()
            .iter()
            .map(|observation| observation.node)
            .collect()
    }

    pub fn observe_options(&self, node: NodeId) -> Option<ObserveOptions> {
        self.observations
            .borrow()
            .iter()
            .find(|observation| observation.node == node)
            .map(|observation| observation.options.clone())
    }

    /// Scroll `node` into view. Returns whether anything was observing it.
    pub fn reveal(&self, node: NodeId) -> bool {
        let (hits, rest): (Vec<_>, Vec<_>) = self
            .observations
            .borrow_mut()
            .drain(..)
            .partition(|observation| observation.node == node);
        self.observations.borrow_mut().extend(rest);

        let revealed = !hits.is_empty();
        for observation in hits {
            (observation.on_visible)();
        }
        revealed
    }

    pub fn reveal_all(&self) -> usize {
        let hits: Vec<Observation> = self.observations.borrow_mut().drain(..).collect();
        let count = hits.len();
        for observation in hits {
            (observation.on_visible)();
        }
        count
    }

    /// Dispatch a click on `node`, bubbling to listeners on its ancestors.
    /// Returns the number of handlers that ran.
    pub fn click(&self, node: NodeId) -> usize {
        let handlers: Vec<Rc<dyn Fn()>> = {
            let tree = self.tree.borrow();
            self.listeners
                .borrow()
                .clicks
                .iter()
                .filter(|(_, target, _)| tree.is_inclusive_ancestor(*target, node))
                .map(|(_, _, handler)| handler.clone())
                .collect()
        };

        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    pub fn scroll_to(&self, y: f64) {
        self.window.borrow_mut().scroll_y = y;
        let handlers: Vec<Rc<dyn Fn()>> = self
            .listeners
            .borrow()
            .scrolls
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler();
        }
    }

    pub fn press_key(&self, key: &str) {
        let handlers: Vec<Rc<dyn Fn(&str)>> = self
            .listeners
            .borrow()
            .keys
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(key);
        }
    }

    pub fn click_listeners(&self) -> usize {
        self.listeners.borrow().clicks.len()
    }

    pub fn scroll_listeners(&self) -> usize {
        self.listeners.borrow().scrolls.len()
    }

    pub fn key_listeners(&self) -> usize {
        self.listeners.borrow().keys.len()
    }

    /// Poll every spawned task that is still waiting. Returns how many
    /// remain pending.
    pub fn run_pending(&self) -> usize {
        loop {
            let tasks: Vec<LocalFuture<()>> = self.tasks.borrow_mut().drain(..).collect();
            let before = tasks.len();

            let mut waiting = Vec::new();
            for mut task in tasks {
                if poll_once(&mut task).is_pending() {
                    waiting.push(task);
                }
            }

            let progressed = waiting.len() < before;
            let mut queue = self.tasks.borrow_mut();
            waiting.append(&mut queue);
            *queue = waiting;

            if !progressed {
                return queue.len();
            }
        }
    }

    fn image_behavior(&self, node: &NodeId) -> ImageBehavior {
        let src = self.attribute(node, "src").unwrap_or_default();
        self.images
            .borrow()
            .get(&src)
            .copied()
            .unwrap_or(self.default_image.get())
    }
}

impl Dom for TestHost {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(BODY)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(DOCUMENT)
            .into_iter()
            .find(|node| tree.attribute(*node, "id") == Some(id))
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_within(&DOCUMENT, selector)
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let selector = Selector::parse(selector);
        let tree = self.tree.borrow();
        tree.descendants(*root)
            .into_iter()
            .filter(|node| tree.matches(*node, &selector))
            .collect()
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.tree.borrow().is_connected(*node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.node(*node)
            .children
            .iter()
            .copied()
            .filter(|child| tree.tag(*child).is_some())
            .collect()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.tree.borrow().tag(*node).unwrap_or_default().to_owned()
    }

    fn create_element(&self, tag: &str) -> Option<NodeId> {
        let tag = tag.to_ascii_lowercase();
        let runnable = tag == "script";
        Some(self.tree.borrow_mut().alloc(
            NodeKind::Element {
                tag,
                attributes: Vec::new(),
            },
            runnable,
        ))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.tree.borrow_mut().insert(*parent, *child, None);
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        let mut tree = self.tree.borrow_mut();
        // Detach first so the index is computed without the child itself.
        tree.detach(*child);
        let index = reference.and_then(|reference| {
            tree.node(*parent)
                .children
                .iter()
                .position(|existing| existing == reference)
        });
        tree.insert(*parent, *child, index);
    }

    fn replace_node(&self, old: &NodeId, new: &NodeId) {
        let mut tree = self.tree.borrow_mut();
        let Some(parent) = tree.node(*old).parent else {
            return;
        };
        tree.detach(*new);
        let index = tree.node(parent).children.iter().position(|child| child == old);
        tree.detach(*old);
        tree.insert(parent, *new, index);
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().attribute(*node, name).map(str::to_owned)
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        self.tree.borrow().attributes(*node).to_vec()
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.tree.borrow_mut().set_attribute(*node, name, value);
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        self.tree.borrow_mut().remove_attribute(*node, name);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.tree.borrow().classes(*node).iter().any(|existing| existing == class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let mut classes = tree.classes(*node);
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_owned());
            tree.set_attribute(*node, "class", &classes.join(" "));
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let classes = tree.classes(*node);
        if classes.iter().any(|existing| existing == class) {
            let kept: Vec<String> = classes
                .into_iter()
                .filter(|existing| existing != class)
                .collect();
            tree.set_attribute(*node, "class", &kept.join(" "));
        }
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        let styles = tree.styles.entry(*node).or_default();
        match styles.iter_mut().find(|(name, _)| name == property) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => styles.push((property.to_owned(), value.to_owned())),
        }
        tree.style_log
            .push((*node, property.to_owned(), value.to_owned()));
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().serialize_children(*node, &mut out);
        out
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.clear_children(*node);
        tree.parse_into(*node, html);
    }

    fn text(&self, node: &NodeId) -> String {
        self.tree.borrow().text(*node)
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.clear_children(*node);
        if !text.is_empty() {
            let child = tree.alloc(NodeKind::Text(text.to_owned()), false);
            tree.push_child(*node, child);
        }
    }

    fn image_ready(&self, node: &NodeId) -> bool {
        self.image_behavior(node) == ImageBehavior::Ready
    }

    fn image_settled(&self, node: &NodeId) -> LocalFuture<()> {
        self.image_waits.set(self.image_waits.get() + 1);
        match self.image_behavior(node) {
            ImageBehavior::Ready | ImageBehavior::Loads => future::ready(()).boxed_local(),
            ImageBehavior::Never => future::pending().boxed_local(),
        }
    }

    fn transition_end(&self, _node: &NodeId) -> LocalFuture<()> {
        self.transition_waits.set(self.transition_waits.get() + 1);
        if self.transitions_fire.get() {
            future::ready(()).boxed_local()
        } else {
            future::pending().boxed_local()
        }
    }

    fn observe_once(&self, node: &NodeId, options: &ObserveOptions, on_visible: Box<dyn FnOnce()>) {
        self.observations.borrow_mut().push(Observation {
            node: *node,
            options: options.clone(),
            on_visible,
        });
    }

    fn on_click(&self, node: &NodeId, handler: Rc<dyn Fn()>) -> Listener {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id();
            listeners.clicks.push((id, *node, handler));
            id
        };

        let listeners = Rc::downgrade(&self.listeners);
        Listener::new(move || detach(&listeners, |l| l.clicks.retain(|(i, ..)| *i != id)))
    }
}

fn detach(listeners: &Weak<RefCell<Listeners>>, remove: impl FnOnce(&mut Listeners)) {
    if let Some(listeners) = listeners.upgrade() {
        remove(&mut listeners.borrow_mut());
    }
}

impl Window for TestHost {
    fn href(&self) -> String {
        self.window.borrow().href.clone()
    }

    fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str) {
        self.record_history(HistoryAction::Push, entry, title, url);
    }

    fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str) {
        self.record_history(HistoryAction::Replace, entry, title, url);
    }

    fn assign(&self, url: &str) {
        self.window.borrow_mut().assigned.push(url.to_owned());
    }

    fn reload(&self) {
        self.window.borrow_mut().reloads += 1;
    }

    fn scroll_to_top(&self, behavior: ScrollBehavior) {
        let mut window = self.window.borrow_mut();
        window.scrolls.push(behavior);
        window.scroll_y = 0.0;
    }

    fn scroll_y(&self) -> f64 {
        self.window.borrow().scroll_y
    }

    fn viewport_width(&self) -> f64 {
        self.window.borrow().viewport_width
    }

    fn title(&self) -> String {
        self.window.borrow().title.clone()
    }

    fn set_title(&self, title: &str) {
        self.window.borrow_mut().title = title.to_owned();
    }

    fn on_scroll(&self, handler: Rc<dyn Fn()>) -> Listener {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id();
            listeners.scrolls.push((id, handler));
            id
        };

        let listeners = Rc::downgrade(&self.listeners);
        Listener::new(move || detach(&listeners, |l| l.scrolls.retain(|(i, _)| *i != id)))
    }

    fn on_key(&self, handler: Rc<dyn Fn(&str)>) -> Listener {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id();
            listeners.keys.push((id, handler));
            id
        };

        let listeners = Rc::downgrade(&self.listeners);
        Listener::new(move || detach(&listeners, |l| l.keys.retain(|(i, _)| *i != id)))
    }
}

impl TestHost {
    fn record_history(&self, action: HistoryAction, entry: &HistoryEntry, title: &str, url: &str) {
        let mut window = self.window.borrow_mut();
        let resolved = Url::parse(&window.href)
            .and_then(|base| base.join(url))
            .map(String::from)
            .unwrap_or_else(|_| url.to_owned());

        window.href = resolved;
        window.history.push(HistoryRecord {
            action,
            entry: entry.clone(),
            title: title.to_owned(),
            url: url.to_owned(),
        });
    }
}

impl Timer for TestHost {
    fn sleep(&self, duration: Duration) -> LocalFuture<()> {
        self.sleeps.borrow_mut().push(duration);
        future::ready(()).boxed_local()
    }

    fn spawn(&self, task: LocalFuture<()>) {
        let mut task = task;
        if poll_once(&mut task).is_pending() {
            self.tasks.borrow_mut().push(task);
        }
    }
}

impl FragmentSource for TestHost {
    fn fetch_fragment(&self, url: &str) -> LocalFuture<Result<Fragment, FragmentError>> {
        self.fetches.borrow_mut().push(url.to_owned());
        let response = self
            .responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or(Err(FragmentError::Http { status: 404 }));

        if !self.holding.get() {
            return future::ready(response).boxed_local();
        }

        let gate = Rc::new(Gate::default());
        self.gates.borrow_mut().push(gate.clone());
        async move {
            gate.wait().await;
            response
        }
        .boxed_local()
    }
}
