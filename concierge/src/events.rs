//! The router's broadcast channel and the registry of components it re-arms.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use concierge_router::PageKey;

/// Lifecycle of one in-page navigation, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Start { url: String, page: PageKey },
    End { url: String, page: PageKey, error: bool },
    /// The wrapper content was replaced. Element references taken before
    /// this event are dead.
    ContentLoaded { page: PageKey },
}

impl NavigationEvent {
    pub fn page(&self) -> &PageKey {
        match self {
            NavigationEvent::Start { page, .. }
            | NavigationEvent::End { page, .. }
            | NavigationEvent::ContentLoaded { page } => page,
        }
    }
}

type Callback = Rc<dyn Fn(&NavigationEvent)>;

#[derive(Default)]
struct BusInner {
    next_id: usize,
    subscribers: Vec<(usize, Callback)>,
}

/// Typed publish/subscribe channel. Clones share the same subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every event until the returned guard is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NavigationEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Rc::new(callback)));

        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    pub fn emit(&self, event: &NavigationEvent) {
        let subscribers: Vec<Callback> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in subscribers {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// Guard returned by [`EventBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: usize,
    active: bool,
}

impl Subscription {
    /// Keep the subscription for the lifetime of the bus.
    pub fn forget(mut self) {
        self.active = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }

        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut()
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

/// A component that must re-scan the document after the wrapper content
/// was replaced.
pub trait Reinit {
    fn name(&self) -> &str;

    /// Re-query everything. Must be safe to call repeatedly on the same DOM.
    fn reinit(&self);
}

/// Components supplied by the composition root, re-armed in registration
/// order after every swap.
#[derive(Clone, Default)]
pub struct ReinitRegistry {
    components: Rc<RefCell<Vec<Rc<dyn Reinit>>>>,
}

impl fmt::Debug for ReinitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ReinitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, component: Rc<dyn Reinit>) {
        self.components.borrow_mut().push(component);
    }

    pub fn reinit_all(&self) {
        let components: Vec<Rc<dyn Reinit>> = self.components.borrow().clone();

        for component in components {
            crate::debug_log!("reinit {}", component.name());
            component.reinit();
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.components
            .borrow()
            .iter()
            .map(|component| component.name().to_owned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.borrow().is_empty()
    }
}
