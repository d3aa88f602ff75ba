//! Body transition classes driven by the router's lifecycle events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use concierge::{EventBus, Host, NavigationEvent, Subscription};
use concierge_utils::Sequence;
use serde::{Deserialize, Serialize};

use crate::scroll_animations::ScrollAnimationRegistrar;
use crate::widgets::{HeaderScrollEffect, ScrollToTopButton, WidgetOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    TransitioningOut,
    TransitioningIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
    pub out_class: String,
    pub in_class: String,
    pub loading_class: String,
    /// How long the in-state lasts after a navigation ended without a swap.
    pub settle_ms: u64,
    pub widgets: WidgetOptions,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            out_class: "page-transitioning-out".to_owned(),
            in_class: "page-transitioning-in".to_owned(),
            loading_class: "page-loading".to_owned(),
            settle_ms: 300,
            widgets: WidgetOptions::default(),
        }
    }
}

impl TransitionOptions {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Idle → transitioning-out on start, transitioning-in on end, and back to
/// idle either after [`TransitionOptions::settle`] or as soon as the content
/// was swapped. Returning to idle re-binds the scroll widgets and re-scans
/// animated elements.
pub struct PageTransitionCoordinator<H: Host> {
    host: Rc<H>,
    options: TransitionOptions,
    state: Cell<TransitionState>,
    settling: Sequence,
    header: HeaderScrollEffect<H>,
    scroll_top: ScrollToTopButton<H>,
    animations: RefCell<Option<Rc<ScrollAnimationRegistrar<H>>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<H: Host> std::fmt::Debug for PageTransitionCoordinator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTransitionCoordinator")
            .field("state", &self.state.get())
            .field("attached", &self.subscription.borrow().is_some())
            .finish()
    }
}

impl<H: Host> PageTransitionCoordinator<H> {
    pub fn new(host: Rc<H>, options: TransitionOptions) -> Rc<Self> {
        Rc::new(Self {
            header: HeaderScrollEffect::new(host.clone(), options.widgets.clone()),
            scroll_top: ScrollToTopButton::new(host.clone(), options.widgets.clone()),
            host,
            options,
            state: Cell::new(TransitionState::Idle),
            settling: Sequence::new(),
            animations: RefCell::new(None),
            subscription: RefCell::new(None),
        })
    }

    /// Re-scan `registrar` whenever the coordinator settles.
    pub fn with_animations(self: Rc<Self>, registrar: Rc<ScrollAnimationRegistrar<H>>) -> Rc<Self> {
        *self.animations.borrow_mut() = Some(registrar);
        self
    }

    /// Follow `bus` until [`detach`](Self::detach), and bind the widgets for
    /// the current page. The bus keeps the coordinator alive while attached.
    pub fn attach(self: &Rc<Self>, bus: &EventBus) {
        let this = Rc::clone(self);
        let subscription = bus.subscribe(move |event| this.handle(event));
        let previous = self.subscription.replace(Some(subscription));
        drop(previous);
        self.refresh();
    }

    pub fn detach(&self) {
        let subscription = self.subscription.take();
        drop(subscription);
    }

    pub fn state(&self) -> TransitionState {
        self.state.get()
    }

    pub fn handle(self: &Rc<Self>, event: &NavigationEvent) {
        match event {
            NavigationEvent::Start { .. } => {
                self.settling.next();
                self.enter(TransitionState::TransitioningOut);
            }
            NavigationEvent::End { .. } => {
                let ticket = self.settling.next();
                self.enter(TransitionState::TransitioningIn);

                let this = Rc::downgrade(self);
                let sleep = self.host.sleep(self.options.settle());
                self.host.spawn(Box::pin(async move {
                    sleep.await;
                    if let Some(this) = this.upgrade()
                        && this.settling.is_latest(ticket)
                        && this.state.get() == TransitionState::TransitioningIn
                    {
                        this.settle();
                    }
                }));
            }
            NavigationEvent::ContentLoaded { .. } => {
                self.settling.next();
                self.settle();
            }
        }
    }

    /// Re-bind the widgets and re-scan animated elements.
    pub fn refresh(&self) {
        self.header.bind();
        self.scroll_top.bind();

        let animations = self.animations.borrow().clone();
        if let Some(animations) = animations {
            animations.scan();
        }
    }

    fn settle(&self) {
        self.enter(TransitionState::Idle);
        self.refresh();
    }

    fn enter(&self, state: TransitionState) {
        concierge::debug_log!("page transition: {:?} -> {:?}", self.state.get(), state);
        self.state.set(state);

        let Some(body) = self.host.body() else {
            return;
        };
        let options = &self.options;
        match state {
            TransitionState::Idle => {
                self.host.remove_class(&body, &options.out_class);
                self.host.remove_class(&body, &options.in_class);
            }
            TransitionState::TransitioningOut => {
                self.host.remove_class(&body, &options.in_class);
                self.host.add_class(&body, &options.out_class);
                self.host.add_class(&body, &options.loading_class);
            }
            TransitionState::TransitioningIn => {
                self.host.remove_class(&body, &options.out_class);
                self.host.add_class(&body, &options.in_class);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge::Dom;
    use concierge::testing::TestHost;
    use concierge_router::PageKey;

    const PAGE: &str = concat!(
        r#"<header></header><main><div id="offer" data-animate="fade"></div></main>"#,
        r#"<button id="scroll-to-top"></button>"#,
    );

    fn start() -> NavigationEvent {
        NavigationEvent::Start {
            url: "/gym.php".to_owned(),
            page: PageKey::Gym,
        }
    }

    fn end(error: bool) -> NavigationEvent {
        NavigationEvent::End {
            url: "/gym.php".to_owned(),
            page: PageKey::Gym,
            error,
        }
    }

    fn coordinator() -> (Rc<TestHost>, EventBus, Rc<PageTransitionCoordinator<TestHost>>) {
        let host = Rc::new(TestHost::page("https://hotel.test/", PAGE));
        let bus = EventBus::new();
        let coordinator =
            PageTransitionCoordinator::new(host.clone(), TransitionOptions::default());
        coordinator.attach(&bus);
        (host, bus, coordinator)
    }

    fn body_has(host: &TestHost, class: &str) -> bool {
        host.has_class(&host.body().unwrap(), class)
    }

    #[test]
    fn test_start_marks_out_and_loading() {
        let (host, bus, coordinator) = coordinator();

        bus.emit(&start());

        assert_eq!(coordinator.state(), TransitionState::TransitioningOut);
        assert!(body_has(&host, "page-transitioning-out"));
        assert!(body_has(&host, "page-loading"));
    }

    #[test]
    fn test_end_settles_after_fixed_duration() {
        let (host, bus, coordinator) = coordinator();

        bus.emit(&start());
        bus.emit(&end(true));

        // The in-memory timer fires immediately.
        assert_eq!(host.sleeps(), vec![Duration::from_millis(300)]);
        assert_eq!(coordinator.state(), TransitionState::Idle);
        assert!(!body_has(&host, "page-transitioning-out"));
        assert!(!body_has(&host, "page-transitioning-in"));
    }

    #[test]
    fn test_content_loaded_goes_straight_to_idle() {
        let (host, bus, coordinator) = coordinator();

        bus.emit(&start());
        coordinator.handle(&NavigationEvent::ContentLoaded { page: PageKey::Gym });

        assert_eq!(coordinator.state(), TransitionState::Idle);
        assert!(host.sleeps().is_empty());
        assert!(!body_has(&host, "page-transitioning-out"));
    }

    #[test]
    fn test_settling_rebinds_widgets_and_animations() {
        let host = Rc::new(TestHost::page("https://hotel.test/", PAGE));
        let bus = EventBus::new();
        let registrar = Rc::new(ScrollAnimationRegistrar::new(host.clone(), Default::default()));
        let coordinator = PageTransitionCoordinator::new(host.clone(), TransitionOptions::default())
            .with_animations(registrar);
        coordinator.attach(&bus);

        assert_eq!(host.observed().len(), 1);
        assert_eq!(host.scroll_listeners(), 2);

        let main = host.query_selector("main").unwrap();
        host.set_inner_html(&main, r#"<div id="spa" data-animate="fade"></div>"#);
        bus.emit(&NavigationEvent::ContentLoaded { page: PageKey::Gym });

        let fresh = host.element_by_id("spa").unwrap();
        assert!(host.observed().contains(&fresh));
        assert_eq!(host.scroll_listeners(), 2);
        assert_eq!(host.click_listeners(), 1);
    }

    #[test]
    fn test_detach_stops_following() {
        let (host, bus, coordinator) = coordinator();

        coordinator.detach();
        bus.emit(&start());

        assert_eq!(coordinator.state(), TransitionState::Idle);
        assert!(!body_has(&host, "page-loading"));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
