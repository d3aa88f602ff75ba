//! The navigation router: decides which links are handled in-page, fetches
//! their content fragment, swaps it in and keeps history, active-nav
//! highlighting and every registered component in step.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use concierge_router::{
    HistoryEntry, LinkCandidate, PageKey, Rejection, SpaTarget, Url, fragment_url,
};
use concierge_utils::Sequence;

use crate::config::RouterConfig;
use crate::error::NavigationError;
use crate::events::{EventBus, NavigationEvent, Reinit, ReinitRegistry};
use crate::host::{Host, ScrollBehavior};
use crate::loader::LoaderIndicator;
use crate::signal::Signal;
use crate::swap::swap;
use crate::wrapper::ensure_wrapper;
use crate::{debug_log, info_log, warn_log};

/// The mouse state of a click on a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Click {
    pub button: i16,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
}

impl Click {
    /// A plain left click.
    pub fn primary() -> Self {
        Self::default()
    }

    /// Only plain primary clicks are handled in-page; everything else
    /// (new tab, new window, download) belongs to the browser.
    pub fn is_plain(&self) -> bool {
        self.button == 0 && !(self.ctrl_key || self.meta_key || self.shift_key || self.alt_key)
    }
}

/// How a navigation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigated {
    /// The wrapper now shows the target page.
    Swapped,
    /// Another navigation was in flight, or the location did not change.
    Ignored,
    /// Left to the browser (full load or reload).
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    /// Back/forward: the browser already moved to the entry.
    Traverse,
}

/// Snapshot of the router's navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_page: PageKey,
    pub is_loading: bool,
}

pub struct NavigationRouter<H: Host> {
    host: Rc<H>,
    config: RouterConfig,
    is_loading: Cell<bool>,
    current_page: Signal<PageKey>,
    /// URL whose content the wrapper currently shows.
    rendered: RefCell<Url>,
    sequence: Sequence,
    events: EventBus,
    components: ReinitRegistry,
    loader: LoaderIndicator<H>,
}

impl<H: Host> fmt::Debug for NavigationRouter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRouter")
            .field("current_page", &self.current_page.get())
            .field("is_loading", &self.is_loading.get())
            .field("rendered", &self.rendered.borrow().as_str())
            .field("sequence", &self.sequence.current())
            .field("components", &self.components)
            .finish()
    }
}

impl<H: Host> NavigationRouter<H> {
    pub fn new(host: Rc<H>, config: RouterConfig) -> Result<Rc<Self>, NavigationError> {
        let href = host.href();
        let rendered = Url::parse(&href).map_err(|_| NavigationError::Location(href))?;
        let loader = LoaderIndicator::new(
            host.clone(),
            config.selectors.loader.clone(),
            config.classes.loader_active.clone(),
        );

        Ok(Rc::new(Self {
            current_page: Signal::new(PageKey::from_path(rendered.path())),
            rendered: RefCell::new(rendered),
            host,
            config,
            is_loading: Cell::new(false),
            sequence: Sequence::new(),
            events: EventBus::new(),
            components: ReinitRegistry::new(),
            loader,
        }))
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Handle to the broadcast channel.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn components(&self) -> &ReinitRegistry {
        &self.components
    }

    pub fn register(&self, component: Rc<dyn Reinit>) {
        self.components.register(component);
    }

    pub fn current_page(&self) -> PageKey {
        self.current_page.get()
    }

    /// Observable current page.
    pub fn page_signal(&self) -> Signal<PageKey> {
        self.current_page.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    pub fn state(&self) -> NavigationState {
        NavigationState {
            current_page: self.current_page.get(),
            is_loading: self.is_loading.get(),
        }
    }

    pub fn loader(&self) -> &LoaderIndicator<H> {
        &self.loader
    }

    /// Build the wrapper, tag the current history entry, highlight the menu
    /// and run every component once.
    pub fn start(&self) -> Result<(), NavigationError> {
        ensure_wrapper(&*self.host, &self.config.selectors, &self.config.classes)
            .ok_or(NavigationError::MissingWrapper)?;

        let page = self.current_page.get();
        let url = self.rendered.borrow().to_string();
        self.host
            .replace_state(&HistoryEntry::new(page.clone()), &self.host.title(), &url);
        self.refresh_active_nav();
        self.components.reinit_all();

        info_log!("navigation router started on {}", page);
        Ok(())
    }

    /// Decide whether a link is handled in-page.
    pub fn link_target(&self, link: &LinkCandidate<'_>) -> Result<SpaTarget, Rejection> {
        self.config.policy.evaluate(link, &self.location())
    }

    pub fn is_spa_eligible(&self, href: &str) -> bool {
        self.link_target(&LinkCandidate::new(href)).is_ok()
    }

    /// Called for every click on an anchor. Returns `true` when the default
    /// browser navigation must be suppressed; the navigation then runs on
    /// the host's event loop.
    pub fn intercept(self: &Rc<Self>, link: &LinkCandidate<'_>, click: Click) -> bool {
        if !click.is_plain() {
            return false;
        }

        let target = match self.link_target(link) {
            Ok(target) => target,
            Err(rejection) => {
                debug_log!("link {} left to the browser: {:?}", link.href, rejection);
                return false;
            }
        };

        let router = self.clone();
        self.host.spawn(Box::pin(async move {
            if let Err(error) = router.navigate(target).await {
                debug_log!("navigation ended without swap: {}", error);
            }
        }));

        true
    }

    /// Navigate to an `href` programmatically. Ineligible targets get a full
    /// browser navigation.
    pub async fn navigate_to(&self, href: &str) -> Result<Navigated, NavigationError> {
        match self.link_target(&LinkCandidate::new(href)) {
            Ok(target) => self.navigate(target).await,
            Err(rejection) => {
                debug_log!("{} is not handled in-page: {:?}", href, rejection);
                self.host.assign(href);
                Ok(Navigated::Deferred)
            }
        }
    }

    /// Fetch and swap in `target`, pushing a history entry. A no-op while
    /// another navigation is in flight.
    pub async fn navigate(&self, target: SpaTarget) -> Result<Navigated, NavigationError> {
        if self.is_loading.get() {
            debug_log!("navigation to {} dropped, another one is in flight", target.url);
            return Ok(Navigated::Ignored);
        }

        self.run(target, HistoryMode::Push).await
    }

    /// React to a `popstate`: the browser has already moved to `href()`.
    ///
    /// Eligible pages are fetched again and supersede any navigation in
    /// flight; anything else is reloaded.
    pub async fn handle_pop(&self) -> Result<Navigated, NavigationError> {
        let href = self.host.href();
        let url = Url::parse(&href).map_err(|_| NavigationError::Location(href.clone()))?;

        {
            let rendered = self.rendered.borrow();
            if url.path() == rendered.path() && url.query() == rendered.query() {
                return Ok(Navigated::Ignored);
            }
        }

        let classified = {
            let rendered = self.rendered.borrow();
            self.config.policy.classify(url, &rendered)
        };

        match classified {
            Ok(target) => self.run(target, HistoryMode::Traverse).await,
            Err(rejection) => {
                debug_log!("history entry {} needs a reload: {:?}", href, rejection);
                self.host.reload();
                Ok(Navigated::Deferred)
            }
        }
    }

    /// Toggle the active class on every desktop and mobile menu link.
    pub fn refresh_active_nav(&self) {
        let current = self.current_page.get();
        let base = self.rendered.borrow().clone();
        let selectors = &self.config.selectors;

        for selector in [&selectors.desktop_nav_links, &selectors.mobile_nav_links] {
            for link in self.host.query_selector_all(selector) {
                let active = self
                    .host
                    .attribute(&link, "href")
                    .and_then(|href| base.join(&href).ok())
                    .filter(|url| url.origin() == base.origin())
                    .is_some_and(|url| PageKey::from_path(url.path()).highlights_for(&current));

                self.host
                    .toggle_class(&link, &self.config.classes.nav_active, active);
            }
        }
    }

    fn location(&self) -> Url {
        Url::parse(&self.host.href()).unwrap_or_else(|_| self.rendered.borrow().clone())
    }

    async fn run(
        &self,
        target: SpaTarget,
        mode: HistoryMode,
    ) -> Result<Navigated, NavigationError> {
        let ticket = self.sequence.next();
        let url = target.url.to_string();

        info_log!("navigating to {} ({})", url, target.page);

        self.is_loading.set(true);
        if let Some(body) = self.host.body() {
            self.host.add_class(&body, &self.config.classes.page_loading);
        }
        self.events.emit(&NavigationEvent::Start {
            url: url.clone(),
            page: target.page.clone(),
        });
        self.loader.show();

        let result = self.load(&target, mode, ticket).await;

        match &result {
            Ok(()) => {}
            Err(NavigationError::Superseded) => {
                debug_log!("discarded stale response for {}", url);
            }
            Err(error) => self.fall_back(&target, error, ticket).await,
        }

        self.settle(ticket).await;

        result.map(|()| Navigated::Swapped)
    }

    async fn load(
        &self,
        target: &SpaTarget,
        mode: HistoryMode,
        ticket: u64,
    ) -> Result<(), NavigationError> {
        let wrapper = ensure_wrapper(&*self.host, &self.config.selectors, &self.config.classes)
            .ok_or(NavigationError::MissingWrapper)?;

        let request = fragment_url(&self.config.endpoint, target, &self.config.slug_param);
        let fetched = self.host.fetch_fragment(&request).await;

        if !self.sequence.is_latest(ticket) {
            return Err(NavigationError::Superseded);
        }

        let fragment = fetched?;
        let report = swap(&*self.host, &self.config, &self.loader, &wrapper, &fragment).await;
        debug_log!("swapped {}: {:?}", target.page, report);

        if !self.sequence.is_latest(ticket) {
            return Err(NavigationError::Superseded);
        }

        let url = target.url.to_string();

        if mode == HistoryMode::Push {
            let title = fragment.title.clone().unwrap_or_else(|| self.host.title());
            self.host
                .push_state(&HistoryEntry::new(target.page.clone()), &title, &url);
        }

        *self.rendered.borrow_mut() = target.url.clone();
        self.current_page.set(target.page.clone());
        self.refresh_active_nav();

        self.events.emit(&NavigationEvent::End {
            url,
            page: target.page.clone(),
            error: false,
        });
        self.events.emit(&NavigationEvent::ContentLoaded {
            page: target.page.clone(),
        });
        self.components.reinit_all();

        self.host.scroll_to_top(ScrollBehavior::Smooth);

        Ok(())
    }

    async fn fall_back(&self, target: &SpaTarget, error: &NavigationError, ticket: u64) {
        let url = target.url.to_string();
        warn_log!("navigation to {} failed, loading it fully: {}", url, error);

        self.loader.hide();
        self.events.emit(&NavigationEvent::End {
            url: url.clone(),
            page: target.page.clone(),
            error: true,
        });

        self.host.sleep(self.config.timings.fallback_delay()).await;

        if self.sequence.is_latest(ticket) {
            self.host.assign(&url);
        }
    }

    async fn settle(&self, ticket: u64) {
        if self.sequence.is_latest(ticket) {
            self.is_loading.set(false);
        }

        self.host
            .sleep(self.config.timings.loading_class_delay())
            .await;

        if !self.is_loading.get()
            && let Some(body) = self.host.body()
        {
            self.host
                .remove_class(&body, &self.config.classes.page_loading);
        }
    }
}
