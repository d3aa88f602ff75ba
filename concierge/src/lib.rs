#![allow(missing_docs)]
//! In-page navigation for the hotel site.
//!
//! [`NavigationRouter`] intercepts eligible link clicks, fetches the target
//! page's content fragment and swaps it into the wrapper between the
//! persistent header and footer. Components that need to re-scan the page
//! afterwards implement [`Reinit`] and are registered through [`Concierge`].
//!
//! The router is generic over [`Host`]; on wasm32 the `web` module provides
//! the browser binding, and the `testing` feature exposes an in-memory host.

use std::rc::Rc;

pub use concierge_router;
pub use js_sys;
pub use wasm_bindgen;
pub use web_sys;

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod loader;
pub mod logging;
pub mod router;
pub mod signal;
pub mod swap;
pub mod transition;
pub mod wrapper;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{Classes, RouterConfig, Selectors, Timings};
pub use error::{ConfigError, NavigationError};
pub use events::{EventBus, NavigationEvent, Reinit, ReinitRegistry, Subscription};
pub use host::{
    Dom, FragmentSource, Host, Listener, LocalFuture, ObserveOptions, ScrollBehavior, Timer, Window,
};
pub use router::{Click, NavigationRouter, NavigationState, Navigated};
pub use signal::Signal;

/// Composition root: one router per page plus the components it re-arms.
pub struct Concierge<H: Host> {
    router: Rc<NavigationRouter<H>>,
}

impl<H: Host> std::fmt::Debug for Concierge<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Concierge")
            .field("router", &self.router)
            .finish()
    }
}

impl<H: Host> Concierge<H> {
    pub fn new(host: Rc<H>, config: RouterConfig) -> Result<Self, NavigationError> {
        Ok(Self {
            router: NavigationRouter::new(host, config)?,
        })
    }

    pub fn router(&self) -> &Rc<NavigationRouter<H>> {
        &self.router
    }

    pub fn host(&self) -> &Rc<H> {
        self.router.host()
    }

    pub fn events(&self) -> EventBus {
        self.router.events()
    }

    /// Register a component; it is re-armed after every swap in
    /// registration order.
    pub fn with_component(self, component: Rc<dyn Reinit>) -> Self {
        self.router.register(component);
        self
    }

    /// Prepare the page and run every component once.
    pub fn start(self) -> Result<Rc<NavigationRouter<H>>, NavigationError> {
        self.router.start()?;
        Ok(self.router)
    }
}

#[cfg(target_arch = "wasm32")]
impl Concierge<web::WebHost> {
    /// Build a router for the current page, reading overrides from
    /// `window.CONCIERGE_CONFIG`.
    pub fn from_window() -> Result<Self, wasm_bindgen::JsValue> {
        let host = Rc::new(web::WebHost::new()?);
        Self::new(host, web::config_from_window())
            .map_err(|error| wasm_bindgen::JsValue::from_str(&error.to_string()))
    }

    /// Start the router and attach the document listeners.
    pub fn hydrate(self) -> Result<Rc<NavigationRouter<web::WebHost>>, wasm_bindgen::JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let router = self
            .start()
            .map_err(|error| wasm_bindgen::JsValue::from_str(&error.to_string()))?;
        web::install(&router)?;

        Ok(router)
    }
}
