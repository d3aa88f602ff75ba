#![allow(missing_docs)]
//! The hotel site: page content, the fragment registry behind
//! `/api/content.php`, full-page rendering for direct loads, and the
//! browser entry point.

pub mod pages;
pub mod shell;

pub use pages::{ROOMS, Room, fragment_server};
pub use shell::render_page;

/// Start in-page navigation and every page component.
#[cfg(target_arch = "wasm32")]
pub fn hydrate() -> Result<(), concierge::wasm_bindgen::JsValue> {
    use std::rc::Rc;

    use concierge::Concierge;
    use concierge_components::{
        ComponentOptions, ModalController, PageTransitionCoordinator, ScrollAnimationRegistrar,
    };

    let options = ComponentOptions::from_config_value(&concierge::web::config_value_from_window());
    let concierge = Concierge::from_window()?;
    let host = concierge.host().clone();

    let modals = ModalController::new(host.clone(), options.modals);
    let animations = Rc::new(ScrollAnimationRegistrar::new(host.clone(), options.animations));
    PageTransitionCoordinator::new(host, options.transitions)
        .with_animations(animations)
        .attach(&concierge.events());

    let router = concierge.with_component(modals).hydrate()?;
    concierge::info_log!("hotel ready on {}", router.current_page());
    drop(router);

    Ok(())
}
