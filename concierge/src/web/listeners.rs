use std::rc::Rc;

use concierge_router::LinkCandidate;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent, PopStateEvent};

use super::WebHost;
use crate::router::{Click, NavigationRouter};

/// Route document clicks on anchors and `popstate` through `router`. The
/// listeners live as long as the page.
pub fn install(router: &Rc<NavigationRouter<WebHost>>) -> Result<(), JsValue> {
    let host = router.host().clone();

    let click_callback = {
        let router = router.clone();

        Closure::wrap(Box::new(move |event: MouseEvent| {
            if event.default_prevented() {
                return;
            }

            let Some(anchor) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|element| element.closest("a[href]").ok().flatten())
            else {
                return;
            };

            let href = anchor.get_attribute("href").unwrap_or_default();
            let target = anchor.get_attribute("target");
            let link = LinkCandidate {
                href: &href,
                target: target.as_deref(),
                download: anchor.has_attribute("download"),
                opted_out: anchor.has_attribute(&router.config().policy.opt_out_attribute),
            };
            let click = Click {
                button: event.button(),
                ctrl_key: event.ctrl_key(),
                meta_key: event.meta_key(),
                shift_key: event.shift_key(),
                alt_key: event.alt_key(),
            };

            if router.intercept(&link, click) {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(_)>)
    };

    host.document()
        .add_event_listener_with_callback("click", click_callback.as_ref().unchecked_ref())?;
    click_callback.forget();

    let popstate_callback = {
        let router = router.clone();

        Closure::wrap(Box::new(move |_event: PopStateEvent| {
            let router = router.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(error) = router.handle_pop().await {
                    crate::debug_log!("history navigation ended without swap: {}", error);
                }
            });
        }) as Box<dyn FnMut(_)>)
    };

    host.window()
        .add_event_listener_with_callback("popstate", popstate_callback.as_ref().unchecked_ref())?;
    popstate_callback.forget();

    Ok(())
}
