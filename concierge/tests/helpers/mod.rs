#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use concierge::testing::{NodeId, TestHost};
use concierge::{Dom, NavigationEvent, NavigationRouter, RouterConfig};
use concierge_router::Fragment;

pub(crate) const SHELL: &str = concat!(
    r#"<header><nav class="nav-links">"#,
    r#"<a href="/index.php">Home</a>"#,
    r#"<a href="/rooms-gallery.php">Rooms</a>"#,
    r#"<a href="/restaurant.php">Restaurant</a>"#,
    r#"<a href="/gym.php">Gym</a>"#,
    r#"<a href="/booking.php">Book now</a>"#,
    r#"</nav>"#,
    r#"<div class="mobile-menu">"#,
    r#"<a href="/index.php">Home</a>"#,
    r#"<a href="/rooms-gallery.php">Rooms</a>"#,
    r#"<a href="/gym.php">Gym</a>"#,
    r#"</div></header>"#,
    r#"<div id="page-loader"></div>"#,
    r#"<main><h1>Welcome</h1></main>"#,
    r#"<footer><p>Hotel</p></footer>"#,
);

pub(crate) struct Site {
    pub(crate) host: Rc<TestHost>,
    pub(crate) router: Rc<NavigationRouter<TestHost>>,
    pub(crate) events: Rc<RefCell<Vec<NavigationEvent>>>,
}

impl Site {
    pub(crate) fn at(href: &str) -> Self {
        let host = Rc::new(TestHost::page(href, SHELL));
        let router = NavigationRouter::new(host.clone(), RouterConfig::default()).unwrap();
        router.start().unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = events.clone();
            router
                .events()
                .subscribe(move |event| events.borrow_mut().push(event.clone()))
                .forget();
        }

        Site {
            host,
            router,
            events,
        }
    }

    pub(crate) fn home() -> Self {
        Self::at("https://hotel.test/index.php")
    }

    /// Answer `?page=<page>` with a fragment.
    pub(crate) fn serve(&self, page: &str, html: &str, title: &str) {
        self.host.respond(
            &format!("/api/content.php?page={page}"),
            Ok(Fragment::new(html).with_title(title)),
        );
    }

    pub(crate) fn wrapper(&self) -> NodeId {
        self.host.element_by_id("spa-wrapper").unwrap()
    }

    pub(crate) fn content(&self) -> String {
        self.host.inner_html(&self.wrapper())
    }

    pub(crate) fn active_links(&self) -> Vec<String> {
        self.host
            .query_selector_all(".nav-links a, .mobile-menu a")
            .into_iter()
            .filter(|link| self.host.has_class(link, "active"))
            .filter_map(|link| self.host.attribute(&link, "href"))
            .collect()
    }

    pub(crate) fn events(&self) -> Vec<NavigationEvent> {
        self.events.borrow().clone()
    }
}
