#![allow(missing_docs)]

mod helpers;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use concierge::testing::ImageBehavior;
use concierge::{
    Click, Concierge, Dom, NavigationError, NavigationEvent, Navigated, Reinit, RouterConfig,
    ScrollBehavior, Signal, Window,
};
use concierge_router::{
    Fragment, FragmentError, FragmentPayload, HistoryEntry, LinkCandidate, PageKey,
};
use futures_util::FutureExt;
use helpers::Site;

#[test]
fn test_eligible_click_is_intercepted() {
    let site = Site::home();
    site.serve("gym", "<h1>Gym</h1>", "Gym | Hotel");

    let intercepted = site
        .router
        .intercept(&LinkCandidate::new("/gym.php"), Click::primary());

    assert!(intercepted);
    assert_eq!(site.host.fetches(), vec!["/api/content.php?page=gym"]);
    assert_eq!(site.content(), "<h1>Gym</h1>");
}

#[test]
fn test_ineligible_clicks_are_left_alone() {
    let site = Site::home();

    let candidates = [
        LinkCandidate::new(""),
        LinkCandidate::new("#rooms"),
        LinkCandidate::new("mailto:desk@hotel.test"),
        LinkCandidate::new("tel:+15551234"),
        LinkCandidate::new("javascript:void(0)"),
        LinkCandidate::new("https://partner.test/gym.php"),
        LinkCandidate::new("/admin/login.php"),
        LinkCandidate::new("/booking.php"),
        LinkCandidate::new("/spa-treatments.php"),
        LinkCandidate {
            target: Some("_blank"),
            ..LinkCandidate::new("/gym.php")
        },
        LinkCandidate {
            download: true,
            ..LinkCandidate::new("/gym.php")
        },
        LinkCandidate {
            opted_out: true,
            ..LinkCandidate::new("/gym.php")
        },
    ];

    for candidate in &candidates {
        assert!(
            !site.router.intercept(candidate, Click::primary()),
            "{} should not be intercepted",
            candidate.href
        );
    }

    assert!(site.host.fetches().is_empty());
    assert!(site.events().is_empty());
}

#[tokio::test]
async fn test_successful_navigation_swaps_content() {
    let site = Site::home();
    site.serve("gym", r#"<section class="hero"><h1>Gym</h1></section>"#, "Gym | Hotel");

    let outcome = site.router.navigate_to("/gym.php").await.unwrap();

    assert_eq!(outcome, Navigated::Swapped);
    assert_eq!(site.content(), r#"<section class="hero"><h1>Gym</h1></section>"#);
    assert_eq!(site.host.title(), "Gym | Hotel");

    let pushes = site.host.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].url, "https://hotel.test/gym.php");
    assert_eq!(pushes[0].entry, HistoryEntry::new(PageKey::Gym));
    assert_eq!(pushes[0].title, "Gym | Hotel");

    assert_eq!(site.router.current_page(), PageKey::Gym);
    assert!(!site.router.is_loading());
    assert!(!site.router.loader().is_visible());
    assert_eq!(site.host.scrolls(), vec![ScrollBehavior::Smooth]);
}

#[tokio::test]
async fn test_events_are_emitted_in_order() {
    let site = Site::home();
    site.serve("restaurant", "<p>menu</p>", "Restaurant");

    site.router.navigate_to("/restaurant.php").await.unwrap();

    let url = "https://hotel.test/restaurant.php".to_owned();
    assert_eq!(
        site.events(),
        vec![
            NavigationEvent::Start {
                url: url.clone(),
                page: PageKey::Restaurant
            },
            NavigationEvent::End {
                url,
                page: PageKey::Restaurant,
                error: false
            },
            NavigationEvent::ContentLoaded {
                page: PageKey::Restaurant
            },
        ]
    );
}

#[tokio::test]
async fn test_server_error_falls_back_to_full_load() {
    let site = Site::home();
    site.host.respond(
        "/api/content.php?page=gym",
        Err(FragmentError::Server("database unavailable".to_owned())),
    );

    let error = site.router.navigate_to("/gym.php").await.unwrap_err();

    assert_eq!(
        error,
        NavigationError::Fragment(FragmentError::Server("database unavailable".to_owned()))
    );
    assert_eq!(site.host.assigned(), vec!["https://hotel.test/gym.php"]);
    assert!(site.host.pushes().is_empty());
    assert_eq!(site.content(), "<main><h1>Welcome</h1></main>");
    assert!(site.host.sleeps().contains(&Duration::from_millis(300)));
    assert!(!site.router.loader().is_visible());
    assert!(!site.router.is_loading());
    assert_eq!(
        site.events().last(),
        Some(&NavigationEvent::End {
            url: "https://hotel.test/gym.php".to_owned(),
            page: PageKey::Gym,
            error: true
        })
    );
}

#[tokio::test]
async fn test_payload_without_html_falls_back() {
    let site = Site::home();
    site.host.respond(
        "/api/content.php?page=events",
        FragmentPayload::parse(200, r#"{ "title": "Events" }"#),
    );

    let error = site.router.navigate_to("/events.php").await.unwrap_err();

    assert_eq!(error, NavigationError::Fragment(FragmentError::MissingHtml));
    assert_eq!(site.host.assigned(), vec!["https://hotel.test/events.php"]);
    assert!(site.host.pushes().is_empty());
}

#[tokio::test]
async fn test_http_error_falls_back() {
    let site = Site::home();

    // Nothing served: the test host answers 404.
    site.router.navigate_to("/conference.php").await.unwrap_err();

    assert_eq!(site.host.assigned(), vec!["https://hotel.test/conference.php"]);
}

#[tokio::test]
async fn test_second_navigation_while_loading_is_dropped() {
    let site = Site::home();
    site.serve("gym", "<p>gym</p>", "Gym");
    site.serve("restaurant", "<p>restaurant</p>", "Restaurant");
    site.host.hold_fetches(true);

    let mut first = Box::pin(site.router.navigate_to("/gym.php"));
    assert!((&mut first).now_or_never().is_none());
    assert!(site.router.is_loading());

    let second = site.router.navigate_to("/restaurant.php").await.unwrap();
    assert_eq!(second, Navigated::Ignored);
    assert_eq!(site.host.fetches().len(), 1);

    site.host.release_fetches();
    assert_eq!(first.await.unwrap(), Navigated::Swapped);
    assert_eq!(site.content(), "<p>gym</p>");
}

#[test]
fn test_click_during_loading_is_swallowed() {
    let site = Site::home();
    site.serve("gym", "<p>gym</p>", "Gym");
    site.serve("restaurant", "<p>restaurant</p>", "Restaurant");
    site.host.hold_fetches(true);

    assert!(site.router.intercept(&LinkCandidate::new("/gym.php"), Click::primary()));
    assert!(site.router.intercept(&LinkCandidate::new("/restaurant.php"), Click::primary()));
    assert_eq!(site.host.fetches().len(), 1);

    site.host.release_fetches();
    assert_eq!(site.host.run_pending(), 0);
    assert_eq!(site.content(), "<p>gym</p>");
}

#[tokio::test]
async fn test_ready_hero_skips_the_wait() {
    let site = Site::home();
    site.host.set_image("/img/gym.jpg", ImageBehavior::Ready);
    site.serve("gym", r#"<img data-hero="" src="/img/gym.jpg">"#, "Gym");

    site.router.navigate_to("/gym.php").await.unwrap();

    assert_eq!(site.host.image_waits(), 0);
    assert!(!site.host.sleeps().contains(&Duration::from_millis(2500)));
}

#[tokio::test]
async fn test_stalled_hero_does_not_block_fade_in() {
    let site = Site::home();
    site.host.set_image("/img/gym.jpg", ImageBehavior::Never);
    site.serve("gym", r#"<img data-hero="" src="/img/gym.jpg">"#, "Gym");

    let outcome = site.router.navigate_to("/gym.php").await.unwrap();

    assert_eq!(outcome, Navigated::Swapped);
    assert_eq!(site.host.image_waits(), 1);
    assert!(site.host.sleeps().contains(&Duration::from_millis(2500)));
    assert_eq!(site.host.style(site.wrapper(), "opacity").as_deref(), Some("1"));
}

#[test]
fn test_page_key_and_eligibility() {
    let site = Site::home();

    assert_eq!(PageKey::from_path("/"), PageKey::Index);
    assert_eq!(PageKey::from_path("/index.php"), PageKey::Index);
    assert_eq!(PageKey::from_path("/room.php"), PageKey::Room);
    assert_eq!(PageKey::from_path("/rooms-gallery.php"), PageKey::RoomsGallery);

    assert!(site.router.is_spa_eligible("/room.php?room=deluxe-suite"));
    assert!(site.router.is_spa_eligible("/"));
    assert!(!site.router.is_spa_eligible("/admin/login.php"));
}

#[tokio::test]
async fn test_room_highlights_gallery_in_both_menus() {
    let site = Site::home();
    site.host.respond(
        "/api/content.php?page=room&slug=deluxe-suite",
        Ok(Fragment::new("<h1>Deluxe Suite</h1>")),
    );

    site.router
        .navigate_to("/room.php?room=deluxe-suite")
        .await
        .unwrap();

    assert_eq!(site.router.current_page(), PageKey::Room);
    assert_eq!(
        site.active_links(),
        vec!["/rooms-gallery.php", "/rooms-gallery.php"]
    );
}

#[tokio::test]
async fn test_active_nav_follows_current_page() {
    let site = Site::home();
    assert_eq!(site.active_links(), vec!["/index.php", "/index.php"]);

    site.serve("gym", "<p>gym</p>", "Gym");
    site.router.navigate_to("/gym.php").await.unwrap();

    assert_eq!(site.active_links(), vec!["/gym.php", "/gym.php"]);
}

#[tokio::test]
async fn test_round_trip_keeps_header_and_footer() {
    let site = Site::home();
    site.serve("gym", "<p>gym</p>", "Gym");
    site.serve("restaurant", "<p>restaurant</p>", "Restaurant");

    let header = site.host.query_selector("header").unwrap();
    let footer = site.host.query_selector("footer").unwrap();

    site.router.navigate_to("/gym.php").await.unwrap();
    let first = site.content();
    site.router.navigate_to("/restaurant.php").await.unwrap();
    let second = site.content();
    site.router.navigate_to("/gym.php").await.unwrap();

    assert_ne!(first, second);
    assert_eq!(site.content(), first);
    assert_eq!(site.host.query_selector("header"), Some(header));
    assert_eq!(site.host.query_selector("footer"), Some(footer));
    assert!(site.host.is_connected(&header));
    assert_eq!(site.host.pushes().len(), 3);
}

#[tokio::test]
async fn test_inline_scripts_run_after_swap() {
    let site = Site::home();
    site.serve(
        "events",
        r#"<div id="calendar"></div><script src="/js/calendar.js"></script><script>initCalendar();</script>"#,
        "Events",
    );

    site.router.navigate_to("/events.php").await.unwrap();

    assert_eq!(site.host.executed_scripts(), vec!["", "initCalendar();"]);
}

struct Probe {
    name: &'static str,
    log: Rc<RefCell<Vec<PageKey>>>,
    page: Signal<PageKey>,
}

impl Reinit for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn reinit(&self) {
        self.log.borrow_mut().push(self.page.get());
    }
}

#[tokio::test]
async fn test_components_are_rearmed_after_swap() {
    let host = Rc::new(concierge::testing::TestHost::page(
        "https://hotel.test/index.php",
        helpers::SHELL,
    ));
    host.respond("/api/content.php?page=gym", Ok(Fragment::new("<p>gym</p>")));

    let log = Rc::new(RefCell::new(Vec::new()));
    let concierge = Concierge::new(host.clone(), RouterConfig::default()).unwrap();
    let probe = Probe {
        name: "probe",
        log: log.clone(),
        page: concierge.router().page_signal(),
    };

    let router = concierge.with_component(Rc::new(probe)).start().unwrap();
    assert_eq!(*log.borrow(), vec![PageKey::Index]);

    router.navigate_to("/gym.php").await.unwrap();
    assert_eq!(*log.borrow(), vec![PageKey::Index, PageKey::Gym]);
    assert_eq!(router.components().names(), vec!["probe"]);
}

#[tokio::test]
async fn test_mixed_case_path_is_loaded_fully() {
    let site = Site::home();
    site.serve("gym", "<p>gym</p>", "Gym");

    assert!(!site.router.is_spa_eligible("/Gym.php"));
    assert_eq!(PageKey::from_path("/Gym.php"), PageKey::Other("Gym".to_owned()));

    let outcome = site.router.navigate_to("/Gym.php").await.unwrap();

    assert_eq!(outcome, Navigated::Deferred);
    assert!(site.host.fetches().is_empty());
    assert!(site.host.pushes().is_empty());
    assert_eq!(site.host.assigned(), vec!["/Gym.php"]);
}

#[test]
fn test_anchor_on_current_page_is_left_to_the_browser() {
    let site = Site::home();
    site.serve("index", "<p>home again</p>", "Home");

    let intercepted = site
        .router
        .intercept(&LinkCandidate::new("/index.php#rooms"), Click::primary());

    assert!(!intercepted);
    assert!(site.host.fetches().is_empty());
    assert_eq!(site.host.history().len(), 1);
    assert!(site.events().is_empty());
    assert!(site.host.scrolls().is_empty());
}
