//! Content fragments of every in-page navigable page.

use concierge_router::{Fragment, FragmentServer, PageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Room {
    pub slug: &'static str,
    pub name: &'static str,
    pub nightly_rate: u32,
    pub summary: &'static str,
    pub image: &'static str,
}

pub const ROOMS: [Room; 3] = [
    Room {
        slug: "deluxe-suite",
        name: "Deluxe Suite",
        nightly_rate: 320,
        summary: "A corner suite with a separate lounge and a view over the old town.",
        image: "/static/img/deluxe-suite.jpg",
    },
    Room {
        slug: "garden-double",
        name: "Garden Double",
        nightly_rate: 180,
        summary: "Ground floor double opening onto the courtyard garden.",
        image: "/static/img/garden-double.jpg",
    },
    Room {
        slug: "classic-single",
        name: "Classic Single",
        nightly_rate: 110,
        summary: "A quiet single room on the upper floors.",
        image: "/static/img/classic-single.jpg",
    },
];

pub fn room(slug: &str) -> Option<&'static Room> {
    ROOMS.iter().find(|room| room.slug == slug)
}

fn title(page: &str) -> String {
    format!("{page} | Grand Concierge Hotel")
}

fn hero(image: &str, heading: &str, tagline: &str) -> String {
    format!(
        r#"<section class="hero"><img data-hero src="{image}" alt="{heading}"><div class="hero-text"><h1>{heading}</h1><p>{tagline}</p></div></section>"#
    )
}

fn index() -> Fragment {
    let cards: String = ROOMS
        .iter()
        .enumerate()
        .map(|(i, room)| {
            format!(
                r#"<article class="room-card" data-animate="fade-up" data-delay="{}"><h3>{}</h3><p>from €{} per night</p><a href="/room.php?room={}">View room</a></article>"#,
                i * 100,
                room.name,
                room.nightly_rate,
                room.slug
            )
        })
        .collect();

    Fragment::new(format!(
        r#"{}<section class="rooms" data-animate="fade-up">{cards}</section><button class="button" data-modal-open="newsletter-modal">Stay in touch</button>"#,
        hero("/static/img/lobby.jpg", "Welcome", "Rest in the heart of the city.")
    ))
    .with_title(title("Home"))
}

fn rooms_gallery() -> Fragment {
    let gallery: String = ROOMS
        .iter()
        .map(|room| {
            format!(
                r#"<figure data-animate="zoom"><img src="{}" alt="{}"><figcaption><a href="/room.php?room={}">{}</a></figcaption></figure>"#,
                room.image, room.name, room.slug, room.name
            )
        })
        .collect();

    Fragment::new(format!(
        r#"{}<section class="gallery">{gallery}</section>"#,
        hero("/static/img/rooms.jpg", "Our rooms", "Three ways to stay.")
    ))
    .with_title(title("Rooms"))
}

fn rooms_showcase() -> Fragment {
    let rows: String = ROOMS
        .iter()
        .map(|room| {
            format!(
                r#"<tr data-animate="fade-left"><td>{}</td><td>€{}</td><td>{}</td></tr>"#,
                room.name, room.nightly_rate, room.summary
            )
        })
        .collect();

    Fragment::new(format!(
        r#"<section class="showcase"><h1>Compare rooms</h1><table>{rows}</table></section>"#
    ))
    .with_title(title("Compare rooms"))
}

fn room_detail(room: &Room) -> Fragment {
    Fragment::new(format!(
        r#"{}<section class="room-detail" data-animate="fade-up"><p>{}</p><p class="rate">€{} per night</p><a class="button" href="/booking.php?room={}">Book this room</a></section>"#,
        hero(room.image, room.name, "Room details"),
        room.summary,
        room.nightly_rate,
        room.slug
    ))
    .with_title(title(room.name))
}

fn restaurant() -> Fragment {
    Fragment::new(format!(
        r#"{}<section class="menu" data-animate="fade-up"><h2>Tonight</h2><p>Seasonal tasting menu, served from 19:00.</p></section><script>document.body.dataset.menu = "loaded";</script>"#,
        hero("/static/img/restaurant.jpg", "Restaurant", "Local produce, open kitchen.")
    ))
    .with_title(title("Restaurant"))
}

fn events() -> Fragment {
    Fragment::new(
        r#"<section class="events" data-animate="fade-up"><h1>Events</h1><p>Weddings and celebrations for up to 120 guests.</p><button class="button" data-modal-open="enquiry-modal">Enquire</button></section><div id="enquiry-modal" class="modal"><div class="modal-content"><button class="modal-close" data-modal-close="enquiry-modal">×</button><p>Write to events@hotel.test.</p></div></div>"#,
    )
    .with_title(title("Events"))
}

fn gym() -> Fragment {
    Fragment::new(format!(
        r#"{}<section class="hours" data-animate="fade-up"><h2>Opening hours</h2><p>Every day, 06:00 to 22:00.</p></section>"#,
        hero("/static/img/gym.jpg", "Gym", "Free for every guest.")
    ))
    .with_title(title("Gym"))
}

fn conference() -> Fragment {
    Fragment::new(
        r#"<section class="conference" data-animate="fade-up"><h1>Conference</h1><p>Four meeting rooms with daylight and video equipment.</p></section>"#,
    )
    .with_title(title("Conference"))
}

/// Every page the client router may request from `/api/content.php`.
pub fn fragment_server() -> FragmentServer {
    FragmentServer::new()
        .page(PageKey::Index, |_| async { Some(index()) })
        .page(PageKey::RoomsGallery, |_| async { Some(rooms_gallery()) })
        .page(PageKey::RoomsShowcase, |_| async { Some(rooms_showcase()) })
        .page(PageKey::Room, |query| async move {
            query.slug.as_deref().and_then(room).map(room_detail)
        })
        .page(PageKey::Restaurant, |_| async { Some(restaurant()) })
        .page(PageKey::Events, |_| async { Some(events()) })
        .page(PageKey::Gym, |_| async { Some(gym()) })
        .page(PageKey::Conference, |_| async { Some(conference()) })
}
