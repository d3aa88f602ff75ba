//! Full HTML documents for direct loads and hard navigations.

use concierge_router::{Fragment, PageKey};

const NAV: [(&str, &str, PageKey); 6] = [
    ("/index.php", "Home", PageKey::Index),
    ("/rooms-gallery.php", "Rooms", PageKey::RoomsGallery),
    ("/restaurant.php", "Restaurant", PageKey::Restaurant),
    ("/events.php", "Events", PageKey::Events),
    ("/gym.php", "Gym", PageKey::Gym),
    ("/conference.php", "Conference", PageKey::Conference),
];

fn nav_links(current: &PageKey) -> String {
    let mut links: String = NAV
        .iter()
        .map(|(href, label, page)| {
            let class = if page.highlights_for(current) {
                r#" class="active""#
            } else {
                ""
            };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect();

    // Booking runs a multi-step form and always loads as a full page.
    links.push_str(r#"<a href="/booking.php" class="button">Book now</a>"#);
    links
}

/// Render `fragment` inside the persistent header and footer.
pub fn render_page(page: &PageKey, fragment: &Fragment) -> String {
    let title = fragment.title.as_deref().unwrap_or("Grand Concierge Hotel");
    let links = nav_links(page);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="/static/styles.css">
<script type="module" src="/static/init.js"></script>
</head>
<body>
<header>
<a class="brand" href="/index.php">Grand Concierge</a>
<nav class="nav-links">{links}</nav>
<div class="mobile-menu">{links}</div>
</header>
<div id="page-loader"></div>
<div id="spa-wrapper" class="spa-wrapper">{html}</div>
<footer>
<p>Grand Concierge Hotel</p>
<button class="button" data-modal-open="newsletter-modal">Newsletter</button>
<div id="newsletter-modal" class="modal"><div class="modal-content"><button class="modal-close" data-modal-close="newsletter-modal">×</button><p>Offers once a month, nothing else.</p></div></div>
</footer>
<button id="scroll-to-top" aria-label="Back to top">↑</button>
</body>
</html>
"#,
        html = fragment.html
    )
}
