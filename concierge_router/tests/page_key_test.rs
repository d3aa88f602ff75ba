#![allow(missing_docs)]

use concierge_router::{LinkCandidate, PageKey, SpaPolicy, Url};

#[test]
fn test_documented_page_keys() {
    assert_eq!(PageKey::from_path("/"), PageKey::Index);
    assert_eq!(PageKey::from_path("/index.php"), PageKey::Index);
    assert_eq!(PageKey::from_path("/room.php?room=deluxe-suite"), PageKey::Room);
    assert_eq!(PageKey::from_path("/rooms-gallery.php"), PageKey::RoomsGallery);

    let current = Url::parse("https://hotel.test/").unwrap();
    assert!(!SpaPolicy::default().is_eligible(&LinkCandidate::new("/admin/login.php"), &current));
}

#[test]
fn test_every_known_page_is_eligible_by_default() {
    let policy = SpaPolicy::default();
    let current = Url::parse("https://hotel.test/index.php").unwrap();

    for page in PageKey::KNOWN {
        let href = format!("/{page}.php");
        let target = policy.evaluate(&LinkCandidate::new(&href), &current).unwrap();
        assert_eq!(target.page, page);
    }
}

#[test]
fn test_policy_deserializes_with_defaults() {
    let policy: SpaPolicy =
        serde_json::from_str(r#"{ "allow": ["gym", "events"], "deny": ["gym"] }"#).unwrap();

    assert_eq!(policy.allow, vec![PageKey::Gym, PageKey::Events]);
    assert_eq!(policy.admin_segment, "admin");

    let current = Url::parse("https://hotel.test/").unwrap();
    assert!(!policy.is_eligible(&LinkCandidate::new("/gym.php"), &current));
    assert!(policy.is_eligible(&LinkCandidate::new("/events.php"), &current));
    assert!(!policy.is_eligible(&LinkCandidate::new("/restaurant.php"), &current));
}
