#![allow(missing_docs)]

use concierge_router::{Fragment, FragmentQuery, FragmentServer, PageKey};

fn hotel_server() -> FragmentServer {
    FragmentServer::new()
        .page(PageKey::Gym, |_query: FragmentQuery| async {
            Some(Fragment::new("<section>Gym</section>").with_title("Gym"))
        })
        .page(PageKey::Room, |query: FragmentQuery| async move {
            match query.slug.as_deref() {
                Some("deluxe-suite") => {
                    Some(Fragment::new("<section>Deluxe</section>").with_title("Deluxe Suite"))
                }
                _ => None,
            }
        })
}

#[tokio::test]
async fn test_known_page_returns_fragment_json() {
    let server = hotel_server();

    let response = server.handle_query("page=gym").await;
    assert_eq!(response.status, 200);

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["html"], "<section>Gym</section>");
    assert_eq!(body["title"], "Gym");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_room_slug_is_forwarded() {
    let server = hotel_server();

    let response = server.handle_query("page=room&slug=deluxe-suite").await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains("Deluxe"));

    let response = server.handle_query("page=room&slug=broom-closet").await;
    assert_eq!(response.status, 404);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_and_malformed_queries() {
    let server = hotel_server();

    assert_eq!(server.handle_query("page=spa").await.status, 404);
    assert_eq!(server.handle_query("").await.status, 400);
    assert!(server.has_page(&PageKey::Gym));
    assert!(!server.has_page(&PageKey::Events));
}

#[test]
#[should_panic(expected = "Failed to register fragment page 'gym'")]
fn test_duplicate_page_panics() {
    let _ = hotel_server().page(PageKey::Gym, |_query: FragmentQuery| async { None });
}
