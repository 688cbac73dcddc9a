use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_test::TestServer;
use gallery_explorer::{
    CollectionConfig, Config, InitialItemConfig, create_app, explorer::SESSION_COOKIE,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Deserialize)]
struct HostQuery {
    max_results: usize,
}

/// Stand-in for the media host. `flaky` fails the first request only.
async fn spawn_media_host() -> (SocketAddr, Arc<AtomicUsize>) {
    let flaky_calls = Arc::new(AtomicUsize::new(0));
    let counter = flaky_calls.clone();

    let app = Router::new().route(
        "/api/cloudinary/{folder}",
        get(move |Path(folder): Path<String>, Query(query): Query<HostQuery>| {
            let counter = counter.clone();
            async move {
                let (count, total) = match folder.as_str() {
                    "summer-gala" => (50, 200),
                    "spring" => (25, 25),
                    "empty" => (0, 0),
                    "down" => return (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
                    "flaky" => {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            return (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response();
                        }
                        (3, 3)
                    }
                    _ => return StatusCode::NOT_FOUND.into_response(),
                };

                let images: Vec<_> = (1..=count.min(query.max_results))
                    .map(|i| {
                        serde_json::json!({
                            "url": format!("https://cdn.example.com/{}/img_{}.jpg", folder, i),
                            "publicId": format!("events/{}/img_{}", folder, i),
                        })
                    })
                    .collect();
                Json(serde_json::json!({ "images": images, "total": total })).into_response()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, flaky_calls)
}

fn collection(id: &str, title: &str) -> CollectionConfig {
    CollectionConfig {
        id: id.to_string(),
        title: title.to_string(),
        description: "Highlights from the evening.".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2024, 6, 21),
        initial_items: Vec::new(),
        initial_total_count: None,
    }
}

fn create_test_config(host: SocketAddr) -> Config {
    let mut config = Config::default();
    config.templates.directory = PathBuf::from("templates");
    config.media.api_base = format!("http://{}/api/cloudinary", host);
    config.media.settle_delay_ms = 0;
    config.media.endpoints = HashMap::from([
        ("2".to_string(), "summer-gala".to_string()),
        ("1".to_string(), "spring".to_string()),
    ]);

    let mut offline = collection("offline", "Offline Party");
    offline.initial_items = vec![InitialItemConfig {
        url: "https://cdn.example.com/offline/cover.jpg".to_string(),
        public_id: None,
    }];
    config.media.endpoints.insert("offline".to_string(), "down".to_string());

    config.collections = vec![
        collection("1", "Spring Launch"),
        collection("2", "Summer Gala"),
        collection("empty", "Quiet Evening"),
        collection("flaky", "Autumn Mixer"),
        offline,
    ];
    config
}

async fn test_server() -> (TestServer, Arc<AtomicUsize>) {
    let (host, flaky_calls) = spawn_media_host().await;
    let app = create_app(create_test_config(host)).await;
    (TestServer::new(app).unwrap(), flaky_calls)
}

#[tokio::test]
async fn test_index_lists_collections() {
    let (server, _) = test_server().await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let html = response.text();
    assert!(html.contains("Spring Launch"));
    assert!(html.contains("href=\"/gallery/2\""));
    assert!(html.contains("June 21, 2024"));
}

#[tokio::test]
async fn test_gallery_page_renders_first_page() {
    let (server, _) = test_server().await;

    let response = server.get("/gallery/1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let cookie = response.cookie(SESSION_COOKIE);
    assert!(!cookie.value().is_empty());

    let html = response.text();
    assert!(html.contains("<h1>Spring Launch</h1>"));
    assert!(html.contains("<p>Highlights from the evening.</p>"));
    assert!(html.contains("https://cdn.example.com/spring/img_1.jpg"));
    assert!(html.contains("https://cdn.example.com/spring/img_12.jpg"));
    assert!(!html.contains("https://cdn.example.com/spring/img_13.jpg"));
    assert!(html.contains("loading=\"lazy\""));
    assert!(html.contains("Spring Launch - Foto 1"));
    assert!(html.contains("aria-current=\"page\">1</span>"));
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let (server, _) = test_server().await;

    let response = server.get("/gallery/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/gallery/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_bound_snapshot() {
    let (server, _) = test_server().await;

    let response = server.get("/api/gallery/2").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["loaded_count"], 50);
    assert_eq!(json["total_count"], 200);
    assert_eq!(json["total_pages"], 17);
    assert_eq!(json["view"], "grid");
    assert_eq!(json["cards"].as_array().unwrap().len(), 12);

    let cookie = response.cookie(SESSION_COOKIE);
    let response = server
        .post("/api/gallery/2/page/9")
        .add_cookie(cookie.clone())
        .await;
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["current_page"], 9);
    assert_eq!(json["view"], "empty");
    assert!(json["cards"].as_array().unwrap().is_empty());

    let pagination = json["pagination"].as_array().unwrap();
    assert_eq!(pagination.first().unwrap()["page"], 1);
    assert_eq!(pagination.last().unwrap()["page"], 17);
    assert!(pagination.iter().any(|item| item["kind"] == "ellipsis"));

    let html = server
        .get("/gallery/2?page=9")
        .add_cookie(cookie)
        .await
        .text();
    assert!(html.contains("No photos are available on this page."));
}

#[tokio::test]
async fn test_empty_collection_state() {
    let (server, _) = test_server().await;

    let json = server
        .get("/api/gallery/empty")
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["view"], "empty");
    assert_eq!(json["total_pages"], 1);
    assert_eq!(json["offer_retry"], false);

    let html = server.get("/gallery/empty").await.text();
    assert!(html.contains("There are no photos in this collection yet."));
    assert!(!html.contains("Try again"));
}

#[tokio::test]
async fn test_failed_fetch_shows_fallback_and_retry() {
    let (server, _) = test_server().await;

    let response = server.get("/gallery/offline").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();
    assert!(html.contains("Try again"));
    assert!(html.contains("https://cdn.example.com/offline/cover.jpg"));

    let (server, flaky_calls) = test_server().await;
    let response = server.get("/api/gallery/flaky").await;
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["view"], "error");
    assert_eq!(json["show_grid"], false);

    let json = server
        .post("/api/gallery/flaky/retry")
        .add_cookie(response.cookie(SESSION_COOKIE))
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["view"], "grid");
    assert_eq!(json["loaded_count"], 3);
    assert_eq!(flaky_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lightbox_crosses_pages() {
    let (server, _) = test_server().await;

    let response = server.get("/api/gallery/1").await;
    let cookie = response.cookie(SESSION_COOKIE);

    let json = server
        .post("/api/gallery/1/lightbox/open/12")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["lightbox"]["ordinal"], 12);
    assert_eq!(json["body_scroll_locked"], true);

    let json = server
        .post("/api/gallery/1/lightbox/navigate/next")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["current_page"], 2);
    assert_eq!(json["lightbox"]["ordinal"], 13);
    assert_eq!(
        json["lightbox"]["resolved_url"],
        "https://res.cloudinary.com/demo/image/upload/w_1200,h_1200,c_limit,q_auto/img_13"
    );

    let json = server
        .post("/api/gallery/1/lightbox/failed")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["lightbox"]["failed"], true);

    let html = server
        .get("/gallery/1")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("Image unavailable"));
    assert!(html.contains("class=\"no-scroll\""));

    let json = server
        .delete("/api/gallery/1/lightbox")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert!(json["lightbox"].is_null());
    assert_eq!(json["body_scroll_locked"], false);

    let response = server
        .post("/api/gallery/1/lightbox/open/99")
        .add_cookie(cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_page_query_keeps_lightbox_navigating() {
    let (server, _) = test_server().await;

    let response = server.get("/gallery/1?page=1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let cookie = response.cookie(SESSION_COOKIE);

    server
        .post("/api/gallery/1/lightbox/open/12")
        .add_cookie(cookie.clone())
        .await;
    let json = server
        .post("/api/gallery/1/lightbox/navigate/next")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["current_page"], 2);
    assert_eq!(json["lightbox"]["ordinal"], 13);

    let html = server
        .get("/gallery/1?page=1")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("aria-current=\"page\">2</span>"));
    assert!(html.contains("window.location.replace(window.location.pathname)"));

    let json = server
        .post("/api/gallery/1/lightbox/navigate/next")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["current_page"], 2);
    assert_eq!(json["lightbox"]["ordinal"], 14);

    let json = server
        .delete("/api/gallery/1/lightbox")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert!(json["lightbox"].is_null());

    let json = server
        .get("/api/gallery/1?page=1")
        .add_cookie(cookie)
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["current_page"], 1);
}

#[tokio::test]
async fn test_titles_are_escaped_in_markup() {
    let (host, _) = spawn_media_host().await;
    let mut config = create_test_config(host);
    config.collections[0].title = "The \"Launch\" <Night>".to_string();
    let server = TestServer::new(create_app(config).await).unwrap();

    let html = server.get("/gallery/1").await.text();
    assert!(html.contains("alt=\"The &quot;Launch&quot; &lt;Night&gt; - Foto 1\""));
    assert!(!html.contains("<Night>"));
}

#[tokio::test]
async fn test_card_failure_renders_placeholder() {
    let (server, _) = test_server().await;
    let cookie = server.get("/api/gallery/1").await.cookie(SESSION_COOKIE);

    let json = server
        .post("/api/gallery/1/cards/2/failed")
        .add_cookie(cookie.clone())
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["cards"][1]["status"], "errored");
    assert_eq!(json["cards"][0]["status"], "pending");

    let html = server
        .get("/gallery/1")
        .add_cookie(cookie.clone())
        .await
        .text();
    assert!(html.contains("Image unavailable"));
    assert!(!html.contains("https://cdn.example.com/spring/img_2.jpg"));

    let response = server
        .post("/api/gallery/1/cards/77/loaded")
        .add_cookie(cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_switching_collection_resets_viewer() {
    let (server, _) = test_server().await;
    let cookie = server.get("/api/gallery/1").await.cookie(SESSION_COOKIE);

    server
        .post("/api/gallery/1/lightbox/open/20")
        .add_cookie(cookie.clone())
        .await;

    let json = server
        .get("/api/gallery/2")
        .add_cookie(cookie)
        .await
        .json::<serde_json::Value>();
    assert_eq!(json["collection_id"], "2");
    assert_eq!(json["current_page"], 1);
    assert!(json["lightbox"].is_null());
    assert_eq!(json["cards"][0]["title"], "Summer Gala - Foto 1");
}
