// Integration tests for the HTTP client.
//
// Each test starts a small HTTP/1.1 server on a random local port that
// answers from a fixed route table, then drives the public client API
// against it with the real reqwest transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Url;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use wattpad_core::cache::ResponseCache;
use wattpad_core::{HtmlContent, HtmlStyle, WattpadClient, WattpadError};

// ===========================================================================
// Mock server
// ===========================================================================

struct MockServer {
    base: Url,
    hits: Arc<AtomicUsize>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

/// Route table: request target (path + query) -> (status line, body).
type Routes = HashMap<String, (&'static str, String)>;

async fn start_server(routes: Routes) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let user_agents = Arc::new(Mutex::new(Vec::new()));

    let routes = Arc::new(routes);
    let server_hits = hits.clone();
    let server_agents = user_agents.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            let hits = server_hits.clone();
            let agents = server_agents.clone();

            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                hits.fetch_add(1, Ordering::SeqCst);

                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                if let Some(ua) = request
                    .lines()
                    .find_map(|l| l.strip_prefix("user-agent: ").or_else(|| l.strip_prefix("User-Agent: ")))
                {
                    agents.lock().unwrap().push(ua.to_string());
                }

                let (status, body) = routes
                    .get(&target)
                    .cloned()
                    .unwrap_or(("404 Not Found", String::from("missing")));
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            });
        }
    });

    MockServer {
        base: Url::parse(&format!("http://{addr}/")).unwrap(),
        hits,
        user_agents,
    }
}

fn target(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}

fn story_body() -> String {
    json!({
        "id": "42",
        "title": "Mock Story",
        "description": "Served locally.",
        "url": "https://www.wattpad.com/story/mock-story-42",
        "user": { "name": "Mock Author", "username": "mocker" },
        "isPaywalled": true,
        "lastPublishedPart": { "id": 2, "createDate": "2024-01-02T03:04:05Z" },
        "parts": [
            { "id": 1, "title": "Chapter 1", "text_url": { "text": "/apiv2/?m=storytext&id=1" } }
        ],
        "tags": ["mock"]
    })
    .to_string()
}

fn uncached_client(server: &MockServer) -> WattpadClient {
    WattpadClient::builder()
        .base_url(server.base.clone())
        .use_cache(false)
        .user_agent("integration-test/1.0")
        .build()
        .unwrap()
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn fetches_story_over_http() {
    let base = Url::parse("http://placeholder/").unwrap();
    let mut routes = Routes::new();
    routes.insert(
        target(&wattpad_core::urls::story_by_id(&base, 42)),
        ("200 OK", story_body()),
    );
    let server = start_server(routes).await;
    let client = uncached_client(&server);

    let story = client.get_story_by_id(42).await.unwrap();
    assert_eq!(story.id, 42);
    assert_eq!(story.title, "Mock Story");
    assert_eq!(story.author.username, "mocker");
    assert_eq!(story.url.as_deref(), Some("https://www.wattpad.com/story/mock-story"));
    assert!(story.is_paywalled);
    assert_eq!(story.tags, vec!["mock"]);

    let agents = server.user_agents.lock().unwrap();
    assert_eq!(agents.as_slice(), ["integration-test/1.0"]);
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let server = start_server(Routes::new()).await;
    let client = uncached_client(&server);

    let err = client.get_story_by_id(7).await.unwrap_err();
    match err {
        WattpadError::NotFound { url } => assert!(url.contains("/api/v3/stories/7")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_api_error() {
    let base = Url::parse("http://placeholder/").unwrap();
    let mut routes = Routes::new();
    routes.insert(
        target(&wattpad_core::urls::story_by_id(&base, 8)),
        ("500 Internal Server Error", "boom".to_string()),
    );
    let server = start_server(routes).await;
    let client = uncached_client(&server);

    let err = client.get_story_by_id(8).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("HTTP Error: 500 Internal Server Error for URL: "), "{msg}");
}

#[tokio::test]
async fn renders_part_text_with_images() {
    let mut routes = Routes::new();
    routes.insert(
        "/apiv2/?m=storytext&id=1".to_string(),
        (
            "200 OK",
            concat!(
                r#"<p data-p-id="p1">It was <i>dark</i>.</p>"#,
                r#"<p data-p-id="p2"><img src="/images/map.png"></p>"#,
            )
            .to_string(),
        ),
    );
    let server = start_server(routes).await;
    let client = uncached_client(&server);
    let story: wattpad_core::Story =
        wattpad_core::Story::from_json(&serde_json::from_str(&story_body()).unwrap()).unwrap();

    let page = client.render_part(&story.parts[0]).await.unwrap();
    assert_eq!(page.title, "Chapter 1");
    assert_eq!(page.content.len(), 2);

    let words = page.content[0].words().unwrap();
    assert!(words.iter().any(|w| w.data == "dark" && w.style == HtmlStyle::Italic));
    assert_eq!(
        page.content[1],
        HtmlContent::Image(format!("{}images/map.png", server.base))
    );
    assert_eq!(
        page.full_text(),
        format!("It was dark.\n\n[Image: {}images/map.png]", server.base)
    );
}

#[tokio::test]
async fn disk_cache_survives_client_restart() {
    let base = Url::parse("http://placeholder/").unwrap();
    let mut routes = Routes::new();
    routes.insert(
        target(&wattpad_core::urls::story_by_id(&base, 42)),
        ("200 OK", story_body()),
    );
    let server = start_server(routes).await;
    let cache_dir = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        let client = WattpadClient::builder()
            .base_url(server.base.clone())
            .cache_directory(cache_dir.path())
            .build()
            .unwrap();
        let story = client.get_story_by_id(42).await.unwrap();
        assert_eq!(story.title, "Mock Story");
    }

    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn api_error_payload_is_not_cached() {
    let base = Url::parse("http://placeholder/").unwrap();
    let mut routes = Routes::new();
    routes.insert(
        target(&wattpad_core::urls::story_by_id(&base, 9)),
        ("200 OK", r#"{"error":"Story is private","code":403}"#.to_string()),
    );
    let server = start_server(routes).await;
    let client = WattpadClient::builder()
        .base_url(server.base.clone())
        .cache(ResponseCache::open_in_memory().unwrap())
        .build()
        .unwrap();

    for _ in 0..2 {
        let err = client.get_story_by_id(9).await.unwrap_err();
        assert!(matches!(err, WattpadError::Api { .. }));
    }
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn search_stories_over_http() {
    let base = Url::parse("http://placeholder/").unwrap();
    let mut routes = Routes::new();
    routes.insert(
        target(&wattpad_core::urls::search_stories(&base, "dragons", false, 3)),
        (
            "200 OK",
            json!({
                "stories": [{ "id": "5", "title": "Dragon Tales", "numParts": 12 }],
                "total": 1
            })
            .to_string(),
        ),
    );
    let server = start_server(routes).await;
    let client = uncached_client(&server);

    let results = client.search_stories("dragons", false, 3).await.unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.stories[0].title, "Dragon Tales");
    assert_eq!(results.stories[0].num_parts, 12);
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // Bind and immediately drop a listener to get a port nobody serves.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = WattpadClient::builder()
        .base_url(Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap())
        .use_cache(false)
        .build()
        .unwrap();

    let err = client.get_story_by_id(1).await.unwrap_err();
    assert!(matches!(err, WattpadError::Network { .. }), "{err:?}");
}
