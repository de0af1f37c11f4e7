use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use nd_core::config::MediastackConfig;
use nd_core::{Category, Logger};
use nd_ingest::{IngestManager, MediastackClient};
use nd_storage::InMemoryStorage;
use nd_summary::SummaryGenerator;
use nd_web::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state() -> AppState {
    AppState::new(
        Arc::new(InMemoryStorage::new()),
        Arc::new(SummaryGenerator::default()),
        Logger::capturing(),
    )
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn article_body(url: &str, category: &str, published_at: &str) -> Value {
    json!({
        "title": format!("Story at {}", url),
        "url": url,
        "source": "Wire",
        "category": category,
        "summary": "The lead sentence.",
        "content": "A second sentence. A third one.",
        "published_at": published_at
    })
}

#[tokio::test]
async fn test_health() {
    let app = create_app(state());
    let (status, body) = send_json(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = create_app(state());

    let (status, created) = send_json(
        &app,
        Method::POST,
        "/api/articles",
        Some(article_body("https://news.test/a", "science", "2024-11-06T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created["extended_summary"],
        "The lead sentence. A second sentence. A third one."
    );
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/articles",
        Some(article_body("https://news.test/a", "science", "2024-11-06T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/articles",
        Some(article_body("not a url", "science", "2024-11-06T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, patched) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/articles/{}", id),
        Some(json!({"title": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Renamed");
    assert_eq!(patched["source"], "Wire");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/articles/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send_json(&app, Method::GET, &format!("/api/articles/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Article not found", "status": "error"}));
}

#[tokio::test]
async fn test_listing_filters_by_category() {
    let app = create_app(state());
    for (url, category, at) in [
        ("https://news.test/1", "science", "2024-11-06T08:00:00Z"),
        ("https://news.test/2", "sports", "2024-11-06T09:00:00Z"),
        ("https://news.test/3", "science", "2024-11-06T10:00:00Z"),
    ] {
        let (status, _) = send_json(&app, Method::POST, "/api/articles", Some(article_body(url, category, at))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = send_json(&app, Method::GET, "/api/articles", None).await;
    let urls: Vec<&str> = all.as_array().unwrap().iter().map(|a| a["url"].as_str().unwrap()).collect();
    assert_eq!(urls, vec!["https://news.test/3", "https://news.test/2", "https://news.test/1"]);

    let (_, science) = send_json(&app, Method::GET, "/api/articles?category=science", None).await;
    assert_eq!(science.as_array().unwrap().len(), 2);

    let (status, unknown) = send_json(&app, Method::GET, "/api/articles?category=weather", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, json!([]));
}

#[tokio::test]
async fn test_comments() {
    let app = create_app(state());
    let (_, created) = send_json(
        &app,
        Method::POST,
        "/api/articles",
        Some(article_body("https://news.test/c", "general", "2024-11-06T10:00:00Z")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/comments",
        Some(json!({"article_id": id, "content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Comment content is required", "status": "error"}));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/comments",
        Some(json!({"article_id": 999, "content": "Hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Article not found");

    let (status, body) = send_json(&app, Method::POST, "/api/comments", Some(json!({"content": "Hi"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Article not found", "status": "error"}));

    let (status, _) = send_json(&app, Method::POST, "/api/comments", Some(json!({"content": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, comment) = send_json(
        &app,
        Method::POST,
        "/api/comments",
        Some(json!({"article_id": id, "content": "  Nice piece ", "username": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "Nice piece");
    assert_eq!(comment["username"], "Anonymous");

    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/api/articles/{}/comments", id),
        Some(json!({"content": "Second", "username": "amy"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = send_json(&app, Method::GET, &format!("/api/comments?article_id={}", id), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (_, detail) = send_json(&app, Method::GET, &format!("/api/articles/{}", id), None).await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 2);

    let comment_id = comment["id"].as_i64().unwrap();
    let (status, _) = send(&app, Method::DELETE, &format!("/api/comments/{}", comment_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/comments/{}", comment_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_html_views_escape_content() {
    let app = create_app(state());
    let mut body = article_body("https://news.test/x", "health", "2024-11-06T10:00:00Z");
    body["title"] = json!("<b>Bold</b> claim");
    let (_, created) = send_json(&app, Method::POST, "/api/articles", Some(body)).await;
    let id = created["id"].as_i64().unwrap();

    let (status, html) = send(&app, Method::GET, "/?category=health", None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt; claim"));
    assert!(html.contains("class=\"selected\""));

    let (status, html) = send(&app, Method::GET, &format!("/articles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(html).unwrap().contains("The lead sentence."));

    let (status, _) = send(&app, Method::GET, "/articles/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fetch_news_without_key() {
    let app = create_app(state());
    let (status, body) = send_json(&app, Method::POST, "/api/fetch-news", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");

    let (status, _) = send(&app, Method::GET, "/api/fetch-news", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_fetch_news_runs_a_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "title": "Launch",
                "description": "The rocket launched.",
                "url": "https://news.test/launch",
                "published_at": "2024-11-06T10:58:00+00:00"
            }]
        })))
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryStorage::new());
    let summarizer = Arc::new(SummaryGenerator::default());
    let client = MediastackClient::new(&MediastackConfig {
        base_url: format!("{}/v1/news", server.uri()),
        access_key: "key".to_string(),
        ..Default::default()
    })
    .unwrap();
    let manager = IngestManager::new(storage.clone(), summarizer.clone(), Arc::new(client), Logger::new())
        .with_categories(vec![Category::Science, Category::Technology]);
    let app = create_app(AppState::new(storage, summarizer, Logger::new()).with_ingest(manager));

    let (status, body) = send_json(&app, Method::POST, "/api/fetch-news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["report"]["created"], 1);
    assert_eq!(body["report"]["skipped"], 1);

    let (_, listed) = send_json(&app, Method::GET, "/api/articles", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_news_all_categories_failing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryStorage::new());
    let summarizer = Arc::new(SummaryGenerator::default());
    let client = MediastackClient::new(&MediastackConfig {
        base_url: format!("{}/v1/news", server.uri()),
        access_key: "key".to_string(),
        ..Default::default()
    })
    .unwrap();
    let manager = IngestManager::new(storage.clone(), summarizer.clone(), Arc::new(client), Logger::new())
        .with_categories(vec![Category::Sports]);
    let app = create_app(AppState::new(storage, summarizer, Logger::new()).with_ingest(manager));

    let (status, body) = send_json(&app, Method::POST, "/api/fetch-news", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["report"]["category_errors"][0]["category"], "sports");
}
