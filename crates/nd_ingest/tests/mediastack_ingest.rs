use std::sync::Arc;

use nd_core::config::MediastackConfig;
use nd_core::{ArticleStorage, Category, Logger};
use nd_ingest::{IngestManager, MediastackClient};
use nd_storage::InMemoryStorage;
use nd_summary::SummaryGenerator;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload() -> serde_json::Value {
    json!({
        "pagination": {"limit": 10, "offset": 0, "count": 3, "total": 3},
        "data": [
            {
                "author": "Jane Doe",
                "title": "Frogs found in Peru",
                "description": "Scientists found a new frog.",
                "url": "https://news.test/frogs",
                "source": "Science Daily",
                "image": null,
                "category": "science",
                "language": "en",
                "country": "us",
                "published_at": "2024-11-06T10:58:00+00:00"
            },
            {
                "title": "Comet spotted",
                "description": "A comet is visible tonight. Look north.",
                "url": "https://news.test/comet",
                "published_at": "2024-11-06T09:00:00+0000"
            },
            {
                "title": "No link",
                "description": "This one has no url.",
                "published_at": "2024-11-06T08:00:00+00:00"
            }
        ]
    })
}

async fn mount(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/news"))
        .and(query_param("categories", "science"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/news"))
        .and(query_param("categories", "sports"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "invalid_access_key", "message": "You have not supplied a valid API Access Key."}
        })))
        .mount(server)
        .await;
}

fn manager(server: &MockServer, storage: Arc<InMemoryStorage>) -> IngestManager {
    let config = MediastackConfig {
        base_url: format!("{}/v1/news", server.uri()),
        access_key: "test-key".to_string(),
        ..Default::default()
    };
    let client = MediastackClient::new(&config).unwrap();
    IngestManager::new(
        storage,
        Arc::new(SummaryGenerator::default()),
        Arc::new(client),
        Logger::capturing(),
    )
    .with_categories(vec![Category::Science, Category::Sports])
}

#[tokio::test]
async fn test_repeated_cycles_do_not_duplicate() {
    let server = MockServer::start().await;
    mount(&server).await;
    let storage = Arc::new(InMemoryStorage::new());
    let manager = manager(&server, storage.clone());

    let first = manager.run_cycle().await;
    assert_eq!(first.created, 2);
    assert_eq!(first.failed, 1);
    assert_eq!(first.category_errors.len(), 1);
    assert_eq!(first.category_errors[0].category, Category::Sports);
    assert!(first.category_errors[0]
        .message
        .contains("API returned status code 401"));

    let second = manager.run_cycle().await;
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.failed, 1);

    let stored = storage.list_articles(None).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_stored_fields_follow_the_payload() {
    let server = MockServer::start().await;
    mount(&server).await;
    let storage = Arc::new(InMemoryStorage::new());
    manager(&server, storage.clone())
        .run_categories(&[Category::Science])
        .await;

    let stored = storage.list_articles(Some(Category::Science)).await.unwrap();
    let frogs = stored.iter().find(|a| a.url == "https://news.test/frogs").unwrap();
    assert_eq!(frogs.source, "Science Daily");
    assert_eq!(frogs.author.as_deref(), Some("Jane Doe"));
    assert_eq!(frogs.country.as_deref(), Some("us"));
    assert_eq!(frogs.summary, "Scientists found a new frog.");
    assert_eq!(frogs.extended_summary, "Scientists found a new frog.");

    let comet = stored.iter().find(|a| a.url == "https://news.test/comet").unwrap();
    assert_eq!(comet.source, "Unknown");
    assert_eq!(comet.extended_summary, "A comet is visible tonight. Look north.");
    assert!(frogs.published_at > comet.published_at);
    assert_eq!(stored[0].url, "https://news.test/frogs");
}

#[tokio::test]
async fn test_every_category_failing_is_visible_in_the_report() {
    let server = MockServer::start().await;
    mount(&server).await;
    let storage = Arc::new(InMemoryStorage::new());
    let report = manager(&server, storage)
        .run_categories(&[Category::Sports])
        .await;
    assert_eq!(report.created, 0);
    assert!(report.all_categories_failed(1));
}

#[tokio::test]
async fn test_malformed_item_is_counted_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/news"))
        .and(query_param("categories", "technology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "title": "Chip shortage eases",
                    "description": "Supply is back.",
                    "url": "https://news.test/chips",
                    "published_at": "2024-11-06T10:58:00+00:00"
                },
                {
                    "title": "Epoch timestamp",
                    "url": "https://news.test/epoch",
                    "published_at": 1730890680
                }
            ]
        })))
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryStorage::new());
    let manager = manager(&server, storage.clone()).with_categories(vec![Category::Technology]);

    let report = manager.run_cycle().await;
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, 1);
    assert!(report.category_errors.is_empty());

    let stored = storage.list_articles(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, "https://news.test/chips");
}
