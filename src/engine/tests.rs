//! Tests for engine module

use super::*;
use crate::auth::{Credentials, TokenStore};
use crate::catalog::Catalog;
use crate::decode::RecordLocation;
use crate::http::{ExecutorConfig, RetryPolicy};
use crate::types::FieldValue;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn fetcher(server: &MockServer, page_size: u32) -> ResourceFetcher {
    let credentials = Credentials::new("id", "secret", "scope", format!("{}/token", server.uri()));
    let config = ExecutorConfig::builder()
        .base_url(server.uri())
        .retry(RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .build();
    let executor =
        RequestExecutor::new(config, Arc::new(TokenStore::new(credentials))).unwrap();
    ResourceFetcher::new(Arc::new(executor), page_size)
}

fn page_body(start: usize, count: usize) -> Value {
    let records: Vec<Value> = (start..start + count)
        .map(|i| json!({"No": format!("{i:05}"), "Unit_Price": 1.10}))
        .collect();
    json!({ "value": records })
}

async fn resource_requests(server: &MockServer, resource: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == resource)
        .collect()
}

fn query_of(request: &Request) -> HashMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

fn descriptor(name: &str) -> ResourceDescriptor {
    Catalog::builtin().unwrap().get(name).unwrap().clone()
}

// ============================================================================
// FetchStats Tests
// ============================================================================

#[test]
fn test_fetch_stats_default() {
    let stats = FetchStats::new();
    assert_eq!(stats.records, 0);
    assert_eq!(stats.pages, 0);
    assert_eq!(stats.duration_ms, 0);
}

#[test]
fn test_fetch_stats_merge() {
    let mut total = FetchStats::new();
    let mut one = FetchStats::new();
    one.add_page();
    one.add_records(10);
    one.set_duration(5);

    total.merge(&one);
    total.merge(&one);

    assert_eq!(total.pages, 2);
    assert_eq!(total.records, 20);
    assert_eq!(total.duration_ms, 10);
}

// ============================================================================
// Query Building Tests
// ============================================================================

#[tokio::test]
async fn test_query_for_incremental_resource_with_cursor() {
    let server = MockServer::start().await;
    let fetcher = fetcher(&server, 5000);
    let clients = descriptor("clients");
    let cursor = ReplicationCursor::new("lastModifiedDateTime", "2024-03-01T10:00:00Z");

    let query = fetcher.build_query(&clients, Some(&cursor), &PageState::new(5000));

    assert_eq!(
        query.to_pairs(),
        vec![
            ("$top", "5000".to_string()),
            ("$orderby", "lastModifiedDateTime asc".to_string()),
            (
                "$filter",
                "lastModifiedDateTime gt 2024-03-01T10:00:00Z and eCommerce eq false".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_query_for_incremental_resource_without_cursor() {
    let server = MockServer::start().await;
    let fetcher = fetcher(&server, 100);

    let query = fetcher.build_query(&descriptor("products"), None, &PageState::new(100));

    assert_eq!(query.order_by.as_deref(), Some("Last_Date_Modified asc"));
    assert!(query.filter.is_none());
}

#[tokio::test]
async fn test_query_for_filter_override() {
    let server = MockServer::start().await;
    let fetcher = fetcher(&server, 100);

    let query = fetcher.build_query(&descriptor("prices"), None, &PageState::new(100));

    assert!(query.order_by.is_none());
    assert_eq!(query.filter.as_deref(), Some("Price_List_Code eq '01'"));
}

#[tokio::test]
async fn test_custom_filter_builder_replaces_default() {
    let server = MockServer::start().await;
    let fetcher = fetcher(&server, 100).with_filter_builder(|descriptor, _cursor| {
        Some(format!("Source eq '{}'", descriptor.name))
    });
    let cursor = ReplicationCursor::new("Last_Date_Modified", "2024-01-01");

    let query = fetcher.build_query(&descriptor("products"), Some(&cursor), &PageState::new(100));

    assert!(query.order_by.is_none());
    assert_eq!(query.filter.as_deref(), Some("Source eq 'products'"));
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_all_two_pages() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 1000)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param("$skip", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1000, 300)))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, 1000);
    let (records, stats) = fetcher.fetch_all(&descriptor("units"), None).await.unwrap();

    assert_eq!(records.len(), 1300);
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.records, 1300);
    assert_eq!(records[1299].get("No"), Some(&FieldValue::from("01299")));
    assert_eq!(resource_requests(&server, "/ItemUnits").await.len(), 2);
}

#[tokio::test]
async fn test_fetch_stream_matches_fetch_all() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/Vendedor_Card"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 3)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Vendedor_Card"))
        .and(query_param("$skip", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 2)))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, 3);
    let sellers = descriptor("sellers");

    let streamed: Vec<Record> = fetcher
        .fetch(&sellers, None)
        .map(|r| r.unwrap())
        .collect()
        .await;
    let (all, _) = fetcher.fetch_all(&sellers, None).await.unwrap();

    assert_eq!(streamed.len(), 5);
    assert_eq!(streamed, all);
}

#[tokio::test]
async fn test_full_final_page_costs_one_empty_request() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 2)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .mount(&server)
        .await;

    let (records, stats) = fetcher(&server, 2)
        .fetch_all(&descriptor("units"), None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(stats.pages, 2);
}

#[tokio::test]
async fn test_continuation_marker_continues_short_page() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"Code": "PCS"}],
            "@odata.nextLink": "https://api/ItemUnits?$skip=10"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param("$skip", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"Code": "BOX"}]
        })))
        .mount(&server)
        .await;

    let (records, stats) = fetcher(&server, 10)
        .fetch_all(&descriptor("units"), None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(stats.pages, 2);
}

#[tokio::test]
async fn test_fetch_sends_cursor_filter_and_ordering() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/apiCustomerCards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"no": "C1", "lastModifiedDateTime": "2024-03-02T00:00:00Z"}]
        })))
        .mount(&server)
        .await;

    let cursor = ReplicationCursor::new("lastModifiedDateTime", "2024-03-01T00:00:00Z");
    let (records, _) = fetcher(&server, 100)
        .fetch_all(&descriptor("clients"), Some(&cursor))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    let requests = resource_requests(&server, "/apiCustomerCards").await;
    let query = query_of(&requests[0]);
    assert_eq!(query["$top"], "100");
    assert_eq!(query["$orderby"], "lastModifiedDateTime asc");
    assert_eq!(
        query["$filter"],
        "lastModifiedDateTime gt 2024-03-01T00:00:00Z and eCommerce eq false"
    );
    assert!(!query.contains_key("$skip"));
}

#[tokio::test]
async fn test_failed_page_ends_stream_without_its_records() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemCard"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 2)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemCard"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, 2);
    let products = descriptor("products");
    let items: Vec<Result<Record>> = fetcher.fetch(&products, None).collect().await;

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok());
    assert!(items[1].is_ok());
    assert!(matches!(
        items[2],
        Err(Error::HttpStatus { status: 404, .. })
    ));
    assert_eq!(resource_requests(&server, "/ItemCard").await.len(), 2);
}

#[tokio::test]
async fn test_custom_record_key_paginates_past_first_page() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"Code": "PCS"}, {"Code": "BOX"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"Code": "KG"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let decoder = RecordDecoder::with_location(RecordLocation::Key("items".to_string()));
    let (records, stats) = fetcher(&server, 2)
        .with_decoder(decoder)
        .fetch_all(&descriptor("units"), None)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(stats.pages, 2);
    assert_eq!(records[2].get("Code"), Some(&FieldValue::from("KG")));
}

#[tokio::test]
async fn test_fetch_pages_yields_one_item_per_page() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param_is_missing("$skip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 3)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ItemUnits"))
        .and(query_param("$skip", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 1)))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, 3);
    let units = descriptor("units");
    let pages: Vec<Vec<Record>> = fetcher
        .fetch_pages(&units, None)
        .map(|p| p.unwrap())
        .collect()
        .await;

    let sizes: Vec<_> = pages.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 1]);
}

#[tokio::test]
async fn test_stream_is_lazy_until_polled() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let fetcher = fetcher(&server, 10);
    let units = descriptor("units");
    let stream = fetcher.fetch(&units, None);
    drop(stream);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_page_is_fatal() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/ItemCard"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = fetcher(&server, 10)
        .fetch_all(&descriptor("products"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert!(err.to_string().contains("/ItemCard"));
}
