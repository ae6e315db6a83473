//! HTTP transport against a wiremock server

use crate::common::{http_transport, mock_config, signal};
use crate::{assert_completed, assert_err, assert_ok, assert_queue_len};
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tradejournal_sync::journal_app::api_client::{
    HttpTransport, TradeSource, Transport, TransportError,
};
use tradejournal_sync::journal_app::local_db::MemoryStore;
use tradejournal_sync::journal_app::offline::{OfflineQueue, Operation};
use tradejournal_sync::shared::trade::sample_trades;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_send_prefixes_api_path_and_sets_auth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/trades/t1"))
        .and(header("Authorization", "Bearer secret"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({ "tags": ["a"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = mock_config(&server);
    config.set_token(Some("secret".to_string()));
    let transport = HttpTransport::new(config);

    let status = assert_ok!(
        transport
            .send(Method::PUT, "/trades/t1", Some(&json!({ "tags": ["a"] })))
            .await
    );
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let transport = http_transport(&server);
    let status = assert_ok!(transport.send(Method::POST, "/trades", None).await);
    assert_eq!(status, 500);
}

#[tokio::test]
async fn test_fetch_trades() {
    let server = MockServer::start().await;
    let trades = sample_trades();
    Mock::given(method("GET"))
        .and(path("/api/trades"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&trades))
        .mount(&server)
        .await;

    let fetched = assert_ok!(http_transport(&server).fetch_trades().await);
    assert_eq!(fetched, trades);
}

#[tokio::test]
async fn test_fetch_trades_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/trades"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    assert_err!(
        http_transport(&server).fetch_trades().await,
        TransportError::Status { status: 401, .. }
    );
}

#[tokio::test]
async fn test_queue_replays_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/trades/t1/journal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/trades/t2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let queue = OfflineQueue::new(
        Arc::new(MemoryStore::new()),
        http_transport(&server),
        signal(true),
    );
    assert_ok!(
        queue
            .enqueue(assert_ok!(Operation::create(
                "/trades/t1/journal",
                &json!({ "journal": "note" })
            )))
            .await
    );
    assert_ok!(queue.enqueue(Operation::delete("/trades/t2")).await);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(report.delivered, 2);
    assert_queue_len!(queue, 0);

    let requests = server.received_requests().await.unwrap();
    let first: Value = requests[0].body_json().unwrap();
    assert_eq!(first, json!({ "journal": "note" }));
    assert!(requests[1].body.is_empty());
}
