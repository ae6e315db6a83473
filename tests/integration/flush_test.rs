//! Queue manager: enqueue, ordered replay, retry ceiling, rejection

use crate::common::{memory_queue, memory_queue_with_policy, signal, Reply, ScriptedTransport};
use crate::{assert_completed, assert_err, assert_ok, assert_queue_len};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Notify;
use tradejournal_sync::journal_app::api_client::{Transport, TransportError};
use tradejournal_sync::journal_app::local_db::MemoryStore;
use tradejournal_sync::journal_app::offline::{
    FlushOutcome, FlushReport, OfflineQueue, Operation, OperationType, RetryPolicy,
};
use tradejournal_sync::journal_app::SyncError;
use tradejournal_sync::shared::SharedError;

fn update(id: &str) -> Operation {
    Operation::new(
        OperationType::Update,
        format!("/trades/{}", id),
        json!({ "exitReason": "target" }),
    )
}

#[tokio::test]
async fn test_enqueue_appends_with_zero_retries() {
    let queue = memory_queue(ScriptedTransport::always(Reply::Status(200)), false);

    for n in 1..=3 {
        let item = assert_ok!(queue.enqueue(update(&n.to_string())).await);
        assert_eq!(item.retries, 0);
        assert_queue_len!(queue, n);
    }
}

#[tokio::test]
async fn test_malformed_operation_surfaces() {
    let queue = memory_queue(ScriptedTransport::always(Reply::Status(200)), false);
    assert_err!(queue.enqueue(Operation::delete("")).await, SyncError::Shared(SharedError::InvalidEndpoint { .. }));
    assert_queue_len!(queue, 0);
}

#[tokio::test]
async fn test_replay_is_fifo() {
    let transport = ScriptedTransport::always(Reply::Status(200));
    let queue = memory_queue(transport.clone(), true);

    assert_ok!(queue.enqueue(Operation::create("/trades", &json!({"id": "t1"})).unwrap()).await);
    assert_ok!(queue.enqueue(update("t1")).await);
    assert_ok!(queue.enqueue(Operation::delete("/trades/t1")).await);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(report.delivered, 3);

    let methods: Vec<Method> = transport.calls().into_iter().map(|c| c.method).collect();
    assert_eq!(methods, vec![Method::POST, Method::PUT, Method::DELETE]);
    assert_eq!(
        transport.endpoints(),
        vec!["/trades", "/trades/t1", "/trades/t1"]
    );
    assert_queue_len!(queue, 0);
}

#[tokio::test]
async fn test_success_removes_only_the_delivered_item() {
    let transport =
        ScriptedTransport::scripted(vec![Reply::Status(201), Reply::Status(500)], Reply::Status(200));
    let queue = memory_queue(transport, true);

    let x = assert_ok!(queue.enqueue(update("x")).await);
    let y = assert_ok!(queue.enqueue(update("y")).await);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(
        report,
        FlushReport {
            attempted: 2,
            delivered: 1,
            retried: 1,
            dropped: 0,
            rejected: 0,
        }
    );

    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].id, y.id);
    assert_ne!(items[0].id, x.id);
    assert_eq!(items[0].retries, 1);
}

#[tokio::test]
async fn test_persistent_server_error_drops_after_three_flushes() {
    let transport = ScriptedTransport::always(Reply::Status(500));
    let queue = memory_queue(transport.clone(), true);
    let item = assert_ok!(queue.enqueue(update("t1")).await);

    assert_ok!(queue.flush_queue().await);
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 1);

    assert_ok!(queue.flush_queue().await);
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 2);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(report.dropped, 1);
    assert_queue_len!(queue, 0);

    // Never replayed again
    assert_ok!(queue.flush_queue().await);
    assert_eq!(transport.call_count(), 3);
    assert!(transport.calls().iter().all(|c| c.endpoint == item.endpoint()));
}

#[tokio::test]
async fn test_network_errors_count_like_http_errors() {
    let transport = ScriptedTransport::always(Reply::NetworkDown);
    let queue = memory_queue(transport, true);
    assert_ok!(queue.enqueue(update("t1")).await);

    for _ in 0..3 {
        assert_ok!(queue.flush_queue().await);
    }
    assert_queue_len!(queue, 0);
}

#[tokio::test]
async fn test_failure_does_not_block_later_items() {
    let transport =
        ScriptedTransport::scripted(vec![Reply::NetworkDown], Reply::Status(204));
    let queue = memory_queue(transport.clone(), true);
    assert_ok!(queue.enqueue(update("a")).await);
    assert_ok!(queue.enqueue(update("b")).await);
    assert_ok!(queue.enqueue(update("c")).await);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(report.delivered, 2);
    assert_eq!(transport.call_count(), 3);

    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].endpoint(), "/trades/a");
}

#[tokio::test]
async fn test_retried_item_keeps_its_position() {
    let transport = ScriptedTransport::scripted(
        vec![Reply::Status(503), Reply::Status(503)],
        Reply::Status(503),
    );
    let queue = memory_queue(transport, true);
    assert_ok!(queue.enqueue(update("a")).await);
    assert_ok!(queue.enqueue(update("b")).await);

    assert_ok!(queue.flush_queue().await);
    let items = assert_queue_len!(queue, 2);
    assert_eq!(items[0].endpoint(), "/trades/a");
    assert_eq!(items[1].endpoint(), "/trades/b");
}

#[tokio::test]
async fn test_delete_is_sent_without_body() {
    let transport = ScriptedTransport::always(Reply::Status(204));
    let queue = memory_queue(transport.clone(), true);
    assert_ok!(queue.enqueue(Operation::delete("/trades/t9")).await);
    assert_ok!(queue.flush_queue().await);

    let calls = transport.calls();
    assert_eq!(calls[0].method, Method::DELETE);
    assert_eq!(calls[0].body, None);
}

#[tokio::test]
async fn test_offline_flush_is_a_noop() {
    let transport = ScriptedTransport::always(Reply::Status(200));
    let queue = memory_queue(transport.clone(), false);
    assert_ok!(queue.enqueue(update("t1")).await);

    assert_eq!(assert_ok!(queue.flush_queue().await), FlushOutcome::Offline);
    assert_eq!(transport.call_count(), 0);
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 0);
}

#[tokio::test]
async fn test_uniform_policy_retries_client_errors() {
    let transport = ScriptedTransport::always(Reply::Status(422));
    let queue = memory_queue(transport, true);
    assert_ok!(queue.enqueue(update("t1")).await);

    assert_ok!(queue.flush_queue().await);
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 1);
    assert!(assert_ok!(queue.rejected().await).is_empty());
}

#[tokio::test]
async fn test_classified_policy_rejects_client_errors() {
    let transport =
        ScriptedTransport::scripted(vec![Reply::Status(422), Reply::Status(503)], Reply::Status(200));
    let queue = memory_queue_with_policy(transport, true, RetryPolicy::classified(3));
    let invalid = assert_ok!(queue.enqueue(update("bad")).await);
    assert_ok!(queue.enqueue(update("good")).await);

    let report = assert_completed!(assert_ok!(queue.flush_queue().await));
    assert_eq!(report.rejected, 1);
    assert_eq!(report.retried, 1);

    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].endpoint(), "/trades/good");

    let rejected = assert_ok!(queue.rejected().await);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].item.id, invalid.id);
    assert_eq!(rejected[0].reason, "HTTP 422");

    assert!(assert_ok!(queue.dismiss_rejected(&invalid.id).await));
    assert!(assert_ok!(queue.rejected().await).is_empty());
}

#[tokio::test]
async fn test_classified_policy_still_retries_rate_limits() {
    let transport = ScriptedTransport::always(Reply::Status(429));
    let queue = memory_queue_with_policy(transport, true, RetryPolicy::classified(3));
    assert_ok!(queue.enqueue(update("t1")).await);

    assert_ok!(queue.flush_queue().await);
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 1);
}

#[tokio::test]
async fn test_clear_cache_wipes_queue_and_trades_cache() {
    let queue = memory_queue(ScriptedTransport::always(Reply::Status(200)), false);
    assert_ok!(queue.enqueue(update("a")).await);
    assert_ok!(queue.enqueue(update("b")).await);
    assert_ok!(queue.cache_trade(&json!({"id": "a"})).await);

    assert_ok!(queue.clear_cache().await);
    assert_queue_len!(queue, 0);
    assert!(assert_ok!(queue.cached_trades().await).is_empty());
}

/// Blocks every request until released
struct GatedTransport {
    status: u16,
    entered: Notify,
    release: Notify,
    endpoints: StdMutex<Vec<String>>,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(
        &self,
        _method: Method,
        endpoint: &str,
        _body: Option<&Value>,
    ) -> Result<u16, TransportError> {
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.status)
    }
}

fn gated_queue_with(status: u16, policy: RetryPolicy) -> (Arc<OfflineQueue>, Arc<GatedTransport>) {
    let transport = Arc::new(GatedTransport {
        status,
        entered: Notify::new(),
        release: Notify::new(),
        endpoints: StdMutex::new(Vec::new()),
    });
    let queue = Arc::new(
        OfflineQueue::new(Arc::new(MemoryStore::new()), transport.clone(), signal(true))
            .with_policy(policy),
    );
    (queue, transport)
}

fn gated_queue() -> (Arc<OfflineQueue>, Arc<GatedTransport>) {
    gated_queue_with(200, RetryPolicy::default())
}

#[tokio::test]
async fn test_overlapping_flush_is_skipped() {
    let (queue, transport) = gated_queue();
    assert_ok!(queue.enqueue(update("t1")).await);

    let running = tokio::spawn({
        let queue = queue.clone();
        async move { queue.flush_queue().await }
    });
    transport.entered.notified().await;

    assert!(queue.is_flushing());
    assert_eq!(assert_ok!(queue.flush_queue().await), FlushOutcome::AlreadyRunning);

    transport.release.notify_one();
    let report = assert_completed!(assert_ok!(running.await.unwrap()));
    assert_eq!(report.delivered, 1);
    assert!(!queue.is_flushing());
}

#[tokio::test]
async fn test_items_enqueued_mid_flush_wait_for_next_pass() {
    let (queue, transport) = gated_queue();
    assert_ok!(queue.enqueue(update("first")).await);

    let running = tokio::spawn({
        let queue = queue.clone();
        async move { queue.flush_queue().await }
    });
    transport.entered.notified().await;
    let late = assert_ok!(queue.enqueue(update("late")).await);

    transport.release.notify_one();
    let report = assert_completed!(assert_ok!(running.await.unwrap()));
    assert_eq!(report.attempted, 1);

    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].id, late.id);
    assert_eq!(items[0].retries, 0);
}

#[tokio::test]
async fn test_clear_cache_mid_flush_stops_replay() {
    let (queue, transport) = gated_queue_with(400, RetryPolicy::classified(3));
    assert_ok!(queue.enqueue(Operation::delete("/trades/a")).await);
    assert_ok!(queue.enqueue(Operation::delete("/trades/b")).await);

    let running = tokio::spawn({
        let queue = queue.clone();
        async move { queue.flush_queue().await }
    });
    transport.entered.notified().await;
    assert_ok!(queue.clear_cache().await);
    transport.release.notify_one();

    let finished = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("flush kept replaying cleared items");
    let report = assert_completed!(assert_ok!(finished.unwrap()));

    assert_eq!(*transport.endpoints.lock().unwrap(), vec!["/trades/a".to_string()]);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.rejected, 0);
    assert_queue_len!(queue, 0);
    assert!(assert_ok!(queue.rejected().await).is_empty());
}

#[tokio::test]
async fn test_item_removed_mid_flush_is_not_sent() {
    let (queue, transport) = gated_queue();
    assert_ok!(queue.enqueue(update("first")).await);
    let second = assert_ok!(queue.enqueue(update("second")).await);

    let running = tokio::spawn({
        let queue = queue.clone();
        async move { queue.flush_queue().await }
    });
    transport.entered.notified().await;
    assert!(assert_ok!(queue.remove_from_queue(&second.id).await));
    transport.release.notify_one();

    let finished = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("flush replayed a removed item");
    let report = assert_completed!(assert_ok!(finished.unwrap()));
    assert_eq!(report.delivered, 1);
    assert_eq!(*transport.endpoints.lock().unwrap(), vec!["/trades/first".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_polling_never_blocks_a_flush() {
    let queue = memory_queue(ScriptedTransport::always(Reply::Status(200)), true);
    let stop = Arc::new(AtomicBool::new(false));

    let poller = tokio::spawn({
        let queue = queue.clone();
        let stop = stop.clone();
        async move {
            while !stop.load(Ordering::Relaxed) {
                let _ = queue.is_flushing();
                tokio::task::yield_now().await;
            }
        }
    });

    let mut skipped = 0;
    for _ in 0..20_000 {
        if assert_ok!(queue.flush_queue().await) == FlushOutcome::AlreadyRunning {
            skipped += 1;
        }
    }
    stop.store(true, Ordering::Relaxed);
    poller.await.unwrap();

    assert_eq!(skipped, 0);
    assert!(!queue.is_flushing());
}
