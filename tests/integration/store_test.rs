//! Queue durability across restarts on the SQLite store

use crate::common::{sqlite_queue, Reply, ScriptedTransport};
use crate::{assert_ok, assert_queue_len};
use pretty_assertions::assert_eq;
use serde_json::json;
use tradejournal_sync::journal_app::local_db::{DurableStore, QUEUE_KEY};
use tradejournal_sync::journal_app::offline::{Operation, RetryPolicy};

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offline.db");
    let transport = ScriptedTransport::always(Reply::Status(200));

    let enqueued = {
        let (queue, store) = sqlite_queue(&path, transport.clone(), false).await;
        let first = assert_ok!(queue.enqueue(Operation::create("/trades", &json!({"id": "t1"})).unwrap()).await);
        let second = assert_ok!(queue.enqueue(Operation::delete("/trades/t0")).await);
        store.close().await;
        vec![first, second]
    };

    let (queue, _store) = sqlite_queue(&path, transport.clone(), true).await;
    let restored = assert_queue_len!(queue, 2);
    assert_eq!(restored, enqueued);

    assert_ok!(queue.flush_queue().await);
    assert_queue_len!(queue, 0);
    assert_eq!(transport.endpoints(), vec!["/trades", "/trades/t0"]);
}

#[tokio::test]
async fn test_retry_count_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offline.db");
    let transport = ScriptedTransport::always(Reply::Status(502));

    {
        let (queue, store) = sqlite_queue(&path, transport.clone(), true).await;
        assert_ok!(queue.enqueue(Operation::delete("/trades/t1")).await);
        assert_ok!(queue.flush_queue().await);
        assert_ok!(queue.flush_queue().await);
        store.close().await;
    }

    let (queue, _store) = sqlite_queue(&path, transport.clone(), true).await;
    let items = assert_queue_len!(queue, 1);
    assert_eq!(items[0].retries, 2);
    assert_eq!(queue.policy(), RetryPolicy::default());

    assert_ok!(queue.flush_queue().await);
    assert_queue_len!(queue, 0);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_stored_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offline.db");
    let (queue, store) = sqlite_queue(&path, ScriptedTransport::always(Reply::Status(200)), false).await;

    let item = assert_ok!(
        queue
            .enqueue(Operation::update("/trades/t1", &json!({"tags": ["x"]})).unwrap())
            .await
    );

    let raw = assert_ok!(store.get(QUEUE_KEY).await).expect("queue record present");
    assert_eq!(
        raw,
        json!([{
            "id": item.id,
            "type": "update",
            "endpoint": "/trades/t1",
            "payload": {"tags": ["x"]},
            "timestamp": item.timestamp,
            "retries": 0
        }])
    );
}
