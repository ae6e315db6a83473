/**
 * Journal Sync Entry Point
 *
 * Opens the local offline store, reports how many writes are waiting, and
 * replays them once when the journal API answers its health check.
 *
 * With --watch it keeps running instead: the sync service flushes on every
 * reconnect, probes /health on the configured interval and prints the
 * pending-sync notice whenever it changes, until Ctrl-C.
 *
 * Usage: journal_sync [--watch] [config.toml]
 */

use std::path::PathBuf;
use std::sync::Arc;
use tradejournal_sync::journal_app::api_client::HttpTransport;
use tradejournal_sync::journal_app::config::Config;
use tradejournal_sync::journal_app::local_db::SqliteStore;
use tradejournal_sync::journal_app::offline::{FlushOutcome, OfflineQueue, RetryPolicy};
use tradejournal_sync::journal_app::sync::{
    ConnectivitySignal, NetworkStatus, SyncService, SyncState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let mut watch = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--watch" {
            watch = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }
    let config = Config::load(config_path.as_deref())?;

    let store_path = config.store_path();
    tracing::info!("Opening offline store at {}", store_path.display());
    let store = Arc::new(SqliteStore::open(&store_path).await?);

    let transport = Arc::new(HttpTransport::new(config.clone()));
    let reachable = transport.health().await;
    let connectivity = ConnectivitySignal::new(NetworkStatus::from_online(reachable));

    let queue = Arc::new(
        OfflineQueue::new(store.clone(), transport.clone(), connectivity).with_policy(
            RetryPolicy::new(config.retry_ceiling(), config.failure_handling()),
        ),
    );

    let pending = queue.pending_count().await?;
    println!("{} operation(s) pending sync", pending);

    if watch {
        run_watch(&config, queue, transport).await?;
        store.close().await;
        return Ok(());
    }

    if !reachable {
        println!("{} is unreachable; nothing replayed", config.server_url());
        store.close().await;
        return Ok(());
    }

    match queue.flush_queue().await? {
        FlushOutcome::Completed(report) => {
            println!(
                "Flushed {} item(s): {} delivered, {} retrying, {} dropped, {} rejected",
                report.attempted, report.delivered, report.retried, report.dropped, report.rejected
            );
        }
        outcome => println!("Flush skipped: {:?}", outcome),
    }

    let rejected = queue.rejected().await?;
    for entry in &rejected {
        println!(
            "Rejected {:?} {}: {}",
            entry.item.kind(),
            entry.item.endpoint(),
            entry.reason
        );
    }

    store.close().await;
    Ok(())
}

async fn run_watch(
    config: &Config,
    queue: Arc<OfflineQueue>,
    transport: Arc<HttpTransport>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = SyncService::from_config(config, queue, transport);
    if !service.has_health_probe() {
        tracing::warn!("health_probe_secs is not set; connectivity stays as first probed");
    }
    service.start()?;

    // Replay whatever was left over from earlier runs before waiting on transitions
    service.sync_now().await?;
    let mut updates = service.subscribe();
    print_notice(&service.status());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_notice(&state);
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping");
                break;
            }
        }
    }

    service.stop();
    Ok(())
}

fn print_notice(state: &SyncState) {
    match state.notice() {
        Some(notice) => println!("{}", notice),
        None => println!("All changes synced"),
    }
}
