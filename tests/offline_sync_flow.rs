use offline_sync::infrastructure::notification::ChannelNotifier;
use offline_sync::infrastructure::storage::FileKeyValueStore;
use offline_sync::{
    ActionType, AppConfig, AppError, CacheKey, ConnectivitySignal, DataLoader, HttpMethod,
    OfflinePayload, OfflineSyncDeps, OfflineSyncState, PendingAction, PendingActionDraft, Severity,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn offline_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.data_dir = dir.path().to_string_lossy().into_owned();
    config.connectivity.start_online = false;
    config.sync.auto_sync = false;
    config
}

fn draft(title: &str) -> PendingActionDraft {
    PendingActionDraft::new(
        ActionType::new("create_project").unwrap(),
        OfflinePayload::new(json!({ "title": title })).unwrap(),
    )
    .with_endpoint(HttpMethod::Post, "projects")
}

fn build_state(config: AppConfig, notifier: Arc<ChannelNotifier>) -> Arc<OfflineSyncState> {
    let storage = Arc::new(FileKeyValueStore::new(&config.storage.data_dir));
    OfflineSyncState::new(config, OfflineSyncDeps::new(storage, notifier)).unwrap()
}

#[tokio::test]
async fn queue_survives_restart_in_order() {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(ChannelNotifier::default());

    let first = build_state(offline_config(&dir), notifier.clone());
    let ids = vec![
        first.enqueue(draft("alpha")).await,
        first.enqueue(draft("beta")).await,
        first.enqueue(draft("gamma")).await,
    ];
    drop(first);

    let mut notes = notifier.subscribe();
    let second = build_state(offline_config(&dir), notifier.clone());
    assert_eq!(second.initialize().await, 3);

    let restored: Vec<PendingAction> = second.snapshot().await.pending;
    let restored_ids: Vec<_> = restored.iter().map(|a| a.id.clone()).collect();
    assert_eq!(restored_ids, ids);
    assert_eq!(restored[1].payload.as_json(), &json!({ "title": "beta" }));

    let note = notes.recv().await.unwrap();
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.title, "Pending actions restored");
}

#[tokio::test(start_paused = true)]
async fn reconnect_drains_queue_and_invalidates_reads() {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(ChannelNotifier::default());
    let state = build_state(offline_config(&dir), notifier.clone());

    let remote: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&remote);
    state.registry().register_fn(
        ActionType::new("create_project").unwrap(),
        move |action: PendingAction| {
            let sink = Arc::clone(&sink);
            async move {
                let title = action.payload.as_json()["title"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                sink.lock().unwrap().push(title);
                Ok(json!({ "created": true }))
            }
        },
    );

    let loader: DataLoader<Vec<String>> = DataLoader::new(Duration::from_secs(300));
    state.register_invalidator(Arc::new(loader.clone()));

    let fetches = Arc::new(AtomicUsize::new(0));
    let fetch = |fetches: &Arc<AtomicUsize>, remote: &Arc<Mutex<Vec<String>>>| {
        let fetches = Arc::clone(fetches);
        let remote = Arc::clone(remote);
        move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(remote.lock().unwrap().clone())
        }
    };
    let list_key = CacheKey::resource_only("projects").unwrap();

    let before = loader
        .load_with_default_ttl(list_key.clone(), fetch(&fetches, &remote))
        .await
        .unwrap();
    assert!(before.is_empty());

    let handle = state.start();
    state.enqueue(draft("alpha")).await;
    state.enqueue(draft("beta")).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(remote.lock().unwrap().is_empty());
    assert_eq!(state.snapshot().await.pending.len(), 2);

    let mut notes = notifier.subscribe();
    state.report_connectivity(ConnectivitySignal::Online).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(*remote.lock().unwrap(), vec!["alpha", "beta"]);
    let snapshot = state.snapshot().await;
    assert!(snapshot.pending.is_empty());
    assert!(!snapshot.connectivity.is_offline);
    assert_eq!(snapshot.metrics.total_success, 2);

    let titles: Vec<String> = std::iter::from_fn(|| notes.try_recv().ok())
        .map(|note| note.title)
        .collect();
    assert_eq!(titles, vec!["Back online", "Sync complete"]);

    let after = loader
        .load_with_default_ttl(list_key, fetch(&fetches, &remote))
        .await
        .unwrap();
    assert_eq!(after, vec!["alpha", "beta"]);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);

    let reopened = FileKeyValueStore::new(dir.path());
    let persisted = offline_sync::KeyValueStore::read(&reopened, "offline_pending_actions")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted, "[]");

    handle.shutdown();
}
