//! Integration tests for beacon-hub

use std::sync::Arc;
use std::time::Duration;

use beacon_core::now_ms;
use beacon_hub::{
    sweeper, Authority, DeviceClass, Filter, HubConfig, PositionRecord, PresenceStore, SyncError,
    WriteOutcome,
};

/// Submit followed by latest returns exactly the submitted record
#[test]
fn test_submit_then_latest_round_trip() {
    let store = PresenceStore::new();
    let record = PositionRecord::new("a", 10.0, 20.0)
        .with_display_name("Alice")
        .with_color("#00ff00")
        .with_device_class(DeviceClass::Desktop);
    assert_eq!(store.submit("demo", record).unwrap(), WriteOutcome::Applied);

    let latest = store.latest("demo", &Filter::new());
    assert_eq!(latest.len(), 1);
    let got = &latest[0];
    assert_eq!(got.client_id, "a");
    assert_eq!(got.display_name, "Alice");
    assert_eq!((got.x, got.y), (10.0, 20.0));
    assert_eq!(got.color.as_deref(), Some("#00ff00"));
    assert_eq!(got.device_class, DeviceClass::Desktop);
    assert!(got.updated_at > 0); // store-assigned
}

/// Overwrite semantics: a room holds one record per client, no history
#[test]
fn test_overwrite_keeps_only_latest() {
    let store = PresenceStore::new();
    store
        .submit("demo", PositionRecord::new("a", 10.0, 20.0).with_updated_at(100))
        .unwrap();
    store
        .submit("demo", PositionRecord::new("a", 15.0, 25.0).with_updated_at(200))
        .unwrap();

    let latest = store.latest("demo", &Filter::new());
    assert_eq!(latest.len(), 1);
    assert_eq!((latest[0].x, latest[0].y), (15.0, 25.0));
}

/// Out-of-order delivery is an idempotent drop, never a regression
#[test]
fn test_stale_update_dropped() {
    let store = PresenceStore::new();
    store
        .submit("demo", PositionRecord::new("a", 10.0, 20.0).with_updated_at(1_000))
        .unwrap();

    let outcome = store
        .submit("demo", PositionRecord::new("a", 99.0, 99.0).with_updated_at(500))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Stale);

    // Equal timestamps are dropped too (keep-max)
    let outcome = store
        .submit("demo", PositionRecord::new("a", 99.0, 99.0).with_updated_at(1_000))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Stale);

    let latest = store.poll_latest("demo", &Filter::new()).unwrap();
    assert_eq!((latest.x, latest.y), (10.0, 20.0));
    assert_eq!(latest.updated_at, 1_000);
}

/// Store-assigned timestamps strictly increase even within one millisecond
#[test]
fn test_server_stamps_strictly_increase() {
    let store = PresenceStore::new();
    store.submit("demo", PositionRecord::new("a", 1.0, 1.0)).unwrap();
    let first = store.poll_latest("demo", &Filter::new()).unwrap().updated_at;
    store.submit("demo", PositionRecord::new("a", 2.0, 2.0)).unwrap();
    let second = store.poll_latest("demo", &Filter::new()).unwrap().updated_at;
    assert!(second > first);
}

/// Malformed submissions are rejected before touching shared state
#[test]
fn test_validation_rejects_at_the_boundary() {
    let store = PresenceStore::new();
    assert!(matches!(
        store.submit("demo", PositionRecord::new("a", 150.0, 20.0)),
        Err(SyncError::InvalidPosition { .. })
    ));
    assert!(matches!(
        store.submit("demo", PositionRecord::new("a", f64::NAN, 20.0)),
        Err(SyncError::InvalidPosition { .. })
    ));
    assert!(matches!(
        store.submit("", PositionRecord::new("a", 1.0, 1.0)),
        Err(SyncError::InvalidRoom)
    ));
    assert!(matches!(
        store.submit("demo", PositionRecord::new("", 1.0, 1.0)),
        Err(SyncError::InvalidClient)
    ));
    assert!(matches!(
        store.subscribe("", Filter::new()),
        Err(SyncError::InvalidRoom)
    ));
    assert!(matches!(
        store.set_leader("demo", Some("")),
        Err(SyncError::InvalidClient)
    ));

    // Nothing entered shared state, no room was created
    assert!(store.latest("demo", &Filter::new()).is_empty());
    assert!(!store.contains_room("demo"));
}

/// Reads against a never-referenced room are empty, not errors
#[test]
fn test_unknown_room_reads_return_empty() {
    let store = PresenceStore::new();
    assert!(store.latest("ghost", &Filter::new()).is_empty());
    assert_eq!(store.poll_latest("ghost", &Filter::new()), None);
    assert_eq!(store.leader("ghost"), None);
    assert!(!store.is_leader("ghost", "a"));

    // The explicit existence check is the one place the error surfaces
    assert!(matches!(
        store.expect_room("ghost"),
        Err(SyncError::RoomNotFound(_))
    ));
}

/// setLeader(A) then setLeader(B) leaves exactly B in control
#[test]
fn test_leadership_last_write_wins() {
    let store = PresenceStore::new();
    store.set_leader("demo", Some("a")).unwrap();
    store.set_leader("demo", Some("b")).unwrap();
    assert_eq!(store.leader("demo").as_deref(), Some("b"));
    assert!(store.is_leader("demo", "b"));
    assert!(!store.is_leader("demo", "a"));

    // Re-entrant set is a no-op, not an error
    store.set_leader("demo", Some("b")).unwrap();
    assert_eq!(store.leader("demo").as_deref(), Some("b"));

    store.set_leader("demo", None).unwrap();
    assert_eq!(store.leader("demo"), None);
}

/// Desktop writes drive the shared target until a client claims control
#[test]
fn test_authority_defaults_to_desktop() {
    let store = PresenceStore::new();
    let desktop = PositionRecord::new("pc-1", 1.0, 1.0).with_device_class(DeviceClass::Desktop);
    let headset = PositionRecord::new("hmd-1", 2.0, 2.0).with_device_class(DeviceClass::Headset);

    assert_eq!(
        store.authority("demo"),
        Authority::DeviceClass(DeviceClass::Desktop)
    );
    assert!(store.is_authoritative("demo", &desktop));
    assert!(!store.is_authoritative("demo", &headset));

    // The headset takes control; only its writes count now
    store.set_leader("demo", Some("hmd-1")).unwrap();
    assert_eq!(store.authority("demo"), Authority::Client("hmd-1".into()));
    assert!(store.is_authoritative("demo", &headset));
    assert!(!store.is_authoritative("demo", &desktop));

    // Release hands control back to the desktop side
    store.set_leader("demo", None).unwrap();
    assert!(store.is_authoritative("demo", &desktop));
}

/// A poller filtering on desktop origin never sees headset records
#[test]
fn test_device_class_filtered_poll() {
    let store = PresenceStore::new();
    store
        .submit(
            "demo",
            PositionRecord::new("b", 5.0, 5.0).with_device_class(DeviceClass::Headset),
        )
        .unwrap();

    let filter = Filter::new().device_class(DeviceClass::Desktop);
    assert_eq!(store.poll_latest("demo", &filter), None);
    assert!(store.latest("demo", &filter).is_empty());

    let filter = Filter::new().device_class(DeviceClass::Headset);
    assert_eq!(store.poll_latest("demo", &filter).unwrap().client_id, "b");
}

/// Poll mode hands back the most recent record across clients
#[test]
fn test_poll_latest_returns_most_recent() {
    let store = PresenceStore::new();
    store
        .submit("demo", PositionRecord::new("a", 1.0, 1.0).with_updated_at(100))
        .unwrap();
    store
        .submit("demo", PositionRecord::new("b", 2.0, 2.0).with_updated_at(200))
        .unwrap();
    assert_eq!(store.poll_latest("demo", &Filter::new()).unwrap().client_id, "b");
}

/// A subscriber registered before two writes observes them in order,
/// and latest afterwards holds only the second
#[tokio::test]
async fn test_demo_scenario_ordered_delivery() {
    let store = PresenceStore::new();
    let mut sub = store.subscribe("demo", Filter::new()).unwrap();

    store
        .submit("demo", PositionRecord::new("a", 10.0, 20.0).with_updated_at(100))
        .unwrap();
    store
        .submit("demo", PositionRecord::new("a", 15.0, 25.0).with_updated_at(200))
        .unwrap();

    let first = sub.recv().await.unwrap();
    let second = sub.recv().await.unwrap();
    assert_eq!((first.x, first.y), (10.0, 20.0));
    assert_eq!((second.x, second.y), (15.0, 25.0));

    let latest = store.latest("demo", &Filter::new());
    assert_eq!(latest.len(), 1);
    assert_eq!((latest[0].x, latest[0].y), (15.0, 25.0));
}

/// Every subscriber sees every write in per-client order, slow ones included
#[tokio::test]
async fn test_fanout_completeness_with_slow_subscriber() {
    let store = Arc::new(PresenceStore::new());
    let mut subs = Vec::new();
    for _ in 0..3 {
        subs.push(store.subscribe("demo", Filter::new()).unwrap());
    }

    for i in 0..5u64 {
        store
            .submit(
                "demo",
                PositionRecord::new("a", i as f64, 0.0).with_updated_at(i + 1),
            )
            .unwrap();
    }

    let mut handles = Vec::new();
    for (idx, mut sub) in subs.into_iter().enumerate() {
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..5 {
                // The first subscriber drains artificially slowly
                if idx == 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                seen.push(sub.recv().await.unwrap().updated_at);
            }
            seen
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), vec![1, 2, 3, 4, 5]);
    }
}

/// Self-echo suppression: a subscriber excluding its own id only sees peers
#[tokio::test]
async fn test_self_echo_suppression() {
    let store = PresenceStore::new();
    let mut sub = store
        .subscribe("demo", Filter::new().exclude_client("a"))
        .unwrap();

    store
        .submit("demo", PositionRecord::new("a", 1.0, 1.0).with_updated_at(1))
        .unwrap();
    store
        .submit("demo", PositionRecord::new("b", 2.0, 2.0).with_updated_at(1))
        .unwrap();

    let got = sub.recv().await.unwrap();
    assert_eq!(got.client_id, "b");
    assert_eq!(sub.try_recv().unwrap(), None);
}

/// A lagging subscriber gets the failure on its own path; writes never fail
#[tokio::test]
async fn test_lagged_subscriber_gets_error_not_writer() {
    let config = HubConfig::new().with_channel_capacity(4);
    let store = PresenceStore::with_config(config);
    let mut sub = store.subscribe("demo", Filter::new()).unwrap();

    for i in 0..10u64 {
        let outcome = store
            .submit(
                "demo",
                PositionRecord::new("a", 1.0, 1.0).with_updated_at(i + 1),
            )
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied);
    }

    // The subscriber fell behind the room buffer
    let err = sub.recv().await.unwrap_err();
    assert!(matches!(err, SyncError::Lagged(n) if n > 0));

    // Delivery resumes from the oldest retained update through the newest
    let mut last = 0;
    while let Some(record) = sub.try_recv().unwrap() {
        assert!(record.updated_at > last);
        last = record.updated_at;
    }
    assert_eq!(last, 10);
}

/// Cancelling a subscription stops delivery without touching the room
#[tokio::test]
async fn test_cancel_stops_delivery() {
    let store = PresenceStore::new();
    let sub = store.subscribe("demo", Filter::new()).unwrap();
    sub.cancel();

    store.submit("demo", PositionRecord::new("a", 1.0, 1.0)).unwrap();
    assert!(store.contains_room("demo"));
    assert_eq!(store.latest("demo", &Filter::new()).len(), 1);
}

/// Stale records vanish after a sweep; a fresh one survives
#[test]
fn test_ttl_eviction() {
    let store = PresenceStore::new();
    let now = now_ms();
    store
        .submit(
            "demo",
            PositionRecord::new("stale", 1.0, 1.0).with_updated_at(now - 60_000),
        )
        .unwrap();
    store
        .submit("demo", PositionRecord::new("fresh", 2.0, 2.0).with_updated_at(now))
        .unwrap();

    let stats = store.sweep(now_ms());
    assert_eq!(stats.records_evicted, 1);

    let latest = store.latest("demo", &Filter::new());
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].client_id, "fresh");
}

/// A record refreshed just before expiry survives the sweep
#[test]
fn test_refreshed_record_survives_sweep() {
    let store = PresenceStore::new();
    let now = now_ms();
    store
        .submit(
            "demo",
            PositionRecord::new("a", 1.0, 1.0).with_updated_at(now - 60_000),
        )
        .unwrap();
    store
        .submit("demo", PositionRecord::new("a", 2.0, 2.0).with_updated_at(now))
        .unwrap();

    assert_eq!(store.sweep(now_ms()).records_evicted, 0);
    assert_eq!(store.latest("demo", &Filter::new()).len(), 1);
}

/// Emptied rooms are torn down only after a full idle interval
#[test]
fn test_idle_empty_room_removed() {
    let config = HubConfig::new().with_sweep_interval(Duration::from_millis(40));
    let store = PresenceStore::with_config(config);
    store
        .submit(
            "demo",
            PositionRecord::new("a", 1.0, 1.0).with_updated_at(now_ms() - 60_000),
        )
        .unwrap();

    let stats = store.sweep(now_ms());
    assert_eq!(stats.records_evicted, 1);
    assert_eq!(stats.rooms_removed, 0); // just-touched room is not yet idle
    assert!(store.contains_room("demo"));

    std::thread::sleep(Duration::from_millis(60));
    let stats = store.sweep(now_ms());
    assert_eq!(stats.rooms_removed, 1);
    assert!(!store.contains_room("demo"));
}

/// A room with a live push subscriber is never torn down under it
#[test]
fn test_room_with_live_subscriber_survives_sweep() {
    let config = HubConfig::new().with_sweep_interval(Duration::from_millis(20));
    let store = PresenceStore::with_config(config);
    let sub = store.subscribe("demo", Filter::new()).unwrap();

    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(store.sweep(now_ms()).rooms_removed, 0);
    assert!(store.contains_room("demo"));

    sub.cancel();
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(store.sweep(now_ms()).rooms_removed, 1);
    assert!(!store.contains_room("demo"));
}

/// The background sweeper evicts on its own cadence
#[tokio::test]
async fn test_sweeper_task_evicts_in_background() {
    let config = HubConfig::new()
        .with_max_age(Duration::from_millis(50))
        .with_sweep_interval(Duration::from_millis(20));
    let store = Arc::new(PresenceStore::with_config(config));
    let handle = sweeper::spawn(Arc::clone(&store));

    store.submit("demo", PositionRecord::new("a", 1.0, 1.0)).unwrap();
    assert_eq!(store.latest("demo", &Filter::new()).len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(store.latest("demo", &Filter::new()).is_empty());

    handle.shutdown().await;
}

/// Records keep a stable wire shape for transport-layer collaborators
#[test]
fn test_record_wire_shape() {
    let record = PositionRecord::new("a", 10.0, 20.0)
        .with_device_class(DeviceClass::Desktop)
        .with_updated_at(1234);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["client_id"], "a");
    assert_eq!(json["device_class"], "desktop");
    assert_eq!(json["updated_at"], 1234);
    assert!(json["color"].is_null());

    let parsed: PositionRecord = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, record);
}
