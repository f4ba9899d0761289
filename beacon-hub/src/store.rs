//! Process-wide presence store.
//!
//! Maps room names to room state, creating rooms lazily on first write,
//! leadership change, or subscription. The store-level lock is taken only
//! to create or remove a room entry; all per-record work happens under the
//! room's own lock, so traffic in one room never contends with another.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use beacon_core::{DeviceClass, PositionRecord};

use crate::error::{Result, SyncError};
use crate::fanout::Subscription;
use crate::leader::{Authority, DEFAULT_AUTHORITY_CLASS};
use crate::room::RoomState;

/// Hub tuning knobs.
pub struct HubConfig {
    /// Maximum record age before eviction.
    pub max_age: Duration,
    /// Sweep cadence; also the idle threshold for empty-room teardown.
    pub sweep_interval: Duration,
    /// Buffered updates per room before a slow subscriber starts lagging.
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(10),
            channel_capacity: 256,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum record age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the sweep cadence.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the per-room fanout buffer size. Must be nonzero.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "channel capacity must be nonzero");
        self.channel_capacity = capacity;
        self
    }
}

/// Record filter for reads and push subscriptions.
///
/// Generalizes origin-based filtering: `exclude_client` suppresses a
/// caller's own echo, `device_class` selects a single producer class
/// (e.g. a headset consumer accepting only desktop-origin records).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    exclude_client: Option<String>,
    device_class: Option<DeviceClass>,
}

impl Filter {
    /// Match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress records from this client.
    pub fn exclude_client(mut self, client_id: impl Into<String>) -> Self {
        self.exclude_client = Some(client_id.into());
        self
    }

    /// Accept only records from this device class.
    pub fn device_class(mut self, device_class: DeviceClass) -> Self {
        self.device_class = Some(device_class);
        self
    }

    /// Does the record pass this filter?
    pub fn matches(&self, record: &PositionRecord) -> bool {
        if let Some(excluded) = &self.exclude_client {
            if record.client_id == *excluded {
                return false;
            }
        }
        if let Some(class) = self.device_class {
            if record.device_class != class {
                return false;
            }
        }
        true
    }
}

/// Result of a write: stored and fanned out, or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Record stored; subscribers notified.
    Applied,
    /// Older than the stored record for this client; dropped silently.
    Stale,
}

impl WriteOutcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Counters from one eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub records_evicted: usize,
    pub rooms_removed: usize,
}

/// Room-keyed presence store; the process-wide entry point to the hub.
///
/// Construct once, share behind an `Arc`, and pair with
/// [`sweeper::spawn`](crate::sweeper::spawn) for background eviction.
pub struct PresenceStore {
    rooms: RwLock<HashMap<String, Arc<RoomState>>>,
    config: HubConfig,
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceStore {
    /// Create a store with default config.
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a store with the given config.
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Validate and write a position record, fanning out on success.
    ///
    /// Creates the room on first reference. Returns
    /// [`WriteOutcome::Stale`] when the record carries an `updated_at` not
    /// newer than the stored one — out-of-order deliveries are dropped,
    /// never allowed to overwrite a newer position.
    pub fn submit(&self, room: &str, record: PositionRecord) -> Result<WriteOutcome> {
        if room.is_empty() {
            return Err(SyncError::InvalidRoom);
        }
        if record.client_id.is_empty() {
            return Err(SyncError::InvalidClient);
        }
        if !record.in_range() {
            return Err(SyncError::InvalidPosition {
                x: record.x,
                y: record.y,
            });
        }
        Ok(self.room_or_create(room).apply(record))
    }

    /// All current records in a room matching the filter, as copies.
    ///
    /// Empty for unknown rooms or when nothing matches — never an error.
    pub fn latest(&self, room: &str, filter: &Filter) -> Vec<PositionRecord> {
        self.room(room)
            .map(|r| r.snapshot(filter))
            .unwrap_or_default()
    }

    /// The single most recent matching record, for poll-mode consumers.
    ///
    /// The caller owns its interval and discards records whose
    /// `updated_at` it has already processed; the store keeps no
    /// per-poller cursor.
    pub fn poll_latest(&self, room: &str, filter: &Filter) -> Option<PositionRecord> {
        self.room(room)?.latest_match(filter)
    }

    /// Register a push subscriber for a room, creating it if needed.
    ///
    /// The filter is applied on the subscriber's receive side, so one
    /// subscriber's options never affect another's deliveries.
    pub fn subscribe(&self, room: &str, filter: Filter) -> Result<Subscription> {
        if room.is_empty() {
            return Err(SyncError::InvalidRoom);
        }
        let rx = self.room_or_create(room).subscribe();
        Ok(Subscription::new(room.to_owned(), rx, filter))
    }

    /// Replace the room's leader, last-write-wins.
    ///
    /// `None` releases control back to the default authority. Creates the
    /// room on first reference; re-entrant set is a no-op.
    pub fn set_leader(&self, room: &str, leader: Option<&str>) -> Result<()> {
        if room.is_empty() {
            return Err(SyncError::InvalidRoom);
        }
        if leader == Some("") {
            return Err(SyncError::InvalidClient);
        }
        self.room_or_create(room).set_leader(leader);
        Ok(())
    }

    /// The room's current leader, if one claimed control.
    pub fn leader(&self, room: &str) -> Option<String> {
        self.room(room)?.leader()
    }

    /// Is this client the room's current leader?
    pub fn is_leader(&self, room: &str, client_id: &str) -> bool {
        self.room(room).is_some_and(|r| r.is_leader(client_id))
    }

    /// Who currently drives a shared target in this room.
    ///
    /// Falls back to desktop-class authority when no explicit leader is
    /// set — the "PC drives until the device takes control" initial state.
    pub fn authority(&self, room: &str) -> Authority {
        match self.leader(room) {
            Some(client_id) => Authority::Client(client_id),
            None => Authority::DeviceClass(DEFAULT_AUTHORITY_CLASS),
        }
    }

    /// Should a shared-target consumer act on this record?
    ///
    /// Non-authoritative records are still stored and fanned out; this is
    /// the consumer-side gate.
    pub fn is_authoritative(&self, room: &str, record: &PositionRecord) -> bool {
        self.authority(room).permits(record)
    }

    /// Has this room ever been referenced (and not yet swept away)?
    pub fn contains_room(&self, room: &str) -> bool {
        self.rooms.read().contains_key(room)
    }

    /// Explicit existence check; the only query that surfaces
    /// [`SyncError::RoomNotFound`].
    pub fn expect_room(&self, room: &str) -> Result<()> {
        if self.contains_room(room) {
            Ok(())
        } else {
            Err(SyncError::RoomNotFound(room.to_owned()))
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// One eviction pass: drop records older than `max_age`, then drop
    /// rooms left empty, unsubscribed, and idle for at least one sweep
    /// interval.
    ///
    /// Safe against concurrent writes: record removal is keyed to the
    /// timestamp observed during the scan, and room removal is re-checked
    /// under the store write lock. A write racing a room removal can land
    /// in the dropped map; the client's next write recreates the room.
    pub fn sweep(&self, now_ms: u64) -> SweepStats {
        let max_age_ms = self.config.max_age.as_millis() as u64;
        let idle = self.config.sweep_interval;

        let rooms: Vec<(String, Arc<RoomState>)> = self
            .rooms
            .read()
            .iter()
            .map(|(name, room)| (name.clone(), Arc::clone(room)))
            .collect();

        let mut stats = SweepStats::default();
        for (name, room) in rooms {
            stats.records_evicted += room.evict_stale(now_ms, max_age_ms);

            if room.is_empty_and_idle(idle) && room.subscriber_count() == 0 {
                let mut map = self.rooms.write();
                let removable = map.get(&name).is_some_and(|r| Arc::ptr_eq(r, &room))
                    && room.is_empty_and_idle(idle)
                    && room.subscriber_count() == 0;
                if removable {
                    map.remove(&name);
                    stats.rooms_removed += 1;
                }
            }
        }
        stats
    }

    fn room(&self, name: &str) -> Option<Arc<RoomState>> {
        self.rooms.read().get(name).cloned()
    }

    fn room_or_create(&self, name: &str) -> Arc<RoomState> {
        if let Some(room) = self.rooms.read().get(name) {
            return Arc::clone(room);
        }
        let mut rooms = self.rooms.write();
        Arc::clone(
            rooms
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(RoomState::new(self.config.channel_capacity))),
        )
    }
}
