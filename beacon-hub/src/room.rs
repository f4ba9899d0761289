//! Per-room presence state.
//!
//! A room is the unit of locking: the record map, `leader_id`, and the
//! activity clock live behind one `RwLock`; the fanout channel enqueue is
//! lock-free on the subscriber side. Rooms are owned by the store and never
//! handed out — readers get cloned records.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use beacon_core::{now_ms, PositionRecord};

use crate::store::{Filter, WriteOutcome};

pub(crate) struct RoomState {
    inner: RwLock<RoomInner>,
    tx: broadcast::Sender<PositionRecord>,
}

struct RoomInner {
    records: HashMap<String, PositionRecord>,
    leader_id: Option<String>,
    last_activity: Instant,
}

impl RoomState {
    pub(crate) fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity);
        Self {
            inner: RwLock::new(RoomInner {
                records: HashMap::new(),
                leader_id: None,
                last_activity: Instant::now(),
            }),
            tx,
        }
    }

    /// Insert or overwrite the record for its client, keep-max on `updated_at`.
    ///
    /// An unstamped record (`updated_at == 0`) gets the current time, bumped
    /// past the stored stamp if the clock hasn't advanced within the
    /// millisecond. A stamped record older than the stored one is dropped.
    pub(crate) fn apply(&self, mut record: PositionRecord) -> WriteOutcome {
        let mut inner = self.inner.write();
        let stored = inner.records.get(&record.client_id).map(|r| r.updated_at);

        if record.updated_at == 0 {
            let floor = stored.map_or(0, |t| t + 1);
            record.updated_at = now_ms().max(floor);
        } else if stored.is_some_and(|t| record.updated_at <= t) {
            return WriteOutcome::Stale;
        }

        inner.last_activity = Instant::now();
        // Enqueue under the lock so any one subscriber observes a client's
        // updates in updated_at order. send() never blocks; a send with no
        // receivers just reports zero deliveries.
        let _ = self.tx.send(record.clone());
        inner.records.insert(record.client_id.clone(), record);
        WriteOutcome::Applied
    }

    pub(crate) fn snapshot(&self, filter: &Filter) -> Vec<PositionRecord> {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub(crate) fn latest_match(&self, filter: &Filter) -> Option<PositionRecord> {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| filter.matches(r))
            .max_by_key(|r| r.updated_at)
            .cloned()
    }

    /// Replace the leader, last-write-wins. Setting the same leader again
    /// is a no-op apart from refreshing the activity clock.
    pub(crate) fn set_leader(&self, leader: Option<&str>) {
        let mut inner = self.inner.write();
        inner.last_activity = Instant::now();
        let next = leader.map(str::to_owned);
        if inner.leader_id != next {
            inner.leader_id = next;
        }
    }

    pub(crate) fn leader(&self) -> Option<String> {
        self.inner.read().leader_id.clone()
    }

    pub(crate) fn is_leader(&self, client_id: &str) -> bool {
        self.inner.read().leader_id.as_deref() == Some(client_id)
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<PositionRecord> {
        self.inner.write().last_activity = Instant::now();
        self.tx.subscribe()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Remove records older than `max_age_ms`, keyed to the timestamp
    /// observed during the scan — a record refreshed between the check and
    /// the removal survives.
    pub(crate) fn evict_stale(&self, now_ms: u64, max_age_ms: u64) -> usize {
        let candidates: Vec<(String, u64)> = {
            let inner = self.inner.read();
            inner
                .records
                .values()
                .filter(|r| now_ms.saturating_sub(r.updated_at) > max_age_ms)
                .map(|r| (r.client_id.clone(), r.updated_at))
                .collect()
        };
        if candidates.is_empty() {
            return 0;
        }

        let mut evicted = 0;
        let mut inner = self.inner.write();
        for (client_id, observed) in candidates {
            if inner
                .records
                .get(&client_id)
                .is_some_and(|r| r.updated_at == observed)
            {
                inner.records.remove(&client_id);
                evicted += 1;
            }
        }
        evicted
    }

    pub(crate) fn is_empty_and_idle(&self, idle: Duration) -> bool {
        let inner = self.inner.read();
        inner.records.is_empty() && inner.last_activity.elapsed() >= idle
    }
}
