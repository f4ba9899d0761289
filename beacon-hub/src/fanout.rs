//! Push-mode delivery.
//!
//! Every room carries one broadcast channel; a subscription is a filtered
//! receiver over it. Delivery to each subscriber happens on that
//! subscriber's own task, out of line with the write path — a slow
//! consumer lags and loses its oldest buffered updates, it never delays
//! the writer or its peers.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use beacon_core::PositionRecord;

use crate::error::{Result, SyncError};
use crate::store::Filter;

/// A live push registration for one room.
///
/// Obtained from [`PresenceStore::subscribe`](crate::PresenceStore::subscribe).
/// Dropping the handle (or calling [`cancel`](Self::cancel)) stops delivery
/// and releases the room reference.
pub struct Subscription {
    room: String,
    rx: broadcast::Receiver<PositionRecord>,
    filter: Filter,
}

impl Subscription {
    pub(crate) fn new(
        room: String,
        rx: broadcast::Receiver<PositionRecord>,
        filter: Filter,
    ) -> Self {
        Self { room, rx, filter }
    }

    /// The room this subscription is attached to.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Wait for the next update passing this subscription's filter.
    ///
    /// Returns [`SyncError::Lagged`] if this subscriber fell behind the
    /// room's buffer — later calls resume from the oldest retained update.
    /// Returns [`SyncError::Closed`] once the room is gone.
    pub async fn recv(&mut self) -> Result<PositionRecord> {
        loop {
            match self.rx.recv().await {
                Ok(record) => {
                    if self.filter.matches(&record) {
                        return Ok(record);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    return Err(SyncError::Lagged(missed));
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SyncError::Closed),
            }
        }
    }

    /// Drain the next matching update without waiting.
    ///
    /// `Ok(None)` means nothing is pending right now.
    pub fn try_recv(&mut self) -> Result<Option<PositionRecord>> {
        loop {
            match self.rx.try_recv() {
                Ok(record) => {
                    if self.filter.matches(&record) {
                        return Ok(Some(record));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(missed)) => return Err(SyncError::Lagged(missed)),
                Err(TryRecvError::Closed) => return Err(SyncError::Closed),
            }
        }
    }

    /// Cancel the subscription.
    ///
    /// Dropping the handle has the same effect; this just makes the
    /// intent explicit at call sites.
    pub fn cancel(self) {}
}
