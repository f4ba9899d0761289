//! Single-writer arbitration for shared-target consumers.
//!
//! Rooms store every client's position, but consumers that drive one
//! shared target (a mirrored cursor, a single marker) act on one writer
//! at a time. With no explicit claim, desktop-class writes drive; an
//! explicit [`set_leader`](crate::PresenceStore::set_leader) call hands
//! control to a specific client, last-write-wins, until released.

use beacon_core::{DeviceClass, PositionRecord};

/// Device class that drives a shared target when no leader is set.
pub(crate) const DEFAULT_AUTHORITY_CLASS: DeviceClass = DeviceClass::Desktop;

/// Who currently drives a shared target in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authority {
    /// An explicit leader holds control.
    Client(String),
    /// No explicit claim; writes from this device class drive by default.
    DeviceClass(DeviceClass),
}

impl Authority {
    /// Is this record's writer the one a shared-target consumer should
    /// act on?
    pub fn permits(&self, record: &PositionRecord) -> bool {
        match self {
            Authority::Client(client_id) => record.client_id == *client_id,
            Authority::DeviceClass(class) => record.device_class == *class,
        }
    }
}
