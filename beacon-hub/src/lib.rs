//! # beacon-hub
//!
//! Room-scoped presence hub: latest-position storage, push and poll
//! fanout, leader arbitration, and TTL eviction.
//!
//! The hub holds only the latest position per `(room, client)` — it is
//! presence, not a message log. Producers normalize coordinates through
//! `beacon-core` transforms before submitting; consumers receive peer
//! records by push subscription or by polling, and map them back into
//! their own native space.
//!
//! ## Quick start
//!
//! ```rust
//! use beacon_hub::{Filter, PositionRecord, PresenceStore};
//!
//! let store = PresenceStore::new();
//! store
//!     .submit("demo", PositionRecord::new("a", 10.0, 20.0))
//!     .unwrap();
//!
//! let latest = store.poll_latest("demo", &Filter::new()).unwrap();
//! assert_eq!(latest.client_id, "a");
//! ```
//!
//! Push-capable consumers subscribe instead of polling:
//!
//! ```rust,no_run
//! # async fn demo() -> beacon_hub::Result<()> {
//! use beacon_hub::{Filter, PresenceStore};
//!
//! let store = PresenceStore::new();
//! let mut sub = store.subscribe("demo", Filter::new().exclude_client("me"))?;
//! while let Ok(record) = sub.recv().await {
//!     // apply the peer position to the local rendering layer
//!     let _ = (record.x, record.y);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Pair a shared store with [`sweeper::spawn`] so stale records and idle
//! rooms are evicted in the background.
//!
//! ## Features
//!
//! - `tracing`: emit eviction events via the `tracing` facade (off by
//!   default; the crate is silent without it)

mod error;
mod fanout;
mod leader;
mod room;
mod store;
pub mod sweeper;

pub use error::{Result, SyncError};
pub use fanout::Subscription;
pub use leader::Authority;
pub use store::{Filter, HubConfig, PresenceStore, SweepStats, WriteOutcome};
pub use sweeper::SweeperHandle;

// Re-export the record types that appear in this crate's API.
pub use beacon_core::{DeviceClass, PositionRecord};
