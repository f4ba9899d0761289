//! # beacon-core
//!
//! Shared presence types for Beacon position synchronization.
//!
//! This crate provides the types exchanged between producers (a map
//! location poller, a mouse-tracking controller, an AR marker tracker)
//! and consumers of position updates:
//!
//! - [`PositionRecord`]: one client's latest position in a room
//! - [`DeviceClass`]: producer origin tag for consumer-side filtering
//! - [`TransformParams`]: mapping between a native coordinate space and
//!   the normalized 0–100 exchange space
//!
//! ## Layer Diagram
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ beacon-hub (rooms, fanout, eviction)    │
//! └────────────────────┬────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────┐
//! │ beacon-core (records, transforms)       │  ← This crate
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use beacon_core::{from_exchange, to_exchange, Point, PositionRecord, TransformParams};
//!
//! // A desktop producer on a 1920x1080 screen, Y inverted for the consumer
//! let params = TransformParams::new(0.0, 1920.0, 0.0, 1080.0).invert_y();
//! let exchange = to_exchange(Point::new(960.0, 1080.0), &params);
//! assert_eq!(exchange, Point::new(50.0, 0.0));
//!
//! // The consumer maps back into its own native space
//! let back = from_exchange(exchange, &params);
//! assert!((back.x - 960.0).abs() < 1e-9);
//!
//! let record = PositionRecord::new("mouse-1", exchange.x, exchange.y);
//! assert!(record.in_range());
//! ```

mod record;
mod transform;

pub use record::{now_ms, DeviceClass, PositionRecord, EXCHANGE_MAX, EXCHANGE_MIN};
pub use transform::{
    from_exchange, from_exchange_world, to_exchange, Point, TransformParams, WorldOffset,
};
