//! Error types for beacon-hub.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Coordinates outside the exchange range, or not finite.
    ///
    /// Rejected rather than clamped so producers fix their transform
    /// params instead of feeding corrupt positions into shared state.
    #[error("invalid position ({x}, {y}): outside exchange range [0, 100]")]
    InvalidPosition { x: f64, y: f64 },

    /// Empty room name.
    #[error("invalid room name")]
    InvalidRoom,

    /// Empty client id.
    #[error("invalid client id")]
    InvalidClient,

    /// Explicit existence check against a room never referenced.
    ///
    /// Read queries never surface this; they return empty results.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// A push subscriber fell behind and missed this many updates.
    ///
    /// Surfaced only on that subscriber's receive path; the writer is
    /// never blocked or failed by a slow subscriber.
    #[error("subscriber lagged, {0} updates dropped")]
    Lagged(u64),

    /// The subscription's room channel is gone.
    #[error("subscription closed")]
    Closed,
}
