//! Exchange-space coordinate transforms.
//!
//! Producers and consumers live in different native spaces (screen pixels,
//! 3D world offsets). Both sides map through the normalized 0–100 exchange
//! space so neither needs to know the other's geometry. The mapping is pure
//! and deterministic for fixed params; `from_exchange(to_exchange(p)) ≈ p`
//! except where clamping at the range boundaries applies.

use serde::{Deserialize, Serialize};

use crate::{EXCHANGE_MAX, EXCHANGE_MIN};

/// A 2D point, in native or exchange coordinates depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 3D offset relative to a consumer's reference frame (e.g. a camera).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldOffset {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Parameters mapping one native coordinate space to the exchange space.
///
/// `scale` is a linear factor applied on top of range normalization;
/// `depth` is the perspective divisor for 3D producers (viewing distance,
/// 1.0 for flat producers). Both must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub invert_x: bool,
    pub invert_y: bool,
    pub scale: f64,
    pub depth: f64,
}

impl Default for TransformParams {
    /// Identity mapping: native space is the exchange space.
    fn default() -> Self {
        Self::new(EXCHANGE_MIN, EXCHANGE_MAX, EXCHANGE_MIN, EXCHANGE_MAX)
    }
}

impl TransformParams {
    /// Create params for the given native axis ranges.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            invert_x: false,
            invert_y: false,
            scale: 1.0,
            depth: 1.0,
        }
    }

    /// Flip the X axis (native minimum maps to exchange maximum).
    pub fn invert_x(mut self) -> Self {
        self.invert_x = true;
        self
    }

    /// Flip the Y axis (e.g. screen-down producer, world-up consumer).
    pub fn invert_y(mut self) -> Self {
        self.invert_y = true;
        self
    }

    /// Set the linear scale factor.
    pub fn scale(mut self, factor: f64) -> Self {
        debug_assert!(factor > 0.0);
        self.scale = factor;
        self
    }

    /// Set the perspective divisor for 3D producers.
    pub fn depth(mut self, distance: f64) -> Self {
        debug_assert!(distance > 0.0);
        self.depth = distance;
        self
    }
}

/// Map a native-space point into the exchange space, clamped to `[0, 100]`.
pub fn to_exchange(native: Point, params: &TransformParams) -> Point {
    Point::new(
        axis_to_exchange(native.x, params.x_min, params.x_max, params.invert_x, params),
        axis_to_exchange(native.y, params.y_min, params.y_max, params.invert_y, params),
    )
}

/// Map an exchange-space point back into the native space.
///
/// Exact inverse of [`to_exchange`] for points that were in range; points
/// clamped on the way in come back at the corresponding range boundary.
pub fn from_exchange(exchange: Point, params: &TransformParams) -> Point {
    Point::new(
        axis_from_exchange(exchange.x, params.x_min, params.x_max, params.invert_x, params),
        axis_from_exchange(exchange.y, params.y_min, params.y_max, params.invert_y, params),
    )
}

/// Map an exchange-space point into a 3D offset for world-space consumers.
///
/// X and Y come from [`from_exchange`]; Z carries the configured viewing
/// distance, ready to be applied relative to a camera transform.
pub fn from_exchange_world(exchange: Point, params: &TransformParams) -> WorldOffset {
    let native = from_exchange(exchange, params);
    WorldOffset::new(native.x, native.y, params.depth)
}

fn axis_to_exchange(v: f64, min: f64, max: f64, invert: bool, params: &TransformParams) -> f64 {
    let span = max - min;
    // Zero-span axes carry no information; pin them to the exchange minimum
    if span == 0.0 {
        return EXCHANGE_MIN;
    }
    let mut t = (v - min) / span;
    if invert {
        t = 1.0 - t;
    }
    (t * EXCHANGE_MAX * params.scale / params.depth).clamp(EXCHANGE_MIN, EXCHANGE_MAX)
}

fn axis_from_exchange(e: f64, min: f64, max: f64, invert: bool, params: &TransformParams) -> f64 {
    let mut t = e * params.depth / (params.scale * EXCHANGE_MAX);
    if invert {
        t = 1.0 - t;
    }
    min + t * (max - min)
}
