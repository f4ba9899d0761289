//! Position records exchanged between producers and consumers.

use serde::{Deserialize, Serialize};

/// Lower bound of the exchange coordinate space.
pub const EXCHANGE_MIN: f64 = 0.0;

/// Upper bound of the exchange coordinate space.
pub const EXCHANGE_MAX: f64 = 100.0;

/// Producer device class, used for origin-based filtering.
///
/// Consumers that drive a shared target from one side of the link filter
/// on this tag so they never echo updates from their own class:
/// - `Desktop`: a PC-side producer (mouse tracking, map location)
/// - `Headset`: a head-mounted device producer
/// - `Unknown`: unclassified; matched only by explicit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// PC-side producer
    Desktop,
    /// Head-mounted device producer
    Headset,
    /// Unclassified producer
    Unknown,
}

impl Default for DeviceClass {
    fn default() -> Self {
        Self::Unknown
    }
}

impl DeviceClass {
    /// Canonical lowercase name of this class.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Headset => "headset",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from a canonical name.
    ///
    /// Returns `None` for unrecognized names.
    #[inline]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "desktop" => Some(Self::Desktop),
            "headset" => Some(Self::Headset),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Parse from a name, defaulting to `Unknown` for unrecognized values.
    #[inline]
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_name(name).unwrap_or(Self::Unknown)
    }
}

/// One client's latest position in a room.
///
/// A room holds at most one record per `client_id`; every accepted write
/// overwrites the previous record in place. `updated_at` is strictly
/// increasing per client within a room — the store drops anything older
/// than what it already holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Stable producer identifier, unique within a room
    pub client_id: String,
    /// Human-readable name, not unique
    pub display_name: String,
    /// Exchange-space X, in `[0, 100]`
    pub x: f64,
    /// Exchange-space Y, in `[0, 100]`
    pub y: f64,
    /// Opaque rendering tag
    #[serde(default)]
    pub color: Option<String>,
    /// Milliseconds since the Unix epoch; 0 until the store stamps it
    #[serde(default)]
    pub updated_at: u64,
    /// Producer origin tag
    #[serde(default)]
    pub device_class: DeviceClass,
}

impl PositionRecord {
    /// Create a record with the given id and exchange coordinates.
    ///
    /// `display_name` defaults to the client id and `updated_at` to 0,
    /// meaning the store assigns the write time. Use [`with_updated_at`]
    /// to carry a producer-side timestamp instead.
    ///
    /// [`with_updated_at`]: Self::with_updated_at
    pub fn new(client_id: impl Into<String>, x: f64, y: f64) -> Self {
        let client_id = client_id.into();
        Self {
            display_name: client_id.clone(),
            client_id,
            x,
            y,
            color: None,
            updated_at: 0,
            device_class: DeviceClass::Unknown,
        }
    }

    /// Set the human-readable name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the rendering tag.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the producer device class.
    pub fn with_device_class(mut self, device_class: DeviceClass) -> Self {
        self.device_class = device_class;
        self
    }

    /// Set an explicit timestamp (milliseconds since the Unix epoch).
    pub fn with_updated_at(mut self, updated_at: u64) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Are both coordinates finite and within the exchange range?
    #[inline]
    pub fn in_range(&self) -> bool {
        in_exchange_range(self.x) && in_exchange_range(self.y)
    }

    /// Clamp both coordinates into the exchange range.
    ///
    /// Producers call this before submitting; the store rejects rather
    /// than clamps, so out-of-range input never enters shared state.
    pub fn clamped(mut self) -> Self {
        self.x = clamp_exchange(self.x);
        self.y = clamp_exchange(self.y);
        self
    }
}

#[inline]
fn in_exchange_range(v: f64) -> bool {
    v.is_finite() && (EXCHANGE_MIN..=EXCHANGE_MAX).contains(&v)
}

#[inline]
fn clamp_exchange(v: f64) -> f64 {
    if v.is_nan() {
        EXCHANGE_MIN
    } else {
        v.clamp(EXCHANGE_MIN, EXCHANGE_MAX)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
