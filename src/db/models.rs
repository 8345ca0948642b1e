use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Server-assigned sensor identity (`sensor.sensor_id`, `BIGSERIAL`).
pub type SensorId = i64;

/// Row of the `sensor` table.
///
/// `is_underweight`, `last_weight` and `last_reading_time` are derived from
/// the reading history and only ever written by
/// `SensorRegistry::recompute_status`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub full_weight: f64,
    /// Percentage (0–100) of `full_weight` at or below which the sensor is underweight.
    pub underweight_threshold_pct: f64,
    pub is_underweight: bool,
    pub last_weight: Option<f64>,
    pub last_reading_time: Option<DateTime<Utc>>,
}

/// Row of the `sensor_reading` table. Immutable once written.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    pub weight: f64,
}

/// Input for `SensorRegistry::create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensor {
    /// An id the client tried to choose. Always rejected; identities are
    /// assigned by the store.
    pub requested_id: Option<SensorId>,
    pub name: String,
    pub full_weight: f64,
    pub underweight_threshold_pct: f64,
}

impl NewSensor {
    pub fn new(name: impl Into<String>, full_weight: f64, underweight_threshold_pct: f64) -> Self {
        Self {
            requested_id: None,
            name: name.into(),
            full_weight,
            underweight_threshold_pct,
        }
    }
}

/// A reading ready to be persisted (timestamp already resolved).
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    pub weight: f64,
}

/// Derived status fields written together onto a `sensor` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorStatus {
    pub is_underweight: bool,
    pub last_weight: f64,
    pub last_reading_time: DateTime<Utc>,
}
