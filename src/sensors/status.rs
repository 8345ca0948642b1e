use chrono::{DateTime, Utc};

use crate::db::models::{Sensor, SensorStatus};

/// `true` when `weight` is at or below `threshold_pct` percent of `full_weight`.
#[inline]
pub fn is_underweight(weight: f64, full_weight: f64, threshold_pct: f64) -> bool {
    weight / full_weight <= threshold_pct / 100.0
}

/// Status a sensor should carry after a reading of `weight` taken at `at`.
///
/// Returns `None` when the reading is older than the one already applied, so
/// a late-arriving stale reading never overwrites newer status. A reading with
/// the same timestamp as the applied one is re-derived, which keeps retries
/// idempotent.
pub fn derive_status(sensor: &Sensor, weight: f64, at: DateTime<Utc>) -> Option<SensorStatus> {
    if matches!(sensor.last_reading_time, Some(last) if at < last) {
        return None;
    }

    Some(SensorStatus {
        is_underweight: is_underweight(weight, sensor.full_weight, sensor.underweight_threshold_pct),
        last_weight: weight,
        last_reading_time: at,
    })
}
