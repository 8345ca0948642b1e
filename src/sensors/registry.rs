use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::status::derive_status;
use crate::{
    db::models::{NewSensor, Sensor, SensorId},
    error::{CoreError, CoreResult},
    store::{Store, StoreTx},
};

/// Owns sensor metadata and the derived status fields.
#[derive(Clone)]
pub struct SensorRegistry {
    store: Arc<dyn Store>,
}

impl SensorRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Registers a sensor under a freshly assigned id.
    ///
    /// Rejects a client-chosen id, an empty name, a non-positive or
    /// non-finite full weight, and a threshold outside `0..=100`.
    pub async fn create(&self, sensor: NewSensor) -> CoreResult<Sensor> {
        validate_new_sensor(&sensor)?;

        let created = self.store.insert_sensor(&sensor).await?;
        info!(sensor_id = created.id, name = %created.name, "Sensor created");
        Ok(created)
    }

    pub async fn get(&self, id: SensorId) -> CoreResult<Sensor> {
        self.store
            .find_sensor(id)
            .await?
            .ok_or_else(|| CoreError::sensor_not_found(id))
    }

    /// All sensors ordered by id.
    pub async fn list(&self) -> CoreResult<Vec<Sensor>> {
        self.store.list_sensors().await
    }

    /// Sensors whose most recent reading put them at or below threshold.
    pub async fn list_underweight(&self) -> CoreResult<Vec<Sensor>> {
        let sensors = self.list().await?;
        Ok(sensors.into_iter().filter(|s| s.is_underweight).collect())
    }

    /// Removes the sensor row. Its readings are kept and remain queryable by
    /// `sensor_id`.
    pub async fn delete(&self, id: SensorId) -> CoreResult<u64> {
        let deleted = self.store.delete_sensor(id).await?;
        info!(sensor_id = id, deleted, "Sensor deleted");
        Ok(deleted)
    }

    /// Applies a new reading to `sensor`'s derived status inside `tx`.
    ///
    /// `sensor` must be the row locked by `tx`. Returns `false` when the
    /// reading is older than the status already applied and nothing was
    /// written.
    pub async fn recompute_status(
        tx: &mut dyn StoreTx,
        sensor: &Sensor,
        weight: f64,
        at: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let Some(status) = derive_status(sensor, weight, at) else {
            debug!(
                sensor_id = sensor.id,
                reading_time = %at,
                last_reading_time = ?sensor.last_reading_time,
                "Stale reading; status left unchanged"
            );
            return Ok(false);
        };

        tx.write_status(sensor.id, &status).await?;
        debug!(
            sensor_id = sensor.id,
            is_underweight = status.is_underweight,
            last_weight = status.last_weight,
            "Sensor status recomputed"
        );
        Ok(true)
    }
}

fn validate_new_sensor(sensor: &NewSensor) -> CoreResult<()> {
    if let Some(id) = sensor.requested_id {
        return Err(CoreError::validation(format!(
            "sensor_id {id} must not be supplied; ids are assigned by the server"
        )));
    }
    if sensor.name.trim().is_empty() {
        return Err(CoreError::validation("sensor_name must not be empty"));
    }
    if !sensor.full_weight.is_finite() || sensor.full_weight <= 0.0 {
        return Err(CoreError::validation("full_weight must be a positive number"));
    }
    if !(0.0..=100.0).contains(&sensor.underweight_threshold_pct) {
        return Err(CoreError::validation(
            "underweight_percent must be between 0 and 100",
        ));
    }
    Ok(())
}
