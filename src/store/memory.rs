use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreTx};
use crate::{
    db::models::{NewReading, NewSensor, Sensor, SensorId, SensorReading, SensorStatus},
    error::CoreResult,
};

/// In-process [`Store`] with the same semantics as the Postgres tables.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks. A
/// transaction owns the mutex guard until it commits or is dropped, so readers
/// only ever see fully committed state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug)]
struct MemoryState {
    sensors: BTreeMap<SensorId, Sensor>,
    readings: Vec<SensorReading>,
    next_sensor_id: SensorId,
    next_reading_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            sensors: BTreeMap::new(),
            readings: Vec::new(),
            next_sensor_id: 1,
            next_reading_id: 1,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTx>> {
        let guard = self.inner.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            state: guard,
            staged_readings: Vec::new(),
            staged_status: Vec::new(),
        }))
    }

    async fn insert_sensor(&self, sensor: &NewSensor) -> CoreResult<Sensor> {
        let mut state = self.inner.lock().await;
        let id = state.next_sensor_id;
        state.next_sensor_id += 1;

        let row = Sensor {
            id,
            name: sensor.name.clone(),
            full_weight: sensor.full_weight,
            underweight_threshold_pct: sensor.underweight_threshold_pct,
            is_underweight: false,
            last_weight: None,
            last_reading_time: None,
        };
        state.sensors.insert(id, row.clone());
        Ok(row)
    }

    async fn find_sensor(&self, id: SensorId) -> CoreResult<Option<Sensor>> {
        Ok(self.inner.lock().await.sensors.get(&id).cloned())
    }

    async fn list_sensors(&self) -> CoreResult<Vec<Sensor>> {
        Ok(self.inner.lock().await.sensors.values().cloned().collect())
    }

    async fn delete_sensor(&self, id: SensorId) -> CoreResult<u64> {
        let removed = self.inner.lock().await.sensors.remove(&id);
        Ok(removed.map_or(0, |_| 1))
    }

    async fn recent_readings(
        &self,
        sensor_id: SensorId,
        limit: i64,
    ) -> CoreResult<Vec<SensorReading>> {
        let state = self.inner.lock().await;
        let mut rows: Vec<SensorReading> = state
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn delete_readings(&self, sensor_id: SensorId) -> CoreResult<u64> {
        let mut state = self.inner.lock().await;
        let before = state.readings.len();
        state.readings.retain(|r| r.sensor_id != sensor_id);
        Ok((before - state.readings.len()) as u64)
    }
}

/// Writes are staged and applied to the guarded state only on commit.
struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    staged_readings: Vec<SensorReading>,
    staged_status: Vec<(SensorId, SensorStatus)>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_sensor(&mut self, id: SensorId) -> CoreResult<Option<Sensor>> {
        let mut sensor = self.state.sensors.get(&id).cloned();
        if let Some(s) = sensor.as_mut() {
            if let Some((_, status)) = self.staged_status.iter().rev().find(|(sid, _)| *sid == id) {
                apply_status(s, status);
            }
        }
        Ok(sensor)
    }

    async fn insert_reading(&mut self, reading: &NewReading) -> CoreResult<SensorReading> {
        let row = SensorReading {
            id: self.state.next_reading_id + self.staged_readings.len() as i64,
            sensor_id: reading.sensor_id,
            timestamp: reading.timestamp,
            weight: reading.weight,
        };
        self.staged_readings.push(row.clone());
        Ok(row)
    }

    async fn write_status(&mut self, id: SensorId, status: &SensorStatus) -> CoreResult<()> {
        self.staged_status.push((id, *status));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let MemoryTx {
            mut state,
            staged_readings,
            staged_status,
        } = *self;

        state.next_reading_id += staged_readings.len() as i64;
        state.readings.extend(staged_readings);
        for (id, status) in staged_status {
            // Same as an UPDATE matching zero rows.
            if let Some(sensor) = state.sensors.get_mut(&id) {
                apply_status(sensor, &status);
            }
        }
        Ok(())
    }
}

fn apply_status(sensor: &mut Sensor, status: &SensorStatus) {
    sensor.is_underweight = status.is_underweight;
    sensor.last_weight = Some(status.last_weight);
    sensor.last_reading_time = Some(status.last_reading_time);
}
