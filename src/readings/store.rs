use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    db::models::{NewReading, SensorId, SensorReading},
    error::{CoreError, CoreResult},
    sensors::SensorRegistry,
    store::{Store, StoreTx},
};

/// Number of readings returned when no limit is requested.
pub const DEFAULT_READINGS_LIMIT: i64 = 10;

/// Upper bound accepted for an explicit limit.
pub const MAX_READINGS_LIMIT: i64 = 100;

/// Persists weight observations and keeps the owning sensor's status in step.
#[derive(Clone)]
pub struct ReadingStore {
    store: Arc<dyn Store>,
}

impl ReadingStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records a reading and recomputes the sensor's status in the same
    /// transaction.
    ///
    /// A missing `timestamp` is replaced with the current server time (UTC).
    /// Fails with `NotFound` when the sensor does not exist; nothing is
    /// written in that case.
    pub async fn insert(
        &self,
        sensor_id: SensorId,
        timestamp: Option<DateTime<Utc>>,
        weight: f64,
    ) -> CoreResult<SensorReading> {
        validate_sensor_id(sensor_id)?;

        let reading = NewReading {
            sensor_id,
            timestamp: timestamp.unwrap_or_else(Utc::now),
            weight,
        };

        let mut tx = self.store.begin().await?;
        let sensor = tx
            .lock_sensor(sensor_id)
            .await?
            .ok_or_else(|| CoreError::sensor_not_found(sensor_id))?;

        let row = tx.insert_reading(&reading).await?;
        let applied =
            SensorRegistry::recompute_status(&mut *tx, &sensor, row.weight, row.timestamp)
                .await?;
        tx.commit().await?;

        info!(
            sensor_id,
            reading_id = row.id,
            weight = row.weight,
            reading_time = %row.timestamp,
            status_applied = applied,
            "Reading recorded"
        );
        Ok(row)
    }

    /// Up to `limit` readings for the sensor, newest first. An unknown sensor
    /// or one without history yields an empty list.
    pub async fn most_recent(
        &self,
        sensor_id: SensorId,
        limit: i64,
    ) -> CoreResult<Vec<SensorReading>> {
        if !(1..=MAX_READINGS_LIMIT).contains(&limit) {
            return Err(CoreError::validation(format!(
                "limit must be between 1 and {MAX_READINGS_LIMIT}"
            )));
        }
        let rows = self.store.recent_readings(sensor_id, limit).await?;
        debug!(sensor_id, limit, returned = rows.len(), "Fetched recent readings");
        Ok(rows)
    }

    /// The single newest reading. Unlike [`Self::most_recent`], an empty
    /// history is reported as `NotFound`.
    pub async fn latest(&self, sensor_id: SensorId) -> CoreResult<SensorReading> {
        self.store
            .recent_readings(sensor_id, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::readings_not_found(sensor_id))
    }

    /// Removes every reading for the sensor. Zero removed is still success.
    pub async fn delete_all(&self, sensor_id: SensorId) -> CoreResult<u64> {
        let deleted = self.store.delete_readings(sensor_id).await?;
        info!(sensor_id, deleted, "Readings deleted");
        Ok(deleted)
    }
}

fn validate_sensor_id(sensor_id: SensorId) -> CoreResult<()> {
    if sensor_id <= 0 {
        return Err(CoreError::validation(format!(
            "sensor_id must be a positive integer, got {sensor_id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{db::models::NewSensor, store::MemoryStore};

    struct Fixture {
        readings: ReadingStore,
        sensors: SensorRegistry,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        Fixture {
            readings: ReadingStore::new(store.clone()),
            sensors: SensorRegistry::new(store),
        }
    }

    async fn hopper(f: &Fixture) -> SensorId {
        f.sensors
            .create(NewSensor::new("hopper", 100.0, 20.0))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn insert_below_threshold_marks_underweight() {
        let f = fixture();
        let id = hopper(&f).await;

        f.readings.insert(id, None, 15.0).await.unwrap();
        assert!(f.sensors.get(id).await.unwrap().is_underweight);

        f.readings.insert(id, None, 25.0).await.unwrap();
        assert!(!f.sensors.get(id).await.unwrap().is_underweight);
    }

    #[tokio::test]
    async fn insert_updates_last_weight_and_time() {
        let f = fixture();
        let id = hopper(&f).await;
        let at = Utc::now() - Duration::hours(1);

        let row = f.readings.insert(id, Some(at), 42.5).await.unwrap();
        let sensor = f.sensors.get(id).await.unwrap();

        assert_eq!(row.timestamp, at);
        assert_eq!(sensor.last_weight, Some(42.5));
        assert_eq!(sensor.last_reading_time, Some(at));
    }

    #[tokio::test]
    async fn insert_accepts_zero_and_negative_weights() {
        let f = fixture();
        let id = hopper(&f).await;

        f.readings.insert(id, None, 0.0).await.unwrap();
        let row = f.readings.insert(id, None, -4.0).await.unwrap();
        assert_eq!(row.weight, -4.0);
    }

    #[tokio::test]
    async fn missing_timestamp_defaults_to_ingestion_time() {
        let f = fixture();
        let id = hopper(&f).await;

        let before = Utc::now();
        let row = f.readings.insert(id, None, 50.0).await.unwrap();
        let after = Utc::now();

        assert!(row.timestamp >= before && row.timestamp <= after);
        assert!(row.timestamp.timestamp() > 0);
    }

    #[tokio::test]
    async fn insert_rejects_non_positive_sensor_id() {
        let f = fixture();
        for id in [0, -1] {
            let err = f.readings.insert(id, None, 1.0).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn insert_for_missing_sensor_writes_nothing() {
        let f = fixture();

        let err = f.readings.insert(7, None, 1.0).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "sensor", id: 7 }));
        assert!(f.readings.most_recent(7, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn most_recent_is_newest_first() {
        let f = fixture();
        let id = hopper(&f).await;
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(1);
        let t3 = t1 + Duration::seconds(2);

        for t in [t2, t1, t3] {
            f.readings.insert(id, Some(t), 50.0).await.unwrap();
        }

        let times: Vec<_> = f
            .readings
            .most_recent(id, DEFAULT_READINGS_LIMIT)
            .await
            .unwrap()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(times, vec![t3, t2, t1]);
    }

    #[tokio::test]
    async fn most_recent_returns_ten_newest_of_fifteen() {
        let f = fixture();
        let id = hopper(&f).await;
        let base = Utc::now();

        for i in 0..15 {
            f.readings
                .insert(id, Some(base + Duration::seconds(i)), i as f64)
                .await
                .unwrap();
        }

        let rows = f.readings.most_recent(id, DEFAULT_READINGS_LIMIT).await.unwrap();
        assert_eq!(rows.len(), 10);
        let weights: Vec<_> = rows.iter().map(|r| r.weight).collect();
        let expected: Vec<_> = (5..15).rev().map(|i| i as f64).collect();
        assert_eq!(weights, expected);
    }

    #[tokio::test]
    async fn most_recent_shorter_history_returns_all() {
        let f = fixture();
        let id = hopper(&f).await;
        f.readings.insert(id, None, 1.0).await.unwrap();
        f.readings.insert(id, None, 2.0).await.unwrap();

        assert_eq!(f.readings.most_recent(id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn most_recent_rejects_out_of_range_limit() {
        let f = fixture();
        for limit in [0, MAX_READINGS_LIMIT + 1] {
            let err = f.readings.most_recent(1, limit).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn latest_without_readings_is_not_found() {
        let f = fixture();
        let id = hopper(&f).await;

        let err = f.readings.latest(id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "records", .. }));

        f.readings.insert(id, None, 3.0).await.unwrap();
        assert_eq!(f.readings.latest(id).await.unwrap().weight, 3.0);
    }

    #[tokio::test]
    async fn delete_all_without_readings_succeeds_with_zero() {
        let f = fixture();
        let id = hopper(&f).await;
        assert_eq!(f.readings.delete_all(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_all_removes_only_that_sensors_readings() {
        let f = fixture();
        let a = hopper(&f).await;
        let b = hopper(&f).await;
        f.readings.insert(a, None, 1.0).await.unwrap();
        f.readings.insert(a, None, 2.0).await.unwrap();
        f.readings.insert(b, None, 3.0).await.unwrap();

        assert_eq!(f.readings.delete_all(a).await.unwrap(), 2);
        assert!(f.readings.most_recent(a, 10).await.unwrap().is_empty());
        assert_eq!(f.readings.most_recent(b, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_sensor_leaves_orphaned_readings() {
        let f = fixture();
        let id = hopper(&f).await;
        f.readings.insert(id, None, 10.0).await.unwrap();

        f.sensors.delete(id).await.unwrap();

        // Readings are retained after their sensor is gone.
        assert_eq!(f.readings.most_recent(id, 10).await.unwrap().len(), 1);
        assert!(f.readings.insert(id, None, 1.0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn out_of_order_reading_keeps_newer_status() {
        let f = fixture();
        let id = hopper(&f).await;
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(5);

        f.readings.insert(id, Some(t2), 90.0).await.unwrap();
        f.readings.insert(id, Some(t1), 5.0).await.unwrap();

        let sensor = f.sensors.get(id).await.unwrap();
        assert_eq!(sensor.last_reading_time, Some(t2));
        assert_eq!(sensor.last_weight, Some(90.0));
        assert!(!sensor.is_underweight);
        // The stale reading is still part of the history.
        assert_eq!(f.readings.most_recent(id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_settle_on_newest_reading() {
        for _ in 0..20 {
            let f = fixture();
            let id = hopper(&f).await;
            let t1 = Utc::now();
            let t2 = t1 + Duration::seconds(1);

            let older = {
                let readings = f.readings.clone();
                tokio::spawn(async move { readings.insert(id, Some(t1), 5.0).await })
            };
            let newer = {
                let readings = f.readings.clone();
                tokio::spawn(async move { readings.insert(id, Some(t2), 80.0).await })
            };
            older.await.unwrap().unwrap();
            newer.await.unwrap().unwrap();

            let sensor = f.sensors.get(id).await.unwrap();
            assert_eq!(sensor.last_reading_time, Some(t2));
            assert_eq!(sensor.last_weight, Some(80.0));
            assert!(!sensor.is_underweight);
        }
    }
}
