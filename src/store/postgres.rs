use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{Store, StoreTx};
use crate::{
    db::models::{NewReading, NewSensor, Sensor, SensorId, SensorReading, SensorStatus},
    error::CoreResult,
};

/// `sensor` columns aliased onto [`Sensor`] fields.
const SENSOR_COLUMNS: &str = "sensor_id AS id, sensor_name AS name, full_weight, \
    underweight_percent AS underweight_threshold_pct, is_underweight, \
    last_reading_weight AS last_weight, last_reading_time";

/// `sensor_reading` columns aliased onto [`SensorReading`] fields.
const READING_COLUMNS: &str = "reading_id AS id, sensor_id, record_time AS timestamp, weight";

/// [`Store`] backed by the `sensor` and `sensor_reading` Postgres tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn insert_sensor(&self, sensor: &NewSensor) -> CoreResult<Sensor> {
        let query = format!(
            "INSERT INTO sensor (sensor_name, full_weight, underweight_percent) \
             VALUES ($1, $2, $3) \
             RETURNING {SENSOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Sensor>(&query)
            .bind(&sensor.name)
            .bind(sensor.full_weight)
            .bind(sensor.underweight_threshold_pct)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_sensor(&self, id: SensorId) -> CoreResult<Option<Sensor>> {
        let query = format!("SELECT {SENSOR_COLUMNS} FROM sensor WHERE sensor_id = $1");
        let row = sqlx::query_as::<_, Sensor>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_sensors(&self) -> CoreResult<Vec<Sensor>> {
        let query = format!("SELECT {SENSOR_COLUMNS} FROM sensor ORDER BY sensor_id ASC");
        let rows = sqlx::query_as::<_, Sensor>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_sensor(&self, id: SensorId) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM sensor WHERE sensor_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn recent_readings(
        &self,
        sensor_id: SensorId,
        limit: i64,
    ) -> CoreResult<Vec<SensorReading>> {
        let query = format!(
            "SELECT {READING_COLUMNS} FROM sensor_reading \
             WHERE sensor_id = $1 \
             ORDER BY record_time DESC, reading_id DESC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, SensorReading>(&query)
            .bind(sensor_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_readings(&self, sensor_id: SensorId) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM sensor_reading WHERE sensor_id = $1")
            .bind(sensor_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Open Postgres transaction. `sqlx` rolls it back when dropped uncommitted.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_sensor(&mut self, id: SensorId) -> CoreResult<Option<Sensor>> {
        // Row lock serializes concurrent inserts for the same sensor only.
        let query = format!("SELECT {SENSOR_COLUMNS} FROM sensor WHERE sensor_id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, Sensor>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_reading(&mut self, reading: &NewReading) -> CoreResult<SensorReading> {
        let query = format!(
            "INSERT INTO sensor_reading (sensor_id, record_time, weight) \
             VALUES ($1, $2, $3) \
             RETURNING {READING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SensorReading>(&query)
            .bind(reading.sensor_id)
            .bind(reading.timestamp)
            .bind(reading.weight)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn write_status(&mut self, id: SensorId, status: &SensorStatus) -> CoreResult<()> {
        sqlx::query(
            "UPDATE sensor \
             SET is_underweight = $1, last_reading_weight = $2, last_reading_time = $3 \
             WHERE sensor_id = $4",
        )
        .bind(status.is_underweight)
        .bind(status.last_weight)
        .bind(status.last_reading_time)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests (need a live Postgres via DATABASE_URL)
// ---------------------------------------------------------------------------
