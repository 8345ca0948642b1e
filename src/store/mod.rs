//! Storage handle shared by the Reading Store and the Sensor Registry.
//!
//! The handle is passed explicitly (`Arc<dyn Store>`) so the same service code
//! runs against Postgres in production and against [`MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    db::models::{NewReading, NewSensor, Sensor, SensorId, SensorReading, SensorStatus},
    error::CoreResult,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transactional unit. Dropping it without calling
    /// [`StoreTx::commit`] discards every write made through it.
    async fn begin(&self) -> CoreResult<Box<dyn StoreTx>>;

    /// Insert a sensor and return it with its assigned id. `requested_id` is
    /// ignored here; callers validate it beforehand.
    async fn insert_sensor(&self, sensor: &NewSensor) -> CoreResult<Sensor>;

    async fn find_sensor(&self, id: SensorId) -> CoreResult<Option<Sensor>>;

    /// All sensors ordered by id ascending.
    async fn list_sensors(&self) -> CoreResult<Vec<Sensor>>;

    /// Returns the number of sensor rows removed. Readings are left untouched.
    async fn delete_sensor(&self, id: SensorId) -> CoreResult<u64>;

    /// Up to `limit` readings, newest first (ties broken by newest row id).
    async fn recent_readings(&self, sensor_id: SensorId, limit: i64)
        -> CoreResult<Vec<SensorReading>>;

    /// Returns the number of readings removed.
    async fn delete_readings(&self, sensor_id: SensorId) -> CoreResult<u64>;
}

/// One open transaction against a [`Store`].
#[async_trait]
pub trait StoreTx: Send {
    /// Fetch a sensor and hold it exclusively until commit or rollback.
    async fn lock_sensor(&mut self, id: SensorId) -> CoreResult<Option<Sensor>>;

    async fn insert_reading(&mut self, reading: &NewReading) -> CoreResult<SensorReading>;

    async fn write_status(&mut self, id: SensorId, status: &SensorStatus) -> CoreResult<()>;

    async fn commit(self: Box<Self>) -> CoreResult<()>;
}
