use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{NewSensor, Sensor, SensorReading};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorDto {
    pub sensor_id: i64,
    pub sensor_name: String,
    pub full_weight: f64,
    /// Percentage of `full_weight` at or below which the sensor is underweight.
    pub underweight_percent: f64,
    pub is_underweight: bool,
    /// `null` until the first reading arrives.
    pub last_weight: Option<f64>,
    pub last_reading_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingDto {
    pub reading_id: i64,
    pub sensor_id: i64,
    pub reading_time: DateTime<Utc>,
    pub weight: f64,
}

/// Response for `GET /sensors/{sensor_id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorDetailDto {
    pub sensor: SensorDto,
    /// Up to ten most recent readings, newest first.
    pub sensor_readings: Vec<ReadingDto>,
}

/// Request body for `POST /sensors`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSensorRequest {
    /// Must be omitted; ids are assigned by the server.
    pub sensor_id: Option<i64>,
    pub sensor_name: String,
    pub full_weight: f64,
    pub underweight_percent: f64,
}

/// Request body for `POST /sensors/{sensor_id}/readings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReadingRequest {
    /// RFC3339. Defaults to the server's current UTC time.
    pub reading_time: Option<DateTime<Utc>>,
    pub weight: f64,
}

/// Response for the delete endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResultDto {
    pub result: String,
    pub deleted: u64,
}

impl DeleteResultDto {
    pub fn success(deleted: u64) -> Self {
        Self {
            result: "success".to_owned(),
            deleted,
        }
    }
}

impl From<Sensor> for SensorDto {
    fn from(s: Sensor) -> Self {
        Self {
            sensor_id: s.id,
            sensor_name: s.name,
            full_weight: s.full_weight,
            underweight_percent: s.underweight_threshold_pct,
            is_underweight: s.is_underweight,
            last_weight: s.last_weight,
            last_reading_time: s.last_reading_time,
        }
    }
}

impl From<SensorReading> for ReadingDto {
    fn from(r: SensorReading) -> Self {
        Self {
            reading_id: r.id,
            sensor_id: r.sensor_id,
            reading_time: r.timestamp,
            weight: r.weight,
        }
    }
}

impl From<CreateSensorRequest> for NewSensor {
    fn from(req: CreateSensorRequest) -> Self {
        Self {
            requested_id: req.sensor_id,
            name: req.sensor_name,
            full_weight: req.full_weight,
            underweight_threshold_pct: req.underweight_percent,
        }
    }
}
