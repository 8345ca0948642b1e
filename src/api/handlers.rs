use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::OpenApi;

use super::{
    dto::{
        CreateReadingRequest, CreateSensorRequest, DeleteResultDto, ReadingDto, SensorDetailDto,
        SensorDto,
    },
    errors::AppError,
    AppState,
};
use crate::{
    db::models::SensorId,
    error::CoreError,
    readings::DEFAULT_READINGS_LIMIT,
};

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReadingsParams {
    pub limit: Option<i64>,
}

fn sensor_id(path: Result<Path<SensorId>, PathRejection>) -> Result<SensorId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| CoreError::validation("Invalid sensor ID").into())
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|_| CoreError::validation("Invalid request payload").into())
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Register a new sensor. The server assigns its id.
#[utoipa::path(
    post,
    path = "/sensors",
    request_body = CreateSensorRequest,
    responses(
        (status = 201, description = "Sensor created", body = SensorDto),
        (status = 400, description = "Invalid payload or client-supplied sensor_id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn create_sensor(
    State(state): State<AppState>,
    payload: Result<Json<CreateSensorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SensorDto>), AppError> {
    let req = body(payload)?;
    let sensor = state.sensors.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(sensor.into())))
}

/// List every sensor ordered by id.
#[utoipa::path(
    get,
    path = "/sensors",
    responses(
        (status = 200, description = "All sensors", body = Vec<SensorDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(State(state): State<AppState>) -> Result<Json<Vec<SensorDto>>, AppError> {
    let sensors = state.sensors.list().await?;
    Ok(Json(sensors.into_iter().map(Into::into).collect()))
}

/// List sensors whose latest reading is at or below their threshold.
#[utoipa::path(
    get,
    path = "/sensors/underweight",
    responses(
        (status = 200, description = "Underweight sensors", body = Vec<SensorDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn list_underweight_sensors(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorDto>>, AppError> {
    let sensors = state.sensors.list_underweight().await?;
    Ok(Json(sensors.into_iter().map(Into::into).collect()))
}

/// Fetch a sensor together with its ten most recent readings.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}",
    params(("sensor_id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor and recent readings", body = SensorDetailDto),
        (status = 400, description = "Invalid sensor id"),
        (status = 404, description = "Sensor not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
) -> Result<Json<SensorDetailDto>, AppError> {
    let id = sensor_id(path)?;
    let sensor = state.sensors.get(id).await?;
    let readings = state.readings.most_recent(id, DEFAULT_READINGS_LIMIT).await?;

    Ok(Json(SensorDetailDto {
        sensor: sensor.into(),
        sensor_readings: readings.into_iter().map(Into::into).collect(),
    }))
}

/// Delete a sensor. Its readings are retained.
#[utoipa::path(
    delete,
    path = "/sensors/{sensor_id}",
    params(("sensor_id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor deleted (or already absent)", body = DeleteResultDto),
        (status = 400, description = "Invalid sensor id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn delete_sensor(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
) -> Result<Json<DeleteResultDto>, AppError> {
    let id = sensor_id(path)?;
    let deleted = state.sensors.delete(id).await?;
    Ok(Json(DeleteResultDto::success(deleted)))
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Submit a weight reading. Updates the sensor's underweight status.
#[utoipa::path(
    post,
    path = "/sensors/{sensor_id}/readings",
    params(("sensor_id" = i64, Path, description = "Sensor id")),
    request_body = CreateReadingRequest,
    responses(
        (status = 201, description = "Reading recorded", body = ReadingDto),
        (status = 400, description = "Invalid payload or sensor id"),
        (status = 404, description = "Sensor not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn create_reading(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
    payload: Result<Json<CreateReadingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReadingDto>), AppError> {
    let id = sensor_id(path)?;
    let req = body(payload)?;
    let reading = state.readings.insert(id, req.reading_time, req.weight).await?;
    Ok((StatusCode::CREATED, Json(reading.into())))
}

/// Most recent readings for a sensor, newest first. `?limit=` defaults to 10.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}/readings",
    params(
        ("sensor_id" = i64, Path, description = "Sensor id"),
        ("limit" = Option<i64>, Query, description = "Maximum readings to return (1-100, default 10)"),
    ),
    responses(
        (status = 200, description = "Recent readings", body = Vec<ReadingDto>),
        (status = 400, description = "Invalid sensor id or limit"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn list_readings(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
    params: Result<Query<ReadingsParams>, QueryRejection>,
) -> Result<Json<Vec<ReadingDto>>, AppError> {
    let id = sensor_id(path)?;
    let Query(params) =
        params.map_err(|_| CoreError::validation("Invalid query parameters"))?;
    let limit = params.limit.unwrap_or(DEFAULT_READINGS_LIMIT);

    let readings = state.readings.most_recent(id, limit).await?;
    Ok(Json(readings.into_iter().map(Into::into).collect()))
}

/// The single newest reading for a sensor.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}/readings/latest",
    params(("sensor_id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Latest reading", body = ReadingDto),
        (status = 400, description = "Invalid sensor id"),
        (status = 404, description = "No readings for this sensor"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn get_latest_reading(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
) -> Result<Json<ReadingDto>, AppError> {
    let id = sensor_id(path)?;
    let reading = state.readings.latest(id).await?;
    Ok(Json(reading.into()))
}

/// Delete every reading for a sensor. Succeeds with `deleted: 0` when there are none.
#[utoipa::path(
    delete,
    path = "/sensors/{sensor_id}/readings",
    params(("sensor_id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Readings deleted", body = DeleteResultDto),
        (status = 400, description = "Invalid sensor id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn delete_readings(
    State(state): State<AppState>,
    path: Result<Path<SensorId>, PathRejection>,
) -> Result<Json<DeleteResultDto>, AppError> {
    let id = sensor_id(path)?;
    let deleted = state.readings.delete_all(id).await?;
    Ok(Json(DeleteResultDto::success(deleted)))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        create_sensor,
        list_sensors,
        list_underweight_sensors,
        get_sensor,
        delete_sensor,
        create_reading,
        list_readings,
        get_latest_reading,
        delete_readings,
        health,
    ),
    components(schemas(
        SensorDto,
        ReadingDto,
        SensorDetailDto,
        CreateSensorRequest,
        CreateReadingRequest,
        DeleteResultDto,
    )),
    tags(
        (name = "sensors",  description = "Sensor registry endpoints"),
        (name = "readings", description = "Weight reading endpoints"),
        (name = "system",   description = "System endpoints"),
    ),
    info(
        title = "Sensor Weight API",
        version = "0.1.0",
        description = "REST API for weight sensors and their underweight status"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
