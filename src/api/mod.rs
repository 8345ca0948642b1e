pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{readings::ReadingStore, sensors::SensorRegistry, store::Store};
use handlers::ApiDoc;

/// Shared handler state. Both components are built over the same store handle.
#[derive(Clone)]
pub struct AppState {
    pub sensors: SensorRegistry,
    pub readings: ReadingStore,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            sensors: SensorRegistry::new(store.clone()),
            readings: ReadingStore::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/sensors",
            get(handlers::list_sensors).post(handlers::create_sensor),
        )
        .route("/sensors/underweight", get(handlers::list_underweight_sensors))
        .route(
            "/sensors/{sensor_id}",
            get(handlers::get_sensor).delete(handlers::delete_sensor),
        )
        .route(
            "/sensors/{sensor_id}/readings",
            get(handlers::list_readings)
                .post(handlers::create_reading)
                .delete(handlers::delete_readings),
        )
        .route(
            "/sensors/{sensor_id}/readings/latest",
            get(handlers::get_latest_reading),
        )
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(TraceLayer::new_for_http())
}
