use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::CoreError;

/// Handler error; maps each `CoreError` kind to its HTTP status.
#[derive(Debug)]
pub struct AppError(pub CoreError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::Persistence(e) => {
                error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl<E: Into<CoreError>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_error_kind() {
        let cases = [
            (CoreError::validation("bad"), StatusCode::BAD_REQUEST),
            (CoreError::sensor_not_found(1), StatusCode::NOT_FOUND),
            (
                CoreError::Persistence(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError(err).into_response().status(), expected);
        }
    }
}
