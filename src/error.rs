use crate::db::models::SensorId;

/// Classified failure of a core operation.
///
/// Every Reading Store and Sensor Registry operation returns either its
/// success value or exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or disallowed input.
    #[error("{0}")]
    Validation(String),

    /// Lookup on something that does not exist. Expected and never fatal.
    #[error("No {entity} found for sensor_id: {id}")]
    NotFound { entity: &'static str, id: SensorId },

    /// Underlying storage failure, propagated with its cause.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn sensor_not_found(id: SensorId) -> Self {
        Self::NotFound { entity: "sensor", id }
    }

    pub fn readings_not_found(id: SensorId) -> Self {
        Self::NotFound { entity: "records", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_sensor_id() {
        let err = CoreError::readings_not_found(7);
        assert_eq!(err.to_string(), "No records found for sensor_id: 7");
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_is_not_not_found() {
        let err = CoreError::validation("bad");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "bad");
    }
}
