use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::monitor::MonitorError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Request failed on a registry error.");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<MonitorError> for AppError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::InvalidAddress(_) | MonitorError::InvalidInterval(_) => {
                AppError::InvalidInput(err.to_string())
            }
            MonitorError::TargetNotFound(_) => {
                AppError::NotFound("IP not found in database".to_string())
            }
            MonitorError::Registry(e) => AppError::DatabaseError(e.to_string()),
            MonitorError::SchedulerStopped => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::prober::AddressError;
    use crate::monitor::registry::RegistryError;

    #[test]
    fn test_monitor_errors_map_to_status_codes() {
        let cases = [
            (MonitorError::InvalidAddress(AddressError::Empty), StatusCode::BAD_REQUEST),
            (MonitorError::InvalidInterval(0), StatusCode::BAD_REQUEST),
            (MonitorError::TargetNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                MonitorError::Registry(RegistryError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (MonitorError::SchedulerStopped, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
