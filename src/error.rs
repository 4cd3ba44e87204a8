use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Malformed date, unknown status, empty or repeated subject name.
    #[error("{0}")]
    Validation(String),

    /// Two writers raced on the same (owner, date) key and the store could not settle it.
    #[error("Attendance for {date} was modified concurrently, please retry")]
    Conflict { date: NaiveDate },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] anyhow::Error),
}

impl AttendanceError {
    pub fn storage(err: impl Into<anyhow::Error>) -> Self {
        AttendanceError::StorageUnavailable(err.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AttendanceError::Conflict { .. })
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Conflict { .. } => StatusCode::CONFLICT,
            AttendanceError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AttendanceError::Validation(message) => json!({ "message": message }),
            AttendanceError::Conflict { .. } => json!({
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }),
            AttendanceError::StorageUnavailable(e) => {
                tracing::error!(error = ?e, "Storage unavailable");
                json!({ "message": "Internal Server Error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn validation_errors_are_reported_verbatim() {
        let err = AttendanceError::Validation("Invalid date 'soon'".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Invalid date 'soon'");
    }

    #[actix_web::test]
    async fn storage_errors_hide_the_cause() {
        let err = AttendanceError::storage(anyhow::anyhow!("connection refused"));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("connection refused"));
    }

    #[test]
    fn only_conflicts_are_retryable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(AttendanceError::Conflict { date }.is_retryable());
        assert!(!AttendanceError::Validation("x".into()).is_retryable());
    }
}
