use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use transfer_booking::{StepError, SubmissionError};
use transfer_shared::Locale;

#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    Validation(String),
    NotFound(String),
    /// The slot the customer asked for is full.
    Conflict(String),
    Unprocessable(String),
    Unavailable(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// Map a failed submission, with the customer-facing text in `locale`.
    pub fn submission(err: SubmissionError, locale: Locale) -> Self {
        let message = err.user_message(locale);
        match err {
            SubmissionError::Validation { .. }
            | SubmissionError::ReturnBeforeOutbound
            | SubmissionError::NotReady(_) => AppError::Validation(message),
            SubmissionError::Availability { .. } => AppError::Conflict(message),
            SubmissionError::UnknownRoute(e) => AppError::Unprocessable(e.to_string()),
            SubmissionError::UnknownVehicleClass(id) => AppError::NotFound(format!("Unknown vehicle class: {}", id)),
            SubmissionError::Persistence(detail) | SubmissionError::LedgerUnavailable(detail) => {
                tracing::error!("Submission failed on a backend: {}", detail);
                AppError::Unavailable(message)
            }
        }
    }

    pub fn step(err: StepError, locale: Locale) -> Self {
        AppError::Validation(err.user_message(locale))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
