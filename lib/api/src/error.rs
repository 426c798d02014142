use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

/// Error returned by request handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    NotReady(String),

    #[error(transparent)]
    Internal(tailor_core::Error),
}

impl From<tailor_core::Error> for ApiError {
    fn from(err: tailor_core::Error) -> Self {
        match err {
            tailor_core::Error::InvalidArgument(msg) => ApiError::BadRequest(msg),
            tailor_core::Error::NotReady(reason) => ApiError::NotReady(reason),
            other => ApiError::Internal(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Request failed");
                "An internal server error occurred.".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
