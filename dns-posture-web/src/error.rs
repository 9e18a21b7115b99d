use std::fmt::Display;

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use dns_posture_core::{ApiResponse, CoreError};

/// HTTP-facing error - wraps `CoreError`
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_expected() {
            tracing::warn!("ApiError: {err}");
        } else {
            tracing::error!("ApiError: {err}");
        }
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CoreError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let CoreError::RateLimitExceeded {
            retry_after_secs, ..
        } = &self.0
        {
            builder.insert_header((RETRY_AFTER, retry_after_secs.to_string()));
        }
        // Internal details stay in the log.
        let message = match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.0.to_string(),
        };
        builder.json(ApiResponse::<()>::failure(message))
    }
}

/// Turn an extractor failure into the JSON failure envelope.
pub fn invalid_request(detail: impl Display) -> actix_web::Error {
    ApiError::from(CoreError::ValidationError(format!("Invalid request: {detail}"))).into()
}

/// JSON extractor failures. A non-JSON body is reported in terms of the
/// bodies `/api/check` accepts, since a form body that fails also lands here.
pub fn invalid_json(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::ContentType => {
            invalid_request("expected a JSON or form body with a `domain` field")
        }
        other => invalid_request(other),
    }
}
