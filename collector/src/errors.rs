use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reporting::{ParseError, SinkError};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    pub fn status(&self) -> StatusCode {
        match self {
            CollectorError::Parse(ParseError::UnsupportedContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            CollectorError::Parse(_) => StatusCode::BAD_REQUEST,
            CollectorError::Sink(SinkError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            CollectorError::Sink(SinkError::Rejected(_)) | CollectorError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl IntoResponse for CollectorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ApiErrorResponse {
            error_message: self.to_string(),
        });

        (status, body).into_response()
    }
}
