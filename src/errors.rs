use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::Clarification;

const INTERNAL_ERROR_MESSAGE: &str = "Internal error processing request";

/// Failures of the extraction pipeline itself. An ambiguous model answer is
/// not an error; it comes back as a clarification result.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("extraction service error: {0}")]
    ExternalService(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("extraction failed: {source}")]
    Extraction {
        #[source]
        source: ExtractionError,
        raw_text: String,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Clarification::new(message, String::new()),
            ),
            AppError::Extraction { source, raw_text } => {
                let status = match source {
                    ExtractionError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    ExtractionError::ExternalService(_) => StatusCode::BAD_GATEWAY,
                };
                (status, Clarification::new(INTERNAL_ERROR_MESSAGE, raw_text))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
