use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// A source could not be fetched or answered with a non-success status.
    #[error("Source unreachable: {source_id}: {reason}")]
    SourceUnreachable { source_id: String, reason: String },

    /// An extracted entry is missing a required field.
    #[error("Malformed extraction: {0}")]
    ExtractionMalformed(String),

    /// The sentiment or feedback collaborator failed for one tool.
    #[error("{service} service failure: {reason}")]
    ServiceFailure {
        service: &'static str,
        reason: String,
    },

    /// A shared resource (browser session) could not be acquired.
    #[error("Resource acquisition failed: {0}")]
    ResourceAcquisitionFailure(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),
}

impl AppError {
    pub fn unreachable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        AppError::SourceUnreachable {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn service(service: &'static str, reason: impl ToString) -> Self {
        AppError::ServiceFailure {
            service,
            reason: reason.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::SourceUnreachable { .. } | AppError::ServiceFailure { .. } => {
                tracing::warn!(error = %self, "Upstream error");
                StatusCode::BAD_GATEWAY
            }
            AppError::ExtractionMalformed(msg) => {
                tracing::warn!(error = %msg, "Extraction error");
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::ResourceAcquisitionFailure(msg) => {
                tracing::error!(error = %msg, "Resource error");
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                StatusCode::BAD_REQUEST
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
