//! Unified API error handling
//!
//! Hard failures (transport, rendering) become HTTP 500 with a
//! `{code, detail}` body. Undecodable model replies never reach this type;
//! they are returned as a 200 `{error, raw_response}` body instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::{PipelineError, TemplateError};
use crate::services::CompletionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("No response received from the completion service")]
    EmptyResponse,

    #[error("Prompt rendering failed: {0}")]
    Render(#[from] TemplateError),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub detail: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::Render(_) => "RENDER_ERROR",
        }
    }

    fn public_message(&self) -> String {
        self.to_string()
    }
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
            CompletionError::EmptyResponse => Self::EmptyResponse,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Template(e) => e.into(),
            PipelineError::Completion(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Render(e) => {
                tracing::error!(error = %e, "Prompt rendering failed");
            }
            Self::ServiceUnavailable(_) | Self::EmptyResponse => {
                tracing::error!(error = %self, "Completion service failure");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            detail: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
