use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as StdError;

use crate::videos::store::StoreError;
use crate::videos::summarizer::SummarizeError;
use crate::videos::transcript::TranscriptError;
use crate::videos::video_id::VideoIdError;

const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] VideoIdError),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(#[from] TranscriptError),

    #[error("Summarization failed: {0}")]
    SummarizationFailed(#[from] SummarizeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Short machine-friendly name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_failed",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::TranscriptUnavailable(_) => "transcript_unavailable",
            AppError::SummarizationFailed(_) => "summarization_failed",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "store_failed",
            AppError::Unexpected(_) => "unexpected",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::InvalidInput(_)
            | AppError::TranscriptUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::SummarizationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Internal failures never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidInput(e) => e.to_string(),
            AppError::TranscriptUnavailable(e) => e.user_message().to_string(),
            AppError::SummarizationFailed(_) => "Failed to generate summary".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Database(_) | AppError::Unexpected(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();

        tracing::error!(
            error_type = self.kind(),
            error = %self,
            status_code = %status,
            "Request error"
        );

        if let Some(source) = self.source() {
            let mut source_chain = String::new();
            let mut current_err: Option<&(dyn StdError + 'static)> = Some(source);
            while let Some(err) = current_err {
                source_chain.push_str(&format!("\n  Caused by: {}", err));
                current_err = err.source();
            }
            tracing::debug!("Error source chain:{}", source_chain);
        }

        let body = match &self {
            AppError::Validation { field, .. } => Json(json!({
                "message": message,
                "status": status.as_u16(),
                "field": field,
            })),
            _ => Json(json!({
                "message": message,
                "status": status.as_u16(),
            })),
        };
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body".to_string(),
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON request body".to_string(),
            // The rejection text names the failing path, e.g. `...target type: url: invalid type`.
            JsonRejection::JsonDataError(_) if rejection.body_text().contains(": url: ") => {
                "Expected string".to_string()
            }
            JsonRejection::JsonDataError(_) => "Expected an object with a `url` string".to_string(),
            _ => rejection.body_text(),
        };
        AppError::validation("url", message)
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::validation("id", "Expected a numeric id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = AppError::Unexpected(anyhow::anyhow!("connection refused on 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");
    }

    #[test]
    fn extraction_errors_map_to_bad_request() {
        let err = AppError::from(VideoIdError::MissingId);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Could not extract video ID");
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn summarization_errors_use_generic_message() {
        let err = AppError::from(SummarizeError::EmptyResponse);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "Failed to generate summary");
    }

    #[test]
    fn transcript_errors_distinguish_missing_captions() {
        let disabled = AppError::from(TranscriptError::Disabled("abc".into()));
        let unavailable = AppError::from(TranscriptError::VideoUnavailable("abc".into()));
        assert_eq!(disabled.status(), StatusCode::BAD_REQUEST);
        assert_ne!(disabled.public_message(), unavailable.public_message());
    }
}
