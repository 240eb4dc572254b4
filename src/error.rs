use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

use crate::gemini::GenerationError;

/// Failures surfaced to whoever triggered a generation.
#[derive(Debug, Error)]
pub enum GuideError {
    #[error("Please upload at least one screenshot to generate testing instructions.")]
    InputMissing,
    #[error("Unsupported screenshot '{0}': only PNG, JPG and JPEG files are accepted.")]
    UnsupportedImage(String),
    #[error("Error reading uploaded screenshot: {0}")]
    Encoding(String),
    /// The upload itself was rejected (size limit, unreadable context field).
    #[error("{message}")]
    Upload { status: StatusCode, message: String },
    #[error("Error generating testing instructions: {0}")]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<&'static str>,
}

impl GuideError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputMissing => "input_missing",
            Self::UnsupportedImage(_) => "unsupported_image",
            Self::Encoding(_) => "encoding_failure",
            Self::Upload { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => "upload_too_large",
            Self::Upload { .. } => "upload_failure",
            Self::Generation(_) => "generation_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InputMissing => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Encoding(_) => StatusCode::BAD_REQUEST,
            Self::Upload { status, .. } => *status,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GuideError {
    fn into_response(self) -> Response {
        match &self {
            Self::InputMissing | Self::UnsupportedImage(_) | Self::Upload { .. } => tracing::warn!("⚠️ {}", self),
            _ => tracing::error!("❌ {}", self),
        }
        let cause = match &self {
            Self::Generation(e) => Some(e.kind.as_str()),
            _ => None,
        };
        let body = ErrorBody { kind: self.kind(), message: self.to_string(), cause };
        (self.status(), Json(body)).into_response()
    }
}
