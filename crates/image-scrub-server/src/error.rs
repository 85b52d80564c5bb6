use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use image_scrub_core::{HistoryError, ProcessingError};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
}

#[derive(Debug)]
pub enum ApiError {
    Processing(ProcessingError),
    History(HistoryError),
    TooLarge { max_bytes: usize },
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Processing(e) => match e {
                ProcessingError::UnsupportedMediaType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type")
                }
                ProcessingError::InvalidJpegFormat => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Invalid JPEG Image Format")
                }
                ProcessingError::InvalidPngFormat => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Invalid PNG Image Format")
                }
                ProcessingError::UnsupportedImageFormat(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Image Format")
                }
                ProcessingError::ImageRewrite(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Image Rewriting Error")
                }
                ProcessingError::GeneralProcessingError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Image processing error")
                }
            },
            Self::History(e) => match e {
                HistoryError::InvalidStatusFilter { .. } => {
                    (StatusCode::BAD_REQUEST, "Invalid status filter")
                }
                HistoryError::InvalidHistorySize { .. } => {
                    (StatusCode::BAD_REQUEST, "Invalid history size")
                }
            },
            Self::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too large"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Processing(e) => e.to_string(),
            Self::History(e) => e.to_string(),
            Self::TooLarge { max_bytes } => format!(
                "File is too large! The maximum allowed size is {}MB.",
                max_bytes / (1024 * 1024)
            ),
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "An unexpected error occurred.".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (status, title) = self.status_and_title();
        ErrorBody {
            error: title,
            message: self.message(),
            status: status.as_u16(),
        }
    }
}

impl From<ProcessingError> for ApiError {
    fn from(e: ProcessingError) -> Self {
        Self::Processing(e)
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        Self::History(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_title();

        match &self {
            Self::TooLarge { .. } => return (status, self.message()).into_response(),
            Self::Internal(detail) => error!("Unexpected error: {detail}"),
            _ if status.is_server_error() => error!("Error processing the image: {}", self.message()),
            _ => warn!("{}", self.message()),
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_errors_map_to_statuses() {
        let cases = [
            (
                ProcessingError::UnsupportedMediaType("image/gif".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ProcessingError::InvalidJpegFormat,
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ProcessingError::InvalidPngFormat,
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ProcessingError::UnsupportedImageFormat("truncated".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ProcessingError::ImageRewrite("encoder".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProcessingError::GeneralProcessingError("empty".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status_and_title().0, expected);
            assert_eq!(api.into_response().status(), expected);
        }
    }

    #[test]
    fn history_errors_are_bad_requests() {
        let body = ApiError::from(HistoryError::InvalidHistorySize { size: 0 }).body();
        assert_eq!(body.status, 400);
        assert_eq!(body.error, "Invalid history size");

        let body = ApiError::from(HistoryError::InvalidStatusFilter {
            filter: "nope".into(),
        })
        .body();
        assert_eq!(body.status, 400);
        assert_eq!(body.message, "Invalid status filter provided: nope");
    }

    #[test]
    fn too_large_message_mentions_limit() {
        let err = ApiError::TooLarge {
            max_bytes: 10 * 1024 * 1024,
        };
        assert_eq!(
            err.message(),
            "File is too large! The maximum allowed size is 10MB."
        );
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn internal_errors_hide_details() {
        let body = ApiError::Internal("join error".into()).body();
        assert_eq!(body.status, 500);
        assert_eq!(body.message, "An unexpected error occurred.");
    }
}
