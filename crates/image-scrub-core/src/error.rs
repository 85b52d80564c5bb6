//! Errors produced by the verification, rewrite and history components

use crate::types::{MediaType, ProcessingOutcome};

/// Errors raised while checking an upload against its claimed type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Upload has no bytes
    #[error("File cannot be empty")]
    EmptyInput,

    /// Declared content type is not accepted, or the filename extension disagrees with it
    #[error("Unsupported media type: {reason}")]
    UnsupportedMediaType {
        /// Why the declared type was rejected
        reason: String,
    },

    /// Content claims JPEG but the bytes say otherwise
    #[error("The image does not seem to be a valid JPEG")]
    InvalidJpegFormat,

    /// Content claims PNG but the bytes say otherwise
    #[error("The image does not seem to be a valid PNG")]
    InvalidPngFormat,

    /// Signature matched but the structural decode failed
    #[error("Unsupported or corrupted image format: {reason}")]
    UnsupportedImageFormat {
        /// Decoder failure
        reason: String,
    },

    /// Upload exceeds the configured size limit
    #[error("File size {size} exceeds maximum allowed size {max_size}")]
    FileTooLarge {
        /// The actual file size
        size: usize,
        /// The maximum allowed file size
        max_size: usize,
    },
}

/// Errors raised while stripping or re-encoding a verified image
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Rewrite failed
    #[error("Failed to rewrite the {format} image: {reason}")]
    ImageRewrite {
        /// Format being rewritten
        format: MediaType,
        /// Underlying failure
        reason: String,
    },
}

/// Errors raised by the processing history
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Filter is not an outcome name
    #[error("Invalid status filter provided: {filter}")]
    InvalidStatusFilter {
        /// The rejected filter
        filter: String,
    },

    /// Capacity must be positive
    #[error("History size must be greater than zero, got {size}")]
    InvalidHistorySize {
        /// The rejected size
        size: i64,
    },
}

/// Error surfaced by [`crate::ImageProcessor::process`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    /// Content type not accepted, or extension mismatch
    #[error("{0}")]
    UnsupportedMediaType(String),
    /// Bytes are not a JPEG although JPEG was claimed
    #[error("The image does not seem to be a valid JPEG")]
    InvalidJpegFormat,
    /// Bytes are not a PNG although PNG was claimed
    #[error("The image does not seem to be a valid PNG")]
    InvalidPngFormat,
    /// Decode failed after the signature matched
    #[error("{0}")]
    UnsupportedImageFormat(String),
    /// Rewrite step failed
    #[error("{0}")]
    ImageRewrite(String),
    /// Empty input, oversize input or any uncategorized failure
    #[error("{0}")]
    GeneralProcessingError(String),
}

impl ProcessingError {
    /// Outcome recorded in history for this failure
    pub fn outcome(&self) -> ProcessingOutcome {
        match self {
            Self::InvalidJpegFormat => ProcessingOutcome::InvalidJpegFormat,
            Self::InvalidPngFormat => ProcessingOutcome::InvalidPngFormat,
            Self::UnsupportedImageFormat(_) => ProcessingOutcome::UnsupportedImageFormat,
            Self::ImageRewrite(_) => ProcessingOutcome::ImageRewriteError,
            Self::UnsupportedMediaType(_) | Self::GeneralProcessingError(_) => {
                ProcessingOutcome::FailedToProcess
            }
        }
    }
}

impl From<VerificationError> for ProcessingError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::UnsupportedMediaType { .. } => {
                Self::UnsupportedMediaType(e.to_string())
            }
            VerificationError::InvalidJpegFormat => Self::InvalidJpegFormat,
            VerificationError::InvalidPngFormat => Self::InvalidPngFormat,
            VerificationError::UnsupportedImageFormat { .. } => {
                Self::UnsupportedImageFormat(e.to_string())
            }
            VerificationError::EmptyInput | VerificationError::FileTooLarge { .. } => {
                Self::GeneralProcessingError(e.to_string())
            }
        }
    }
}

impl From<RewriteError> for ProcessingError {
    fn from(e: RewriteError) -> Self {
        Self::ImageRewrite(e.to_string())
    }
}
