//! Shared types and constants for upload processing

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;

/// Maximum upload size accepted by the pipeline (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum image dimension (width or height)
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// Maximum total pixels allowed in a decoded image (50 million pixels)
///
/// At 4 bytes per pixel this caps a decode at ~200MB, which rejects
/// decompression bombs before the decoder allocates the full bitmap.
pub const MAX_IMAGE_PIXELS: u64 = 50_000_000;

/// Default number of records kept by the processing history
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Media types the pipeline accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `application/pdf`
    Pdf,
}

impl MediaType {
    /// Every supported media type
    pub const ALL: [MediaType; 3] = [MediaType::Jpeg, MediaType::Png, MediaType::Pdf];

    /// Canonical MIME string
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// File extension an upload of this type must carry
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// Parse a content-type header value.
    ///
    /// The value is trimmed, lowercased and stripped of `;` parameters before
    /// matching, so `"image/PNG; charset=binary"` resolves to [`MediaType::Png`].
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let normalized = content_type.trim().to_ascii_lowercase();
        let canonical = normalized.split(';').next().unwrap_or(&normalized).trim();

        Self::ALL.into_iter().find(|t| t.mime() == canonical)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Outcome recorded for every processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingOutcome {
    /// The upload was verified and rewritten
    ProcessedSuccessfully,
    /// Generic failure (empty input, bad media type, empty output)
    FailedToProcess,
    /// Claimed JPEG, bytes disagree
    InvalidJpegFormat,
    /// Claimed PNG, bytes disagree
    InvalidPngFormat,
    /// Signature matched but the image could not be decoded
    UnsupportedImageFormat,
    /// Metadata removal or re-encoding failed
    ImageRewriteError,
}

impl ProcessingOutcome {
    /// Every outcome, in declaration order
    pub const ALL: [ProcessingOutcome; 6] = [
        ProcessingOutcome::ProcessedSuccessfully,
        ProcessingOutcome::FailedToProcess,
        ProcessingOutcome::InvalidJpegFormat,
        ProcessingOutcome::InvalidPngFormat,
        ProcessingOutcome::UnsupportedImageFormat,
        ProcessingOutcome::ImageRewriteError,
    ];

    /// Stable name used for filtering and serialization
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProcessedSuccessfully => "PROCESSED_SUCCESSFULLY",
            Self::FailedToProcess => "FAILED_TO_PROCESS",
            Self::InvalidJpegFormat => "INVALID_JPEG_FORMAT",
            Self::InvalidPngFormat => "INVALID_PNG_FORMAT",
            Self::UnsupportedImageFormat => "UNSUPPORTED_IMAGE_FORMAT",
            Self::ImageRewriteError => "IMAGE_REWRITE_ERROR",
        }
    }

    /// Human readable label
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProcessedSuccessfully => "Processed Successfully",
            Self::FailedToProcess => "Failed to Process",
            Self::InvalidJpegFormat => "Invalid JPEG Format",
            Self::InvalidPngFormat => "Invalid PNG Format",
            Self::UnsupportedImageFormat => "Unsupported Image Format",
            Self::ImageRewriteError => "Error Rewriting Image",
        }
    }
}

impl fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is not an outcome name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutcome(pub String);

impl FromStr for ProcessingOutcome {
    type Err = UnknownOutcome;

    /// Case-insensitive match against [`ProcessingOutcome::name`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|o| o.name() == upper)
            .ok_or_else(|| UnknownOutcome(s.to_string()))
    }
}

/// One entry of the processing history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Original upload filename
    pub filename: String,
    /// What happened to the upload
    pub outcome: ProcessingOutcome,
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a record stamped with the current time
    pub fn new<S>(filename: S, outcome: ProcessingOutcome) -> Self
    where
        S: Into<String>,
    {
        Self {
            filename: filename.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// An upload as received at the boundary
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Raw upload bytes
    pub bytes: Vec<u8>,
    /// Content type declared by the client
    pub content_type: String,
    /// Original filename declared by the client
    pub filename: String,
}

impl ImagePayload {
    /// Create a new payload
    pub fn new<C, F>(bytes: Vec<u8>, content_type: C, filename: F) -> Self
    where
        C: Into<String>,
        F: Into<String>,
    {
        Self {
            bytes,
            content_type: content_type.into(),
            filename: filename.into(),
        }
    }
}

/// Bytes that passed verification, plus the decoded bitmap where one exists
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The original upload bytes
    pub bytes: Vec<u8>,
    /// The verified format
    pub format: MediaType,
    /// Decoded pixels; `None` for PDF pass-through
    pub bitmap: Option<DynamicImage>,
}

/// Limits applied while verifying uploads
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    /// Largest accepted upload in bytes (default: uses MAX_FILE_SIZE)
    pub max_file_size: Option<usize>,
    /// Largest accepted width or height (default: uses MAX_IMAGE_DIMENSION)
    pub max_dimension: Option<u32>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            max_file_size: Some(MAX_FILE_SIZE),
            max_dimension: Some(MAX_IMAGE_DIMENSION),
        }
    }
}

impl ProcessingOptions {
    /// Options with no size or dimension limit beyond the pixel cap
    pub fn unbounded() -> Self {
        Self {
            max_file_size: None,
            max_dimension: None,
        }
    }
}
