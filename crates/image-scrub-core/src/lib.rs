//! Verification and metadata stripping for uploaded images
//!
//! This crate checks that an upload claimed to be JPEG, PNG or PDF really is
//! one, removes privacy-sensitive metadata from the image formats, and keeps a
//! bounded history of processing outcomes. It includes:
//! - Two-stage format verification (signature sniffing, then a full decode)
//! - EXIF removal for JPEG without recompression, PNG re-encoding
//! - A thread-safe, resizable processing history
//!
//! ```rust,no_run
//! use image_scrub_core::{ImagePayload, ImageProcessor};
//!
//! let processor = ImageProcessor::default();
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let cleaned = processor.process(ImagePayload::new(bytes, "image/jpeg", "photo.jpg"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod error;
pub mod history;
mod jpeg;
pub mod pipeline;
pub mod rewriter;
pub mod sniffer;
#[cfg(test)]
mod test_util;
pub mod types;

pub use self::error::{HistoryError, ProcessingError, RewriteError, VerificationError};
pub use self::history::HistoryStore;
pub use self::pipeline::ImageProcessor;
pub use self::sniffer::allowed_types;
pub use self::types::{
    DecodedImage, HistoryRecord, ImagePayload, MediaType, ProcessingOptions, ProcessingOutcome,
};
