//! Upload processing entry point

use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::error::{HistoryError, ProcessingError, VerificationError};
use crate::history::{DEFAULT_HISTORY_CAPACITY, HistoryStore};
use crate::types::{HistoryRecord, ImagePayload, ProcessingOptions, ProcessingOutcome};
use crate::{rewriter, sniffer};

/// Verifies uploads, strips their metadata and records every attempt
///
/// `ImageProcessor` is `Send + Sync`; share one instance behind an `Arc`.
#[derive(Debug)]
pub struct ImageProcessor {
    options: ProcessingOptions,
    history: HistoryStore,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(ProcessingOptions::default(), DEFAULT_HISTORY_CAPACITY)
    }
}

impl ImageProcessor {
    /// Create a processor with the given limits and history capacity
    pub fn new(options: ProcessingOptions, history_capacity: NonZeroUsize) -> Self {
        Self {
            options,
            history: HistoryStore::new(history_capacity),
        }
    }

    /// Limits applied during verification
    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Verify and rewrite an upload
    ///
    /// Exactly one history record is written per call, whatever the result.
    /// On failure no bytes are returned.
    pub fn process(&self, payload: ImagePayload) -> Result<Vec<u8>, ProcessingError> {
        let filename = payload.filename.clone();
        debug!(filename = %filename, "Processing file");

        let result = self.run(payload);

        let outcome = match &result {
            Ok(bytes) => {
                debug!(filename = %filename, len = bytes.len(), "File processing completed");
                ProcessingOutcome::ProcessedSuccessfully
            }
            Err(e) => {
                let outcome = e.outcome();
                warn!(filename = %filename, %outcome, "Failed to process file: {e}");
                outcome
            }
        };
        self.history.append(HistoryRecord::new(filename, outcome));

        result
    }

    fn run(&self, payload: ImagePayload) -> Result<Vec<u8>, ProcessingError> {
        let ImagePayload {
            bytes,
            content_type,
            filename,
        } = payload;

        if bytes.is_empty() {
            return Err(VerificationError::EmptyInput.into());
        }

        let media_type = sniffer::check_declared_type(&content_type, &filename)?;
        let decoded = sniffer::verify(bytes, media_type, &self.options)?;
        let output = rewriter::rewrite(decoded)?;

        if output.is_empty() {
            return Err(ProcessingError::GeneralProcessingError(
                "Rewrite produced no output".to_string(),
            ));
        }

        Ok(output)
    }

    /// Processing history, optionally filtered by outcome name
    ///
    /// # Errors
    /// * `InvalidStatusFilter` - If the filter is not an outcome name
    pub fn query_history(&self, filter: Option<&str>) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.history.query_by_name(filter)
    }

    /// Processing history filtered by a typed outcome
    pub fn history_by_outcome(&self, filter: Option<ProcessingOutcome>) -> Vec<HistoryRecord> {
        self.history.query(filter)
    }

    /// Resize the processing history
    ///
    /// # Errors
    /// * `InvalidHistorySize` - If `size` is zero or negative
    pub fn set_history_capacity(&self, size: i64) -> Result<(), HistoryError> {
        self.history.set_capacity(size)?;
        debug!(size, "Updated history size");
        Ok(())
    }

    /// Current history capacity
    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{create_test_jpeg, create_test_png, jpeg_with_exif, with_stray_byte};

    #[test]
    fn test_process_records_success() {
        let processor = ImageProcessor::default();
        let out = processor
            .process(ImagePayload::new(
                jpeg_with_exif(16, 16),
                "image/jpeg",
                "photo.jpg",
            ))
            .unwrap();
        assert_eq!(out, create_test_jpeg(16, 16));

        let history = processor.history_by_outcome(None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, "photo.jpg");
        assert_eq!(history[0].outcome, ProcessingOutcome::ProcessedSuccessfully);
    }

    #[test]
    fn test_process_accepts_stray_bytes_between_segments() {
        let processor = ImageProcessor::default();
        let upload = with_stray_byte(&create_test_jpeg(16, 16));

        let out = processor
            .process(ImagePayload::new(upload.clone(), "image/jpeg", "stray.jpg"))
            .unwrap();
        assert_eq!(out, upload);
        assert_eq!(
            processor.history_by_outcome(None)[0].outcome,
            ProcessingOutcome::ProcessedSuccessfully
        );
    }

    #[test]
    fn test_process_records_each_failure_once() {
        let processor = ImageProcessor::default();

        let cases = [
            (
                ImagePayload::new(Vec::new(), "image/png", "empty.png"),
                ProcessingOutcome::FailedToProcess,
            ),
            (
                ImagePayload::new(create_test_png(4, 4), "image/png", "photo.jpg"),
                ProcessingOutcome::FailedToProcess,
            ),
            (
                ImagePayload::new(create_test_png(4, 4), "image/jpeg", "photo.jpg"),
                ProcessingOutcome::InvalidJpegFormat,
            ),
            (
                ImagePayload::new(create_test_jpeg(4, 4), "image/png", "photo.png"),
                ProcessingOutcome::InvalidPngFormat,
            ),
            (
                ImagePayload::new(
                    create_test_png(4, 4)[..40].to_vec(),
                    "image/png",
                    "cut.png",
                ),
                ProcessingOutcome::UnsupportedImageFormat,
            ),
        ];

        for (i, (payload, expected)) in cases.into_iter().enumerate() {
            let err = processor.process(payload).unwrap_err();
            assert_eq!(err.outcome(), expected);

            let history = processor.history_by_outcome(None);
            assert_eq!(history.len(), i + 1);
            assert_eq!(history[i].outcome, expected);
        }
    }

    #[test]
    fn test_process_rejects_oversized_upload() {
        let processor = ImageProcessor::new(
            ProcessingOptions {
                max_file_size: Some(8),
                ..Default::default()
            },
            DEFAULT_HISTORY_CAPACITY,
        );

        let err = processor
            .process(ImagePayload::new(create_test_png(4, 4), "image/png", "a.png"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::GeneralProcessingError(_)));
        assert_eq!(
            processor.history_by_outcome(Some(ProcessingOutcome::FailedToProcess)).len(),
            1
        );
    }

    #[test]
    fn test_history_capacity_passthrough() {
        let processor = ImageProcessor::default();
        assert_eq!(processor.history_capacity(), 10);

        processor.set_history_capacity(3).unwrap();
        assert_eq!(processor.history_capacity(), 3);

        assert_eq!(
            processor.set_history_capacity(0),
            Err(HistoryError::InvalidHistorySize { size: 0 })
        );
        assert_eq!(processor.history_capacity(), 3);

        assert!(matches!(
            processor.query_history(Some("bogus")),
            Err(HistoryError::InvalidStatusFilter { .. })
        ));
    }
}
