//! Metadata removal for verified uploads
//!
//! JPEG uploads have their EXIF APP1 segments cut out of the original byte
//! stream, so the compressed image data is never re-encoded. PNG uploads are
//! re-encoded from the decoded bitmap, which drops every ancillary chunk.
//! PDF uploads are returned untouched.

use std::io::Cursor;

use exif::{Context, In, Reader, Tag};
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};
use tracing::{debug, error, info, warn};

use crate::error::RewriteError;
use crate::jpeg::{self, Segment};
use crate::types::{DecodedImage, MediaType};

/// What an EXIF block contained before it was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifSummary {
    /// Number of fields across all IFDs
    pub fields: usize,
    /// Whether any GPS field was present
    pub has_gps: bool,
    /// Primary image orientation, if tagged
    pub orientation: Option<u32>,
}

/// Parse the TIFF structure of an EXIF block
///
/// Returns `None` if the block cannot be parsed; the block is stripped either way.
pub fn summarize_exif(tiff: &[u8]) -> Option<ExifSummary> {
    let exif = Reader::new().read_raw(tiff.to_vec()).ok()?;

    Some(ExifSummary {
        fields: exif.fields().count(),
        has_gps: exif.fields().any(|f| f.tag.context() == Context::Gps),
        orientation: exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0)),
    })
}

fn rewrite_error<E: std::fmt::Display>(format: MediaType, e: E) -> RewriteError {
    RewriteError::ImageRewrite {
        format,
        reason: e.to_string(),
    }
}

/// Remove every EXIF APP1 segment from a JPEG stream
///
/// Returns the input unchanged when it carries no EXIF block.
pub fn strip_jpeg_exif(data: Vec<u8>) -> Result<Vec<u8>, RewriteError> {
    let segments =
        jpeg::header_segments(&data).map_err(|e| rewrite_error(MediaType::Jpeg, e))?;

    let exif: Vec<Segment> = segments
        .into_iter()
        .filter(|s| s.is_exif(&data))
        .collect();

    if exif.is_empty() {
        debug!("No EXIF metadata found, JPEG left unchanged");
        return Ok(data);
    }

    for segment in &exif {
        match summarize_exif(segment.exif_tiff(&data)) {
            Some(summary) => {
                info!(
                    fields = summary.fields,
                    has_gps = summary.has_gps,
                    "Stripping EXIF metadata"
                );
                if let Some(orientation) = summary.orientation.filter(|o| *o != 1) {
                    warn!(orientation, "Orientation tag will be lost with the EXIF block");
                }
            }
            None => warn!("Stripping EXIF block that could not be parsed"),
        }
    }

    Ok(jpeg::remove_segments(&data, &exif))
}

/// Re-encode a bitmap as PNG
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RewriteError> {
    let mut output = Cursor::new(Vec::new());

    PngEncoder::new(&mut output)
        .write_image(
            img.as_bytes(),
            img.width(),
            img.height(),
            img.color().into(),
        )
        .map_err(|e| rewrite_error(MediaType::Png, format!("failed to re-encode PNG: {e}")))?;

    Ok(output.into_inner())
}

/// Produce the bytes to hand back for a verified upload
///
/// # Errors
/// * `ImageRewrite` - If the JPEG structure cannot be walked, the PNG bitmap is missing, or encoding fails
pub fn rewrite(decoded: DecodedImage) -> Result<Vec<u8>, RewriteError> {
    let result = match decoded.format {
        MediaType::Jpeg => strip_jpeg_exif(decoded.bytes),
        MediaType::Png => match &decoded.bitmap {
            Some(bitmap) => encode_png(bitmap),
            None => Err(rewrite_error(MediaType::Png, "no decoded bitmap")),
        },
        MediaType::Pdf => {
            info!("Received a PDF file, no modifications will be made");
            Ok(decoded.bytes)
        }
    };

    if let Err(e) = &result {
        error!("{e}");
    }
    result
}
