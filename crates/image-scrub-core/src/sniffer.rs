//! Upload verification
//!
//! Verification runs in two stages. [`guess_format`] looks only at the magic
//! bytes and is cheap; [`decode`] runs the full decoder and is authoritative.
//! [`verify`] chains them so that a spoofed content type is rejected before
//! any decoding work happens.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, warn};

use crate::error::VerificationError;
use crate::types::{DecodedImage, MAX_IMAGE_PIXELS, MediaType, ProcessingOptions};

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Accepted content types mapped to the file extension each must carry
pub fn allowed_types() -> BTreeMap<&'static str, &'static str> {
    MediaType::ALL
        .into_iter()
        .map(|t| (t.mime(), t.extension()))
        .collect()
}

/// Check the declared content type and filename before touching any bytes.
///
/// The extension is everything after the last `.` (the whole name when there
/// is none) and must match the canonical extension exactly.
///
/// # Errors
/// * `UnsupportedMediaType` - If the content type is not accepted or the extension disagrees
pub fn check_declared_type(
    content_type: &str,
    filename: &str,
) -> Result<MediaType, VerificationError> {
    let Some(media_type) = MediaType::from_content_type(content_type) else {
        warn!(content_type, "Unsupported media type");
        return Err(VerificationError::UnsupportedMediaType {
            reason: content_type.to_string(),
        });
    };

    let extension = filename
        .rsplit_once('.')
        .map_or(filename, |(_, ext)| ext);

    if extension != media_type.extension() {
        warn!(filename, %media_type, "File extension does not match media type");
        return Err(VerificationError::UnsupportedMediaType {
            reason: format!(
                "file extension '{}' does not match {}",
                extension, media_type
            ),
        });
    }

    Ok(media_type)
}

/// Guess the format from the leading bytes alone
///
/// Returns `None` when the bytes match none of the accepted formats.
pub fn guess_format(data: &[u8]) -> Option<MediaType> {
    if data.starts_with(PDF_SIGNATURE) {
        return Some(MediaType::Pdf);
    }

    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => Some(MediaType::Jpeg),
        Ok(ImageFormat::Png) => Some(MediaType::Png),
        _ => None,
    }
}

fn image_format(format: MediaType) -> Option<ImageFormat> {
    match format {
        MediaType::Jpeg => Some(ImageFormat::Jpeg),
        MediaType::Png => Some(ImageFormat::Png),
        MediaType::Pdf => None,
    }
}

/// Validate image dimensions against limits
pub(crate) fn validate_image_dimensions(
    width: u32,
    height: u32,
    options: &ProcessingOptions,
) -> Result<(), VerificationError> {
    if width == 0 || height == 0 {
        return Err(VerificationError::UnsupportedImageFormat {
            reason: format!("image has empty dimensions {width}x{height}"),
        });
    }

    if let Some(max_dim) = options.max_dimension
        && (width > max_dim || height > max_dim)
    {
        return Err(VerificationError::UnsupportedImageFormat {
            reason: format!("image dimensions {width}x{height} exceed maximum {max_dim}"),
        });
    }

    let total_pixels = width as u64 * height as u64;
    if total_pixels > MAX_IMAGE_PIXELS {
        return Err(VerificationError::UnsupportedImageFormat {
            reason: format!("image has {total_pixels} pixels, exceeding maximum {MAX_IMAGE_PIXELS}"),
        });
    }

    Ok(())
}

/// Fully decode `data` as `format`
///
/// The header is read first so oversized images are rejected before the
/// pixel buffer is allocated.
///
/// # Errors
/// * `UnsupportedImageFormat` - If the header or body cannot be decoded, or the dimensions exceed limits
pub fn decode(
    data: &[u8],
    format: MediaType,
    options: &ProcessingOptions,
) -> Result<DynamicImage, VerificationError> {
    let image_format =
        image_format(format).ok_or_else(|| VerificationError::UnsupportedImageFormat {
            reason: format!("{format} has no bitmap to decode"),
        })?;

    let (width, height) = ImageReader::with_format(Cursor::new(data), image_format)
        .into_dimensions()
        .map_err(|e| VerificationError::UnsupportedImageFormat {
            reason: format!("failed to read image header: {e}"),
        })?;

    validate_image_dimensions(width, height, options)?;

    let img = ImageReader::with_format(Cursor::new(data), image_format)
        .decode()
        .map_err(|e| VerificationError::UnsupportedImageFormat {
            reason: format!("failed to decode image: {e}"),
        })?;

    validate_image_dimensions(img.width(), img.height(), options)?;

    Ok(img)
}

/// Verify that `data` really is an image of the `claimed` type
///
/// PDF uploads are accepted as-is once the declared type has been checked;
/// their content is never inspected.
///
/// # Errors
/// * `EmptyInput` - If `data` is empty
/// * `FileTooLarge` - If `data` exceeds `options.max_file_size`
/// * `InvalidJpegFormat` / `InvalidPngFormat` - If the signature contradicts the claimed type
/// * `UnsupportedImageFormat` - If the signature matched but decoding failed
pub fn verify(
    data: Vec<u8>,
    claimed: MediaType,
    options: &ProcessingOptions,
) -> Result<DecodedImage, VerificationError> {
    if data.is_empty() {
        return Err(VerificationError::EmptyInput);
    }

    if let Some(max_size) = options.max_file_size
        && data.len() > max_size
    {
        return Err(VerificationError::FileTooLarge {
            size: data.len(),
            max_size,
        });
    }

    if claimed == MediaType::Pdf {
        return Ok(DecodedImage {
            bytes: data,
            format: claimed,
            bitmap: None,
        });
    }

    let guessed = guess_format(&data);
    if guessed != Some(claimed) {
        warn!(%claimed, ?guessed, "Image signature does not match claimed type");
        return Err(match claimed {
            MediaType::Png => VerificationError::InvalidPngFormat,
            _ => VerificationError::InvalidJpegFormat,
        });
    }

    let bitmap = decode(&data, claimed, options)?;
    debug!(
        %claimed,
        width = bitmap.width(),
        height = bitmap.height(),
        "Image verified"
    );

    Ok(DecodedImage {
        bytes: data,
        format: claimed,
        bitmap: Some(bitmap),
    })
}
