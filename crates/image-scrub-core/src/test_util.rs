//! Fixture builders shared by unit tests

use std::io::Cursor;

use image::{ImageBuffer, Rgb};

/// Minimal little-endian TIFF block with `Make = "Cam"` and `Orientation = 1`
pub const EXIF_TIFF: [u8; 38] = [
    0x49, 0x49, 0x2A, 0x00, // "II*\0"
    0x08, 0x00, 0x00, 0x00, // IFD0 offset
    0x02, 0x00, // two entries
    0x0F, 0x01, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00, b'C', b'a', b'm', 0x00, // Make
    0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, // Orientation
    0x00, 0x00, 0x00, 0x00, // no IFD1
];

fn gradient(width: u32, height: u32) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([((x * 16) % 256) as u8, ((y * 16) % 256) as u8, 128u8])
    })
}

/// Create a test PNG image with specified dimensions
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let mut png_data = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
        .unwrap();
    png_data
}

/// Create a test JPEG image with specified dimensions
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut jpeg_data = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut jpeg_data), image::ImageFormat::Jpeg)
        .unwrap();
    jpeg_data
}

/// Insert a marker segment right after SOI
pub fn insert_segment(jpeg: &[u8], marker: u8, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Create a test JPEG carrying an EXIF APP1 segment
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&EXIF_TIFF);
    insert_segment(&create_test_jpeg(width, height), 0xE1, &payload)
}

/// Insert a `tEXt` chunk right after IHDR
pub fn png_with_text_chunk(png: &[u8], keyword: &str, text: &str) -> Vec<u8> {
    // signature (8) + IHDR length/type/data/crc (4 + 4 + 13 + 4)
    let ihdr_end = 8 + 25;

    let mut chunk_data = Vec::new();
    chunk_data.extend_from_slice(b"tEXt");
    chunk_data.extend_from_slice(keyword.as_bytes());
    chunk_data.push(0);
    chunk_data.extend_from_slice(text.as_bytes());

    let mut out = Vec::with_capacity(png.len() + chunk_data.len() + 8);
    out.extend_from_slice(&png[..ihdr_end]);
    out.extend_from_slice(&((chunk_data.len() - 4) as u32).to_be_bytes());
    out.extend_from_slice(&chunk_data);
    out.extend_from_slice(&crc32fast::hash(&chunk_data).to_be_bytes());
    out.extend_from_slice(&png[ihdr_end..]);
    out
}

/// Insert a stray `0x00` after the first header segment
pub fn with_stray_byte(jpeg: &[u8]) -> Vec<u8> {
    let first = crate::jpeg::header_segments(jpeg).unwrap()[0];
    let mut out = jpeg.to_vec();
    out.insert(first.end, 0x00);
    out
}
