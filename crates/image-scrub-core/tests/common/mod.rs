//! Fixtures for end-to-end processing tests

use std::io::Cursor;

use image::{ImageBuffer, Rgb};

/// Build an encoded test image
pub fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 200u8])
    });
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), format).unwrap();
    data
}

/// JPEG with an EXIF block carrying GPS coordinates right after SOI
pub fn jpeg_with_gps_exif(width: u32, height: u32) -> Vec<u8> {
    #[rustfmt::skip]
    let tiff: [u8; 50] = [
        0x4D, 0x4D, 0x00, 0x2A, // "MM\0*"
        0x00, 0x00, 0x00, 0x08, // IFD0 offset
        0x00, 0x01, // one entry
        0x88, 0x25, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x1A, // GPS IFD pointer -> 26
        0x00, 0x00, 0x00, 0x00, // no IFD1
        0x00, 0x01, // GPS IFD, one entry
        0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x02, b'N', 0x00, 0x00, 0x00, // GPSLatitudeRef = "N"
        0x00, 0x00, 0x00, 0x00, // no next IFD
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // padding
    ];

    let jpeg = encode(width, height, image::ImageFormat::Jpeg);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";
