//! JPEG marker segment walking
//!
//! Only the header portion of the stream (SOI up to the first SOS) is walked.
//! Entropy-coded data after SOS is never interpreted, so removing a header
//! segment leaves the compressed image untouched.

pub(crate) const SOI: [u8; 2] = [0xFF, 0xD8];

const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const TEM: u8 = 0x01;

/// Identifier that opens an EXIF APP1 payload
pub(crate) const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";

/// A length-prefixed marker segment located in a JPEG stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub marker: u8,
    /// Offset of the first byte belonging to the segment, fill bytes included
    pub start: usize,
    /// Offset just past the two length bytes
    pub payload_start: usize,
    /// Exclusive end offset
    pub end: usize,
}

impl Segment {
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.payload_start..self.end]
    }

    pub fn is_exif(&self, data: &[u8]) -> bool {
        self.marker == APP1 && self.payload(data).starts_with(EXIF_IDENTIFIER)
    }

    /// TIFF structure carried by an EXIF segment
    pub fn exif_tiff<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &self.payload(data)[EXIF_IDENTIFIER.len()..]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SegmentError {
    #[error("missing JPEG start-of-image marker")]
    MissingSoi,
    #[error("invalid segment length at offset {offset}")]
    InvalidLength { offset: usize },
    #[error("segment at offset {offset} runs past the end of the data")]
    Truncated { offset: usize },
}

/// List the length-prefixed segments between SOI and the first SOS (or EOI).
pub(crate) fn header_segments(data: &[u8]) -> Result<Vec<Segment>, SegmentError> {
    if data.len() < 2 || data[0..2] != SOI {
        return Err(SegmentError::MissingSoi);
    }

    let mut segments = Vec::new();
    let mut pos = 2;

    loop {
        if pos >= data.len() {
            return Err(SegmentError::Truncated { offset: pos });
        }
        // Stray bytes between segments are skipped and left in place
        if data[pos] != 0xFF {
            match data[pos..].iter().position(|&b| b == 0xFF) {
                Some(skip) => pos += skip,
                None => return Err(SegmentError::Truncated { offset: pos }),
            }
        }

        // Any number of 0xFF fill bytes may precede a marker
        let mut marker_pos = pos;
        while marker_pos + 1 < data.len() && data[marker_pos + 1] == 0xFF {
            marker_pos += 1;
        }
        if marker_pos + 1 >= data.len() {
            return Err(SegmentError::Truncated { offset: pos });
        }

        let marker = data[marker_pos + 1];
        match marker {
            SOS | EOI => return Ok(segments),
            TEM | 0xD0..=0xD7 => {
                pos = marker_pos + 2;
                continue;
            }
            _ => {}
        }

        if marker_pos + 3 >= data.len() {
            return Err(SegmentError::Truncated { offset: pos });
        }
        let seg_len = u16::from_be_bytes([data[marker_pos + 2], data[marker_pos + 3]]) as usize;
        if seg_len < 2 {
            return Err(SegmentError::InvalidLength { offset: pos });
        }

        let end = marker_pos + 2 + seg_len;
        if end > data.len() {
            return Err(SegmentError::Truncated { offset: pos });
        }

        segments.push(Segment {
            marker,
            start: pos,
            payload_start: marker_pos + 4,
            end,
        });
        pos = end;
    }
}

/// Copy `data` leaving out `remove`, which must be ordered and non-overlapping
/// (as returned by [`header_segments`]).
pub(crate) fn remove_segments(data: &[u8], remove: &[Segment]) -> Vec<u8> {
    let removed: usize = remove.iter().map(|s| s.end - s.start).sum();
    let mut out = Vec::with_capacity(data.len() - removed);

    let mut cursor = 0;
    for segment in remove {
        out.extend_from_slice(&data[cursor..segment.start]);
        cursor = segment.end;
    }
    out.extend_from_slice(&data[cursor..]);

    out
}
