//! ByteRange calculation for PDF signatures.
//!
//! PDF digital signatures use a ByteRange array to specify which portions
//! of the document are covered by the signature. The signature itself is
//! stored in a placeholder that is excluded from the signed bytes.
//!
//! ## ByteRange Format
//!
//! The ByteRange is an array of four integers:
//! `[offset1, length1, offset2, length2]`
//!
//! Where:
//! - `offset1` = 0 (start of file)
//! - `length1` = byte offset of the `<` opening the /Contents value
//! - `offset2` = byte offset just past the `>` closing the /Contents value
//! - `length2` = remaining bytes to end of file
//!
//! The array is written into a fixed-width slot reserved by the writer, so
//! patching it never moves a byte of the file.

use super::types::{DigestAlgorithm, SignatureBound};
use crate::error::{Error, Result};
use crate::writer::WriteLayout;
use std::fs::File;
use std::io::{Chain, Read, Seek, SeekFrom, Take};
use std::ops::Range;
use std::path::Path;

/// Width in bytes of the reserved /ByteRange slot, brackets included.
///
/// Four decimal `u64` values and their separators need at most 83 bytes, but
/// files are far below the exabyte range; 60 bytes fits four 13-digit values.
pub const BYTE_RANGE_SLOT_WIDTH: usize = 60;

/// Streaming view over the two covered spans of a file.
pub type CoveredBytes = Chain<Take<File>, Take<File>>;

/// The four-integer /ByteRange of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Start of the first span (always 0 for ranges built by [`ByteRange::resolve`])
    pub start0: u64,
    /// Length of the first span
    pub len0: u64,
    /// Start of the second span
    pub start1: u64,
    /// Length of the second span
    pub len1: u64,
}

impl ByteRange {
    /// Build a range from its four PDF array values.
    pub fn new(start0: u64, len0: u64, start1: u64, len1: u64) -> Self {
        Self {
            start0,
            len0,
            start1,
            len1,
        }
    }

    /// Compute the range covering everything in the written file except the
    /// /Contents slot of `bound`.
    ///
    /// Fails with [`Error::InvalidByteRange`] if the layout cannot describe
    /// a real file: the slot runs past the end, or the /ByteRange slot is not
    /// fully inside a covered span.
    pub fn resolve(layout: &WriteLayout, bound: SignatureBound) -> Result<Self> {
        let contents = layout.offset_contents;
        let slot_end = contents.checked_add(bound.slot_len() as u64).ok_or_else(|| {
            Error::InvalidByteRange(format!("contents slot at {} overflows", contents))
        })?;

        if slot_end > layout.file_size {
            return Err(Error::InvalidByteRange(format!(
                "contents slot {}..{} exceeds file size {}",
                contents, slot_end, layout.file_size
            )));
        }

        let br_start = layout.offset_byte_range;
        let br_end = br_start
            .checked_add(BYTE_RANGE_SLOT_WIDTH as u64)
            .ok_or_else(|| {
                Error::InvalidByteRange(format!("byte range slot at {} overflows", br_start))
            })?;
        if br_end > layout.file_size {
            return Err(Error::InvalidByteRange(format!(
                "byte range slot {}..{} exceeds file size {}",
                br_start, br_end, layout.file_size
            )));
        }
        if br_start < slot_end && contents < br_end {
            return Err(Error::InvalidByteRange(format!(
                "byte range slot {}..{} overlaps contents slot {}..{}",
                br_start, br_end, contents, slot_end
            )));
        }

        Ok(Self::new(0, contents, slot_end, layout.file_size - slot_end))
    }

    /// The four values in PDF array order.
    pub fn as_array(&self) -> [u64; 4] {
        [self.start0, self.len0, self.start1, self.len1]
    }

    /// The hole between the two spans (the /Contents slot).
    pub fn excluded(&self) -> Range<u64> {
        self.start0 + self.len0..self.start1
    }

    /// Total number of covered bytes.
    pub fn covered_len(&self) -> u64 {
        self.len0 + self.len1
    }

    /// Format as a PDF array string, e.g. `[0 100 200 300]`.
    pub fn to_pdf_array(&self) -> String {
        format!("[{} {} {} {}]", self.start0, self.len0, self.start1, self.len1)
    }

    /// Format the array right-padded with spaces to exactly `width` bytes.
    ///
    /// The closing bracket stays last so the slot remains a well-formed array.
    pub fn to_slot(&self, width: usize) -> Result<Vec<u8>> {
        let array = format!("{} {} {} {}", self.start0, self.len0, self.start1, self.len1);
        if array.len() + 2 > width {
            return Err(Error::InvalidByteRange(format!(
                "byte range {} does not fit in a {}-byte slot",
                array, width
            )));
        }

        let mut slot = Vec::with_capacity(width);
        slot.push(b'[');
        slot.extend_from_slice(array.as_bytes());
        slot.resize(width - 1, b' ');
        slot.push(b']');
        Ok(slot)
    }

    /// Check the range covers a file of `file_size` bytes with a single hole.
    ///
    /// A valid ByteRange should:
    /// - Start at offset 0
    /// - End at the file size
    /// - Have no gaps except for the signature placeholder
    pub fn validate(&self, file_size: u64) -> Result<()> {
        if self.start0 != 0 {
            return Err(Error::InvalidByteRange(format!(
                "ByteRange must start at 0, got {}",
                self.start0
            )));
        }

        let actual_end = self.start1.checked_add(self.len1);
        if actual_end != Some(file_size) {
            return Err(Error::InvalidByteRange(format!(
                "ByteRange must end at file size {}, got {}+{}",
                file_size, self.start1, self.len1
            )));
        }

        if self.len0 > self.start1 {
            return Err(Error::InvalidByteRange(format!(
                "ByteRange first range ({}) overlaps with second range start ({})",
                self.len0, self.start1
            )));
        }

        Ok(())
    }

    /// Extract the covered bytes from an in-memory file.
    pub fn extract(&self, pdf_data: &[u8]) -> Result<Vec<u8>> {
        let size = pdf_data.len() as u64;
        let first = span(self.start0, self.len0, size)?;
        let second = span(self.start1, self.len1, size)?;

        let mut signed_bytes = Vec::with_capacity(first.len() + second.len());
        signed_bytes.extend_from_slice(&pdf_data[first]);
        signed_bytes.extend_from_slice(&pdf_data[second]);
        Ok(signed_bytes)
    }

    /// Open `path` and stream the covered spans in order.
    ///
    /// Each span gets its own file handle, so the reader does not share a
    /// cursor with any handle used for patching.
    pub fn covered_reader(&self, path: &Path) -> Result<CoveredBytes> {
        let mut head = File::open(path)?;
        head.seek(SeekFrom::Start(self.start0))?;

        let mut tail = File::open(path)?;
        tail.seek(SeekFrom::Start(self.start1))?;

        Ok(head.take(self.len0).chain(tail.take(self.len1)))
    }

    /// Hash the covered spans of the file at `path`.
    pub fn digest_file(&self, path: &Path, algorithm: DigestAlgorithm) -> Result<Vec<u8>> {
        let mut reader = self.covered_reader(path)?;
        Ok(algorithm.digest_reader(&mut reader)?)
    }
}

fn span(start: u64, len: u64, size: u64) -> Result<Range<usize>> {
    match start.checked_add(len) {
        Some(end) if end <= size => Ok(start as usize..end as usize),
        _ => Err(Error::InvalidByteRange(format!(
            "span {}+{} exceeds file size {}",
            start, len, size
        ))),
    }
}
