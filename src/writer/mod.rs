//! PDF writing module.
//!
//! ## Architecture
//!
//! ```text
//! PdfDocument (object graph)
//!     ↓
//! [PdfWriter] (assembles header, body, xref, trailer; reserves signature slots)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF file + WriteLayout
//! ```
//!
//! ```ignore
//! use pdf_seal::document::PdfDocument;
//! use pdf_seal::writer::{PdfWriter, PdfWriterConfig};
//!
//! let mut doc = PdfDocument::new();
//! doc.add_letter_page()?;
//! PdfWriter::new().save(&doc, "blank.pdf", &PdfWriterConfig::default())?;
//! ```

mod acroform;
mod object_serializer;
mod pdf_writer;

pub use acroform::{AcroFormBuilder, SIG_FLAG_APPEND_ONLY, SIG_FLAG_SIGNATURES_EXIST};
pub use object_serializer::{ObjectSerializer, SignatureSlots};
pub use pdf_writer::{PdfWriter, PdfWriterConfig};

pub(crate) use object_serializer::hex_upper;

use crate::document::PdfDocument;
use crate::error::Result;
use crate::object::ObjectRef;
use std::path::Path;

/// Byte offsets of the signature slots in a written file.
///
/// Only valid for the file snapshot produced by the write that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLayout {
    /// Offset of the `[` opening the reserved /ByteRange slot
    pub offset_byte_range: u64,
    /// Offset of the `<` opening the /Contents placeholder
    pub offset_contents: u64,
    /// Total file size after the write
    pub file_size: u64,
}

/// Serializes a document once and reports where the signature slots landed.
pub trait LayoutWriter {
    /// Write `document` to `path`, reserving the slots of the signature
    /// dictionary `signature`.
    fn write_layout(
        &self,
        document: &PdfDocument,
        signature: ObjectRef,
        path: &Path,
        config: &PdfWriterConfig,
    ) -> Result<WriteLayout>;
}
