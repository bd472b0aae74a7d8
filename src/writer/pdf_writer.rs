//! PDF document writer.
//!
//! Assembles complete PDF files from a [`PdfDocument`]: header, body,
//! cross-reference section and trailer. The body is written in one pass;
//! when a signature dictionary is designated, its /ByteRange and /Contents
//! slots are reserved and their absolute offsets reported back.

use super::object_serializer::{ObjectSerializer, SignatureSlots};
use super::{LayoutWriter, WriteLayout};
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::signatures::BYTE_RANGE_SLOT_WIDTH;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// Whether to compress streams (including object and xref streams)
    pub compress: bool,
    /// Pack non-stream objects into object streams and emit an xref stream
    pub object_streams: bool,
    /// Maximum number of objects per object stream
    pub objects_per_stream: usize,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            compress: false,
            object_streams: false,
            objects_per_stream: 100,
        }
    }
}

impl PdfWriterConfig {
    /// Enable or disable stream compression.
    ///
    /// When enabled, streams without a /Filter are compressed using
    /// FlateDecode (zlib/deflate).
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable object streams (PDF 1.5+).
    ///
    /// A designated signature dictionary is always written as a plain
    /// indirect object so its slots stay addressable.
    pub fn with_object_streams(mut self, object_streams: bool) -> Self {
        self.object_streams = object_streams;
        self
    }

    /// Set the maximum number of objects packed into a single object stream.
    pub fn with_objects_per_stream(mut self, count: usize) -> Self {
        self.objects_per_stream = count.max(1);
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Cross-reference entry for one object number.
#[derive(Debug, Clone, Copy)]
enum XrefEntry {
    /// Uncompressed object at a byte offset
    InUse(usize),
    /// Object stored in an object stream at the given index
    Compressed { stream: u32, index: usize },
}

/// Result of assembling a file in memory.
struct Assembled {
    bytes: Vec<u8>,
    slots: Option<SignatureSlots>,
}

/// PDF document writer.
///
/// Stateless: every call receives the configuration for that write.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl PdfWriter {
    /// Create a new PDF writer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize the document to bytes.
    pub fn to_bytes(&self, document: &PdfDocument, config: &PdfWriterConfig) -> Result<Vec<u8>> {
        Ok(self.assemble(document, config, None)?.bytes)
    }

    /// Save the document to a file.
    pub fn save(
        &self,
        document: &PdfDocument,
        path: impl AsRef<Path>,
        config: &PdfWriterConfig,
    ) -> Result<()> {
        let bytes = self.to_bytes(document, config)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn assemble(
        &self,
        document: &PdfDocument,
        config: &PdfWriterConfig,
        signature: Option<ObjectRef>,
    ) -> Result<Assembled> {
        let serializer = ObjectSerializer::compact();
        let mut output = Vec::new();
        let mut xref: BTreeMap<u32, XrefEntry> = BTreeMap::new();
        let mut slots = None;
        let mut packed: Vec<(ObjectRef, &Object)> = Vec::new();

        let (major, minor) = document.version();
        let version = if config.object_streams {
            (major, minor).max((1, 5))
        } else {
            (major, minor)
        };
        writeln!(output, "%PDF-{}.{}", version.0, version.1)?;
        // Binary marker (recommended for binary content)
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        for (obj_ref, obj) in document.objects() {
            if Some(obj_ref) == signature {
                let dict = obj.expect_dict()?;
                let (bytes, rel) = serializer.serialize_signature_indirect(
                    obj_ref.id,
                    obj_ref.gen,
                    dict,
                    BYTE_RANGE_SLOT_WIDTH,
                )?;
                let base = output.len();
                slots = Some(SignatureSlots {
                    byte_range: base + rel.byte_range,
                    contents: base + rel.contents,
                });
                xref.insert(obj_ref.id, XrefEntry::InUse(base));
                output.extend_from_slice(&bytes);
                continue;
            }

            if config.object_streams && !matches!(obj, Object::Stream { .. }) {
                packed.push((obj_ref, obj));
                continue;
            }

            xref.insert(obj_ref.id, XrefEntry::InUse(output.len()));
            let prepared = prepare_stream(obj, config.compress)?;
            output.extend_from_slice(&serializer.serialize_indirect(
                obj_ref.id,
                obj_ref.gen,
                prepared.as_ref().unwrap_or(obj),
            )?);
        }

        if let Some(sig) = signature {
            if slots.is_none() {
                return Err(Error::ObjectNotFound(sig.id, sig.gen));
            }
        }

        let mut next_id = document.xref_size();
        for chunk in packed.chunks(config.objects_per_stream.max(1)) {
            let stream_id = next_id;
            next_id += 1;

            let stream = build_object_stream(&serializer, chunk, config.compress)?;
            for (index, (obj_ref, _)) in chunk.iter().enumerate() {
                xref.insert(
                    obj_ref.id,
                    XrefEntry::Compressed {
                        stream: stream_id,
                        index,
                    },
                );
            }
            xref.insert(stream_id, XrefEntry::InUse(output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(stream_id, 0, &stream)?);
        }

        if config.object_streams {
            write_xref_stream(&serializer, &mut output, document, &mut xref, next_id, config)?;
        } else {
            write_xref_table(&serializer, &mut output, document, &xref, next_id)?;
        }

        log::debug!(
            "Assembled PDF {}.{}: {} objects, {} bytes",
            version.0,
            version.1,
            xref.len(),
            output.len()
        );

        Ok(Assembled {
            bytes: output,
            slots,
        })
    }
}

impl LayoutWriter for PdfWriter {
    fn write_layout(
        &self,
        document: &PdfDocument,
        signature: ObjectRef,
        path: &Path,
        config: &PdfWriterConfig,
    ) -> Result<WriteLayout> {
        let assembled = self.assemble(document, config, Some(signature))?;
        let slots = assembled
            .slots
            .ok_or(Error::ObjectNotFound(signature.id, signature.gen))?;

        std::fs::write(path, &assembled.bytes)?;

        let layout = WriteLayout {
            offset_byte_range: slots.byte_range as u64,
            offset_contents: slots.contents as u64,
            file_size: assembled.bytes.len() as u64,
        };
        log::info!(
            "Wrote {} ({} bytes), /ByteRange at {}, /Contents at {}",
            path.display(),
            layout.file_size,
            layout.offset_byte_range,
            layout.offset_contents
        );
        Ok(layout)
    }
}

/// Compress an uncompressed stream when compression is enabled.
///
/// Returns `None` when the object can be written as-is.
fn prepare_stream(obj: &Object, compress: bool) -> Result<Option<Object>> {
    match obj {
        Object::Stream { dict, data } if compress && !dict.contains_key("Filter") => {
            let compressed = compress_data(data)?;
            let mut dict = dict.clone();
            dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            Ok(Some(Object::Stream {
                dict,
                data: bytes::Bytes::from(compressed),
            }))
        },
        _ => Ok(None),
    }
}

/// Pack direct serializations of `objects` into a /Type /ObjStm stream.
fn build_object_stream(
    serializer: &ObjectSerializer,
    objects: &[(ObjectRef, &Object)],
    compress: bool,
) -> Result<Object> {
    let mut header = Vec::new();
    let mut body = Vec::new();

    for (obj_ref, obj) in objects {
        write!(header, "{} {} ", obj_ref.id, body.len())?;
        body.extend_from_slice(&serializer.serialize(obj)?);
        body.push(b'\n');
    }

    let first = header.len();
    header.extend_from_slice(&body);

    let stream = Object::Stream {
        dict: match ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("ObjStm")),
            ("N", ObjectSerializer::integer(objects.len() as i64)),
            ("First", ObjectSerializer::integer(first as i64)),
        ]) {
            Object::Dictionary(d) => d,
            _ => unreachable!("ObjectSerializer::dict builds a dictionary"),
        },
        data: bytes::Bytes::from(header),
    };

    Ok(prepare_stream(&stream, compress)?.unwrap_or(stream))
}

/// Trailer entries shared by xref tables and xref streams.
fn trailer_entries(document: &PdfDocument, size: u32) -> Vec<(&'static str, Object)> {
    let mut entries = vec![
        ("Size", ObjectSerializer::integer(size as i64)),
        ("Root", Object::Reference(document.root())),
    ];
    if let Some(info) = document.info() {
        entries.push(("Info", Object::Reference(info)));
    }
    entries
}

/// Write a classic `xref` table, trailer and `startxref`.
fn write_xref_table(
    serializer: &ObjectSerializer,
    output: &mut Vec<u8>,
    document: &PdfDocument,
    xref: &BTreeMap<u32, XrefEntry>,
    size: u32,
) -> Result<()> {
    let xref_start = output.len();
    writeln!(output, "xref")?;
    writeln!(output, "0 {}", size)?;

    // Object 0 is always free
    writeln!(output, "0000000000 65535 f ")?;
    for id in 1..size {
        match xref.get(&id) {
            Some(XrefEntry::InUse(offset)) => writeln!(output, "{:010} 00000 n ", offset)?,
            Some(XrefEntry::Compressed { .. }) => {
                return Err(Error::Unsupported(
                    "compressed objects require an xref stream".to_string(),
                ))
            },
            None => writeln!(output, "0000000000 00000 f ")?,
        }
    }

    let trailer = ObjectSerializer::dict(trailer_entries(document, size));
    writeln!(output, "trailer")?;
    output.extend_from_slice(&serializer.serialize(&trailer)?);
    writeln!(output)?;
    writeln!(output, "startxref")?;
    writeln!(output, "{}", xref_start)?;
    write!(output, "%%EOF")?;
    Ok(())
}

/// Write a cross-reference stream (`/Type /XRef`, `/W [1 4 2]`) and `startxref`.
fn write_xref_stream(
    serializer: &ObjectSerializer,
    output: &mut Vec<u8>,
    document: &PdfDocument,
    xref: &mut BTreeMap<u32, XrefEntry>,
    xref_id: u32,
    config: &PdfWriterConfig,
) -> Result<()> {
    let xref_start = output.len();
    xref.insert(xref_id, XrefEntry::InUse(xref_start));
    let size = xref_id + 1;

    let mut rows = Vec::with_capacity(size as usize * 7);
    for id in 0..size {
        let (kind, field2, field3): (u8, usize, u16) = match xref.get(&id) {
            Some(XrefEntry::InUse(offset)) => (1, *offset, 0),
            Some(XrefEntry::Compressed { stream, index }) => {
                let index = u16::try_from(*index).map_err(|_| {
                    Error::Unsupported("object stream index exceeds 65535".to_string())
                })?;
                (2, *stream as usize, index)
            },
            None if id == 0 => (0, 0, 65535),
            None => (0, 0, 0),
        };
        let field2 = u32::try_from(field2)
            .map_err(|_| Error::Unsupported("xref stream offsets beyond 4 GiB".to_string()))?;
        rows.push(kind);
        rows.extend_from_slice(&field2.to_be_bytes());
        rows.extend_from_slice(&field3.to_be_bytes());
    }

    let mut entries = trailer_entries(document, size);
    entries.push(("Type", ObjectSerializer::name("XRef")));
    entries.push((
        "W",
        ObjectSerializer::array(vec![
            ObjectSerializer::integer(1),
            ObjectSerializer::integer(4),
            ObjectSerializer::integer(2),
        ]),
    ));
    let dict = match ObjectSerializer::dict(entries) {
        Object::Dictionary(d) => d,
        _ => unreachable!("ObjectSerializer::dict builds a dictionary"),
    };
    let stream = Object::Stream {
        dict,
        data: bytes::Bytes::from(rows),
    };
    let stream = prepare_stream(&stream, config.compress)?.unwrap_or(stream);

    output.extend_from_slice(&serializer.serialize_indirect(xref_id, 0, &stream)?);
    writeln!(output, "startxref")?;
    writeln!(output, "{}", xref_start)?;
    write!(output, "%%EOF")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ObjectSerializer;

    fn one_page_doc() -> PdfDocument {
        let mut doc = PdfDocument::new();
        doc.add_page(612.0, 792.0, b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET".to_vec())
            .unwrap();
        doc
    }

    #[test]
    fn test_create_minimal_pdf() {
        let bytes = PdfWriter::new()
            .to_bytes(&one_page_doc(), &PdfWriterConfig::default())
            .unwrap();

        let content = String::from_utf8_lossy(&bytes);
        assert!(content.starts_with("%PDF-1.7"));
        assert!(content.contains("/Type /Catalog"));
        assert!(content.contains("/Type /Pages"));
        assert!(content.contains("/Type /Page"));
        assert!(content.contains("(Hello) Tj"));
        assert!(content.contains("\ntrailer\n"));
        assert!(content.ends_with("%%EOF"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let doc = one_page_doc();
        let bytes = PdfWriter::new()
            .to_bytes(&doc, &PdfWriterConfig::default())
            .unwrap();

        let xref_at = bytes.windows(6).rposition(|w| w == b"\nxref\n").unwrap() + 1;
        let table = std::str::from_utf8(&bytes[xref_at..]).unwrap();
        let rows: Vec<&str> = table.lines().skip(2).take(doc.object_count() + 1).collect();
        for (id, row) in rows.iter().enumerate().skip(1) {
            let offset: usize = row[..10].parse().unwrap();
            assert!(bytes[offset..].starts_with(format!("{} 0 obj", id).as_bytes()));
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let doc = one_page_doc();
        let writer = PdfWriter::new();
        let a = writer.to_bytes(&doc, &PdfWriterConfig::default()).unwrap();
        let b = writer.to_bytes(&doc, &PdfWriterConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compressed_streams() {
        let config = PdfWriterConfig::default().with_compress(true);
        let bytes = PdfWriter::new().to_bytes(&one_page_doc(), &config).unwrap();
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/Filter /FlateDecode"));
        assert!(!content.contains("(Hello) Tj"));
    }

    #[test]
    fn test_object_streams_use_xref_stream() {
        let config = PdfWriterConfig::default().with_object_streams(true);
        let bytes = PdfWriter::new().to_bytes(&one_page_doc(), &config).unwrap();
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.starts_with("%PDF-1.7"));
        assert!(content.contains("/Type /ObjStm"));
        assert!(content.contains("/Type /XRef"));
        assert!(!content.contains("\ntrailer\n"));
    }

    #[test]
    fn test_write_layout_reports_slots() {
        let mut doc = one_page_doc();
        let sig = doc.add_object(ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Sig")),
            ("Contents", Object::String(vec![0; 8])),
            ("ByteRange", Object::Array(vec![])),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let layout = PdfWriter::new()
            .write_layout(&doc, sig, &path, &PdfWriterConfig::default().with_object_streams(true))
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(layout.file_size, bytes.len() as u64);
        let br = layout.offset_byte_range as usize;
        let c = layout.offset_contents as usize;
        assert_eq!(bytes[br], b'[');
        assert_eq!(bytes[br + BYTE_RANGE_SLOT_WIDTH - 1], b']');
        assert_eq!(&bytes[c..c + 18], b"<0000000000000000>");
    }

    #[test]
    fn test_write_layout_unknown_signature() {
        let dir = tempfile::tempdir().unwrap();
        let result = PdfWriter::new().write_layout(
            &one_page_doc(),
            ObjectRef::new(42, 0),
            &dir.path().join("out.pdf"),
            &PdfWriterConfig::default(),
        );
        assert!(matches!(result, Err(Error::ObjectNotFound(42, 0))));
    }
}
