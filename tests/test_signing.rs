//! Integration tests for placeholder signing.
//!
//! Tests the complete prepare / write / patch protocol including:
//! - Round-trip: the signer sees exactly the covered bytes of the final file
//! - Classic xref tables and compressed object/xref streams
//! - Timestamp records without a signing time
//! - AlreadySigned leaving the document untouched
//! - Oversized signatures rejected without touching the content slot
//! - Byte range arithmetic on a synthetic layout

use pdf_seal::document::PdfDocument;
use pdf_seal::error::{Error, SignerError};
use pdf_seal::object::{Object, ObjectRef};
use pdf_seal::signatures::{
    ByteRange, DigestAlgorithm, DigestSigner, PdfSigner, SignOptions, SignatureBound, Signer,
    BYTE_RANGE_SLOT_WIDTH,
};
use pdf_seal::writer::{LayoutWriter, PdfWriter, PdfWriterConfig, WriteLayout};
use std::cell::RefCell;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::tempdir;

/// Signer that records what it was asked to sign and returns a canned value.
struct RecordingSigner {
    bound: usize,
    output: Vec<u8>,
    seen: RefCell<Vec<u8>>,
}

impl RecordingSigner {
    fn new(bound: usize, output: Vec<u8>) -> Self {
        Self {
            bound,
            output,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Signer for RecordingSigner {
    fn estimate_signature_length(&self) -> Result<SignatureBound, SignerError> {
        SignatureBound::new(self.bound).ok_or_else(|| "zero bound".into())
    }

    fn sign(&self, data: &mut dyn Read) -> Result<Vec<u8>, SignerError> {
        let mut seen = self.seen.borrow_mut();
        seen.clear();
        data.read_to_end(&mut seen)?;
        Ok(self.output.clone())
    }
}

fn sample_document(pages: usize) -> PdfDocument {
    let mut doc = PdfDocument::new();
    for _ in 0..pages {
        doc.add_page(612.0, 792.0, b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET".to_vec())
            .unwrap();
    }
    doc
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

mod round_trip_tests {
    use super::*;

    fn assert_round_trip(config: PdfWriterConfig) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signed.pdf");
        let bound = SignatureBound::new(64).unwrap();
        let signed_digest = RefCell::new(Vec::new());

        let signer = DigestSigner::new(DigestAlgorithm::Sha256, bound, |digest: &[u8]| {
            signed_digest.borrow_mut().extend_from_slice(digest);
            Ok(digest.to_vec())
        });
        let pdf_signer = PdfSigner::new(signer, SignOptions::signature().with_reason("Approved"))
            .with_writer_config(config);

        let mut doc = sample_document(2);
        let signed = pdf_signer.prepare_and_sign(&mut doc, &path).unwrap();
        let bytes = fs::read(&path).unwrap();

        assert_eq!(bytes.len() as u64, signed.layout.file_size);
        signed.byte_range.validate(bytes.len() as u64).unwrap();

        // Hashing the two spans of the final file reproduces the signed digest.
        let digest = signed
            .byte_range
            .digest_file(&path, DigestAlgorithm::Sha256)
            .unwrap();
        assert_eq!(digest, *signed_digest.borrow());

        // The embedded value is the digest, hex encoded and zero padded.
        let c = signed.layout.offset_contents as usize;
        let slot = &bytes[c..c + bound.slot_len()];
        assert_eq!(slot[0], b'<');
        assert_eq!(slot[bound.slot_len() - 1], b'>');
        let hex: String = digest.iter().map(|b| format!("{:02X}", b)).collect();
        assert!(slot[1..].starts_with(hex.as_bytes()));
        assert!(slot[1 + hex.len()..bound.slot_len() - 1]
            .iter()
            .all(|&b| b == b'0'));

        // The patched /ByteRange slot holds the resolved descriptor.
        let br = signed.layout.offset_byte_range as usize;
        let text = std::str::from_utf8(&bytes[br..br + BYTE_RANGE_SLOT_WIDTH]).unwrap();
        let values: Vec<u64> = text
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(values, signed.byte_range.as_array());
    }

    #[test]
    fn test_round_trip_classic_xref() {
        assert_round_trip(PdfWriterConfig::default());
    }

    #[test]
    fn test_round_trip_object_streams() {
        assert_round_trip(
            PdfWriterConfig::default()
                .with_compress(true)
                .with_object_streams(true),
        );
    }

    #[test]
    fn test_signer_sees_covered_bytes_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("covered.pdf");
        let pdf_signer =
            PdfSigner::new(RecordingSigner::new(32, vec![0x30, 0x82]), SignOptions::default());

        let mut doc = sample_document(1);
        let signed = pdf_signer.prepare_and_sign(&mut doc, &path).unwrap();
        let bytes = fs::read(&path).unwrap();

        let seen = pdf_signer.signer().seen.borrow();
        assert_eq!(seen.len() as u64, signed.byte_range.covered_len());
        assert_eq!(*seen, signed.byte_range.extract(&bytes).unwrap());
        // The excluded hole is exactly the /Contents slot.
        assert_eq!(
            signed.byte_range.excluded(),
            signed.layout.offset_contents..signed.layout.offset_contents + 66
        );
    }
}

mod record_tests {
    use super::*;

    #[test]
    fn test_signature_file_has_signing_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sig.pdf");
        let pdf_signer = PdfSigner::new(RecordingSigner::new(16, vec![1]), SignOptions::signature());

        let mut doc = sample_document(1);
        pdf_signer.prepare_and_sign(&mut doc, &path).unwrap();
        let bytes = fs::read(&path).unwrap();

        assert!(find(&bytes, b"/Type /Sig").is_some());
        assert!(find(&bytes, b"/SubFilter /adbe.pkcs7.detached").is_some());
        assert!(find(&bytes, b"/M (D:").is_some());
        assert!(find(&bytes, b"/SigFlags 3").is_some());
    }

    #[test]
    fn test_timestamp_file_has_no_signing_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ts.pdf");
        let pdf_signer = PdfSigner::new(RecordingSigner::new(16, vec![1]), SignOptions::timestamp());

        let mut doc = sample_document(1);
        let prepared = pdf_signer.prepare(&mut doc).unwrap();
        assert!(!doc.dict(prepared.record()).unwrap().contains_key("M"));

        pdf_signer.sign(&doc, &prepared, &path).unwrap();
        let bytes = fs::read(&path).unwrap();

        assert!(find(&bytes, b"/Type /DocTimeStamp").is_some());
        assert!(find(&bytes, b"/SubFilter /ETSI.RFC3161").is_some());
        assert!(find(&bytes, b"/M (").is_none());
    }

    #[test]
    fn test_existing_annotations_preserved() {
        let mut doc = sample_document(1);
        let page = doc.first_page().unwrap();
        let link = doc.add_object(Object::Dictionary(
            [
                ("Type".to_string(), Object::Name("Annot".to_string())),
                ("Subtype".to_string(), Object::Name("Link".to_string())),
            ]
            .into_iter()
            .collect(),
        ));
        doc.dict_mut(page.reference())
            .unwrap()
            .insert("Annots".to_string(), Object::Array(vec![Object::Reference(link)]));

        let pdf_signer = PdfSigner::new(RecordingSigner::new(16, vec![1]), SignOptions::default());
        let prepared = pdf_signer.prepare(&mut doc).unwrap();

        let annots = doc.dict(page.reference()).unwrap()["Annots"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(
            annots,
            vec![Object::Reference(link), Object::Reference(prepared.field())]
        );
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_already_signed_leaves_document_identical() {
        let writer = PdfWriter::new();
        let config = PdfWriterConfig::default();
        let pdf_signer = PdfSigner::new(RecordingSigner::new(16, vec![1]), SignOptions::default());

        let mut doc = sample_document(1);
        pdf_signer.prepare(&mut doc).unwrap();
        let before = writer.to_bytes(&doc, &config).unwrap();

        let err = pdf_signer.prepare(&mut doc).unwrap_err();
        assert!(matches!(err, Error::AlreadySigned));
        assert_eq!(writer.to_bytes(&doc, &config).unwrap(), before);
    }

    #[test]
    fn test_oversized_signature_leaves_contents_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("oversized.pdf");
        let k = 32;
        let pdf_signer =
            PdfSigner::new(RecordingSigner::new(k, vec![0xFF; k + 1]), SignOptions::default());

        let mut doc = sample_document(1);
        let prepared = pdf_signer.prepare(&mut doc).unwrap();
        let err = pdf_signer.sign(&doc, &prepared, &path).unwrap_err();
        assert!(matches!(
            err,
            Error::SignatureTooLarge { reserved, actual } if reserved == k && actual == k + 1
        ));

        // Re-create the unpatched layout to compare against.
        let reference = dir.path().join("reference.pdf");
        let layout = PdfWriter::new()
            .write_layout(&doc, prepared.record(), &reference, &PdfWriterConfig::default())
            .unwrap();
        let original = fs::read(&reference).unwrap();
        let patched = fs::read(&path).unwrap();

        assert_eq!(patched.len(), original.len());
        let c = layout.offset_contents as usize;
        let slot_end = c + prepared.bound().slot_len();
        assert!(patched[c + 1..slot_end - 1].iter().all(|&b| b == b'0'));

        // Only the /ByteRange slot differs.
        let br = layout.offset_byte_range as usize;
        assert_eq!(patched[..br], original[..br]);
        assert_eq!(
            patched[br + BYTE_RANGE_SLOT_WIDTH..],
            original[br + BYTE_RANGE_SLOT_WIDTH..]
        );
    }

    #[test]
    fn test_signer_error_is_preserved() {
        struct Refusing;

        impl Signer for Refusing {
            fn estimate_signature_length(&self) -> Result<SignatureBound, SignerError> {
                Err("token not present".into())
            }

            fn sign(&self, _data: &mut dyn Read) -> Result<Vec<u8>, SignerError> {
                unreachable!("estimate fails first")
            }
        }

        let mut doc = sample_document(1);
        let err = PdfSigner::new(Refusing, SignOptions::default())
            .prepare(&mut doc)
            .unwrap_err();
        assert!(matches!(err, Error::Signer(_)));
        assert!(err.to_string().contains("token not present"));
        assert!(!doc.catalog().unwrap().contains_key("AcroForm"));
    }
}

mod layout_tests {
    use super::*;

    /// Writes a synthetic file with the /Contents slot at a fixed offset.
    struct SyntheticWriter {
        offset_byte_range: u64,
        offset_contents: u64,
        slot_len: usize,
        tail: usize,
    }

    impl LayoutWriter for SyntheticWriter {
        fn write_layout(
            &self,
            _document: &PdfDocument,
            _signature: ObjectRef,
            path: &Path,
            _config: &PdfWriterConfig,
        ) -> pdf_seal::Result<WriteLayout> {
            let mut bytes = vec![b'A'; self.offset_contents as usize];
            let br = self.offset_byte_range as usize;
            bytes[br] = b'[';
            bytes[br + 1..br + BYTE_RANGE_SLOT_WIDTH - 1].fill(b' ');
            bytes[br + BYTE_RANGE_SLOT_WIDTH - 1] = b']';
            bytes.push(b'<');
            bytes.extend(std::iter::repeat(b'0').take(self.slot_len - 2));
            bytes.push(b'>');
            bytes.extend(std::iter::repeat(b'Z').take(self.tail));

            let mut file = fs::File::create(path)?;
            file.write_all(&bytes)?;

            Ok(WriteLayout {
                offset_byte_range: self.offset_byte_range,
                offset_contents: self.offset_contents,
                file_size: bytes.len() as u64,
            })
        }
    }

    #[test]
    fn test_byte_range_matches_formula() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("synthetic.pdf");
        let n = 2449;
        let c = 59646u64;
        let tail = 1234;
        let bound = SignatureBound::new(n).unwrap();

        let pdf_signer = PdfSigner::new(RecordingSigner::new(n, vec![0xAB; n]), SignOptions::default())
            .with_writer(SyntheticWriter {
                offset_byte_range: 200,
                offset_contents: c,
                slot_len: bound.slot_len(),
                tail,
            });

        let mut doc = sample_document(1);
        let signed = pdf_signer.prepare_and_sign(&mut doc, &path).unwrap();

        let file_size = c + 2 + 2 * n as u64 + tail as u64;
        let start1 = c + 2 + 2 * n as u64;
        assert_eq!(signed.layout.file_size, file_size);
        assert_eq!(
            signed.byte_range,
            ByteRange::new(0, c, start1, file_size - start1)
        );
        assert_eq!(
            signed.byte_range.len0 + signed.byte_range.len1 + bound.slot_len() as u64,
            file_size
        );

        // A full-size signature leaves no padding.
        let bytes = fs::read(&path).unwrap();
        let slot = &bytes[c as usize + 1..start1 as usize - 1];
        assert!(slot.chunks(2).all(|pair| pair == b"AB"));
        assert_eq!(bytes.len() as u64, file_size);
    }

    #[test]
    fn test_inconsistent_layout_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.pdf");

        // The writer reserves a smaller /Contents slot than the bound needs.
        let pdf_signer = PdfSigner::new(RecordingSigner::new(64, vec![1]), SignOptions::default())
            .with_writer(SyntheticWriter {
                offset_byte_range: 10,
                offset_contents: 100,
                slot_len: 20,
                tail: 0,
            });

        let mut doc = sample_document(1);
        let err = pdf_signer.prepare_and_sign(&mut doc, &path).unwrap_err();
        assert!(matches!(err, Error::InvalidByteRange(_)));
    }
}
