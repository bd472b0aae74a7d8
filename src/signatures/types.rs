//! Digital signature types and data structures.
//!
//! This module defines the core types used for PDF digital signatures.

use crate::document::PageHandle;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::ObjectRef;
use crate::writer::WriteLayout;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::Read;
use std::num::NonZeroUsize;

use super::byterange::ByteRange;

/// Digest algorithm used for hashing the covered byte ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1 (deprecated, but still common in legacy PDFs)
    Sha1,
    /// SHA-256 (recommended)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Get the name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Hash an in-memory buffer.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Hash everything `reader` yields, without buffering it whole.
    pub fn digest_reader(&self, reader: &mut dyn Read) -> std::io::Result<Vec<u8>> {
        match self {
            DigestAlgorithm::Sha1 => hash_reader::<Sha1>(reader),
            DigestAlgorithm::Sha256 => hash_reader::<Sha256>(reader),
            DigestAlgorithm::Sha384 => hash_reader::<Sha384>(reader),
            DigestAlgorithm::Sha512 => hash_reader::<Sha512>(reader),
        }
    }
}

fn hash_reader<D: Digest>(reader: &mut dyn Read) -> std::io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}

/// Signature sub-filter type (signature format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSubFilter {
    /// adbe.pkcs7.detached - PKCS#7 detached signature
    Pkcs7Detached,
    /// ETSI.RFC3161 - Timestamp token
    Rfc3161,
}

impl SignatureSubFilter {
    /// Get the PDF name for this sub-filter.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            SignatureSubFilter::Pkcs7Detached => "adbe.pkcs7.detached",
            SignatureSubFilter::Rfc3161 => "ETSI.RFC3161",
        }
    }

    /// Parse a PDF name into a sub-filter type.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "adbe.pkcs7.detached" => Some(SignatureSubFilter::Pkcs7Detached),
            "ETSI.RFC3161" => Some(SignatureSubFilter::Rfc3161),
            _ => None,
        }
    }
}

/// Which kind of record the placeholder reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureKind {
    /// Detached PKCS#7 signature (`/Type /Sig`), carries a signing time
    #[default]
    Signature,
    /// RFC 3161 document timestamp (`/Type /DocTimeStamp`), no signing time
    Timestamp,
}

impl SignatureKind {
    /// Value of the /Type entry.
    pub fn type_name(&self) -> &'static str {
        match self {
            SignatureKind::Signature => "Sig",
            SignatureKind::Timestamp => "DocTimeStamp",
        }
    }

    /// Value of the /Filter entry (signature handler).
    pub fn filter(&self) -> &'static str {
        "Adobe.PPKLite"
    }

    /// Value of the /SubFilter entry.
    pub fn sub_filter(&self) -> SignatureSubFilter {
        match self {
            SignatureKind::Signature => SignatureSubFilter::Pkcs7Detached,
            SignatureKind::Timestamp => SignatureSubFilter::Rfc3161,
        }
    }

    /// Whether the record carries a signing time (/M).
    pub fn has_signing_time(&self) -> bool {
        matches!(self, SignatureKind::Signature)
    }
}

/// Upper bound, in raw bytes, on a signature or timestamp token.
///
/// The /Contents placeholder reserves `2 * bytes()` hex digits plus the two
/// delimiters; a signature longer than the bound cannot be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignatureBound(NonZeroUsize);

impl SignatureBound {
    /// Create a bound of `bytes` raw bytes. Returns `None` for zero.
    pub fn new(bytes: usize) -> Option<Self> {
        NonZeroUsize::new(bytes).map(Self)
    }

    /// Raw byte capacity.
    pub fn bytes(&self) -> usize {
        self.0.get()
    }

    /// Number of hex digits reserved inside the delimiters.
    pub fn hex_len(&self) -> usize {
        self.bytes() * 2
    }

    /// Full width of the /Contents slot, delimiters included.
    pub fn slot_len(&self) -> usize {
        self.hex_len() + 2
    }

    /// Fail with [`Error::SignatureTooLarge`] if `actual` bytes do not fit.
    pub fn check(&self, actual: usize) -> Result<()> {
        if actual > self.bytes() {
            return Err(Error::SignatureTooLarge {
                reserved: self.bytes(),
                actual,
            });
        }
        Ok(())
    }
}

/// Options for preparing a signature placeholder.
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Signature or document timestamp
    pub kind: SignatureKind,
    /// Partial field name (/T)
    pub field_name: String,
    /// Widget rectangle on the first page; zero-area means invisible
    pub rect: Rect,
    /// Name of the signer (if different from certificate CN)
    pub name: Option<String>,
    /// Reason for signing
    pub reason: Option<String>,
    /// Location where the document was signed
    pub location: Option<String>,
    /// Contact information
    pub contact_info: Option<String>,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            kind: SignatureKind::Signature,
            field_name: "Signature".to_string(),
            rect: Rect::zero(),
            name: None,
            reason: None,
            location: None,
            contact_info: None,
        }
    }
}

impl SignOptions {
    /// Options for a detached PKCS#7 signature.
    pub fn signature() -> Self {
        Self::default()
    }

    /// Options for an RFC 3161 document timestamp.
    pub fn timestamp() -> Self {
        Self {
            kind: SignatureKind::Timestamp,
            ..Self::default()
        }
    }

    /// Set the widget rectangle.
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the partial field name.
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set the signer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the reason for signing.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the signing location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set contact information.
    pub fn with_contact_info(mut self, contact: impl Into<String>) -> Self {
        self.contact_info = Some(contact.into());
        self
    }
}

/// Handle to a signature placeholder created in the object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedSignature {
    pub(crate) record: ObjectRef,
    pub(crate) field: ObjectRef,
    pub(crate) form: ObjectRef,
    pub(crate) page: PageHandle,
    pub(crate) kind: SignatureKind,
    pub(crate) bound: SignatureBound,
}

impl PreparedSignature {
    /// The signature dictionary (/Type /Sig or /DocTimeStamp).
    pub fn record(&self) -> ObjectRef {
        self.record
    }

    /// The signature field widget annotation.
    pub fn field(&self) -> ObjectRef {
        self.field
    }

    /// The /AcroForm dictionary.
    pub fn form(&self) -> ObjectRef {
        self.form
    }

    /// The page hosting the widget.
    pub fn page(&self) -> PageHandle {
        self.page
    }

    /// Signature or timestamp.
    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    /// Capacity reserved for the signature.
    pub fn bound(&self) -> SignatureBound {
        self.bound
    }
}

/// Outcome of a completed signing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedLayout {
    /// Offsets reported by the layout writer
    pub layout: WriteLayout,
    /// The /ByteRange patched into the file
    pub byte_range: ByteRange,
    /// Raw length of the embedded signature
    pub signature_len: usize,
}
