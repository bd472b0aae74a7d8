//! PDF signing implementation.
//!
//! Signing is a two-phase protocol:
//!
//! 1. [`PdfSigner::prepare`] asks the signer for an upper bound on its output
//!    and inserts a placeholder of that size into the object graph.
//! 2. [`PdfSigner::sign`] writes the file once, patches the /ByteRange slot,
//!    streams the covered bytes through the signer and patches /Contents.
//!
//! Neither patch changes the file size, so every offset recorded during the
//! write stays valid.

use super::byterange::{ByteRange, BYTE_RANGE_SLOT_WIDTH};
use super::patcher::FilePatcher;
use super::placeholder;
use super::types::{DigestAlgorithm, PreparedSignature, SignOptions, SignatureBound, SignedLayout};
use crate::document::PdfDocument;
use crate::error::{Error, Result, SignerError};
use crate::writer::{hex_upper, LayoutWriter, PdfWriter, PdfWriterConfig};
use std::io::Read;
use std::path::Path;

/// Produces a detached signature (or timestamp token) over a byte stream.
///
/// Implementations own the cryptography; this crate only reserves room for
/// the result and embeds it.
pub trait Signer {
    /// Hard upper bound on the length of anything [`Signer::sign`] returns.
    fn estimate_signature_length(&self) -> std::result::Result<SignatureBound, SignerError>;

    /// Sign everything `data` yields.
    fn sign(&self, data: &mut dyn Read) -> std::result::Result<Vec<u8>, SignerError>;
}

impl<S: Signer + ?Sized> Signer for &S {
    fn estimate_signature_length(&self) -> std::result::Result<SignatureBound, SignerError> {
        (**self).estimate_signature_length()
    }

    fn sign(&self, data: &mut dyn Read) -> std::result::Result<Vec<u8>, SignerError> {
        (**self).sign(data)
    }
}

impl<S: Signer + ?Sized> Signer for Box<S> {
    fn estimate_signature_length(&self) -> std::result::Result<SignatureBound, SignerError> {
        (**self).estimate_signature_length()
    }

    fn sign(&self, data: &mut dyn Read) -> std::result::Result<Vec<u8>, SignerError> {
        (**self).sign(data)
    }
}

/// Signer that hashes the covered bytes and hands the digest to a callback.
///
/// The callback typically wraps an HSM, a remote signing service or a CMS
/// library; it receives the raw digest and returns the encoded signature.
pub struct DigestSigner<F> {
    algorithm: DigestAlgorithm,
    bound: SignatureBound,
    sign_digest: F,
}

impl<F> DigestSigner<F>
where
    F: Fn(&[u8]) -> std::result::Result<Vec<u8>, SignerError>,
{
    /// Create a digest signer producing at most `bound` bytes.
    pub fn new(algorithm: DigestAlgorithm, bound: SignatureBound, sign_digest: F) -> Self {
        Self {
            algorithm,
            bound,
            sign_digest,
        }
    }

    /// Digest algorithm applied to the covered bytes.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}

impl<F> Signer for DigestSigner<F>
where
    F: Fn(&[u8]) -> std::result::Result<Vec<u8>, SignerError>,
{
    fn estimate_signature_length(&self) -> std::result::Result<SignatureBound, SignerError> {
        Ok(self.bound)
    }

    fn sign(&self, data: &mut dyn Read) -> std::result::Result<Vec<u8>, SignerError> {
        let digest = self.algorithm.digest_reader(data)?;
        log::trace!("{} digest: {}", self.algorithm.name(), hex_upper(&digest));
        (self.sign_digest)(&digest)
    }
}

/// PDF signer that drives placeholder preparation and embedding.
pub struct PdfSigner<S, W = PdfWriter> {
    signer: S,
    writer: W,
    options: SignOptions,
    config: PdfWriterConfig,
}

impl<S: Signer> PdfSigner<S> {
    /// Create a PDF signer writing through the default [`PdfWriter`].
    pub fn new(signer: S, options: SignOptions) -> Self {
        Self {
            signer,
            writer: PdfWriter::new(),
            options,
            config: PdfWriterConfig::default(),
        }
    }
}

impl<S: Signer, W: LayoutWriter> PdfSigner<S, W> {
    /// Replace the layout writer.
    pub fn with_writer<W2: LayoutWriter>(self, writer: W2) -> PdfSigner<S, W2> {
        PdfSigner {
            signer: self.signer,
            writer,
            options: self.options,
            config: self.config,
        }
    }

    /// Set the writer configuration used by [`PdfSigner::sign`].
    pub fn with_writer_config(mut self, config: PdfWriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the signing options.
    pub fn options(&self) -> &SignOptions {
        &self.options
    }

    /// Get the underlying signer.
    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Insert a placeholder sized by the signer's estimate.
    pub fn prepare(&self, document: &mut PdfDocument) -> Result<PreparedSignature> {
        let bound = self
            .signer
            .estimate_signature_length()
            .map_err(Error::Signer)?;
        placeholder::prepare(document, bound, &self.options)
    }

    /// Write `document` to `output` and embed the signature.
    pub fn sign(
        &self,
        document: &PdfDocument,
        prepared: &PreparedSignature,
        output: impl AsRef<Path>,
    ) -> Result<SignedLayout> {
        sign_document(
            document,
            prepared,
            output.as_ref(),
            &self.signer,
            &self.writer,
            &self.config,
        )
    }

    /// [`PdfSigner::prepare`] followed by [`PdfSigner::sign`].
    pub fn prepare_and_sign(
        &self,
        document: &mut PdfDocument,
        output: impl AsRef<Path>,
    ) -> Result<SignedLayout> {
        let prepared = self.prepare(document)?;
        self.sign(document, &prepared, output)
    }
}

/// Write a prepared document and embed the signature in place.
///
/// If a step after the write fails, the file at `path` is left behind in its
/// partially patched state and must not be treated as signed.
pub fn sign_document<S, W>(
    document: &PdfDocument,
    prepared: &PreparedSignature,
    path: &Path,
    signer: &S,
    writer: &W,
    config: &PdfWriterConfig,
) -> Result<SignedLayout>
where
    S: Signer + ?Sized,
    W: LayoutWriter + ?Sized,
{
    let bound = prepared.bound();
    let estimate = signer.estimate_signature_length().map_err(Error::Signer)?;
    if estimate > bound {
        return Err(Error::signer(format!(
            "signer estimate of {} bytes exceeds the {} bytes reserved",
            estimate.bytes(),
            bound.bytes()
        )));
    }

    let layout = writer.write_layout(document, prepared.record(), path, config)?;
    let byte_range = ByteRange::resolve(&layout, bound)?;

    let mut patcher = FilePatcher::open(path)?;
    if patcher.file_size() != layout.file_size {
        return Err(Error::InvalidByteRange(format!(
            "file is {} bytes but the writer reported {}",
            patcher.file_size(),
            layout.file_size
        )));
    }

    let slot = byte_range.to_slot(BYTE_RANGE_SLOT_WIDTH)?;
    patcher.patch(layout.offset_byte_range, BYTE_RANGE_SLOT_WIDTH, &slot)?;
    log::debug!("patched /ByteRange {}", byte_range.to_pdf_array());

    let mut covered = byte_range.covered_reader(path)?;
    let signature = signer.sign(&mut covered).map_err(Error::Signer)?;
    if signature.is_empty() {
        return Err(Error::signer("signer returned an empty signature"));
    }
    bound.check(signature.len())?;

    let hex = pad_signature_hex(&signature, bound);
    patcher.patch(layout.offset_contents + 1, bound.hex_len(), hex.as_bytes())?;

    log::info!(
        "embedded {:?} of {} bytes ({} reserved) into {}",
        prepared.kind(),
        signature.len(),
        bound.bytes(),
        path.display()
    );

    Ok(SignedLayout {
        layout,
        byte_range,
        signature_len: signature.len(),
    })
}

/// Hex-encode `signature` and right-pad with `0` to fill the placeholder.
fn pad_signature_hex(signature: &[u8], bound: SignatureBound) -> String {
    let mut hex = hex_upper(signature);
    hex.extend(std::iter::repeat('0').take(bound.hex_len() - hex.len()));
    hex
}
