//! PDF Digital Signatures module.
//!
//! Embeds a detached signature or an RFC 3161 document timestamp into a
//! freshly written PDF without rewriting it.
//!
//! ## Flow
//!
//! ```text
//! PdfDocument ──prepare──▶ placeholder objects (/Sig, widget, /AcroForm)
//!      │
//!      └──sign──▶ LayoutWriter ──▶ file + WriteLayout
//!                      │
//!                      ├─ ByteRange::resolve ─▶ patch /ByteRange slot
//!                      ├─ covered spans ─▶ Signer::sign
//!                      └─ patch /Contents slot
//! ```
//!
//! ## Signature Types Supported
//!
//! - PKCS#7 detached signatures (adbe.pkcs7.detached)
//! - RFC 3161 document timestamps (ETSI.RFC3161)
//!
//! ## Example
//!
//! ```ignore
//! use pdf_seal::document::PdfDocument;
//! use pdf_seal::signatures::{DigestAlgorithm, DigestSigner, PdfSigner, SignOptions, SignatureBound};
//!
//! let mut doc = PdfDocument::new();
//! doc.add_letter_page()?;
//!
//! let bound = SignatureBound::new(8192).unwrap();
//! let signer = DigestSigner::new(DigestAlgorithm::Sha256, bound, |digest| cms_sign(digest));
//! PdfSigner::new(signer, SignOptions::signature()).prepare_and_sign(&mut doc, "signed.pdf")?;
//! ```
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ISO 32000-2:2020 Section 12.8.5 - Document Timestamp Dictionary

mod byterange;
mod patcher;
mod placeholder;
mod signer;
mod types;

pub use byterange::{ByteRange, CoveredBytes, BYTE_RANGE_SLOT_WIDTH};
pub use patcher::{patch_file, FilePatcher};
pub use placeholder::{format_pdf_date, prepare};
pub use signer::{sign_document, DigestSigner, PdfSigner, Signer};
pub use types::{
    DigestAlgorithm, PreparedSignature, SignOptions, SignatureBound, SignatureKind,
    SignatureSubFilter, SignedLayout,
};
