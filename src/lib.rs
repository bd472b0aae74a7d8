// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # PDF Seal
//!
//! Incremental embedding of detached PDF signatures and RFC 3161 document
//! timestamps.
//!
//! ## Core Features
//!
//! - **Placeholder Preparation**: Inserts the signature dictionary, signature
//!   field widget and AcroForm into an in-memory object graph, sized by the
//!   signer's own upper bound
//! - **Layout-Reporting Writer**: Serializes the document once (classic xref
//!   table or compressed object/xref streams) and reports the byte offsets of
//!   the reserved /ByteRange and /Contents slots
//! - **In-Place Patching**: Fills both slots without moving a single byte, so
//!   the signed spans are exactly the bytes on disk
//! - **Pluggable Signers**: Any [`signatures::Signer`] works; the
//!   [`signatures::DigestSigner`] adapter covers digest-then-sign backends
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_seal::document::PdfDocument;
//! use pdf_seal::signatures::{PdfSigner, SignOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = PdfDocument::new();
//! doc.add_letter_page()?;
//!
//! let signer = PdfSigner::new(my_cms_signer(), SignOptions::signature().with_reason("Approved"));
//! let signed = signer.prepare_and_sign(&mut doc, "signed.pdf")?;
//! println!("ByteRange {}", signed.byte_range.to_pdf_array());
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Object model
pub mod document;
pub mod geometry;
pub mod object;

// PDF writing
pub mod writer;

// Digital signatures
pub mod signatures;

pub use document::{PageHandle, PdfDocument};
pub use error::{Error, Result};
pub use signatures::{PdfSigner, SignOptions, SignatureBound, SignatureKind, Signer};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
