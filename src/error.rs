//! Error types for the signing pipeline.
//!
//! This module defines all error types that can occur while building the
//! object graph, writing the document, and patching the signature slots.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by external signers.
pub type SignerError = Box<dyn std::error::Error + Send + Sync>;

/// Error types that can occur while preparing or signing a document.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// The catalog already carries an /AcroForm; co-signing is not supported.
    #[error("Document already has a form container (/AcroForm); re-signing is not supported")]
    AlreadySigned,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The external signer failed to estimate or produce a signature
    #[error("Signer error: {0}")]
    Signer(#[source] SignerError),

    /// Signer output does not fit into the reserved /Contents placeholder
    #[error("Signature ({actual} bytes) exceeds reserved placeholder ({reserved} bytes)")]
    SignatureTooLarge {
        /// Raw bytes reserved at preparation time
        reserved: usize,
        /// Raw bytes returned by the signer
        actual: usize,
    },

    /// A patch does not match the length of the slot it replaces
    #[error("Patch at byte {offset} is {actual} bytes, slot is {expected} bytes")]
    PatchLengthMismatch {
        /// Absolute offset of the slot
        offset: u64,
        /// Slot length
        expected: usize,
        /// Patch length
        actual: usize,
    },

    /// A patch would extend past the end of the file
    #[error("Patch at byte {offset} ({len} bytes) exceeds file size {file_size}")]
    PatchOutOfBounds {
        /// Absolute offset of the patch
        offset: u64,
        /// Patch length
        len: usize,
        /// Current file size
        file_size: u64,
    },

    /// The written layout contradicts the reserved placeholder
    #[error("Invalid byte range: {0}")]
    InvalidByteRange(String),

    /// Referenced object not found in the object table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Circular reference detected in object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(crate::object::ObjectRef),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),
}

impl Error {
    /// Wrap an arbitrary signer failure.
    pub fn signer(err: impl Into<SignerError>) -> Self {
        Error::Signer(err.into())
    }
}
