//! AcroForm builder for the document-level form container.
//!
//! Implements the AcroForm dictionary per ISO 32000-1:2008 Section 12.7.2,
//! restricted to what a signed document needs: the /Fields array and the
//! /SigFlags entry.
//!
//! # Example
//!
//! ```
//! use pdf_seal::object::ObjectRef;
//! use pdf_seal::writer::AcroFormBuilder;
//!
//! let mut acroform = AcroFormBuilder::new().signatures_exist().append_only();
//! acroform.add_field(ObjectRef::new(12, 0));
//! let dict = acroform.build();
//! assert_eq!(dict["SigFlags"].as_integer(), Some(3));
//! ```

use crate::object::{Dictionary, Object, ObjectRef};

/// /SigFlags bit 1: the document contains at least one signature field.
pub const SIG_FLAG_SIGNATURES_EXIST: u32 = 1;

/// /SigFlags bit 2: the document must be saved with incremental updates only.
pub const SIG_FLAG_APPEND_ONLY: u32 = 2;

/// Builder for the document-level AcroForm dictionary.
#[derive(Debug, Clone, Default)]
pub struct AcroFormBuilder {
    /// Field object references
    fields: Vec<ObjectRef>,
    /// Signature flags
    sig_flags: Option<u32>,
}

impl AcroFormBuilder {
    /// Create a new AcroForm builder with no fields and no flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field reference.
    pub fn add_field(&mut self, field_ref: ObjectRef) {
        self.fields.push(field_ref);
    }

    /// Mark document as containing signatures.
    pub fn signatures_exist(mut self) -> Self {
        let flags = self.sig_flags.unwrap_or(0);
        self.sig_flags = Some(flags | SIG_FLAG_SIGNATURES_EXIST);
        self
    }

    /// Mark document as append-only (for signed documents).
    pub fn append_only(mut self) -> Self {
        let flags = self.sig_flags.unwrap_or(0);
        self.sig_flags = Some(flags | SIG_FLAG_APPEND_ONLY);
        self
    }

    /// Build the AcroForm dictionary.
    pub fn build(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        let fields: Vec<Object> = self.fields.iter().map(|r| Object::Reference(*r)).collect();
        dict.insert("Fields".to_string(), Object::Array(fields));

        if let Some(flags) = self.sig_flags {
            dict.insert("SigFlags".to_string(), Object::Integer(flags as i64));
        }

        dict
    }
}
