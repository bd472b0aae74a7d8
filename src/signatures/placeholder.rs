//! Signature placeholder preparation.
//!
//! Adds the three objects a signed document needs to the object graph:
//!
//! - the signature dictionary, with a zero-filled /Contents of the reserved
//!   size and an empty /ByteRange that the writer turns into a fixed slot
//! - a widget annotation acting as the signature field, attached to the
//!   first page
//! - the /AcroForm dictionary listing the field, with /SigFlags 3
//!
//! Every lookup happens before the first object is allocated, so a failed
//! preparation leaves the document untouched.

use super::types::{PreparedSignature, SignOptions, SignatureBound};
use crate::document::PdfDocument;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::writer::{AcroFormBuilder, ObjectSerializer};
use chrono::{DateTime, FixedOffset, Local};

/// Annotation flags of the widget: Print (4) and Locked (128).
const WIDGET_FLAGS: i64 = 132;

/// Where the first page keeps its annotations.
enum AnnotsSlot {
    Missing,
    Inline,
    Indirect(ObjectRef),
}

/// Insert the signature dictionary, field widget and AcroForm into `document`.
///
/// Fails with [`Error::AlreadySigned`] when the catalog already has an
/// /AcroForm. The document is only mutated once all checks pass.
pub fn prepare(
    document: &mut PdfDocument,
    bound: SignatureBound,
    options: &SignOptions,
) -> Result<PreparedSignature> {
    if document.catalog()?.contains_key("AcroForm") {
        return Err(Error::AlreadySigned);
    }

    let page = document.first_page()?;
    let annots = annots_slot(document, page.reference())?;

    let record = document.add_object(Object::Dictionary(signature_dictionary(
        bound,
        options,
        Local::now().into(),
    )));

    let field = document.add_object(ObjectSerializer::dict(vec![
        ("Type", ObjectSerializer::name("Annot")),
        ("Subtype", ObjectSerializer::name("Widget")),
        ("FT", ObjectSerializer::name("Sig")),
        ("T", Object::String(options.field_name.as_bytes().to_vec())),
        ("Rect", options.rect.to_object()),
        ("F", Object::Integer(WIDGET_FLAGS)),
        ("P", Object::Reference(page.reference())),
        ("V", Object::Reference(record)),
    ]));

    match annots {
        AnnotsSlot::Missing => {
            document.dict_mut(page.reference())?.insert(
                "Annots".to_string(),
                Object::Array(vec![Object::Reference(field)]),
            );
        },
        AnnotsSlot::Inline => push_annot(document.dict_mut(page.reference())?, field)?,
        AnnotsSlot::Indirect(r) => document
            .get_mut(r)?
            .expect_array_mut()?
            .push(Object::Reference(field)),
    }

    let mut acroform = AcroFormBuilder::new().signatures_exist().append_only();
    acroform.add_field(field);
    let form = document.add_object(Object::Dictionary(acroform.build()));
    document
        .catalog_mut()?
        .insert("AcroForm".to_string(), Object::Reference(form));

    log::debug!(
        "prepared {:?} placeholder: record {}, field {}, form {}, {} bytes reserved",
        options.kind,
        record,
        field,
        form,
        bound.bytes()
    );

    Ok(PreparedSignature {
        record,
        field,
        form,
        page,
        kind: options.kind,
        bound,
    })
}

fn annots_slot(document: &PdfDocument, page: ObjectRef) -> Result<AnnotsSlot> {
    match document.dict(page)?.get("Annots") {
        None => Ok(AnnotsSlot::Missing),
        Some(Object::Array(_)) => Ok(AnnotsSlot::Inline),
        Some(Object::Reference(r)) => {
            document.get(*r)?.expect_array()?;
            Ok(AnnotsSlot::Indirect(*r))
        },
        Some(other) => Err(Error::InvalidObjectType {
            expected: "Array".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn push_annot(page: &mut Dictionary, field: ObjectRef) -> Result<()> {
    match page.get_mut("Annots") {
        Some(annots) => {
            annots.expect_array_mut()?.push(Object::Reference(field));
            Ok(())
        },
        None => Err(Error::InvalidPdf("Page lost its /Annots".to_string())),
    }
}

/// Build the signature dictionary for `options.kind`.
fn signature_dictionary(
    bound: SignatureBound,
    options: &SignOptions,
    signed_at: DateTime<FixedOffset>,
) -> Dictionary {
    let kind = options.kind;
    let mut dict = Dictionary::new();
    dict.insert("Type".to_string(), ObjectSerializer::name(kind.type_name()));
    dict.insert("Filter".to_string(), ObjectSerializer::name(kind.filter()));
    dict.insert(
        "SubFilter".to_string(),
        ObjectSerializer::name(kind.sub_filter().as_pdf_name()),
    );
    dict.insert("Contents".to_string(), Object::String(vec![0; bound.bytes()]));
    dict.insert("ByteRange".to_string(), Object::Array(Vec::new()));

    if kind.has_signing_time() {
        dict.insert(
            "M".to_string(),
            Object::String(format_pdf_date(&signed_at).into_bytes()),
        );

        let optional = [
            ("Name", &options.name),
            ("Reason", &options.reason),
            ("Location", &options.location),
            ("ContactInfo", &options.contact_info),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                dict.insert(key.to_string(), ObjectSerializer::string(value));
            }
        }
    }

    dict
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSS+hh'mm'`).
pub fn format_pdf_date(dt: &DateTime<FixedOffset>) -> String {
    let offset = dt.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.unsigned_abs();
    format!(
        "D:{}{}{:02}'{:02}'",
        dt.format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        offset % 3600 / 60
    )
}
