//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! PDF specification ISO 32000-1:2008.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::HashMap;
use std::io::Write;

/// Positions of the two reserved slots inside a serialized signature dictionary.
///
/// Offsets are relative to the start of the buffer returned by
/// [`ObjectSerializer::serialize_signature_indirect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureSlots {
    /// Offset of the `[` opening the reserved /ByteRange slot
    pub byte_range: usize,
    /// Offset of the `<` opening the /Contents hex string
    pub contents: usize,
}

/// Serializer for PDF objects.
///
/// Converts PDF Object types to their byte representation following
/// the PDF specification syntax rules.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Whether to use compact formatting (minimal whitespace)
    compact: bool,
}

impl ObjectSerializer {
    /// Create a new object serializer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact serializer (minimal whitespace).
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)?;
        Ok(buf)
    }

    /// Serialize an object to a string (for debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> std::io::Result<String> {
        Ok(String::from_utf8_lossy(&self.serialize(obj)?).to_string())
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} {gen} obj\n{object}\nendobj\n`
    pub fn serialize_indirect(&self, id: u32, gen: u16, obj: &Object) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        writeln!(buf, "{} {} obj", id, gen)?;
        self.write_object(&mut buf, obj)?;
        write!(buf, "\nendobj\n")?;
        Ok(buf)
    }

    /// Serialize the signature dictionary as an indirect object, reserving its slots.
    ///
    /// /ByteRange is written as `[`, padding spaces and `]`, exactly
    /// `byte_range_width` bytes wide, regardless of its current value.
    /// /Contents must be a string and is always written in hex form so its
    /// width is `2 * len + 2`. All other entries serialize normally.
    pub fn serialize_signature_indirect(
        &self,
        id: u32,
        gen: u16,
        dict: &Dictionary,
        byte_range_width: usize,
    ) -> Result<(Vec<u8>, SignatureSlots)> {
        if byte_range_width < 2 {
            return Err(Error::InvalidByteRange(format!(
                "slot width {} cannot hold the brackets",
                byte_range_width
            )));
        }
        let contents = dict
            .get("Contents")
            .ok_or_else(|| Error::InvalidPdf("Signature dictionary missing /Contents".to_string()))?
            .as_string()
            .ok_or_else(|| Error::InvalidObjectType {
                expected: "String".to_string(),
                found: dict["Contents"].type_name().to_string(),
            })?;
        if !dict.contains_key("ByteRange") {
            return Err(Error::InvalidPdf("Signature dictionary missing /ByteRange".to_string()));
        }

        let mut buf = Vec::new();
        let mut byte_range = 0;
        let mut contents_at = 0;

        writeln!(buf, "{} {} obj", id, gen)?;
        write!(buf, "<<")?;

        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();

        for key in keys {
            if !self.compact {
                write!(buf, "\n  ")?;
            }
            self.write_name(&mut buf, key)?;
            write!(buf, " ")?;
            match key.as_str() {
                "ByteRange" => {
                    byte_range = buf.len();
                    buf.push(b'[');
                    buf.resize(buf.len() + byte_range_width - 2, b' ');
                    buf.push(b']');
                },
                "Contents" => {
                    contents_at = buf.len();
                    self.write_hex_string(&mut buf, contents)?;
                },
                _ => self.write_object(&mut buf, &dict[key.as_str()])?,
            }
        }

        if !self.compact {
            writeln!(buf)?;
        }
        write!(buf, ">>\nendobj\n")?;

        Ok((
            buf,
            SignatureSlots {
                byte_range,
                contents: contents_at,
            },
        ))
    }

    /// Write an object to a buffer.
    fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> std::io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => self.write_real(w, *r),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n),
            Object::Array(arr) => self.write_array(w, arr),
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => self.write_stream(w, dict, data),
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
        }
    }

    /// Write a real number with appropriate precision.
    ///
    /// PDF has no syntax for NaN or infinities; they are written as `0`.
    fn write_real<W: Write>(&self, w: &mut W, value: f64) -> std::io::Result<()> {
        if !value.is_finite() {
            write!(w, "0")
        } else if value.fract() == 0.0 {
            write!(w, "{}", value as i64)
        } else {
            let formatted = format!("{:.5}", value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            write!(w, "{}", trimmed)
        }
    }

    /// Write a PDF string.
    ///
    /// Uses literal string syntax `(...)` with proper escaping,
    /// or hex string syntax `<...>` for binary data.
    fn write_string<W: Write>(&self, w: &mut W, data: &[u8]) -> std::io::Result<()> {
        let is_printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

        if !is_printable {
            return self.write_hex_string(w, data);
        }

        write!(w, "(")?;
        for &byte in data {
            match byte {
                b'(' => write!(w, "\\(")?,
                b')' => write!(w, "\\)")?,
                b'\\' => write!(w, "\\\\")?,
                b'\n' => write!(w, "\\n")?,
                b'\r' => write!(w, "\\r")?,
                b'\t' => write!(w, "\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        write!(w, ")")
    }

    /// Write a hex string `<...>`, two uppercase digits per byte.
    fn write_hex_string<W: Write>(&self, w: &mut W, data: &[u8]) -> std::io::Result<()> {
        write!(w, "<")?;
        w.write_all(hex_upper(data).as_bytes())?;
        write!(w, ">")
    }

    /// Write a PDF name.
    ///
    /// Names start with `/`. Delimiters, `#`, whitespace and bytes outside
    /// the printable ASCII range are escaped as `#xx`.
    fn write_name<W: Write>(&self, w: &mut W, name: &str) -> std::io::Result<()> {
        write!(w, "/")?;
        for byte in name.bytes() {
            match byte {
                b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#' => {
                    write!(w, "#{:02X}", byte)?;
                },
                b'!'..=b'~' => w.write_all(&[byte])?,
                _ => write!(w, "#{:02X}", byte)?,
            }
        }
        Ok(())
    }

    /// Write a PDF array.
    fn write_array<W: Write>(&self, w: &mut W, arr: &[Object]) -> std::io::Result<()> {
        write!(w, "[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_object(w, obj)?;
        }
        write!(w, "]")
    }

    /// Write a PDF dictionary.
    fn write_dictionary<W: Write>(
        &self,
        w: &mut W,
        dict: &HashMap<String, Object>,
    ) -> std::io::Result<()> {
        write!(w, "<<")?;

        // Sort keys for deterministic output
        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();

        for key in keys {
            if let Some(value) = dict.get(key) {
                if !self.compact {
                    write!(w, "\n  ")?;
                }
                self.write_name(w, key)?;
                write!(w, " ")?;
                self.write_object(w, value)?;
            }
        }

        if !self.compact && !dict.is_empty() {
            writeln!(w)?;
        }
        write!(w, ">>")
    }

    /// Write a PDF stream.
    fn write_stream<W: Write>(
        &self,
        w: &mut W,
        dict: &HashMap<String, Object>,
        data: &[u8],
    ) -> std::io::Result<()> {
        let mut dict_with_length = dict.clone();
        dict_with_length.insert("Length".to_string(), Object::Integer(data.len() as i64));

        self.write_dictionary(w, &dict_with_length)?;
        write!(w, "\nstream\n")?;
        w.write_all(data)?;
        write!(w, "\nendstream")
    }
}

/// Helper functions for building PDF objects.
impl ObjectSerializer {
    /// Create a Name object.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// Create a String object from a Rust string.
    pub fn string(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }

    /// Create an Integer object.
    pub fn integer(i: i64) -> Object {
        Object::Integer(i)
    }

    /// Create an Array object.
    pub fn array(items: Vec<Object>) -> Object {
        Object::Array(items)
    }

    /// Create a Dictionary object.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        let map: HashMap<String, Object> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Object::Dictionary(map)
    }

    /// Create a Reference object.
    pub fn reference(id: u32, gen: u16) -> Object {
        Object::Reference(ObjectRef::new(id, gen))
    }

    /// Create a rectangle array [x, y, width, height] -> [llx, lly, urx, ury].
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Object {
        Object::Array(vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(x + width),
            Object::Real(y + height),
        ])
    }
}

/// Encode bytes as an uppercase hex string.
pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8] = b"0123456789ABCDEF";
    let mut hex = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
        hex.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(s: &ObjectSerializer, obj: &Object) -> String {
        s.serialize_to_string(obj).unwrap()
    }

    #[test]
    fn test_serialize_scalars() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::Null), "null");
        assert_eq!(to_string(&s, &Object::Boolean(true)), "true");
        assert_eq!(to_string(&s, &Object::Integer(-123)), "-123");
    }

    #[test]
    fn test_serialize_real() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::Real(3.14258)), "3.14258");
        assert_eq!(to_string(&s, &Object::Real(1.0)), "1");
        assert_eq!(to_string(&s, &Object::Real(0.5)), "0.5");
    }

    #[test]
    fn test_serialize_string() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::String(b"Hello".to_vec())), "(Hello)");
        assert_eq!(
            to_string(&s, &Object::String(b"Test (parens)".to_vec())),
            "(Test \\(parens\\))"
        );
    }

    #[test]
    fn test_serialize_hex_string() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::String(vec![0x00, 0xFF, 0x80])), "<00FF80>");
    }

    #[test]
    fn test_serialize_name_with_special_chars() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::Name("Adobe.PPKLite".to_string())), "/Adobe.PPKLite");
        assert_eq!(
            to_string(&s, &Object::Name("Name With Space".to_string())),
            "/Name#20With#20Space"
        );
        assert_eq!(to_string(&s, &Object::Name("A%B".to_string())), "/A#25B");
        assert_eq!(to_string(&s, &Object::Name("F(1)".to_string())), "/F#281#29");
        assert_eq!(to_string(&s, &Object::Name("a#b/c".to_string())), "/a#23b#2Fc");
    }

    #[test]
    fn test_name_delimiters_keep_dictionary_intact() {
        let s = ObjectSerializer::compact();
        let dict = ObjectSerializer::dict(vec![
            ("BaseFont", ObjectSerializer::name("A%B")),
            ("Type", ObjectSerializer::name("Font")),
        ]);
        assert_eq!(to_string(&s, &dict), "<</BaseFont /A#25B/Type /Font>>");
    }

    #[test]
    fn test_serialize_non_finite_real() {
        let s = ObjectSerializer::new();
        assert_eq!(to_string(&s, &Object::Real(f64::NAN)), "0");
        assert_eq!(to_string(&s, &Object::Real(f64::INFINITY)), "0");
        assert_eq!(to_string(&s, &Object::Real(f64::NEG_INFINITY)), "0");
    }

    #[test]
    fn test_serialize_dictionary() {
        let s = ObjectSerializer::compact();
        let dict = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Page")),
            ("Count", ObjectSerializer::integer(1)),
        ]);
        assert_eq!(to_string(&s, &dict), "<</Count 1/Type /Page>>");
    }

    #[test]
    fn test_serialize_stream_sets_length() {
        let s = ObjectSerializer::compact();
        let mut dict = HashMap::new();
        dict.insert("Length".to_string(), Object::Integer(999));
        let stream = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"stream data"),
        };

        let result = to_string(&s, &stream);
        assert!(result.contains("/Length 11"));
        assert!(result.contains("stream\nstream data\nendstream"));
    }

    #[test]
    fn test_serialize_indirect() {
        let s = ObjectSerializer::new();
        let bytes = s.serialize_indirect(1, 0, &Object::Integer(42)).unwrap();
        assert_eq!(String::from_utf8_lossy(&bytes), "1 0 obj\n42\nendobj\n");
    }

    #[test]
    fn test_serialize_signature_reserves_slots() {
        let s = ObjectSerializer::compact();
        let dict = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Sig")),
            ("Contents", Object::String(vec![0; 4])),
            ("ByteRange", Object::Array(vec![])),
        ]);
        let Object::Dictionary(dict) = dict else {
            unreachable!()
        };

        let (bytes, slots) = s.serialize_signature_indirect(7, 0, &dict, 12).unwrap();
        assert_eq!(&bytes[slots.byte_range..slots.byte_range + 12], b"[          ]");
        assert_eq!(&bytes[slots.contents..slots.contents + 10], b"<00000000>");
        assert!(String::from_utf8_lossy(&bytes).starts_with("7 0 obj\n<</ByteRange ["));
    }

    #[test]
    fn test_serialize_signature_requires_contents() {
        let s = ObjectSerializer::compact();
        let mut dict = HashMap::new();
        dict.insert("ByteRange".to_string(), Object::Array(vec![]));
        assert!(s.serialize_signature_indirect(1, 0, &dict, 60).is_err());
    }

    #[test]
    fn test_rect_helper() {
        let rect = ObjectSerializer::rect(0.0, 0.0, 612.0, 792.0);
        let s = ObjectSerializer::compact();
        assert_eq!(to_string(&s, &rect), "[0 0 612 792]");
    }

    #[test]
    fn test_hex_upper() {
        assert_eq!(hex_upper(&[0x30, 0x82, 0xAB]), "3082AB");
        assert_eq!(hex_upper(&[]), "");
    }
}
