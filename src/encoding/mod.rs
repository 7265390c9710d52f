//! Encoding detection and transcoding.
//!
//! Source documents are decoded to UTF-8 before parsing:
//!
//! 1. A Byte Order Mark, if present, picks the initial encoding and is
//!    dropped. Without one the input is taken as UTF-8.
//! 2. The XML declaration is read with the [`scan_declaration`]
//!    pseudo-attribute scanner. A declared encoding other than the initial
//!    one wins, except that a bare `UTF-16` defers to the BOM's byte order.
//! 3. The content is decoded with `encoding_rs`. Malformed input is an
//!    error, never replaced.
//!
//! The writer side uses [`output_encoding`] to pick an encoder for the
//! encoding named by a `start.doc` command.

mod decl;

pub use decl::{declared_encoding, scan_declaration, DeclError};

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Splits a Byte Order Mark off the input, returning the encoding it names
/// and the remaining bytes.
///
/// ```
/// use xmlscript::encoding::sniff_bom;
///
/// let (encoding, rest) = sniff_bom(b"\xEF\xBB\xBF<r/>");
/// assert_eq!(encoding.map(|e| e.name()), Some("UTF-8"));
/// assert_eq!(rest, b"<r/>");
/// assert_eq!(sniff_bom(b"<r/>").0, None);
/// ```
#[must_use]
pub fn sniff_bom(bytes: &[u8]) -> (Option<&'static Encoding>, &[u8]) {
    match Encoding::for_bom(bytes) {
        Some((encoding, len)) => (Some(encoding), &bytes[len..]),
        None => (None, bytes),
    }
}

fn lookup(label: &str) -> Result<&'static Encoding, EncodingError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, EncodingError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            EncodingError::new(format!(
                "malformed byte sequence for encoding {}",
                encoding.name()
            ))
        })
}

/// Decodes raw XML bytes into a UTF-8 string, detecting the encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes contain invalid sequences for the
/// detected encoding, the declared encoding is unsupported, or the XML
/// declaration cannot be scanned.
///
/// # Examples
///
/// ```
/// use xmlscript::encoding::decode_to_utf8;
///
/// let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><p>caf\xE9</p>";
/// assert_eq!(decode_to_utf8(xml).unwrap(), "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><p>caf\u{e9}</p>");
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom, content) = sniff_bom(bytes);
    let initial = bom.unwrap_or(UTF_8);

    // Only a UTF-16 BOM hides the declaration from a byte-level scan.
    let first_pass = if initial == UTF_8 {
        None
    } else {
        Some(decode_strict(initial, content)?)
    };
    let scanned = first_pass.as_deref().map_or(content, str::as_bytes);
    let declared = declared_encoding(scanned)
        .map_err(|e| EncodingError::new(format!("bad XML declaration: {e}")))?;

    let target = match declared.as_deref() {
        None => initial,
        Some("UTF-16") if initial != UTF_8 => initial,
        Some(label) => lookup(label)?,
    };
    match first_pass {
        Some(text) if target == initial => Ok(text),
        _ => decode_strict(target, content),
    }
}

/// Looks up an encoder for document output.
///
/// `encoding_rs` only encodes ASCII-compatible encodings, so UTF-16
/// labels (and the replacement encoding) are rejected rather than silently
/// written as UTF-8.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or cannot be encoded.
pub fn output_encoding(label: &str) -> Result<&'static Encoding, EncodingError> {
    let encoding = lookup(label)?;
    if encoding.output_encoding() != encoding {
        return Err(EncodingError::new(format!(
            "cannot write output in encoding {label}"
        )));
    }
    Ok(encoding)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utf16(text: &str, bom: [u8; 2], unit: fn(u16) -> [u8; 2]) -> Vec<u8> {
        let mut bytes = bom.to_vec();
        for u in text.encode_utf16() {
            bytes.extend_from_slice(&unit(u));
        }
        bytes
    }

    #[test]
    fn test_sniff_utf16_boms() {
        let (le, rest) = sniff_bom(b"\xFF\xFE<\x00");
        assert_eq!(le.map(Encoding::name), Some("UTF-16LE"));
        assert_eq!(rest, b"<\x00");
        let (be, _) = sniff_bom(b"\xFE\xFF\x00<");
        assert_eq!(be.map(Encoding::name), Some("UTF-16BE"));
        assert_eq!(sniff_bom(b"\xEF").0, None);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF<?xml version=\"1.0\"?><root/>";
        assert_eq!(decode_to_utf8(bytes).unwrap(), "<?xml version=\"1.0\"?><root/>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><root>caf\xE9</root>";
        let result = decode_to_utf8(bytes).unwrap();
        assert!(result.ends_with("<root>caf\u{e9}</root>"));
    }

    #[test]
    fn test_decode_utf16_either_order() {
        let text = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><r>\u{e9}</r>";
        let le = utf16(text, [0xFF, 0xFE], u16::to_le_bytes);
        let be = utf16(text, [0xFE, 0xFF], u16::to_be_bytes);
        assert_eq!(decode_to_utf8(&le).unwrap(), text);
        assert_eq!(decode_to_utf8(&be).unwrap(), text);
    }

    #[test]
    fn test_decode_failures() {
        assert!(decode_to_utf8(&[0x80, 0x81, 0x82]).is_err());

        let err = decode_to_utf8(b"<?xml version=1.0?><a/>").unwrap_err();
        assert!(err.message.contains("bad XML declaration"));

        let err = decode_to_utf8(b"<?xml version=\"1.0\" encoding=\"X-NOPE\"?><a/>").unwrap_err();
        assert!(err.message.contains("unsupported encoding"));
    }

    #[test]
    fn test_output_encoding() {
        assert_eq!(output_encoding("latin1").unwrap().name(), "windows-1252");
        assert_eq!(output_encoding("utf-8").unwrap().name(), "UTF-8");
        assert!(output_encoding("UTF-16").is_err());
        assert!(output_encoding("EBCDIC-9000").is_err());
    }
}
