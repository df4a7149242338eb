/*!
 * Text Encoding
 * Byte-order-mark detection and UTF-16 decode/encode for text I/O
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// UTF-8 byte-order mark
pub const BOM_UTF8: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian byte-order mark
pub const BOM_UTF16LE: [u8; 2] = [0xFF, 0xFE];
/// UTF-16 big-endian byte-order mark
pub const BOM_UTF16BE: [u8; 2] = [0xFE, 0xFF];

/// Byte order for UTF-16 text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Text encodings recognized by byte-order-mark sniffing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Charset::Utf8 => write!(f, "utf-8"),
            Charset::Utf16Le => write!(f, "utf-16le"),
            Charset::Utf16Be => write!(f, "utf-16be"),
        }
    }
}

/// Sniff a byte-order mark
///
/// Returns the detected charset and the mark length to skip, or `None` when
/// no mark is present (callers then default to UTF-8).
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(Charset, usize)> {
    if bytes.starts_with(&BOM_UTF8) {
        Some((Charset::Utf8, BOM_UTF8.len()))
    } else if bytes.starts_with(&BOM_UTF16LE) {
        Some((Charset::Utf16Le, BOM_UTF16LE.len()))
    } else if bytes.starts_with(&BOM_UTF16BE) {
        Some((Charset::Utf16Be, BOM_UTF16BE.len()))
    } else {
        None
    }
}

/// Decode UTF-16 bytes of the given endianness
///
/// Invalid surrogates are replaced with U+FFFD; a trailing odd byte is
/// dropped.
#[must_use]
pub fn decode_utf16(bytes: &[u8], endian: Endian) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| match endian {
            Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
            Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Encode text as UTF-16 bytes of the given endianness
#[must_use]
pub fn encode_utf16(text: &str, endian: Endian) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        let pair = match endian {
            Endian::Little => unit.to_le_bytes(),
            Endian::Big => unit.to_be_bytes(),
        };
        bytes.extend_from_slice(&pair);
    }
    bytes
}

/// Decode bytes known to hold text of the given charset (no mark expected)
#[must_use]
pub fn decode(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Charset::Utf16Le => decode_utf16(bytes, Endian::Little),
        Charset::Utf16Be => decode_utf16(bytes, Endian::Big),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_detection() {
        assert_eq!(
            detect_bom(&[0xEF, 0xBB, 0xBF, b'h', b'i']),
            Some((Charset::Utf8, 3))
        );
        assert_eq!(
            detect_bom(&[0xFF, 0xFE, b'h', 0]),
            Some((Charset::Utf16Le, 2))
        );
        assert_eq!(
            detect_bom(&[0xFE, 0xFF, 0, b'h']),
            Some((Charset::Utf16Be, 2))
        );
        assert_eq!(detect_bom(b"hello"), None);
        assert_eq!(detect_bom(&[]), None);
    }

    #[test]
    fn test_utf16_round_trip() {
        let text = "héllo \u{1F600}";

        let le = encode_utf16(text, Endian::Little);
        assert_eq!(decode_utf16(&le, Endian::Little), text);

        let be = encode_utf16(text, Endian::Big);
        assert_eq!(decode_utf16(&be, Endian::Big), text);

        // Endianness actually matters for the byte layout
        assert_ne!(le, be);
    }

    #[test]
    fn test_utf16_odd_trailing_byte() {
        let mut bytes = encode_utf16("ab", Endian::Little);
        bytes.push(0x41);
        assert_eq!(decode_utf16(&bytes, Endian::Little), "ab");
    }

    #[test]
    fn test_decode_dispatch() {
        assert_eq!(decode(b"plain", Charset::Utf8), "plain");
        let le = encode_utf16("wide", Endian::Little);
        assert_eq!(decode(&le, Charset::Utf16Le), "wide");
    }
}
