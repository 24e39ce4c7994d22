#![doc = include_str!("../README.md")]

mod decode;
mod detect;
mod encode;
mod error;

pub use crate::decode::{Decode, Decoder};
pub use crate::detect::{detect, Detected};
pub use crate::error::EncodingError;

use std::fmt;

/// A built-in character encoding.
///
/// `Utf16Be`/`Utf16Le` and `Ucs4Be`/`Ucs4Le` are distinct encodings but
/// members of the same *family*: an XML declaration saying `utf-16` agrees
/// with either byte order, because the byte order was already fixed by the
/// byte-order mark or the autodetection pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Be,
    Utf16Le,
    Ucs4Be,
    Ucs4Le,
    Ascii,
    Latin1,
}

impl Encoding {
    /// The canonical IANA-style label for this encoding.
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Ucs4Be => "UCS-4BE",
            Encoding::Ucs4Le => "UCS-4LE",
            Encoding::Ascii => "US-ASCII",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Look up an encoding by label, case-insensitively.
    ///
    /// Bare family labels resolve to the big-endian member; a stream whose
    /// byte order was detected differently stays on the detected decoder
    /// because the families [agree](Encoding::same_family).
    pub fn from_label(label: &str) -> Option<Encoding> {
        let folded = label.to_ascii_lowercase();
        match folded.as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "utf-16" | "utf16" => Some(Encoding::Utf16Be),
            "utf-16be" => Some(Encoding::Utf16Be),
            "utf-16le" => Some(Encoding::Utf16Le),
            "ucs-4" | "ucs4" | "iso-10646-ucs-4" => Some(Encoding::Ucs4Be),
            "ucs-4be" => Some(Encoding::Ucs4Be),
            "ucs-4le" => Some(Encoding::Ucs4Le),
            "us-ascii" | "ascii" => Some(Encoding::Ascii),
            "iso-8859-1" | "latin-1" | "latin1" | "iso8859-1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    /// Whether `self` and `other` are interchangeable declarations for one
    /// byte stream (equal, or byte-order variants of the same encoding).
    pub fn same_family(self, other: Encoding) -> bool {
        use Encoding::*;
        matches!(
            (self, other),
            (Utf16Be | Utf16Le, Utf16Be | Utf16Le) | (Ucs4Be | Ucs4Le, Ucs4Be | Ucs4Le)
        ) || self == other
    }

    /// Encode one codepoint into `out`.
    ///
    /// Fails with [`EncodingError::Unrepresentable`] when the codepoint has
    /// no representation in this encoding (non-ASCII in US-ASCII, anything
    /// past U+00FF in Latin-1).
    pub fn encode(self, c: char, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        encode::encode(self, c, out)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
