use crate::Encoding;

/// An error raised while converting between bytes and codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A byte that cannot occur at this position in the active encoding.
    #[error("invalid byte 0x{byte:02X} for {encoding}")]
    InvalidByte { byte: u8, encoding: Encoding },

    /// A decoded unit that is not a Unicode scalar value (an unpaired
    /// surrogate, or a value past U+10FFFF).
    #[error("0x{0:X} is not a Unicode scalar value")]
    InvalidCodepoint(u32),

    /// A codepoint with no representation in the output encoding.
    #[error("U+{codepoint:04X} cannot be represented in {encoding}")]
    Unrepresentable { codepoint: u32, encoding: Encoding },

    /// The byte-pattern autodetector recognized an encoding this crate
    /// does not ship a decoder for.
    #[error("the detected encoding ({0}) is not supported")]
    Unsupported(&'static str),
}
