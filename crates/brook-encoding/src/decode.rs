use crate::{Encoding, EncodingError};

/// The decoder step contract.
///
/// One byte goes in; either the decoder needs more bytes (`Ok(None)`) or it
/// yields exactly one codepoint. A decoder never buffers a completed
/// codepoint, so the caller may stop feeding bytes between any two calls
/// and resume later, or hand the remaining bytes to a different decoder.
pub trait Decode {
    fn step(&mut self, byte: u8) -> Result<Option<char>, EncodingError>;
}

/// Incremental decoder for one of the built-in [`Encoding`]s.
#[derive(Debug, Clone)]
pub struct Decoder {
    encoding: Encoding,
    state: State,
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// At a codepoint boundary.
    Start,
    /// Inside a UTF-8 sequence. `min` is the smallest scalar value the
    /// sequence length may encode, used to reject overlong forms.
    Utf8Tail { value: u32, remaining: u8, min: u32 },
    /// Holding the first byte of a 16-bit unit.
    Utf16Half { first: u8, high: Option<u16> },
    /// Between units, holding a high surrogate that needs its pair.
    Utf16Pair { high: u16 },
    /// Partially assembled 32-bit codepoint.
    Ucs4Partial { value: u32, seen: u8 },
}

impl Decoder {
    pub fn new(encoding: Encoding) -> Decoder {
        Decoder {
            encoding,
            state: State::Start,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn invalid(&self, byte: u8) -> EncodingError {
        EncodingError::InvalidByte {
            byte,
            encoding: self.encoding,
        }
    }

    fn utf8_start(&mut self, byte: u8) -> Result<Option<char>, EncodingError> {
        match byte {
            0x00..=0x7F => Ok(Some(byte as char)),
            0xC2..=0xDF => {
                self.state = State::Utf8Tail {
                    value: u32::from(byte & 0x1F),
                    remaining: 1,
                    min: 0x80,
                };
                Ok(None)
            }
            0xE0..=0xEF => {
                self.state = State::Utf8Tail {
                    value: u32::from(byte & 0x0F),
                    remaining: 2,
                    min: 0x800,
                };
                Ok(None)
            }
            0xF0..=0xF4 => {
                self.state = State::Utf8Tail {
                    value: u32::from(byte & 0x07),
                    remaining: 3,
                    min: 0x1_0000,
                };
                Ok(None)
            }
            // Stray continuation bytes, 0xC0/0xC1 overlong lead bytes, and
            // lead bytes for sequences past U+10FFFF.
            _ => Err(self.invalid(byte)),
        }
    }

    fn utf8_tail(
        &mut self,
        byte: u8,
        value: u32,
        remaining: u8,
        min: u32,
    ) -> Result<Option<char>, EncodingError> {
        if byte & 0xC0 != 0x80 {
            return Err(self.invalid(byte));
        }
        let value = (value << 6) | u32::from(byte & 0x3F);
        if remaining > 1 {
            self.state = State::Utf8Tail {
                value,
                remaining: remaining - 1,
                min,
            };
            return Ok(None);
        }
        self.state = State::Start;
        if value < min {
            return Err(EncodingError::InvalidCodepoint(value));
        }
        scalar(value).map(Some)
    }

    fn utf16_unit(&mut self, unit: u16, high: Option<u16>) -> Result<Option<char>, EncodingError> {
        self.state = State::Start;
        match (high, unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let value =
                    0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                scalar(value).map(Some)
            }
            (Some(_), _) | (None, 0xDC00..=0xDFFF) => {
                Err(EncodingError::InvalidCodepoint(u32::from(unit)))
            }
            (None, 0xD800..=0xDBFF) => {
                self.state = State::Utf16Pair { high: unit };
                Ok(None)
            }
            (None, _) => scalar(u32::from(unit)).map(Some),
        }
    }
}

impl Decode for Decoder {
    fn step(&mut self, byte: u8) -> Result<Option<char>, EncodingError> {
        match (self.state, self.encoding) {
            (State::Start, Encoding::Ascii) => {
                if byte < 0x80 {
                    Ok(Some(byte as char))
                } else {
                    Err(self.invalid(byte))
                }
            }
            (State::Start, Encoding::Latin1) => Ok(Some(char::from(byte))),
            (State::Start, Encoding::Utf8) => self.utf8_start(byte),
            (
                State::Utf8Tail {
                    value,
                    remaining,
                    min,
                },
                _,
            ) => self.utf8_tail(byte, value, remaining, min),
            (State::Start, Encoding::Utf16Be | Encoding::Utf16Le) => {
                self.state = State::Utf16Half {
                    first: byte,
                    high: None,
                };
                Ok(None)
            }
            (State::Utf16Pair { high }, _) => {
                self.state = State::Utf16Half {
                    first: byte,
                    high: Some(high),
                };
                Ok(None)
            }
            (State::Utf16Half { first, high }, encoding) => {
                let unit = if encoding == Encoding::Utf16Be {
                    u16::from_be_bytes([first, byte])
                } else {
                    u16::from_le_bytes([first, byte])
                };
                self.utf16_unit(unit, high)
            }
            (State::Start, Encoding::Ucs4Be | Encoding::Ucs4Le) => {
                self.state = State::Ucs4Partial {
                    value: u32::from(byte),
                    seen: 1,
                };
                Ok(None)
            }
            (State::Ucs4Partial { value, seen }, encoding) => {
                let value = if encoding == Encoding::Ucs4Be {
                    (value << 8) | u32::from(byte)
                } else {
                    value | (u32::from(byte) << (8 * seen))
                };
                if seen < 3 {
                    self.state = State::Ucs4Partial {
                        value,
                        seen: seen + 1,
                    };
                    Ok(None)
                } else {
                    self.state = State::Start;
                    scalar(value).map(Some)
                }
            }
        }
    }
}

fn scalar(value: u32) -> Result<char, EncodingError> {
    char::from_u32(value).ok_or(EncodingError::InvalidCodepoint(value))
}
