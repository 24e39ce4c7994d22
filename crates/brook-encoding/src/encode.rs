use crate::{Encoding, EncodingError};

pub(crate) fn encode(
    encoding: Encoding,
    c: char,
    out: &mut Vec<u8>,
) -> Result<(), EncodingError> {
    let unrepresentable = || EncodingError::Unrepresentable {
        codepoint: c as u32,
        encoding,
    };
    match encoding {
        Encoding::Utf8 => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        Encoding::Utf16Be => {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        Encoding::Utf16Le => {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        Encoding::Ucs4Be => out.extend_from_slice(&(c as u32).to_be_bytes()),
        Encoding::Ucs4Le => out.extend_from_slice(&(c as u32).to_le_bytes()),
        Encoding::Ascii => {
            if c.is_ascii() {
                out.push(c as u8);
            } else {
                return Err(unrepresentable());
            }
        }
        Encoding::Latin1 => {
            if (c as u32) < 0x100 {
                out.push(c as u8);
            } else {
                return Err(unrepresentable());
            }
        }
    }
    Ok(())
}
