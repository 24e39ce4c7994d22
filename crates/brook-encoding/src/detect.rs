use crate::{Encoding, EncodingError};

/// The result of encoding autodetection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub encoding: Encoding,
    /// How many leading bytes belong to a byte-order mark and must be
    /// skipped before decoding.
    pub bom_len: usize,
}

/// Guess the encoding of a document from its first four bytes.
///
/// This is the standard XML detection procedure: a byte-order mark wins,
/// otherwise the byte pattern of a leading `<?xml` is matched against each
/// encoding's representation of `<`. Documents that start with neither are
/// assumed to be UTF-8, which the encoding declaration may later revise.
pub fn detect(prefix: [u8; 4]) -> Result<Detected, EncodingError> {
    let detected = |encoding, bom_len| Ok(Detected { encoding, bom_len });
    match prefix {
        [0x00, 0x00, 0xFE, 0xFF] => detected(Encoding::Ucs4Be, 4),
        [0xFF, 0xFE, 0x00, 0x00] => detected(Encoding::Ucs4Le, 4),
        [0xFE, 0xFF, _, _] => detected(Encoding::Utf16Be, 2),
        [0xFF, 0xFE, _, _] => detected(Encoding::Utf16Le, 2),
        [0xEF, 0xBB, 0xBF, _] => detected(Encoding::Utf8, 3),
        [0x00, 0x00, 0x00, 0x3C] => detected(Encoding::Ucs4Be, 0),
        [0x3C, 0x00, 0x00, 0x00] => detected(Encoding::Ucs4Le, 0),
        [0x00, 0x3C, 0x00, 0x3F] => detected(Encoding::Utf16Be, 0),
        [0x3C, 0x00, 0x3F, 0x00] => detected(Encoding::Utf16Le, 0),
        [0x4C, 0x6F, 0xA7, 0x94] => Err(EncodingError::Unsupported("EBCDIC")),
        _ => detected(Encoding::Utf8, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bom_patterns() {
        assert_eq!(
            detect([0xEF, 0xBB, 0xBF, b'<']),
            Ok(Detected {
                encoding: Encoding::Utf8,
                bom_len: 3
            })
        );
        assert_eq!(
            detect([0xFE, 0xFF, 0x00, b'<']),
            Ok(Detected {
                encoding: Encoding::Utf16Be,
                bom_len: 2
            })
        );
        assert_eq!(
            detect([0xFF, 0xFE, b'<', 0x00]),
            Ok(Detected {
                encoding: Encoding::Utf16Le,
                bom_len: 2
            })
        );
        // The UCS-4 little-endian BOM shadows the UTF-16 one.
        assert_eq!(
            detect([0xFF, 0xFE, 0x00, 0x00]),
            Ok(Detected {
                encoding: Encoding::Ucs4Le,
                bom_len: 4
            })
        );
    }

    #[test]
    fn angle_bracket_patterns() {
        assert_eq!(detect(*b"<?xm").map(|d| d.encoding), Ok(Encoding::Utf8));
        assert_eq!(
            detect([0x00, b'<', 0x00, b'?']).map(|d| d.encoding),
            Ok(Encoding::Utf16Be)
        );
        assert_eq!(
            detect([b'<', 0x00, b'?', 0x00]).map(|d| d.encoding),
            Ok(Encoding::Utf16Le)
        );
        assert_eq!(
            detect([0x00, 0x00, 0x00, b'<']).map(|d| d.encoding),
            Ok(Encoding::Ucs4Be)
        );
    }

    #[test]
    fn fallback_and_ebcdic() {
        assert_eq!(detect(*b"<doc").map(|d| d.encoding), Ok(Encoding::Utf8));
        assert_eq!(
            detect([0x4C, 0x6F, 0xA7, 0x94]),
            Err(EncodingError::Unsupported("EBCDIC"))
        );
    }
}
