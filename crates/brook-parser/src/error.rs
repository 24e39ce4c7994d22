use brook_encoding::EncodingError;

/// An `Error` type for everything that can abort a parse.
///
/// Every variant is fatal: the parser stops at the first well-formedness
/// violation and the handle refuses further input afterwards. There is no
/// recovery mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A grammar violation: an unexpected character, bad quoting, or one
    /// of the explicitly forbidden constructs (`<` in an attribute value,
    /// `]]>` in text, `--` in a comment, …).
    #[error("{0}")]
    Syntax(String),

    /// A word where one of a small set of keywords was required, e.g. a
    /// declaration in the internal subset that is none of `ELEMENT`,
    /// `ATTLIST`, `ENTITY`, `NOTATION`.
    #[error("unexpected keyword `{0}`")]
    UnknownToken(String),

    /// An entity reference the resolver could not supply a value for.
    /// Raised by the default resolver for everything that is not one of
    /// the five built-ins.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// A character reference naming a codepoint outside the XML `Char`
    /// production.
    #[error("character reference U+{0:04X} is not an XML character")]
    InvalidChar(u32),

    /// `parse` was called on a handle that already delivered `EndOfData`.
    #[error("the parser is finished")]
    Finished,

    /// Input ended (`finish = true`) before the four bytes needed for
    /// encoding autodetection arrived.
    #[error("at least four bytes are required to detect the encoding")]
    TooFew,

    /// The XML declaration named an encoding that is neither built in nor
    /// supplied by the unknown-encoding handler.
    #[error("unknown encoding `{0}`")]
    UnknownEncoding(String),

    /// Entity expansion outgrew the configured budget.
    #[error("entity expansion limit exceeded")]
    ExpansionLimit,

    /// The byte stream is malformed for the active encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
