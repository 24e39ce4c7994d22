use crate::dtd::Dtd;

/// A discrete lexical event pulled from the document.
///
/// The stream of productions is a linearization of document order; nesting
/// is expressed only through paired `StartElement`/`EndElement` events,
/// and checking that they nest correctly is the consumer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production {
    /// `<name …>`. Attributes are in source order; duplicates are
    /// lexically possible and passed through undeduplicated.
    StartElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// `<name …/>`.
    EmptyElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// `</name>`.
    EndElement { name: String },
    /// A run of character data with at least one non-whitespace
    /// codepoint. References are already expanded and line endings
    /// normalized.
    ///
    /// A run suspended by [`EndOfBuffer`](Production::EndOfBuffer) is
    /// emitted in parts: consumers that need the whole run must coalesce
    /// adjacent `Text` events themselves.
    Text(String),
    /// A run of character data that is entirely XML whitespace.
    Whitespace(String),
    /// The contents of a `<![CDATA[…]]>` section, also emitted in parts
    /// when suspended.
    Cdata(String),
    /// `<?target data?>`.
    Pi { target: String, data: String },
    /// `<!--text-->`.
    Comment(String),
    /// The document type declaration, internal subset included.
    Doctype(Dtd),
    /// The buffered input is exhausted; feed more bytes and call `parse`
    /// again to resume exactly where the grammar stopped.
    EndOfBuffer,
    /// The document ended. The handle refuses further `parse` calls.
    EndOfData,
}
