use brook_encoding::{detect, Decode, Decoder, Encoding};

use crate::lexer::{Input, LexCtx, Lexer, Outcome};
use crate::limit::LimitTracker;
use crate::normalize::{Normalized, Normalizer};
use crate::{Error, Production};

/// Resolves a non-built-in entity reference to its replacement text. The
/// returned string is inlined verbatim, without re-lexing; recursive
/// entities are the resolver's problem, bounded only by
/// [`Parser::expansion_limit`].
pub type EntityResolver = Box<dyn FnMut(&str) -> Result<String, Error>>;

/// Supplies a decoder for an encoding label the built-in set does not
/// cover. Returning `None` rejects the label.
pub type UnknownEncodingHandler = Box<dyn FnMut(&str) -> Option<Box<dyn Decode>>>;

/// Parse XML from a byte stream fed in arbitrarily sized chunks.
///
/// Each `parse` call appends its chunk and drives the machine until one
/// [`Production`] comes out. When the buffered bytes run out mid-document
/// the parser suspends with [`Production::EndOfBuffer`], and the next call
/// resumes at the exact byte where it stopped. Passing `finish = true`
/// marks the end of input; once the final production has been delivered
/// the stream terminates with [`Production::EndOfData`].
///
/// ## Example
///
/// ```rust
/// use brook_parser::{Parser, Production};
///
/// let mut parser = Parser::new();
/// let token = parser.parse(b"<greeting>hi</greeting>", true).unwrap();
/// assert_eq!(
///     token,
///     Production::StartElement {
///         name: "greeting".into(),
///         attributes: vec![],
///     }
/// );
/// assert_eq!(parser.parse(&[], false).unwrap(), Production::Text("hi".into()));
/// ```
///
/// The input encoding is autodetected from the first four bytes unless
/// [`Parser::encoding`] picked one, and may be revised once by the XML
/// declaration's `encoding` pseudo-attribute.
pub struct Parser {
    buffer: Vec<u8>,
    pos: usize,
    finish: bool,
    finished: bool,

    /// Encoding forced at construction; `None` means autodetect.
    requested: Option<Encoding>,
    decoder: Option<Box<dyn Decode>>,
    /// The built-in encoding behind `decoder`, `None` for handler-supplied
    /// decoders.
    active: Option<Encoding>,
    encoding_name: String,
    /// A byte-order mark surviving as U+FEFF is dropped once, at stream
    /// start.
    bom_checked: bool,

    normalizer: Normalizer,
    /// The second half of a two-codepoint normalizer step, parked when the
    /// first half already produced a token.
    pending: Option<char>,
    lexer: Lexer,

    output: Encoding,
    entity_resolver: Option<EntityResolver>,
    unknown_encoding: Option<UnknownEncodingHandler>,
    expansion: LimitTracker,
}

impl Parser {
    /// Create a new instance of `Parser`: empty buffer, prolog state,
    /// encoding autodetection, UTF-8 output encoding.
    pub fn new() -> Parser {
        Parser {
            buffer: Vec::new(),
            pos: 0,
            finish: false,
            finished: false,
            requested: None,
            decoder: None,
            active: None,
            encoding_name: String::new(),
            bom_checked: false,
            normalizer: Normalizer::default(),
            pending: None,
            lexer: Lexer::new(),
            output: Encoding::Utf8,
            entity_resolver: None,
            unknown_encoding: None,
            expansion: LimitTracker::default(),
        }
    }

    /// Skip autodetection and decode the input as `encoding`.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.requested = Some(encoding);
        self
    }

    /// Configure the encoding events are written back out in. The parser
    /// itself never consults this; it is carried for the serializer.
    pub fn output_encoding(mut self, encoding: Encoding) -> Self {
        self.output = encoding;
        self
    }

    /// Configure the resolver called for entity references other than the
    /// five built-ins. Without one, any such reference fails the parse
    /// with [`Error::UnknownEntity`].
    pub fn entity_resolver(
        mut self,
        resolver: impl FnMut(&str) -> Result<String, Error> + 'static,
    ) -> Self {
        self.entity_resolver = Some(Box::new(resolver));
        self
    }

    /// Configure the handler consulted when the XML declaration names an
    /// encoding outside the built-in set.
    pub fn unknown_encoding_handler(
        mut self,
        handler: impl FnMut(&str) -> Option<Box<dyn Decode>> + 'static,
    ) -> Self {
        self.unknown_encoding = Some(Box::new(handler));
        self
    }

    /// Configure the limit on text inlined by the entity resolver. If a
    /// document expands past it, parsing aborts with
    /// [`Error::ExpansionLimit`].
    ///
    /// By default, there is no limit.
    pub fn expansion_limit(mut self, limit: usize) -> Self {
        self.expansion = LimitTracker::new(limit);
        self
    }

    /// Replace the entity resolver mid-stream.
    pub fn set_entity_resolver(
        &mut self,
        resolver: impl FnMut(&str) -> Result<String, Error> + 'static,
    ) {
        self.entity_resolver = Some(Box::new(resolver));
    }

    /// False once `EndOfData` has been delivered.
    pub fn is_parsing(&self) -> bool {
        !self.finished
    }

    /// The label of the encoding currently decoding the input; empty
    /// until detection has seen the first four bytes.
    pub fn encoding_name(&self) -> &str {
        &self.encoding_name
    }

    /// The configured output encoding.
    pub fn output(&self) -> Encoding {
        self.output
    }

    /// Expansion-budget utilization so far.
    pub fn expansion_usage(&self) -> LimitTracker {
        self.expansion
    }

    /// The buffered bytes not yet consumed, for handing the remainder of
    /// a stream to another consumer.
    pub fn rest_buffer(&self) -> &[u8] {
        &self.buffer[self.pos..]
    }

    /// Append `chunk`, absorb `finish`, and pull the next production.
    pub fn parse(&mut self, chunk: &[u8], finish: bool) -> Result<Production, Error> {
        if self.finished {
            return Err(Error::Finished);
        }
        if !chunk.is_empty() {
            if self.pos > 0 {
                self.buffer.drain(..self.pos);
                self.pos = 0;
            }
            self.buffer.extend_from_slice(chunk);
        }
        if finish {
            self.finish = true;
        }
        self.drive()
    }

    /// Return to the prolog state, keeping the requested encoding, the
    /// output encoding and the callbacks. The buffer is cleared.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pos = 0;
        self.finish = false;
        self.finished = false;
        self.decoder = None;
        self.active = None;
        self.encoding_name.clear();
        self.bom_checked = false;
        self.normalizer = Normalizer::default();
        self.pending = None;
        self.lexer = Lexer::new();
        self.expansion.reset();
    }

    fn drive(&mut self) -> Result<Production, Error> {
        loop {
            if self.decoder.is_none() && !self.install_decoder()? {
                return Ok(Production::EndOfBuffer);
            }

            if let Some(c) = self.pending.take() {
                if let Some(production) = self.feed(Input::Char(c))? {
                    return Ok(production);
                }
                continue;
            }

            if self.pos == self.buffer.len() {
                if !self.finish {
                    return match self.feed(Input::EndOfBuffer)? {
                        Some(production) => Ok(production),
                        None => Ok(Production::EndOfBuffer),
                    };
                }
                if let Some(c) = self.normalizer.finish() {
                    if let Some(production) = self.feed(Input::Char(c))? {
                        return Ok(production);
                    }
                    continue;
                }
                let Some(production) = self.feed(Input::EndOfData)? else {
                    continue;
                };
                if production == Production::EndOfData {
                    self.finished = true;
                }
                return Ok(production);
            }

            let byte = self.buffer[self.pos];
            self.pos += 1;
            let decoder = self
                .decoder
                .as_mut()
                .expect("a decoder is installed before bytes are consumed");
            let Some(c) = decoder.step(byte)? else {
                continue;
            };
            if !self.bom_checked {
                self.bom_checked = true;
                if c == '\u{FEFF}' {
                    continue;
                }
            }

            match self.normalizer.push(c) {
                Normalized::None => {}
                Normalized::One(a) => {
                    if let Some(production) = self.feed(Input::Char(a))? {
                        return Ok(production);
                    }
                }
                Normalized::Two(a, b) => {
                    if let Some(production) = self.feed(Input::Char(a))? {
                        self.pending = Some(b);
                        return Ok(production);
                    }
                    if let Some(production) = self.feed(Input::Char(b))? {
                        return Ok(production);
                    }
                }
            }
        }
    }

    /// Install the requested or detected decoder. `Ok(false)` means
    /// detection still needs bytes and the driver should suspend.
    fn install_decoder(&mut self) -> Result<bool, Error> {
        let encoding = match self.requested {
            Some(encoding) => encoding,
            None => {
                if self.buffer.len() - self.pos < 4 {
                    if self.finish {
                        return Err(Error::TooFew);
                    }
                    return Ok(false);
                }
                let prefix = [
                    self.buffer[self.pos],
                    self.buffer[self.pos + 1],
                    self.buffer[self.pos + 2],
                    self.buffer[self.pos + 3],
                ];
                let detected = detect(prefix)?;
                self.pos += detected.bom_len;
                detected.encoding
            }
        };
        self.decoder = Some(Box::new(Decoder::new(encoding)));
        self.active = Some(encoding);
        self.encoding_name = encoding.label().to_string();
        Ok(true)
    }

    fn feed(&mut self, input: Input) -> Result<Option<Production>, Error> {
        let mut ctx = LexCtx {
            resolver: self.entity_resolver.as_mut(),
            expansion: &mut self.expansion,
        };
        match self.lexer.step(input, &mut ctx)? {
            Outcome::Continue => Ok(None),
            Outcome::SwitchEncoding(label) => {
                self.switch_encoding(&label)?;
                Ok(None)
            }
            Outcome::Emit(production) => Ok(Some(production)),
        }
    }

    /// Honor an encoding declaration. The swap happens before the next
    /// byte is decoded; already-decoded codepoints are never revisited.
    fn switch_encoding(&mut self, label: &str) -> Result<(), Error> {
        if label.eq_ignore_ascii_case(&self.encoding_name) {
            return Ok(());
        }
        match Encoding::from_label(label) {
            Some(declared) => {
                if let Some(active) = self.active {
                    if active.same_family(declared) {
                        return Ok(());
                    }
                }
                self.decoder = Some(Box::new(Decoder::new(declared)));
                self.active = Some(declared);
                self.encoding_name = declared.label().to_string();
                Ok(())
            }
            None => {
                let handler = self
                    .unknown_encoding
                    .as_mut()
                    .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
                let decoder =
                    handler(label).ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
                self.decoder = Some(decoder);
                self.active = None;
                self.encoding_name = label.to_string();
                Ok(())
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

/// Parse a standalone internal subset.
///
/// Drives the subset machine directly over a UTF-8 string, as if the
/// content stood between `[` and `]` of a DOCTYPE, and returns a
/// synthetic [`Production::Doctype`] with an empty name and no external
/// identifier.
///
/// ```rust
/// use brook_parser::{parse_dtd, ContentSpec, IntSubset, Production};
///
/// let token = parse_dtd("<!ELEMENT br EMPTY>").unwrap();
/// let Production::Doctype(dtd) = token else { panic!() };
/// assert_eq!(dtd.name, "");
/// assert_eq!(
///     dtd.internal_subset,
///     vec![IntSubset::Element {
///         name: "br".into(),
///         content: ContentSpec::Empty,
///     }]
/// );
/// ```
pub fn parse_dtd(input: &str) -> Result<Production, Error> {
    let mut lexer = Lexer::for_subset();
    let mut normalizer = Normalizer::default();
    let mut expansion = LimitTracker::default();

    let mut feed = |lexer: &mut Lexer,
                    expansion: &mut LimitTracker,
                    input: Input|
     -> Result<Option<Production>, Error> {
        let mut ctx = LexCtx {
            resolver: None,
            expansion,
        };
        match lexer.step(input, &mut ctx)? {
            Outcome::Continue => Ok(None),
            Outcome::SwitchEncoding(_) => {
                unreachable!("the internal subset has no XML declaration")
            }
            Outcome::Emit(production) => Ok(Some(production)),
        }
    };

    for c in input.chars() {
        match normalizer.push(c) {
            Normalized::None => {}
            Normalized::One(a) => {
                feed(&mut lexer, &mut expansion, Input::Char(a))?;
            }
            Normalized::Two(a, b) => {
                feed(&mut lexer, &mut expansion, Input::Char(a))?;
                feed(&mut lexer, &mut expansion, Input::Char(b))?;
            }
        }
    }
    if let Some(c) = normalizer.finish() {
        feed(&mut lexer, &mut expansion, Input::Char(c))?;
    }

    match feed(&mut lexer, &mut expansion, Input::EndOfData)? {
        Some(production) => Ok(production),
        None => unreachable!("end of data always produces a token"),
    }
}
