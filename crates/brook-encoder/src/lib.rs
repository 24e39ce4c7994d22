#![doc = include_str!("../README.md")]

use brook_encoding::{Encoding, EncodingError};
use brook_parser::Production;

/// An error raised while writing events out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A codepoint with no representation in the output encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Writes a stream of [`Production`]s as an XML document.
///
/// The serializer is stateless with respect to the document structure: it
/// writes events exactly in the order given and does not check that tags
/// nest. [`Production::EndOfBuffer`] and [`Production::EndOfData`] are
/// ignored, so a stream pulled straight out of a parser can be replayed
/// into a serializer unchanged.
pub struct Serializer {
    encoding: Encoding,
    out: Vec<u8>,
}

impl Serializer {
    pub fn new(encoding: Encoding) -> Serializer {
        Serializer {
            encoding,
            out: Vec::new(),
        }
    }

    /// The bytes written so far.
    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    pub fn write(&mut self, production: &Production) -> Result<(), EncodeError> {
        match production {
            Production::StartElement { name, attributes } => {
                self.raw("<")?;
                self.raw(name)?;
                self.attributes(attributes)?;
                self.raw(">")
            }
            Production::EmptyElement { name, attributes } => {
                self.raw("<")?;
                self.raw(name)?;
                self.attributes(attributes)?;
                self.raw("/>")
            }
            Production::EndElement { name } => {
                self.raw("</")?;
                self.raw(name)?;
                self.raw(">")
            }
            Production::Text(text) | Production::Whitespace(text) => self.text(text),
            Production::Cdata(data) => self.cdata(data),
            Production::Pi { target, data } => {
                self.raw("<?")?;
                self.raw(target)?;
                if !data.is_empty() {
                    self.raw(" ")?;
                    self.raw(data)?;
                }
                self.raw("?>")
            }
            Production::Comment(text) => {
                self.raw("<!--")?;
                self.raw(text)?;
                self.raw("-->")
            }
            Production::Doctype(dtd) => self.raw(&dtd.to_string()),
            Production::EndOfBuffer | Production::EndOfData => Ok(()),
        }
    }

    fn raw(&mut self, s: &str) -> Result<(), EncodeError> {
        for c in s.chars() {
            self.encoding.encode(c, &mut self.out)?;
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), EncodeError> {
        for c in text.chars() {
            match c {
                '&' => self.raw("&amp;")?,
                '<' => self.raw("&lt;")?,
                '>' => self.raw("&gt;")?,
                c => self.encoding.encode(c, &mut self.out)?,
            }
        }
        Ok(())
    }

    fn attributes(&mut self, attributes: &[(String, String)]) -> Result<(), EncodeError> {
        for (name, value) in attributes {
            self.raw(" ")?;
            self.raw(name)?;
            self.raw("=\"")?;
            for c in value.chars() {
                match c {
                    '&' => self.raw("&amp;")?,
                    '<' => self.raw("&lt;")?,
                    '"' => self.raw("&quot;")?,
                    c => self.encoding.encode(c, &mut self.out)?,
                }
            }
            self.raw("\"")?;
        }
        Ok(())
    }

    /// `]]>` cannot occur inside a CDATA section; the section is split
    /// around it.
    fn cdata(&mut self, data: &str) -> Result<(), EncodeError> {
        self.raw("<![CDATA[")?;
        let mut first = true;
        for segment in data.split("]]>") {
            if !first {
                self.raw("]]]]><![CDATA[>")?;
            }
            first = false;
            self.raw(segment)?;
        }
        self.raw("]]>")
    }
}
