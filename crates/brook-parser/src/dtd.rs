//! The document type declaration as data.
//!
//! The parser does not validate documents against the DTD; it only parses
//! the internal subset into this model and hands it over in one
//! [`Doctype`](crate::Production::Doctype) event. Declarations appear in
//! `internal_subset` in lexical order.
//!
//! Every type here implements `Display` as the declaration syntax it was
//! parsed from, which is what `brook-encoder` writes back out.

use std::fmt;

/// A parsed `<!DOCTYPE …>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dtd {
    /// The document type name. Empty for subsets parsed through
    /// [`parse_dtd`](crate::parse_dtd).
    pub name: String,
    pub external_id: Option<ExternalId>,
    pub internal_subset: Vec<IntSubset>,
}

/// A `SYSTEM` or `PUBLIC` external identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalId {
    System(String),
    /// Public identifier and system literal. In a `<!NOTATION …>`
    /// declaration the system literal may be absent, which is kept as an
    /// empty string.
    Public(String, String),
}

/// One declaration of the internal subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntSubset {
    /// `<!ELEMENT name contentspec>`
    Element { name: String, content: ContentSpec },
    /// `<!ATTLIST name attdef*>`
    Attlist { name: String, defs: Vec<AttDef> },
    /// `<!ENTITY …>`
    Entity(EntityDecl),
    /// `<!NOTATION name externalid>`
    Notation { name: String, id: ExternalId },
    /// A `%name;` parameter-entity reference between declarations. The
    /// referenced replacement text is not fetched or expanded.
    DeclSect(String),
    /// A processing instruction inside the subset.
    Pi { target: String, data: String },
    /// A comment inside the subset.
    Comment(String),
}

/// The content model of an `<!ELEMENT>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    Empty,
    Any,
    /// `(#PCDATA)` or `(#PCDATA|name|…)*`; the names only.
    Mixed(Vec<String>),
    /// A `children` content model: the root group particle.
    Children(ContentParticle),
}

/// A node of the content-model expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentParticle {
    Name(String, Quantifier),
    Choice(Vec<ContentParticle>, Quantifier),
    Seq(Vec<ContentParticle>, Quantifier),
}

/// The repetition marker trailing a name or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    /// `?`
    Opt,
    /// `*`
    Star,
    /// `+`
    Plus,
}

/// One attribute definition of an `<!ATTLIST>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttDef {
    pub name: String,
    pub ty: AttType,
    pub default: DefaultDecl,
}

/// The declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttType {
    Cdata,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    NmToken,
    NmTokens,
    Notation(Vec<String>),
    Enumeration(Vec<String>),
}

/// The default-value clause of an attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultDecl {
    Required,
    Implied,
    Fixed(String),
    Value(String),
}

/// A general or parameter entity declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDecl {
    General { name: String, def: EntityDef },
    Parameter { name: String, def: EntityDef },
}

/// What an entity expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDef {
    /// A quoted entity value. Character and built-in references are
    /// already expanded; other `&name;` and `%name;` references are kept
    /// verbatim.
    Internal(String),
    /// An external identifier, with the notation name of an `NDATA`
    /// clause if one was present.
    External {
        id: ExternalId,
        ndata: Option<String>,
    },
}

fn quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    // Literals re-quote with whichever quote the value does not contain.
    if value.contains('"') {
        write!(f, "'{value}'")
    } else {
        write!(f, "\"{value}\"")
    }
}

impl fmt::Display for Dtd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!DOCTYPE {}", self.name)?;
        if let Some(id) = &self.external_id {
            write!(f, " {id}")?;
        }
        if !self.internal_subset.is_empty() {
            f.write_str(" [")?;
            for item in &self.internal_subset {
                write!(f, "{item}")?;
            }
            f.write_str("]")?;
        }
        f.write_str(">")
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::System(system) => {
                f.write_str("SYSTEM ")?;
                quoted(f, system)
            }
            ExternalId::Public(pubid, system) => {
                f.write_str("PUBLIC ")?;
                quoted(f, pubid)?;
                f.write_str(" ")?;
                quoted(f, system)
            }
        }
    }
}

impl fmt::Display for IntSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntSubset::Element { name, content } => {
                write!(f, "<!ELEMENT {name} {content}>")
            }
            IntSubset::Attlist { name, defs } => {
                write!(f, "<!ATTLIST {name}")?;
                for def in defs {
                    write!(f, " {def}")?;
                }
                f.write_str(">")
            }
            IntSubset::Entity(decl) => write!(f, "{decl}"),
            IntSubset::Notation { name, id } => {
                write!(f, "<!NOTATION {name} ")?;
                match id {
                    // PUBLIC without a system literal is legal here.
                    ExternalId::Public(pubid, system) if system.is_empty() => {
                        f.write_str("PUBLIC ")?;
                        quoted(f, pubid)?;
                    }
                    other => write!(f, "{other}")?,
                }
                f.write_str(">")
            }
            IntSubset::DeclSect(name) => write!(f, "%{name};"),
            IntSubset::Pi { target, data } => {
                if data.is_empty() {
                    write!(f, "<?{target}?>")
                } else {
                    write!(f, "<?{target} {data}?>")
                }
            }
            IntSubset::Comment(text) => write!(f, "<!--{text}-->"),
        }
    }
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSpec::Empty => f.write_str("EMPTY"),
            ContentSpec::Any => f.write_str("ANY"),
            ContentSpec::Mixed(names) => {
                f.write_str("(#PCDATA")?;
                for name in names {
                    write!(f, "|{name}")?;
                }
                if names.is_empty() {
                    f.write_str(")")
                } else {
                    f.write_str(")*")
                }
            }
            ContentSpec::Children(root) => write!(f, "{root}"),
        }
    }
}

impl fmt::Display for ContentParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = |f: &mut fmt::Formatter<'_>,
                     items: &[ContentParticle],
                     sep: char,
                     quantifier: Quantifier| {
            f.write_str("(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, "{sep}")?;
                }
                write!(f, "{item}")?;
            }
            write!(f, "){quantifier}")
        };
        match self {
            ContentParticle::Name(name, quantifier) => write!(f, "{name}{quantifier}"),
            ContentParticle::Choice(items, quantifier) => group(f, items, '|', *quantifier),
            ContentParticle::Seq(items, quantifier) => group(f, items, ',', *quantifier),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::One => Ok(()),
            Quantifier::Opt => f.write_str("?"),
            Quantifier::Star => f.write_str("*"),
            Quantifier::Plus => f.write_str("+"),
        }
    }
}

impl fmt::Display for AttDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.ty, self.default)
    }
}

impl fmt::Display for AttType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = |f: &mut fmt::Formatter<'_>, names: &[String]| {
            f.write_str("(")?;
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
            }
            f.write_str(")")
        };
        match self {
            AttType::Cdata => f.write_str("CDATA"),
            AttType::Id => f.write_str("ID"),
            AttType::IdRef => f.write_str("IDREF"),
            AttType::IdRefs => f.write_str("IDREFS"),
            AttType::Entity => f.write_str("ENTITY"),
            AttType::Entities => f.write_str("ENTITIES"),
            AttType::NmToken => f.write_str("NMTOKEN"),
            AttType::NmTokens => f.write_str("NMTOKENS"),
            AttType::Notation(names) => {
                f.write_str("NOTATION ")?;
                group(f, names)
            }
            AttType::Enumeration(names) => group(f, names),
        }
    }
}

fn attvalue(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '"' => f.write_str("&quot;")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for DefaultDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultDecl::Required => f.write_str("#REQUIRED"),
            DefaultDecl::Implied => f.write_str("#IMPLIED"),
            DefaultDecl::Fixed(value) => {
                f.write_str("#FIXED ")?;
                attvalue(f, value)
            }
            DefaultDecl::Value(value) => attvalue(f, value),
        }
    }
}

fn entity_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    // Kept-verbatim `&name;`/`%name;` references must survive unescaped;
    // only the quote needs re-escaping, as a character reference.
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("&#34;")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for EntityDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, def, percent) = match self {
            EntityDecl::General { name, def } => (name, def, ""),
            EntityDecl::Parameter { name, def } => (name, def, "% "),
        };
        write!(f, "<!ENTITY {percent}{name} ")?;
        match def {
            EntityDef::Internal(value) => entity_value(f, value)?,
            EntityDef::External { id, ndata } => {
                write!(f, "{id}")?;
                if let Some(notation) = ndata {
                    write!(f, " NDATA {notation}")?;
                }
            }
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn doctype_display() {
        let dtd = Dtd {
            name: "greeting".into(),
            external_id: Some(ExternalId::System("hello.dtd".into())),
            internal_subset: vec![
                IntSubset::Element {
                    name: "p".into(),
                    content: ContentSpec::Mixed(vec!["q".into()]),
                },
                IntSubset::Attlist {
                    name: "p".into(),
                    defs: vec![AttDef {
                        name: "id".into(),
                        ty: AttType::Id,
                        default: DefaultDecl::Required,
                    }],
                },
            ],
        };
        assert_eq!(
            dtd.to_string(),
            "<!DOCTYPE greeting SYSTEM \"hello.dtd\" \
             [<!ELEMENT p (#PCDATA|q)*><!ATTLIST p id ID #REQUIRED>]>"
        );
    }

    #[test]
    fn content_model_display() {
        let spec = ContentSpec::Children(ContentParticle::Seq(
            vec![
                ContentParticle::Name("head".into(), Quantifier::Opt),
                ContentParticle::Choice(
                    vec![
                        ContentParticle::Name("p".into(), Quantifier::One),
                        ContentParticle::Name("ul".into(), Quantifier::One),
                    ],
                    Quantifier::Star,
                ),
            ],
            Quantifier::One,
        ));
        assert_eq!(spec.to_string(), "(head?,(p|ul)*)");
    }

    #[test]
    fn entity_display() {
        let decl = EntityDecl::Parameter {
            name: "list".into(),
            def: EntityDef::Internal("(#PCDATA)".into()),
        };
        assert_eq!(decl.to_string(), "<!ENTITY % list \"(#PCDATA)\">");

        let decl = EntityDecl::General {
            name: "pic".into(),
            def: EntityDef::External {
                id: ExternalId::Public("-//W3C//EX".into(), "pic.gif".into()),
                ndata: Some("gif".into()),
            },
        };
        assert_eq!(
            decl.to_string(),
            "<!ENTITY pic PUBLIC \"-//W3C//EX\" \"pic.gif\" NDATA gif>"
        );
    }
}
