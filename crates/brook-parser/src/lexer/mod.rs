//! The resumable lexer.
//!
//! Each grammar production of XML 1.0 is a variant of [`State`]; the
//! variant is the suspend point and the accumulators live on the [`Lexer`]
//! struct. One codepoint goes in per step and the machine either consumes
//! it, emits a [`Production`] with its successor state already installed,
//! or asks the driver to hot-swap the decoder. `EndOfBuffer` can be
//! delivered to any state: the state is left exactly where it was, so the
//! next codepoint continues mid-token without loss or duplication.
//!
//! Boundary characters (the codepoint that ends a name, a keyword, a
//! quantifier position, …) are handed back through [`Consumed::Again`] and
//! re-dispatched against the successor state, which is what the
//! continuation-passing original achieved by calling the parent closure
//! with the lookahead codepoint.

mod dtd;
mod xmldecl;

macro_rules! syntax {
    ($($tt:tt)*) => {
        return Err($crate::Error::Syntax(format!($($tt)*)))
    };
}

pub(crate) use syntax;

use crate::chars::{is_first_namechar, is_namechar, is_pubid_char, is_space, is_xmlchar};
use crate::dtd::{
    AttDef, AttType, ContentParticle, ContentSpec, DefaultDecl, Dtd, EntityDecl, EntityDef,
    ExternalId, IntSubset, Quantifier,
};
use crate::limit::LimitTracker;
use crate::{EntityResolver, Error, Production};

/// One unit of lexer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Input {
    Char(char),
    EndOfBuffer,
    EndOfData,
}

/// What one lexer step produced.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Continue,
    /// The XML declaration named this encoding; the driver must swap the
    /// decoder before feeding another byte.
    SwitchEncoding(String),
    Emit(Production),
}

/// Driver-owned resources a step may need: the embedder's entity resolver
/// and the expansion budget it is charged against.
pub(crate) struct LexCtx<'a> {
    pub(crate) resolver: Option<&'a mut EntityResolver>,
    pub(crate) expansion: &'a mut LimitTracker,
}

/// Where a completed comment or processing instruction is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkupCtx {
    /// Emitted as a token of the document.
    Doc,
    /// Appended to the internal subset of the open DOCTYPE.
    Subset,
}

/// Where a completed attribute value belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttCtx {
    /// An attribute of a start tag.
    Tag,
    /// The default value of an `<!ATTLIST>` definition.
    Default,
}

/// General or parameter entity declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    General,
    Parameter,
}

/// Which construct a reference expands into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefCtx {
    Text,
    Attr(AttCtx),
    EntityValue(EntityKind),
}

/// Which construct an external identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtCtx {
    Doctype,
    Entity(EntityKind),
    Notation,
}

/// Where a `%name;` reference occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeCtx {
    Subset,
    EntityValue(EntityKind),
}

/// Name or Nmtoken group in an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumKind {
    Name,
    Nmtoken,
}

/// The keyword sets a [`State::Keyword`] terminator dispatches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KwCtx {
    /// `DOCTYPE` after `<!` at document level.
    Bang,
    /// `CDATA` after `<![`.
    Cdata,
    /// `ELEMENT` / `ATTLIST` / `ENTITY` / `NOTATION` after `<!` in the
    /// internal subset.
    SubsetDecl,
    /// `SYSTEM` / `PUBLIC`.
    ExternalId(ExtCtx),
    /// `EMPTY` / `ANY`.
    ContentSpec,
    /// `PCDATA` after `(#`.
    Pcdata,
    /// An attribute type keyword.
    AttType,
    /// `REQUIRED` / `IMPLIED` / `FIXED` after `#`.
    Default,
    /// `NDATA`.
    Ndata(EntityKind),
}

/// Every suspend point of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tokens; whitespace accumulates here.
    Misc,
    /// A body text run.
    Text,
    /// `]` seen in a text run.
    TextRb1,
    /// `]]` seen in a text run.
    TextRb2,
    /// After `<`.
    Markup,
    /// After `<!`.
    Bang,
    /// Accumulating a keyword; dispatched on the terminating codepoint.
    Keyword(KwCtx),

    /// After `<!-`, expecting the second `-`.
    CommentOpen(MarkupCtx),
    Comment(MarkupCtx),
    CommentDash(MarkupCtx),
    CommentDashDash(MarkupCtx),

    PiTarget(MarkupCtx),
    PiAfterTarget(MarkupCtx),
    PiWs(MarkupCtx),
    PiData(MarkupCtx),
    PiQmark(MarkupCtx),

    /// Pseudo-attribute text of `<?xml …`.
    DeclData,
    DeclQmark,

    Cdata,
    CdataRb1,
    CdataRb2,

    TagName,
    TagSpace,
    AttrName,
    AttrAfterName,
    AttrValueStart,
    AttrValue(AttCtx),
    TagAfterValue,
    TagSlash,

    EndTagName,
    EndTagSpace,

    /// After `&`.
    RefStart(RefCtx),
    RefName(RefCtx),
    /// After `&#`.
    CharRefStart(RefCtx),
    CharRefDec(RefCtx),
    /// After `&#x`.
    CharRefHex0(RefCtx),
    CharRefHex(RefCtx),

    DoctypeNameWs,
    DoctypeName,
    DoctypeAfterName,
    DoctypeAfterExtId,
    DoctypeAfterSubset,

    SystemLit0(ExtCtx),
    SystemLit(ExtCtx),
    PubidLit0(ExtCtx),
    PubidLit(ExtCtx),
    AfterPubid(ExtCtx),
    AfterPubidWs(ExtCtx),

    /// Between declarations of the internal subset.
    Subset,
    SubsetMarkup,
    SubsetBang,
    /// `%name;`, in the subset or in an entity value.
    PeName(PeCtx),

    ElementNameWs,
    ElementName,
    ContentSpecWs,
    CpItemStart,
    CpName,
    CpQuant,
    CpAfterItem,
    MixedAfterItem,
    MixedNameWs,
    MixedName,
    MixedStar { required: bool },
    ElementDeclEnd,

    AttlistNameWs,
    AttlistName,
    AttlistLoop,
    AttDefName,
    AttTypeWs,
    NotationGroupWs,
    EnumItemWs(EnumKind),
    EnumName(EnumKind),
    EnumAfter(EnumKind),
    DefaultWs0,
    DefaultWs,
    FixedWs,
    AttlistAfterDef,

    EntityStartWs,
    EntityPct0,
    EntityPctWs,
    EntityName(EntityKind),
    EntityDefWs(EntityKind),
    EntityValue(EntityKind),
    NdataMaybe(EntityKind),
    NdataNameWs(EntityKind),
    NdataName(EntityKind),
    EntityEnd(EntityKind),

    NotationNameWs,
    NotationName,
    NotationKwWs,
    NotationEnd,
}

/// Group frame of the content-model parser; one per open `(`.
#[derive(Debug, Clone, Default)]
struct GroupFrame {
    items: Vec<ContentParticle>,
    sep: Option<GroupSep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupSep {
    Choice,
    Seq,
}

enum Consumed {
    /// The codepoint was consumed.
    Done(Outcome),
    /// The state changed; re-dispatch the same codepoint.
    Again,
}

type StepResult = Result<Consumed, Error>;

#[derive(Debug)]
pub(crate) struct Lexer {
    state: State,
    /// True only while `<?xml` may still legally begin.
    decl_possible: bool,
    seen_doctype: bool,
    /// False in the prolog, true from the first start tag on.
    in_body: bool,
    /// Standalone internal-subset mode, for [`crate::parse_dtd`].
    subset_only: bool,

    /// Text, whitespace, CDATA and comment accumulator.
    text: String,
    /// Name accumulator: keywords, PI targets, reference and end-tag
    /// names.
    name: String,
    tag_name: String,
    attr_name: String,
    attributes: Vec<(String, String)>,
    /// Attribute values, PI data, entity values and DTD literals.
    value: String,
    quote: char,
    pi_target: String,
    charref: u32,

    dtd: Option<Dtd>,
    decl_name: String,
    attdef_name: String,
    atttype: Option<AttType>,
    fixed: bool,
    attdefs: Vec<AttDef>,
    /// Mixed-content, NOTATION and enumeration name lists.
    names: Vec<String>,
    groups: Vec<GroupFrame>,
    /// A completed content particle awaiting its quantifier.
    particle: Option<ContentParticle>,
    content: Option<ContentSpec>,
    pubid: Option<String>,
    ext_id: Option<ExternalId>,
    entity_def: Option<EntityDef>,
}

impl Lexer {
    pub(crate) fn new() -> Lexer {
        Lexer {
            state: State::Misc,
            decl_possible: true,
            seen_doctype: false,
            in_body: false,
            subset_only: false,
            text: String::new(),
            name: String::new(),
            tag_name: String::new(),
            attr_name: String::new(),
            attributes: Vec::new(),
            value: String::new(),
            quote: '"',
            pi_target: String::new(),
            charref: 0,
            dtd: None,
            decl_name: String::new(),
            attdef_name: String::new(),
            atttype: None,
            fixed: false,
            attdefs: Vec::new(),
            names: Vec::new(),
            groups: Vec::new(),
            particle: None,
            content: None,
            pubid: None,
            ext_id: None,
            entity_def: None,
        }
    }

    /// A lexer that starts between declarations of an internal subset and
    /// finishes it into a synthetic [`Production::Doctype`] at end of
    /// input.
    pub(crate) fn for_subset() -> Lexer {
        let mut lexer = Lexer::new();
        lexer.state = State::Subset;
        lexer.decl_possible = false;
        lexer.subset_only = true;
        lexer.dtd = Some(Dtd {
            name: String::new(),
            external_id: None,
            internal_subset: Vec::new(),
        });
        lexer
    }

    pub(crate) fn step(&mut self, input: Input, ctx: &mut LexCtx<'_>) -> Result<Outcome, Error> {
        let c = match input {
            Input::Char(c) => c,
            Input::EndOfBuffer => return Ok(Outcome::Emit(self.suspend())),
            Input::EndOfData => return self.end_of_data(),
        };
        loop {
            match self.consume(c, ctx)? {
                Consumed::Done(outcome) => return Ok(outcome),
                Consumed::Again => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // step plumbing

    fn cont(&mut self) -> StepResult {
        Ok(Consumed::Done(Outcome::Continue))
    }

    fn to(&mut self, state: State) -> StepResult {
        self.state = state;
        self.cont()
    }

    fn again(&mut self, state: State) -> StepResult {
        self.state = state;
        Ok(Consumed::Again)
    }

    fn emit(&mut self, state: State, production: Production) -> StepResult {
        self.state = state;
        Ok(Consumed::Done(Outcome::Emit(production)))
    }

    /// The `EndOfBuffer` rule: mid-run accumulators flush a partial token,
    /// everything else suspends in place.
    fn suspend(&mut self) -> Production {
        match self.state {
            State::Misc | State::Text | State::TextRb1 | State::TextRb2
                if !self.text.is_empty() =>
            {
                text_production(std::mem::take(&mut self.text))
            }
            State::Cdata | State::CdataRb1 | State::CdataRb2 if !self.text.is_empty() => {
                Production::Cdata(std::mem::take(&mut self.text))
            }
            _ => Production::EndOfBuffer,
        }
    }

    fn end_of_data(&mut self) -> Result<Outcome, Error> {
        match self.state {
            State::Misc | State::Text | State::TextRb1 | State::TextRb2 => {
                // Pending `]`s were just text after all.
                match self.state {
                    State::TextRb1 => self.text.push(']'),
                    State::TextRb2 => self.text.push_str("]]"),
                    _ => {}
                }
                self.state = State::Misc;
                if self.text.is_empty() {
                    Ok(Outcome::Emit(Production::EndOfData))
                } else {
                    Ok(Outcome::Emit(text_production(std::mem::take(
                        &mut self.text,
                    ))))
                }
            }
            State::Subset if self.subset_only => {
                let dtd = self.take_dtd();
                self.state = State::Misc;
                Ok(Outcome::Emit(Production::Doctype(dtd)))
            }
            _ => Err(Error::Syntax("unexpected end of input".into())),
        }
    }

    fn consume(&mut self, c: char, ctx: &mut LexCtx<'_>) -> StepResult {
        match self.state {
            State::Misc => self.misc(c),
            State::Text => self.text_run(c),
            State::TextRb1 => self.text_rb1(c),
            State::TextRb2 => self.text_rb2(c),
            State::Markup => self.markup(c),
            State::Bang => self.bang(c),
            State::Keyword(kctx) => self.keyword(kctx, c),

            State::CommentOpen(mctx) => self.comment_open(mctx, c),
            State::Comment(mctx) => self.comment(mctx, c),
            State::CommentDash(mctx) => self.comment_dash(mctx, c),
            State::CommentDashDash(mctx) => self.comment_dash_dash(mctx, c),

            State::PiTarget(mctx) => self.pi_target(mctx, c),
            State::PiAfterTarget(mctx) => self.pi_after_target(mctx, c),
            State::PiWs(mctx) => self.pi_ws(mctx, c),
            State::PiData(mctx) => self.pi_data(mctx, c),
            State::PiQmark(mctx) => self.pi_qmark(mctx, c),

            State::DeclData => self.decl_data(c),
            State::DeclQmark => self.decl_qmark(c),

            State::Cdata => self.cdata(c),
            State::CdataRb1 => self.cdata_rb1(c),
            State::CdataRb2 => self.cdata_rb2(c),

            State::TagName => self.tag_name(c),
            State::TagSpace => self.tag_space(c),
            State::AttrName => self.attr_name(c),
            State::AttrAfterName => self.attr_after_name(c),
            State::AttrValueStart => self.attr_value_start(c),
            State::AttrValue(actx) => self.attr_value(actx, c),
            State::TagAfterValue => self.tag_after_value(c),
            State::TagSlash => self.tag_slash(c),

            State::EndTagName => self.end_tag_name(c),
            State::EndTagSpace => self.end_tag_space(c),

            State::RefStart(rctx) => self.ref_start(rctx, c),
            State::RefName(rctx) => self.ref_name(rctx, c, ctx),
            State::CharRefStart(rctx) => self.char_ref_start(rctx, c),
            State::CharRefDec(rctx) => self.char_ref_dec(rctx, c),
            State::CharRefHex0(rctx) => self.char_ref_hex0(rctx, c),
            State::CharRefHex(rctx) => self.char_ref_hex(rctx, c),

            // Everything below is the DOCTYPE machinery, in dtd.rs.
            State::DoctypeNameWs => self.doctype_name_ws(c),
            State::DoctypeName => self.doctype_name(c),
            State::DoctypeAfterName => self.doctype_after_name(c),
            State::DoctypeAfterExtId => self.doctype_after_ext_id(c),
            State::DoctypeAfterSubset => self.doctype_after_subset(c),

            State::SystemLit0(ectx) => self.system_lit0(ectx, c),
            State::SystemLit(ectx) => self.system_lit(ectx, c),
            State::PubidLit0(ectx) => self.pubid_lit0(ectx, c),
            State::PubidLit(ectx) => self.pubid_lit(ectx, c),
            State::AfterPubid(ectx) => self.after_pubid(ectx, c),
            State::AfterPubidWs(ectx) => self.after_pubid_ws(ectx, c),

            State::Subset => self.subset(c),
            State::SubsetMarkup => self.subset_markup(c),
            State::SubsetBang => self.subset_bang(c),
            State::PeName(pctx) => self.pe_name(pctx, c),

            State::ElementNameWs => self.element_name_ws(c),
            State::ElementName => self.element_name(c),
            State::ContentSpecWs => self.content_spec_ws(c),
            State::CpItemStart => self.cp_item_start(c),
            State::CpName => self.cp_name(c),
            State::CpQuant => self.cp_quant(c),
            State::CpAfterItem => self.cp_after_item(c),
            State::MixedAfterItem => self.mixed_after_item(c),
            State::MixedNameWs => self.mixed_name_ws(c),
            State::MixedName => self.mixed_name(c),
            State::MixedStar { required } => self.mixed_star(required, c),
            State::ElementDeclEnd => self.element_decl_end(c),

            State::AttlistNameWs => self.attlist_name_ws(c),
            State::AttlistName => self.attlist_name(c),
            State::AttlistLoop => self.attlist_loop(c),
            State::AttDefName => self.attdef_name(c),
            State::AttTypeWs => self.att_type_ws(c),
            State::NotationGroupWs => self.notation_group_ws(c),
            State::EnumItemWs(kind) => self.enum_item_ws(kind, c),
            State::EnumName(kind) => self.enum_name(kind, c),
            State::EnumAfter(kind) => self.enum_after(kind, c),
            State::DefaultWs0 => self.default_ws0(c),
            State::DefaultWs => self.default_ws(c),
            State::FixedWs => self.fixed_ws(c),
            State::AttlistAfterDef => self.attlist_after_def(c),

            State::EntityStartWs => self.entity_start_ws(c),
            State::EntityPct0 => self.entity_pct0(c),
            State::EntityPctWs => self.entity_pct_ws(c),
            State::EntityName(kind) => self.entity_name(kind, c),
            State::EntityDefWs(kind) => self.entity_def_ws(kind, c),
            State::EntityValue(kind) => self.entity_value(kind, c),
            State::NdataMaybe(kind) => self.ndata_maybe(kind, c),
            State::NdataNameWs(kind) => self.ndata_name_ws(kind, c),
            State::NdataName(kind) => self.ndata_name(kind, c),
            State::EntityEnd(kind) => self.entity_end(kind, c),

            State::NotationNameWs => self.notation_name_ws(c),
            State::NotationName => self.notation_name(c),
            State::NotationKwWs => self.notation_kw_ws(c),
            State::NotationEnd => self.notation_end(c),
        }
    }

    // ------------------------------------------------------------------
    // document level

    fn misc(&mut self, c: char) -> StepResult {
        if is_space(c) {
            self.decl_possible = false;
            self.text.push(c);
            self.cont()
        } else if c == '<' {
            if self.text.is_empty() {
                self.to(State::Markup)
            } else {
                let run = text_production(std::mem::take(&mut self.text));
                self.emit(State::Markup, run)
            }
        } else if self.in_body {
            self.again(State::Text)
        } else {
            syntax!("text is not allowed before the root element")
        }
    }

    fn text_run(&mut self, c: char) -> StepResult {
        match c {
            '<' => {
                if self.text.is_empty() {
                    self.to(State::Markup)
                } else {
                    let run = text_production(std::mem::take(&mut self.text));
                    self.emit(State::Markup, run)
                }
            }
            '&' => self.to(State::RefStart(RefCtx::Text)),
            ']' => self.to(State::TextRb1),
            c if is_xmlchar(c) => {
                self.text.push(c);
                self.cont()
            }
            c => syntax!("character U+{:04X} is not allowed in a document", c as u32),
        }
    }

    fn text_rb1(&mut self, c: char) -> StepResult {
        if c == ']' {
            self.to(State::TextRb2)
        } else {
            self.text.push(']');
            self.again(State::Text)
        }
    }

    fn text_rb2(&mut self, c: char) -> StepResult {
        match c {
            '>' => syntax!("']]>' is not allowed in text"),
            ']' => {
                self.text.push(']');
                self.cont()
            }
            _ => {
                self.text.push_str("]]");
                self.again(State::Text)
            }
        }
    }

    fn markup(&mut self, c: char) -> StepResult {
        match c {
            '?' => {
                self.name.clear();
                self.to(State::PiTarget(MarkupCtx::Doc))
            }
            '!' => {
                self.decl_possible = false;
                self.to(State::Bang)
            }
            '/' => {
                self.decl_possible = false;
                self.name.clear();
                self.to(State::EndTagName)
            }
            c if is_first_namechar(c) => {
                self.decl_possible = false;
                self.tag_name.clear();
                self.tag_name.push(c);
                self.attributes.clear();
                self.to(State::TagName)
            }
            c => syntax!("expected an element name, '!', '?' or '/' after '<', found `{c}`"),
        }
    }

    fn bang(&mut self, c: char) -> StepResult {
        match c {
            '-' => self.to(State::CommentOpen(MarkupCtx::Doc)),
            '[' if self.in_body => {
                self.name.clear();
                self.to(State::Keyword(KwCtx::Cdata))
            }
            '[' => syntax!("CDATA sections are not allowed in the prolog"),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::Bang))
            }
            c => syntax!("expected '--', '[CDATA[' or 'DOCTYPE' after '<!', found `{c}`"),
        }
    }

    fn keyword(&mut self, kctx: KwCtx, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let word = std::mem::take(&mut self.name);
        match kctx {
            KwCtx::Bang => {
                if word != "DOCTYPE" {
                    return Err(Error::UnknownToken(word));
                }
                if self.in_body {
                    syntax!("'<!DOCTYPE' is only allowed in the prolog");
                }
                if self.seen_doctype {
                    syntax!("only one '<!DOCTYPE' is allowed");
                }
                self.require_space(c, "'<!DOCTYPE'")?;
                self.to(State::DoctypeNameWs)
            }
            KwCtx::Cdata => {
                if word != "CDATA" {
                    return Err(Error::UnknownToken(word));
                }
                if c != '[' {
                    syntax!("expected '[' after '<![CDATA'");
                }
                self.text.clear();
                self.to(State::Cdata)
            }
            _ => self.keyword_dtd(kctx, word, c),
        }
    }

    fn require_space(&self, c: char, after: &str) -> Result<(), Error> {
        if is_space(c) {
            Ok(())
        } else {
            Err(Error::Syntax(format!("expected whitespace after {after}")))
        }
    }

    // ------------------------------------------------------------------
    // comments

    fn comment_open(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        if c == '-' {
            self.text.clear();
            self.to(State::Comment(mctx))
        } else {
            syntax!("expected '<!--' to open a comment")
        }
    }

    fn comment(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            '-' => self.to(State::CommentDash(mctx)),
            c if is_xmlchar(c) => {
                self.text.push(c);
                self.cont()
            }
            c => syntax!("character U+{:04X} is not allowed in a comment", c as u32),
        }
    }

    fn comment_dash(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            '-' => self.to(State::CommentDashDash(mctx)),
            c if is_xmlchar(c) => {
                self.text.push('-');
                self.text.push(c);
                self.to(State::Comment(mctx))
            }
            c => syntax!("character U+{:04X} is not allowed in a comment", c as u32),
        }
    }

    fn comment_dash_dash(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        if c != '>' {
            syntax!("'--' is not allowed in a comment");
        }
        let text = std::mem::take(&mut self.text);
        match mctx {
            MarkupCtx::Doc => self.emit(State::Misc, Production::Comment(text)),
            MarkupCtx::Subset => {
                self.subset_push(IntSubset::Comment(text));
                self.to(State::Subset)
            }
        }
    }

    // ------------------------------------------------------------------
    // processing instructions and the XML declaration

    fn pi_target(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        if self.name.is_empty() {
            if is_first_namechar(c) {
                self.name.push(c);
                return self.cont();
            }
            syntax!("expected a processing-instruction target");
        }
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let target = std::mem::take(&mut self.name);
        if target.eq_ignore_ascii_case("xml") {
            if target == "xml" && mctx == MarkupCtx::Doc && self.decl_possible {
                self.decl_possible = false;
                self.value.clear();
                return self.again(State::DeclData);
            }
            syntax!("the processing-instruction target `{target}` is reserved");
        }
        self.decl_possible = false;
        self.pi_target = target;
        self.value.clear();
        self.again(State::PiAfterTarget(mctx))
    }

    fn pi_after_target(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            '?' => self.to(State::PiQmark(mctx)),
            c if is_space(c) => self.to(State::PiWs(mctx)),
            _ => syntax!("expected whitespace after the processing-instruction target"),
        }
    }

    fn pi_ws(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '?' => self.to(State::PiQmark(mctx)),
            c if is_xmlchar(c) => self.again(State::PiData(mctx)),
            c => syntax!(
                "character U+{:04X} is not allowed in a processing instruction",
                c as u32
            ),
        }
    }

    fn pi_data(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            '?' => self.to(State::PiQmark(mctx)),
            c if is_xmlchar(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in a processing instruction",
                c as u32
            ),
        }
    }

    fn pi_qmark(&mut self, mctx: MarkupCtx, c: char) -> StepResult {
        match c {
            '>' => {
                let target = std::mem::take(&mut self.pi_target);
                let data = std::mem::take(&mut self.value);
                match mctx {
                    MarkupCtx::Doc => self.emit(State::Misc, Production::Pi { target, data }),
                    MarkupCtx::Subset => {
                        self.subset_push(IntSubset::Pi { target, data });
                        self.to(State::Subset)
                    }
                }
            }
            '?' => {
                self.value.push('?');
                self.cont()
            }
            _ => {
                self.value.push('?');
                self.again(State::PiData(mctx))
            }
        }
    }

    fn decl_data(&mut self, c: char) -> StepResult {
        match c {
            '?' => self.to(State::DeclQmark),
            c if is_xmlchar(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in the XML declaration",
                c as u32
            ),
        }
    }

    fn decl_qmark(&mut self, c: char) -> StepResult {
        match c {
            '>' => {
                let data = std::mem::take(&mut self.value);
                let decl = xmldecl::parse(&data)?;
                self.state = State::Misc;
                match decl.encoding {
                    Some(label) => Ok(Consumed::Done(Outcome::SwitchEncoding(label))),
                    None => self.cont(),
                }
            }
            '?' => {
                self.value.push('?');
                self.cont()
            }
            _ => {
                self.value.push('?');
                self.again(State::DeclData)
            }
        }
    }

    // ------------------------------------------------------------------
    // CDATA sections

    fn cdata(&mut self, c: char) -> StepResult {
        match c {
            ']' => self.to(State::CdataRb1),
            c if is_xmlchar(c) => {
                self.text.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in a CDATA section",
                c as u32
            ),
        }
    }

    fn cdata_rb1(&mut self, c: char) -> StepResult {
        if c == ']' {
            self.to(State::CdataRb2)
        } else {
            self.text.push(']');
            self.again(State::Cdata)
        }
    }

    fn cdata_rb2(&mut self, c: char) -> StepResult {
        match c {
            '>' => {
                let text = std::mem::take(&mut self.text);
                self.emit(State::Misc, Production::Cdata(text))
            }
            ']' => {
                self.text.push(']');
                self.cont()
            }
            _ => {
                self.text.push_str("]]");
                self.again(State::Cdata)
            }
        }
    }

    // ------------------------------------------------------------------
    // start and empty tags

    fn emit_start(&mut self, empty: bool) -> StepResult {
        let name = std::mem::take(&mut self.tag_name);
        let attributes = std::mem::take(&mut self.attributes);
        self.in_body = true;
        let production = if empty {
            Production::EmptyElement { name, attributes }
        } else {
            Production::StartElement { name, attributes }
        };
        self.emit(State::Misc, production)
    }

    fn tag_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.tag_name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::TagSpace),
            '>' => self.emit_start(false),
            '/' => self.to(State::TagSlash),
            c => syntax!("unexpected character `{c}` in a start tag"),
        }
    }

    fn tag_space(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.attr_name.clear();
                self.attr_name.push(c);
                self.to(State::AttrName)
            }
            '>' => self.emit_start(false),
            '/' => self.to(State::TagSlash),
            c => syntax!("unexpected character `{c}` in a start tag"),
        }
    }

    fn attr_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.attr_name.push(c);
                self.cont()
            }
            '=' => {
                self.value.clear();
                self.to(State::AttrValueStart)
            }
            c if is_space(c) => self.to(State::AttrAfterName),
            _ => syntax!("expected '=' after the attribute name `{}`", self.attr_name),
        }
    }

    fn attr_after_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '=' => {
                self.value.clear();
                self.to(State::AttrValueStart)
            }
            _ => syntax!("expected '=' after the attribute name `{}`", self.attr_name),
        }
    }

    fn attr_value_start(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.to(State::AttrValue(AttCtx::Tag))
            }
            _ => syntax!("expected a quoted attribute value"),
        }
    }

    fn attr_value(&mut self, actx: AttCtx, c: char) -> StepResult {
        match c {
            c if c == self.quote => {
                let value = std::mem::take(&mut self.value);
                match actx {
                    AttCtx::Tag => {
                        let name = std::mem::take(&mut self.attr_name);
                        self.attributes.push((name, value));
                        self.to(State::TagAfterValue)
                    }
                    AttCtx::Default => {
                        let default = if self.fixed {
                            DefaultDecl::Fixed(value)
                        } else {
                            DefaultDecl::Value(value)
                        };
                        self.push_attdef(default);
                        self.to(State::AttlistAfterDef)
                    }
                }
            }
            '<' => syntax!("'<' is not allowed in attribute values"),
            '&' => self.to(State::RefStart(RefCtx::Attr(actx))),
            c if is_xmlchar(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in an attribute value",
                c as u32
            ),
        }
    }

    fn tag_after_value(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.to(State::TagSpace),
            '/' => self.to(State::TagSlash),
            '>' => self.emit_start(false),
            _ => syntax!("expected whitespace between attributes"),
        }
    }

    fn tag_slash(&mut self, c: char) -> StepResult {
        if c == '>' {
            self.emit_start(true)
        } else {
            syntax!("expected '>' after '/' in an empty-element tag")
        }
    }

    // ------------------------------------------------------------------
    // end tags

    fn end_tag_name(&mut self, c: char) -> StepResult {
        if self.name.is_empty() {
            if is_first_namechar(c) {
                self.name.push(c);
                return self.cont();
            }
            syntax!("expected an element name after '</'");
        }
        match c {
            c if is_namechar(c) => {
                self.name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::EndTagSpace),
            '>' => {
                let name = std::mem::take(&mut self.name);
                self.emit(State::Misc, Production::EndElement { name })
            }
            c => syntax!("unexpected character `{c}` in an end tag"),
        }
    }

    fn end_tag_space(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => {
                let name = std::mem::take(&mut self.name);
                self.emit(State::Misc, Production::EndElement { name })
            }
            c => syntax!("unexpected character `{c}` in an end tag"),
        }
    }

    // ------------------------------------------------------------------
    // entity and character references

    fn ref_start(&mut self, rctx: RefCtx, c: char) -> StepResult {
        match c {
            '#' => self.to(State::CharRefStart(rctx)),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::RefName(rctx))
            }
            _ => syntax!("expected an entity name or '#' after '&'"),
        }
    }

    fn ref_name(&mut self, rctx: RefCtx, c: char, ctx: &mut LexCtx<'_>) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.name.push(c);
                self.cont()
            }
            ';' => self.resolve_ref(rctx, ctx),
            _ => syntax!("expected ';' after the entity name `{}`", self.name),
        }
    }

    fn resolve_ref(&mut self, rctx: RefCtx, ctx: &mut LexCtx<'_>) -> StepResult {
        let name = std::mem::take(&mut self.name);
        let builtin = match name.as_str() {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "apos" => Some('\''),
            "quot" => Some('"'),
            _ => None,
        };
        match builtin {
            Some(c) => self.ref_buffer(rctx).push(c),
            // Inside an entity value, general references are bypassed
            // untouched; the resolver only serves content and attributes.
            None => match rctx {
                RefCtx::EntityValue(_) => {
                    self.value.push('&');
                    self.value.push_str(&name);
                    self.value.push(';');
                }
                _ => {
                    let replacement = match ctx.resolver.as_mut() {
                        Some(resolver) => resolver(&name)?,
                        None => return Err(Error::UnknownEntity(name)),
                    };
                    if !ctx.expansion.consume(replacement.chars().count()) {
                        return Err(Error::ExpansionLimit);
                    }
                    self.ref_buffer(rctx).push_str(&replacement);
                }
            },
        }
        self.ref_return(rctx)
    }

    fn ref_buffer(&mut self, rctx: RefCtx) -> &mut String {
        match rctx {
            RefCtx::Text => &mut self.text,
            RefCtx::Attr(_) | RefCtx::EntityValue(_) => &mut self.value,
        }
    }

    fn ref_return(&mut self, rctx: RefCtx) -> StepResult {
        match rctx {
            RefCtx::Text => self.to(State::Text),
            RefCtx::Attr(actx) => self.to(State::AttrValue(actx)),
            RefCtx::EntityValue(kind) => self.to(State::EntityValue(kind)),
        }
    }

    fn char_ref_start(&mut self, rctx: RefCtx, c: char) -> StepResult {
        match c {
            'x' => self.to(State::CharRefHex0(rctx)),
            c if c.is_ascii_digit() => {
                self.charref = c as u32 - '0' as u32;
                self.to(State::CharRefDec(rctx))
            }
            _ => syntax!("expected digits in a character reference"),
        }
    }

    fn char_ref_dec(&mut self, rctx: RefCtx, c: char) -> StepResult {
        match c {
            c if c.is_ascii_digit() => {
                self.charref = self
                    .charref
                    .saturating_mul(10)
                    .saturating_add(c as u32 - '0' as u32);
                self.cont()
            }
            ';' => self.finish_charref(rctx),
            _ => syntax!("expected a digit or ';' in a character reference"),
        }
    }

    fn char_ref_hex0(&mut self, rctx: RefCtx, c: char) -> StepResult {
        match c.to_digit(16) {
            Some(d) => {
                self.charref = d;
                self.to(State::CharRefHex(rctx))
            }
            None => syntax!("expected hex digits in a character reference"),
        }
    }

    fn char_ref_hex(&mut self, rctx: RefCtx, c: char) -> StepResult {
        if let Some(d) = c.to_digit(16) {
            self.charref = self.charref.saturating_mul(16).saturating_add(d);
            return self.cont();
        }
        if c == ';' {
            self.finish_charref(rctx)
        } else {
            syntax!("expected a hex digit or ';' in a character reference")
        }
    }

    fn finish_charref(&mut self, rctx: RefCtx) -> StepResult {
        match char::from_u32(self.charref).filter(|&c| is_xmlchar(c)) {
            Some(c) => {
                self.ref_buffer(rctx).push(c);
                self.ref_return(rctx)
            }
            None => Err(Error::InvalidChar(self.charref)),
        }
    }

    // ------------------------------------------------------------------
    // shared DTD helpers, used from dtd.rs as well

    fn subset_push(&mut self, item: IntSubset) {
        self.dtd
            .as_mut()
            .expect("a DOCTYPE is open while parsing the internal subset")
            .internal_subset
            .push(item);
    }

    fn take_dtd(&mut self) -> Dtd {
        self.dtd
            .take()
            .expect("a DOCTYPE is open while parsing the internal subset")
    }

    fn push_attdef(&mut self, default: DefaultDecl) {
        let ty = self
            .atttype
            .take()
            .expect("an attribute type precedes its default declaration");
        let def = AttDef {
            name: std::mem::take(&mut self.attdef_name),
            ty,
            default,
        };
        self.attdefs.push(def);
    }

    fn set_quantifier(&mut self, quantifier: Quantifier) {
        if let Some(
            ContentParticle::Name(_, q) | ContentParticle::Choice(_, q) | ContentParticle::Seq(_, q),
        ) = self.particle.as_mut()
        {
            *q = quantifier;
        }
    }
}

/// Classify a finished run: all-whitespace runs are their own production.
fn text_production(text: String) -> Production {
    if text.chars().all(is_space) {
        Production::Whitespace(text)
    } else {
        Production::Text(text)
    }
}
