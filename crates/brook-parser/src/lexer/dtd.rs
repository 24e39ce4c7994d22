//! The DOCTYPE machinery: document type name, external identifiers, and
//! the internal-subset declarations with their content models.
//!
//! Same stepping discipline as the document-level states: consume one
//! codepoint or hand it back with `Again`. Nested content-model groups
//! are the one place with real recursion in the grammar; they run over
//! the explicit `groups` stack so that suspension never has to walk a
//! call stack.

use super::*;

impl Lexer {
    // ------------------------------------------------------------------
    // <!DOCTYPE name (externalid)? ([subset])? >

    pub(super) fn doctype_name_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::DoctypeName)
            }
            _ => syntax!("expected a name after '<!DOCTYPE'"),
        }
    }

    pub(super) fn doctype_name(&mut self, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        self.dtd = Some(Dtd {
            name: std::mem::take(&mut self.name),
            external_id: None,
            internal_subset: Vec::new(),
        });
        self.seen_doctype = true;
        self.again(State::DoctypeAfterName)
    }

    pub(super) fn doctype_after_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '[' => self.to(State::Subset),
            '>' => self.emit_doctype(),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::ExternalId(ExtCtx::Doctype)))
            }
            c => syntax!("unexpected character `{c}` in '<!DOCTYPE'"),
        }
    }

    pub(super) fn doctype_after_ext_id(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '[' => self.to(State::Subset),
            '>' => self.emit_doctype(),
            c => syntax!("unexpected character `{c}` in '<!DOCTYPE'"),
        }
    }

    pub(super) fn doctype_after_subset(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => self.emit_doctype(),
            _ => syntax!("expected '>' after the internal subset"),
        }
    }

    fn emit_doctype(&mut self) -> StepResult {
        let dtd = self.take_dtd();
        self.emit(State::Misc, Production::Doctype(dtd))
    }

    // ------------------------------------------------------------------
    // external identifiers

    pub(super) fn system_lit0(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.to(State::SystemLit(ectx))
            }
            _ => syntax!("expected a quoted system literal"),
        }
    }

    pub(super) fn system_lit(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if c == self.quote => {
                let system = std::mem::take(&mut self.value);
                let id = match self.pubid.take() {
                    Some(pubid) => ExternalId::Public(pubid, system),
                    None => ExternalId::System(system),
                };
                self.external_id_done(ectx, id)
            }
            c if is_xmlchar(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in a system literal",
                c as u32
            ),
        }
    }

    fn external_id_done(&mut self, ectx: ExtCtx, id: ExternalId) -> StepResult {
        match ectx {
            ExtCtx::Doctype => {
                if let Some(dtd) = self.dtd.as_mut() {
                    dtd.external_id = Some(id);
                }
                self.to(State::DoctypeAfterExtId)
            }
            ExtCtx::Entity(kind) => {
                self.ext_id = Some(id);
                self.to(State::NdataMaybe(kind))
            }
            ExtCtx::Notation => {
                self.ext_id = Some(id);
                self.to(State::NotationEnd)
            }
        }
    }

    pub(super) fn pubid_lit0(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.to(State::PubidLit(ectx))
            }
            _ => syntax!("expected a quoted public identifier"),
        }
    }

    pub(super) fn pubid_lit(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if c == self.quote => {
                self.pubid = Some(std::mem::take(&mut self.value));
                self.to(State::AfterPubid(ectx))
            }
            c if is_pubid_char(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!("character `{c}` is not allowed in a public identifier"),
        }
    }

    pub(super) fn after_pubid(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.to(State::AfterPubidWs(ectx)),
            // A notation may stop at the public identifier.
            '>' if ectx == ExtCtx::Notation => self.public_only_notation(),
            _ => syntax!("expected whitespace after the public identifier"),
        }
    }

    pub(super) fn after_pubid_ws(&mut self, ectx: ExtCtx, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.to(State::SystemLit(ectx))
            }
            '>' if ectx == ExtCtx::Notation => self.public_only_notation(),
            _ => syntax!("expected a system literal"),
        }
    }

    fn public_only_notation(&mut self) -> StepResult {
        let pubid = self
            .pubid
            .take()
            .expect("a public identifier was just parsed");
        self.ext_id = Some(ExternalId::Public(pubid, String::new()));
        self.again(State::NotationEnd)
    }

    // ------------------------------------------------------------------
    // the internal subset

    pub(super) fn subset(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '<' => self.to(State::SubsetMarkup),
            '%' => {
                self.name.clear();
                self.to(State::PeName(PeCtx::Subset))
            }
            ']' if !self.subset_only => self.to(State::DoctypeAfterSubset),
            c => syntax!("unexpected character `{c}` in the internal subset"),
        }
    }

    pub(super) fn subset_markup(&mut self, c: char) -> StepResult {
        match c {
            '?' => {
                self.name.clear();
                self.to(State::PiTarget(MarkupCtx::Subset))
            }
            '!' => self.to(State::SubsetBang),
            _ => syntax!("expected '<!' or '<?' in the internal subset"),
        }
    }

    pub(super) fn subset_bang(&mut self, c: char) -> StepResult {
        match c {
            '-' => self.to(State::CommentOpen(MarkupCtx::Subset)),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::SubsetDecl))
            }
            c => syntax!("expected a declaration or comment after '<!', found `{c}`"),
        }
    }

    pub(super) fn pe_name(&mut self, pctx: PeCtx, c: char) -> StepResult {
        if self.name.is_empty() {
            if is_first_namechar(c) {
                self.name.push(c);
                return self.cont();
            }
            syntax!("expected a name after '%'");
        }
        match c {
            c if is_namechar(c) => {
                self.name.push(c);
                self.cont()
            }
            ';' => {
                let name = std::mem::take(&mut self.name);
                match pctx {
                    PeCtx::Subset => {
                        self.subset_push(IntSubset::DeclSect(name));
                        self.to(State::Subset)
                    }
                    // Inside an entity value the reference is inlined as
                    // written, not resolved.
                    PeCtx::EntityValue(kind) => {
                        self.value.push('%');
                        self.value.push_str(&name);
                        self.value.push(';');
                        self.to(State::EntityValue(kind))
                    }
                }
            }
            _ => syntax!("expected ';' after the parameter-entity name `{}`", self.name),
        }
    }

    /// Keyword dispatch for every DTD context.
    pub(super) fn keyword_dtd(&mut self, kctx: KwCtx, word: String, c: char) -> StepResult {
        match kctx {
            KwCtx::SubsetDecl => {
                let next = match word.as_str() {
                    "ELEMENT" => State::ElementNameWs,
                    "ATTLIST" => State::AttlistNameWs,
                    "ENTITY" => State::EntityStartWs,
                    "NOTATION" => State::NotationNameWs,
                    _ => return Err(Error::UnknownToken(word)),
                };
                self.require_space(c, "the declaration keyword")?;
                self.to(next)
            }
            KwCtx::ExternalId(ectx) => {
                let next = match word.as_str() {
                    "SYSTEM" => State::SystemLit0(ectx),
                    "PUBLIC" => State::PubidLit0(ectx),
                    _ => return Err(Error::UnknownToken(word)),
                };
                self.require_space(c, &format!("'{word}'"))?;
                self.to(next)
            }
            KwCtx::ContentSpec => {
                self.content = Some(match word.as_str() {
                    "EMPTY" => ContentSpec::Empty,
                    "ANY" => ContentSpec::Any,
                    _ => return Err(Error::UnknownToken(word)),
                });
                self.again(State::ElementDeclEnd)
            }
            KwCtx::Pcdata => {
                if word != "PCDATA" {
                    return Err(Error::UnknownToken(word));
                }
                self.names.clear();
                self.again(State::MixedAfterItem)
            }
            KwCtx::AttType => {
                let ty = match word.as_str() {
                    "CDATA" => AttType::Cdata,
                    "ID" => AttType::Id,
                    "IDREF" => AttType::IdRef,
                    "IDREFS" => AttType::IdRefs,
                    "ENTITY" => AttType::Entity,
                    "ENTITIES" => AttType::Entities,
                    "NMTOKEN" => AttType::NmToken,
                    "NMTOKENS" => AttType::NmTokens,
                    "NOTATION" => {
                        self.require_space(c, "'NOTATION'")?;
                        return self.to(State::NotationGroupWs);
                    }
                    _ => return Err(Error::UnknownToken(word)),
                };
                self.atttype = Some(ty);
                self.require_space(c, "the attribute type")?;
                self.to(State::DefaultWs)
            }
            KwCtx::Default => match word.as_str() {
                "REQUIRED" => {
                    self.push_attdef(DefaultDecl::Required);
                    self.again(State::AttlistAfterDef)
                }
                "IMPLIED" => {
                    self.push_attdef(DefaultDecl::Implied);
                    self.again(State::AttlistAfterDef)
                }
                "FIXED" => {
                    self.require_space(c, "'#FIXED'")?;
                    self.fixed = true;
                    self.to(State::FixedWs)
                }
                _ => Err(Error::UnknownToken(word)),
            },
            KwCtx::Ndata(kind) => {
                if word != "NDATA" {
                    return Err(Error::UnknownToken(word));
                }
                self.require_space(c, "'NDATA'")?;
                self.to(State::NdataNameWs(kind))
            }
            KwCtx::Bang | KwCtx::Cdata => {
                unreachable!("document-level keywords are dispatched in the lexer core")
            }
        }
    }

    // ------------------------------------------------------------------
    // <!ELEMENT name contentspec>

    pub(super) fn element_name_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.decl_name.clear();
                self.decl_name.push(c);
                self.to(State::ElementName)
            }
            _ => syntax!("expected a name after '<!ELEMENT'"),
        }
    }

    pub(super) fn element_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.decl_name.push(c);
                self.cont()
            }
            c if is_space(c) => {
                self.groups.clear();
                self.content = None;
                self.to(State::ContentSpecWs)
            }
            _ => syntax!("expected whitespace after the element name"),
        }
    }

    pub(super) fn content_spec_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '(' => {
                self.groups.push(GroupFrame::default());
                self.to(State::CpItemStart)
            }
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::ContentSpec))
            }
            _ => syntax!("expected a content model after the element name"),
        }
    }

    pub(super) fn cp_item_start(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '(' => {
                self.groups.push(GroupFrame::default());
                self.cont()
            }
            '#' => {
                let outermost = self.groups.len() == 1
                    && self.groups[0].items.is_empty()
                    && self.groups[0].sep.is_none();
                if !outermost {
                    syntax!("'#PCDATA' is only allowed first in the outermost group");
                }
                self.name.clear();
                self.to(State::Keyword(KwCtx::Pcdata))
            }
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::CpName)
            }
            _ => syntax!("expected a name or '(' in a content model"),
        }
    }

    pub(super) fn cp_name(&mut self, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let name = std::mem::take(&mut self.name);
        self.particle = Some(ContentParticle::Name(name, Quantifier::One));
        self.again(State::CpQuant)
    }

    pub(super) fn cp_quant(&mut self, c: char) -> StepResult {
        let quantifier = match c {
            '?' => Some(Quantifier::Opt),
            '*' => Some(Quantifier::Star),
            '+' => Some(Quantifier::Plus),
            _ => None,
        };
        match quantifier {
            Some(q) => {
                self.set_quantifier(q);
                let next = self.attach_particle();
                self.to(next)
            }
            None => {
                let next = self.attach_particle();
                self.again(next)
            }
        }
    }

    /// Move the completed particle into its parent group, or promote it to
    /// the whole content model when the outermost group just closed.
    fn attach_particle(&mut self) -> State {
        let particle = self
            .particle
            .take()
            .expect("a content particle was just completed");
        match self.groups.last_mut() {
            Some(frame) => {
                frame.items.push(particle);
                State::CpAfterItem
            }
            None => {
                self.content = Some(ContentSpec::Children(particle));
                State::ElementDeclEnd
            }
        }
    }

    pub(super) fn cp_after_item(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '|' => {
                self.group_separator(GroupSep::Choice)?;
                self.to(State::CpItemStart)
            }
            ',' => {
                self.group_separator(GroupSep::Seq)?;
                self.to(State::CpItemStart)
            }
            ')' => {
                let frame = self
                    .groups
                    .pop()
                    .expect("a group is open while parsing its items");
                let particle = match frame.sep {
                    Some(GroupSep::Choice) => {
                        ContentParticle::Choice(frame.items, Quantifier::One)
                    }
                    _ => ContentParticle::Seq(frame.items, Quantifier::One),
                };
                self.particle = Some(particle);
                self.to(State::CpQuant)
            }
            c => syntax!("expected '|', ',' or ')' in a content model, found `{c}`"),
        }
    }

    fn group_separator(&mut self, sep: GroupSep) -> Result<(), Error> {
        let frame = self
            .groups
            .last_mut()
            .expect("a group is open while parsing its items");
        match frame.sep {
            None => {
                frame.sep = Some(sep);
                Ok(())
            }
            Some(current) if current == sep => Ok(()),
            Some(_) => Err(Error::Syntax(
                "'|' and ',' cannot be mixed in one group".into(),
            )),
        }
    }

    pub(super) fn mixed_after_item(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '|' => self.to(State::MixedNameWs),
            ')' => {
                let required = !self.names.is_empty();
                self.to(State::MixedStar { required })
            }
            _ => syntax!("expected '|' or ')' after '#PCDATA'"),
        }
    }

    pub(super) fn mixed_name_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::MixedName)
            }
            _ => syntax!("expected a name after '|' in mixed content"),
        }
    }

    pub(super) fn mixed_name(&mut self, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let name = std::mem::take(&mut self.name);
        self.names.push(name);
        self.again(State::MixedAfterItem)
    }

    pub(super) fn mixed_star(&mut self, required: bool, c: char) -> StepResult {
        if c == '*' {
            self.content = Some(ContentSpec::Mixed(std::mem::take(&mut self.names)));
            self.to(State::ElementDeclEnd)
        } else if required {
            syntax!("'*' is required after mixed content with element names")
        } else {
            self.content = Some(ContentSpec::Mixed(std::mem::take(&mut self.names)));
            self.again(State::ElementDeclEnd)
        }
    }

    pub(super) fn element_decl_end(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => {
                let name = std::mem::take(&mut self.decl_name);
                let content = self
                    .content
                    .take()
                    .expect("a content model was just completed");
                self.subset_push(IntSubset::Element { name, content });
                self.to(State::Subset)
            }
            _ => syntax!("expected '>' to close '<!ELEMENT'"),
        }
    }

    // ------------------------------------------------------------------
    // <!ATTLIST name (name type default)*>

    pub(super) fn attlist_name_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.decl_name.clear();
                self.decl_name.push(c);
                self.attdefs.clear();
                self.to(State::AttlistName)
            }
            _ => syntax!("expected a name after '<!ATTLIST'"),
        }
    }

    pub(super) fn attlist_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.decl_name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::AttlistLoop),
            '>' => self.finish_attlist(),
            _ => syntax!("unexpected character `{c}` in '<!ATTLIST'"),
        }
    }

    fn finish_attlist(&mut self) -> StepResult {
        let name = std::mem::take(&mut self.decl_name);
        let defs = std::mem::take(&mut self.attdefs);
        self.subset_push(IntSubset::Attlist { name, defs });
        self.to(State::Subset)
    }

    pub(super) fn attlist_loop(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => self.finish_attlist(),
            c if is_first_namechar(c) => {
                self.attdef_name.clear();
                self.attdef_name.push(c);
                self.to(State::AttDefName)
            }
            c => syntax!("unexpected character `{c}` in '<!ATTLIST'"),
        }
    }

    pub(super) fn attdef_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.attdef_name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::AttTypeWs),
            _ => syntax!("expected whitespace after the attribute name"),
        }
    }

    pub(super) fn att_type_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '(' => {
                self.names.clear();
                self.to(State::EnumItemWs(EnumKind::Nmtoken))
            }
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::AttType))
            }
            _ => syntax!("expected an attribute type"),
        }
    }

    pub(super) fn notation_group_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '(' => {
                self.names.clear();
                self.to(State::EnumItemWs(EnumKind::Name))
            }
            _ => syntax!("expected '(' after 'NOTATION'"),
        }
    }

    pub(super) fn enum_item_ws(&mut self, kind: EnumKind, c: char) -> StepResult {
        let starts = match kind {
            EnumKind::Name => is_first_namechar(c),
            EnumKind::Nmtoken => is_namechar(c),
        };
        match c {
            c if is_space(c) => self.cont(),
            c if starts => {
                self.name.clear();
                self.name.push(c);
                self.to(State::EnumName(kind))
            }
            _ => match kind {
                EnumKind::Name => syntax!("expected a notation name"),
                EnumKind::Nmtoken => syntax!("expected a name token in the enumeration"),
            },
        }
    }

    pub(super) fn enum_name(&mut self, kind: EnumKind, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let name = std::mem::take(&mut self.name);
        self.names.push(name);
        self.again(State::EnumAfter(kind))
    }

    pub(super) fn enum_after(&mut self, kind: EnumKind, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '|' => self.to(State::EnumItemWs(kind)),
            ')' => {
                let names = std::mem::take(&mut self.names);
                self.atttype = Some(match kind {
                    EnumKind::Name => AttType::Notation(names),
                    EnumKind::Nmtoken => AttType::Enumeration(names),
                });
                self.to(State::DefaultWs0)
            }
            _ => syntax!("expected '|' or ')' in the enumeration"),
        }
    }

    pub(super) fn default_ws0(&mut self, c: char) -> StepResult {
        if is_space(c) {
            self.to(State::DefaultWs)
        } else {
            syntax!("expected whitespace before the default declaration")
        }
    }

    pub(super) fn default_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '#' => {
                self.name.clear();
                self.fixed = false;
                self.to(State::Keyword(KwCtx::Default))
            }
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.fixed = false;
                self.to(State::AttrValue(AttCtx::Default))
            }
            _ => syntax!("expected a default declaration"),
        }
    }

    pub(super) fn fixed_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.to(State::AttrValue(AttCtx::Default))
            }
            _ => syntax!("expected a quoted value after '#FIXED'"),
        }
    }

    pub(super) fn attlist_after_def(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.to(State::AttlistLoop),
            '>' => self.finish_attlist(),
            _ => syntax!("expected whitespace between attribute definitions"),
        }
    }

    // ------------------------------------------------------------------
    // <!ENTITY (%)? name (value | externalid (NDATA name)?)>

    pub(super) fn entity_start_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '%' => self.to(State::EntityPct0),
            c if is_first_namechar(c) => {
                self.decl_name.clear();
                self.decl_name.push(c);
                self.to(State::EntityName(EntityKind::General))
            }
            _ => syntax!("expected a name or '%' after '<!ENTITY'"),
        }
    }

    pub(super) fn entity_pct0(&mut self, c: char) -> StepResult {
        if is_space(c) {
            self.to(State::EntityPctWs)
        } else {
            syntax!("expected whitespace after '%' in '<!ENTITY'")
        }
    }

    pub(super) fn entity_pct_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.decl_name.clear();
                self.decl_name.push(c);
                self.to(State::EntityName(EntityKind::Parameter))
            }
            _ => syntax!("expected a parameter-entity name"),
        }
    }

    pub(super) fn entity_name(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.decl_name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::EntityDefWs(kind)),
            _ => syntax!("expected whitespace after the entity name"),
        }
    }

    pub(super) fn entity_def_ws(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '"' | '\'' => {
                self.quote = c;
                self.value.clear();
                self.to(State::EntityValue(kind))
            }
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::ExternalId(ExtCtx::Entity(kind))))
            }
            _ => syntax!("expected an entity value or external identifier"),
        }
    }

    pub(super) fn entity_value(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if c == self.quote => {
                self.entity_def = Some(EntityDef::Internal(std::mem::take(&mut self.value)));
                self.to(State::EntityEnd(kind))
            }
            '&' => self.to(State::RefStart(RefCtx::EntityValue(kind))),
            '%' => {
                self.name.clear();
                self.to(State::PeName(PeCtx::EntityValue(kind)))
            }
            c if is_xmlchar(c) => {
                self.value.push(c);
                self.cont()
            }
            c => syntax!(
                "character U+{:04X} is not allowed in an entity value",
                c as u32
            ),
        }
    }

    pub(super) fn ndata_maybe(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => {
                let id = self.take_ext_id();
                self.entity_def = Some(EntityDef::External { id, ndata: None });
                self.again(State::EntityEnd(kind))
            }
            // An NDATA clause makes an unparsed entity; only general
            // entities can be unparsed.
            c if is_first_namechar(c) => {
                if kind == EntityKind::Parameter {
                    syntax!("'NDATA' is not allowed on a parameter entity");
                }
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::Ndata(kind)))
            }
            _ => syntax!("expected 'NDATA' or '>' after the external identifier"),
        }
    }

    pub(super) fn ndata_name_ws(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::NdataName(kind))
            }
            _ => syntax!("expected a notation name after 'NDATA'"),
        }
    }

    pub(super) fn ndata_name(&mut self, kind: EntityKind, c: char) -> StepResult {
        if is_namechar(c) {
            self.name.push(c);
            return self.cont();
        }
        let id = self.take_ext_id();
        let ndata = Some(std::mem::take(&mut self.name));
        self.entity_def = Some(EntityDef::External { id, ndata });
        self.again(State::EntityEnd(kind))
    }

    pub(super) fn entity_end(&mut self, kind: EntityKind, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => {
                let name = std::mem::take(&mut self.decl_name);
                let def = self
                    .entity_def
                    .take()
                    .expect("an entity definition was just completed");
                let decl = match kind {
                    EntityKind::General => EntityDecl::General { name, def },
                    EntityKind::Parameter => EntityDecl::Parameter { name, def },
                };
                self.subset_push(IntSubset::Entity(decl));
                self.to(State::Subset)
            }
            _ => syntax!("expected '>' to close '<!ENTITY'"),
        }
    }

    fn take_ext_id(&mut self) -> ExternalId {
        self.ext_id
            .take()
            .expect("an external identifier was just parsed")
    }

    // ------------------------------------------------------------------
    // <!NOTATION name externalid>

    pub(super) fn notation_name_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.decl_name.clear();
                self.decl_name.push(c);
                self.to(State::NotationName)
            }
            _ => syntax!("expected a name after '<!NOTATION'"),
        }
    }

    pub(super) fn notation_name(&mut self, c: char) -> StepResult {
        match c {
            c if is_namechar(c) => {
                self.decl_name.push(c);
                self.cont()
            }
            c if is_space(c) => self.to(State::NotationKwWs),
            _ => syntax!("expected whitespace after the notation name"),
        }
    }

    pub(super) fn notation_kw_ws(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            c if is_first_namechar(c) => {
                self.name.clear();
                self.name.push(c);
                self.to(State::Keyword(KwCtx::ExternalId(ExtCtx::Notation)))
            }
            _ => syntax!("expected 'SYSTEM' or 'PUBLIC' in '<!NOTATION'"),
        }
    }

    pub(super) fn notation_end(&mut self, c: char) -> StepResult {
        match c {
            c if is_space(c) => self.cont(),
            '>' => {
                let name = std::mem::take(&mut self.decl_name);
                let id = self.take_ext_id();
                self.subset_push(IntSubset::Notation { name, id });
                self.to(State::Subset)
            }
            _ => syntax!("expected '>' to close '<!NOTATION'"),
        }
    }
}
