use crate::{
    parse_dtd, split_name, AttDef, AttType, ContentParticle, ContentSpec, DefaultDecl, Dtd,
    Encoding, EntityDecl, EntityDef, Error, ExternalId, IntSubset, Parser, Production, Quantifier,
};
use brook_encoding::{Decode, Decoder};
use expect_test::{expect, Expect};
use pretty_assertions::assert_eq;

/// Feed `input` whole with `finish = true` and pull everything through
/// `EndOfData`.
fn collect(input: &[u8]) -> Result<Vec<Production>, Error> {
    collect_with(Parser::new(), input)
}

fn collect_with(mut parser: Parser, input: &[u8]) -> Result<Vec<Production>, Error> {
    let mut events = vec![parser.parse(input, true)?];
    while events.last() != Some(&Production::EndOfData) {
        events.push(parser.parse(&[], false)?);
    }
    Ok(events)
}

/// Feed `input` in `size`-byte chunks, dropping the `EndOfBuffer`
/// suspension markers and the final `EndOfData`.
fn collect_chunked(input: &[u8], size: usize) -> Result<Vec<Production>, Error> {
    let mut parser = Parser::new();
    let mut events = Vec::new();
    let chunks: Vec<&[u8]> = input.chunks(size).collect();
    for (i, chunk) in chunks.iter().enumerate() {
        let mut token = parser.parse(chunk, i == chunks.len() - 1)?;
        loop {
            match token {
                Production::EndOfBuffer => break,
                Production::EndOfData => return Ok(events),
                other => events.push(other),
            }
            token = parser.parse(&[], false)?;
        }
    }
    Ok(events)
}

/// Merge the partial text runs that chunk boundaries produce, so that
/// differently chunked parses can be compared event for event.
fn coalesce(events: Vec<Production>) -> Vec<Production> {
    let mut out: Vec<Production> = Vec::new();
    let mut run = String::new();
    fn flush(run: &mut String, out: &mut Vec<Production>) {
        if !run.is_empty() {
            let s = std::mem::take(run);
            if s.chars().all(|c| crate::chars::is_space(c)) {
                out.push(Production::Whitespace(s));
            } else {
                out.push(Production::Text(s));
            }
        }
    }
    for event in events {
        match event {
            Production::Text(s) | Production::Whitespace(s) => run.push_str(&s),
            Production::Cdata(s) => {
                flush(&mut run, &mut out);
                if let Some(Production::Cdata(prev)) = out.last_mut() {
                    prev.push_str(&s);
                } else {
                    out.push(Production::Cdata(s));
                }
            }
            other => {
                flush(&mut run, &mut out);
                out.push(other);
            }
        }
    }
    flush(&mut run, &mut out);
    out
}

/// One line per event, for snapshot tests.
fn render(events: &[Production]) -> String {
    let mut out = String::new();
    for event in events {
        let line = match event {
            Production::StartElement { name, attributes } => {
                format!("start {name}{}", render_attrs(attributes))
            }
            Production::EmptyElement { name, attributes } => {
                format!("empty {name}{}", render_attrs(attributes))
            }
            Production::EndElement { name } => format!("end {name}"),
            Production::Text(s) => format!("text {s:?}"),
            Production::Whitespace(s) => format!("whitespace {s:?}"),
            Production::Cdata(s) => format!("cdata {s:?}"),
            Production::Pi { target, data } => format!("pi {target} {data:?}"),
            Production::Comment(s) => format!("comment {s:?}"),
            Production::Doctype(dtd) => format!("doctype {dtd}"),
            Production::EndOfBuffer => "suspend".to_string(),
            Production::EndOfData => "eod".to_string(),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn render_attrs(attributes: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in attributes {
        out.push_str(&format!(" {name}={value:?}"));
    }
    out
}

fn check(input: &[u8], expected: Expect) {
    expected.assert_eq(&render(&collect(input).unwrap()));
}

fn element(name: &str, attributes: &[(&str, &str)], empty: bool) -> Production {
    let name = name.to_string();
    let attributes = attributes
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();
    if empty {
        Production::EmptyElement { name, attributes }
    } else {
        Production::StartElement { name, attributes }
    }
}

// ----------------------------------------------------------------------
// the end-to-end scenarios

#[test]
fn declaration_and_empty_element() {
    let events = collect(br#"<?xml version="1.0" encoding="UTF-8"?><r a="1" b='2'/>"#).unwrap();
    assert_eq!(
        events,
        vec![
            element("r", &[("a", "1"), ("b", "2")], true),
            Production::EndOfData,
        ]
    );
}

#[test]
fn mixed_content() {
    check(
        b"<a>x&amp;y<!--c--><![CDATA[<z>]]></a>",
        expect![[r#"
            start a
            text "x&y"
            comment "c"
            cdata "<z>"
            end a
            eod
        "#]],
    );
}

#[test]
fn newlines_are_normalized() {
    let events = collect(b"<a>\r\nhi\r</a>").unwrap();
    assert_eq!(
        events,
        vec![
            element("a", &[], false),
            Production::Text("\nhi\n".into()),
            Production::EndElement { name: "a".into() },
            Production::EndOfData,
        ]
    );
}

#[test]
fn cdata_end_in_text_is_fatal() {
    let mut parser = Parser::new();
    assert_eq!(
        parser.parse(b"<a>]]></a>", true).unwrap(),
        element("a", &[], false)
    );
    assert_eq!(
        parser.parse(&[], false),
        Err(Error::Syntax("']]>' is not allowed in text".into()))
    );
}

#[test]
fn doctype_with_internal_subset() {
    let events =
        collect(b"<!DOCTYPE x [<!ELEMENT p (#PCDATA|q)*><!ATTLIST p id ID #REQUIRED>]><x/>")
            .unwrap();
    assert_eq!(
        events,
        vec![
            Production::Doctype(Dtd {
                name: "x".into(),
                external_id: None,
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
            }),
            element("x", &[], true),
            Production::EndOfData,
        ]
    );
}

#[test]
fn suspension_and_resumption() {
    let mut parser = Parser::new();
    assert_eq!(
        parser.parse(b"<a", false).unwrap(),
        Production::EndOfBuffer
    );
    assert_eq!(
        parser.parse(b">hi</a>", true).unwrap(),
        element("a", &[], false)
    );
    assert_eq!(
        parser.parse(&[], false).unwrap(),
        Production::Text("hi".into())
    );
    assert_eq!(
        parser.parse(&[], false).unwrap(),
        Production::EndElement { name: "a".into() }
    );
    assert_eq!(parser.parse(&[], false).unwrap(), Production::EndOfData);
    assert!(!parser.is_parsing());
    assert_eq!(parser.parse(&[], false), Err(Error::Finished));
}

// ----------------------------------------------------------------------
// quantified properties

#[test]
fn chunk_independence() {
    let input: &[u8] = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n\
         <!DOCTYPE r [<!ELEMENT r ANY><!ENTITY % pe \"v\">]>\r\n\
         <r a=\"x&#65;y\" b='&quot;'>h\u{E9}llo &amp; w\u{F6}rld\r\
         <!--remark--><![CDATA[a]]b>]]><x/>\r\n tail</r>\n"
        .as_bytes();
    let whole = coalesce(collect_chunked(input, input.len()).unwrap());
    for size in [1, 2, 3, 5, 7, 11, 64] {
        let chunked = coalesce(collect_chunked(input, size).unwrap());
        assert_eq!(chunked, whole, "chunk size {size}");
    }
}

#[test]
fn builtin_entities_in_text_and_attributes() {
    let events = collect(
        br#"<a t="&lt;&gt;&amp;&apos;&quot;">&lt;&gt;&amp;&apos;&quot;</a>"#,
    )
    .unwrap();
    assert_eq!(
        events,
        vec![
            element("a", &[("t", "<>&'\"")], false),
            Production::Text("<>&'\"".into()),
            Production::EndElement { name: "a".into() },
            Production::EndOfData,
        ]
    );
}

#[test]
fn attribute_order_and_duplicates_are_preserved() {
    let events = collect(br#"<a x="1" y="2" x="3"/>"#).unwrap();
    assert_eq!(
        events,
        vec![
            element("a", &[("x", "1"), ("y", "2"), ("x", "3")], true),
            Production::EndOfData,
        ]
    );
}

#[test]
fn character_references() {
    let events = collect(b"<a>&#65;&#x42;&#x1F600;</a>").unwrap();
    assert_eq!(
        events[1],
        Production::Text("AB\u{1F600}".into())
    );

    let mut parser = Parser::new();
    parser.parse(b"<a>", false).unwrap();
    assert_eq!(
        collect_rest(&mut parser, b"&#0;</a>"),
        Err(Error::InvalidChar(0))
    );

    let mut parser = Parser::new();
    parser.parse(b"<a>", false).unwrap();
    assert_eq!(
        collect_rest(&mut parser, b"&#xFFFE;</a>"),
        Err(Error::InvalidChar(0xFFFE))
    );
}

fn collect_rest(parser: &mut Parser, rest: &[u8]) -> Result<Vec<Production>, Error> {
    let mut events = vec![parser.parse(rest, true)?];
    while events.last() != Some(&Production::EndOfData) {
        events.push(parser.parse(&[], false)?);
    }
    Ok(events)
}

// ----------------------------------------------------------------------
// error locality

#[test]
fn angle_bracket_in_attribute_value_is_fatal() {
    let err = collect(br#"<a x="<"/>"#).unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("'<' is not allowed in attribute values".into())
    );
    // A character reference producing '<' is fine.
    let events = collect(br#"<a x="&lt;"/>"#).unwrap();
    assert_eq!(events[0], element("a", &[("x", "<")], true));
}

#[test]
fn double_dash_in_comment_is_fatal() {
    let err = collect(b"<a><!-- x -- y --></a>").unwrap_err();
    assert_eq!(err, Error::Syntax("'--' is not allowed in a comment".into()));
    let err = collect(b"<a><!--x--->").unwrap_err();
    assert_eq!(err, Error::Syntax("'--' is not allowed in a comment".into()));
}

#[test]
fn text_in_prolog_is_fatal() {
    assert_eq!(
        collect(b"text<a/>"),
        Err(Error::Syntax(
            "text is not allowed before the root element".into()
        ))
    );
}

#[test]
fn doctype_restrictions() {
    let err = collect(b"<a><!DOCTYPE x></a>").unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("'<!DOCTYPE' is only allowed in the prolog".into())
    );
    let err = collect(b"<!DOCTYPE x><!DOCTYPE y><a/>").unwrap_err();
    assert_eq!(err, Error::Syntax("only one '<!DOCTYPE' is allowed".into()));
}

#[test]
fn xml_declaration_only_at_start() {
    let err = collect(b"<a><?xml version=\"1.0\"?></a>").unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("the processing-instruction target `xml` is reserved".into())
    );
    let err = collect(b" <?xml version=\"1.0\"?><a/>").unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("the processing-instruction target `xml` is reserved".into())
    );
    assert!(collect(b"<?xml version=\"1.1\"?><a/>").is_err());
}

#[test]
fn unknown_dtd_keyword() {
    let err = collect(b"<!DOCTYPE x [<!FOO>]><x/>").unwrap_err();
    assert_eq!(err, Error::UnknownToken("FOO".into()));
    let err = collect(b"<!DOCTYPE x SYSTEMX \"s\"><x/>").unwrap_err();
    assert_eq!(err, Error::UnknownToken("SYSTEMX".into()));
}

#[test]
fn unfinished_document_is_fatal() {
    assert_eq!(
        collect(b"<a><b>unclosed comment <!-- "),
        Err(Error::Syntax("unexpected end of input".into()))
    );
}

#[test]
fn too_few_bytes_to_detect() {
    let mut parser = Parser::new();
    assert_eq!(parser.parse(b"<a", true), Err(Error::TooFew));
    // Without finish, short input merely suspends.
    let mut parser = Parser::new();
    assert_eq!(parser.parse(b"<a", false).unwrap(), Production::EndOfBuffer);
}

// ----------------------------------------------------------------------
// entity resolution

#[test]
fn default_resolver_rejects_unknown_entities() {
    let mut parser = Parser::new();
    parser.parse(b"<a>", false).unwrap();
    assert_eq!(
        parser.parse(b"&nope;</a>", true),
        Err(Error::UnknownEntity("nope".into()))
    );
}

#[test]
fn custom_resolver_inlines_verbatim() {
    let parser = Parser::new().entity_resolver(|name| Ok(format!("[{name}]")));
    let events = collect_with(parser, b"<a v=\"&x;\">&y;</a>").unwrap();
    assert_eq!(events[0], element("a", &[("v", "[x]")], false));
    assert_eq!(events[1], Production::Text("[y]".into()));

    // Replacement text is not re-lexed: markup comes through as text.
    let parser = Parser::new().entity_resolver(|_| Ok("<b>&amp;</b>".into()));
    let events = collect_with(parser, b"<a>&markup;</a>").unwrap();
    assert_eq!(events[1], Production::Text("<b>&amp;</b>".into()));
}

#[test]
fn resolver_errors_propagate() {
    let parser = Parser::new().entity_resolver(|name| Err(Error::UnknownEntity(name.into())));
    assert_eq!(
        collect_with(parser, b"<a>&gone;</a>"),
        Err(Error::UnknownEntity("gone".into()))
    );
}

#[test]
fn expansion_limit_is_enforced() {
    let parser = Parser::new()
        .entity_resolver(|_| Ok("0123456789".into()))
        .expansion_limit(25);
    let events = collect_with(parser, b"<a>&e;&e;</a>").unwrap();
    assert_eq!(coalesce(events)[1], Production::Text("01234567890123456789".into()));

    let parser = Parser::new()
        .entity_resolver(|_| Ok("0123456789".into()))
        .expansion_limit(25);
    assert_eq!(
        collect_with(parser, b"<a>&e;&e;&e;</a>"),
        Err(Error::ExpansionLimit)
    );
}

// ----------------------------------------------------------------------
// encodings

#[test]
fn utf16_with_byte_order_mark() {
    for (encoding, bom) in [(Encoding::Utf16Be, [0xFEu8, 0xFF]), (Encoding::Utf16Le, [0xFF, 0xFE])]
    {
        let mut bytes: Vec<u8> = bom.to_vec();
        for unit in "<a>h\u{E9}\u{10348}</a>".encode_utf16() {
            let pair = match encoding {
                Encoding::Utf16Be => unit.to_be_bytes(),
                _ => unit.to_le_bytes(),
            };
            bytes.extend_from_slice(&pair);
        }
        let events = collect(&bytes).unwrap();
        assert_eq!(
            events,
            vec![
                element("a", &[], false),
                Production::Text("h\u{E9}\u{10348}".into()),
                Production::EndElement { name: "a".into() },
                Production::EndOfData,
            ],
            "{encoding}"
        );
    }
}

#[test]
fn explicit_latin1() {
    let parser = Parser::new().encoding(Encoding::Latin1);
    let events = collect_with(parser, b"<a v=\"\xE9\"/>").unwrap();
    assert_eq!(events[0], element("a", &[("v", "\u{E9}")], true));
}

#[test]
fn ascii_rejects_high_bytes() {
    let parser = Parser::new().encoding(Encoding::Ascii);
    let err = collect_with(parser, b"<a>\xE9</a>").unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
}

#[test]
fn declaration_switches_the_decoder() {
    // Detection sees ASCII-compatible bytes, the declaration revises the
    // encoding to Latin-1 before the 0xE9 byte arrives.
    let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a v=\"\xE9\"/>";
    let events = collect(input).unwrap();
    assert_eq!(events[0], element("a", &[("v", "\u{E9}")], true));
}

#[test]
fn unknown_encoding_without_handler_is_fatal() {
    let err = collect(b"<?xml version=\"1.0\" encoding=\"x-custom\"?><a/>").unwrap_err();
    assert_eq!(err, Error::UnknownEncoding("x-custom".into()));
}

#[test]
fn unknown_encoding_handler_supplies_a_decoder() {
    let parser = Parser::new().unknown_encoding_handler(|label| {
        (label == "x-custom").then(|| {
            Box::new(Decoder::new(Encoding::Latin1)) as Box<dyn Decode>
        })
    });
    let input = b"<?xml version=\"1.0\" encoding=\"x-custom\"?><a v=\"\xE9\"/>";
    let events = collect_with(parser, input).unwrap();
    assert_eq!(events[0], element("a", &[("v", "\u{E9}")], true));
}

#[test]
fn utf8_byte_order_mark_is_skipped() {
    let events = collect(b"\xEF\xBB\xBF<a/>").unwrap();
    assert_eq!(events[0], element("a", &[], true));
}

// ----------------------------------------------------------------------
// the DOCTYPE machinery

#[test]
fn doctype_external_ids() {
    let events = collect(b"<!DOCTYPE x SYSTEM \"x.dtd\"><x/>").unwrap();
    assert_eq!(
        events[0],
        Production::Doctype(Dtd {
            name: "x".into(),
            external_id: Some(ExternalId::System("x.dtd".into())),
            internal_subset: vec![],
        })
    );

    let events = collect(b"<!DOCTYPE x PUBLIC '-//X//EN' 'x.dtd' [ ]><x/>").unwrap();
    assert_eq!(
        events[0],
        Production::Doctype(Dtd {
            name: "x".into(),
            external_id: Some(ExternalId::Public("-//X//EN".into(), "x.dtd".into())),
            internal_subset: vec![],
        })
    );
}

#[test]
fn content_models() {
    let input = b"<!DOCTYPE d [\
        <!ELEMENT a EMPTY>\
        <!ELEMENT b ANY>\
        <!ELEMENT c (#PCDATA)>\
        <!ELEMENT e (head?, (p | ul)*, back)>\
    ]><d/>";
    let Production::Doctype(dtd) = &collect(input).unwrap()[0].clone() else {
        panic!("expected a doctype");
    };
    assert_eq!(
        dtd.internal_subset,
        vec![
            IntSubset::Element {
                name: "a".into(),
                content: ContentSpec::Empty,
            },
            IntSubset::Element {
                name: "b".into(),
                content: ContentSpec::Any,
            },
            IntSubset::Element {
                name: "c".into(),
                content: ContentSpec::Mixed(vec![]),
            },
            IntSubset::Element {
                name: "e".into(),
                content: ContentSpec::Children(ContentParticle::Seq(
                    vec![
                        ContentParticle::Name("head".into(), Quantifier::Opt),
                        ContentParticle::Choice(
                            vec![
                                ContentParticle::Name("p".into(), Quantifier::One),
                                ContentParticle::Name("ul".into(), Quantifier::One),
                            ],
                            Quantifier::Star,
                        ),
                        ContentParticle::Name("back".into(), Quantifier::One),
                    ],
                    Quantifier::One,
                )),
            },
        ]
    );
}

#[test]
fn mixed_content_requires_star_with_names() {
    let err = collect(b"<!DOCTYPE d [<!ELEMENT p (#PCDATA|q)>]><d/>").unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("'*' is required after mixed content with element names".into())
    );
}

#[test]
fn group_separators_cannot_mix() {
    let err = collect(b"<!DOCTYPE d [<!ELEMENT e (a|b,c)>]><d/>").unwrap_err();
    assert_eq!(
        err,
        Error::Syntax("'|' and ',' cannot be mixed in one group".into())
    );
}

#[test]
fn attlist_declarations() {
    let input = b"<!DOCTYPE d [\
        <!ATTLIST t a CDATA #IMPLIED b (x|y) \"x\" c NOTATION (n1|n2) #FIXED \"n1\">\
    ]><d/>";
    let Production::Doctype(dtd) = &collect(input).unwrap()[0].clone() else {
        panic!("expected a doctype");
    };
    assert_eq!(
        dtd.internal_subset,
        vec![IntSubset::Attlist {
            name: "t".into(),
            defs: vec![
                AttDef {
                    name: "a".into(),
                    ty: AttType::Cdata,
                    default: DefaultDecl::Implied,
                },
                AttDef {
                    name: "b".into(),
                    ty: AttType::Enumeration(vec!["x".into(), "y".into()]),
                    default: DefaultDecl::Value("x".into()),
                },
                AttDef {
                    name: "c".into(),
                    ty: AttType::Notation(vec!["n1".into(), "n2".into()]),
                    default: DefaultDecl::Fixed("n1".into()),
                },
            ],
        }]
    );
}

#[test]
fn entity_and_notation_declarations() {
    let input = b"<!DOCTYPE d [\
        <!ENTITY % pe \"(#PCDATA)\">\
        <!ENTITY e \"a&lt;b&#33;&other;%p;\">\
        <!ENTITY pic SYSTEM \"pic.gif\" NDATA gif>\
        <!NOTATION gif PUBLIC \"-//GIF\">\
        %pe;\
        <?sort keep?>\
        <!--subset comment-->\
    ]><d/>";
    let Production::Doctype(dtd) = &collect(input).unwrap()[0].clone() else {
        panic!("expected a doctype");
    };
    assert_eq!(
        dtd.internal_subset,
        vec![
            IntSubset::Entity(EntityDecl::Parameter {
                name: "pe".into(),
                def: EntityDef::Internal("(#PCDATA)".into()),
            }),
            // Character and built-in references expand; other references
            // are carried through verbatim.
            IntSubset::Entity(EntityDecl::General {
                name: "e".into(),
                def: EntityDef::Internal("a<b!&other;%p;".into()),
            }),
            IntSubset::Entity(EntityDecl::General {
                name: "pic".into(),
                def: EntityDef::External {
                    id: ExternalId::System("pic.gif".into()),
                    ndata: Some("gif".into()),
                },
            }),
            IntSubset::Notation {
                name: "gif".into(),
                id: ExternalId::Public("-//GIF".into(), String::new()),
            },
            IntSubset::DeclSect("pe".into()),
            IntSubset::Pi {
                target: "sort".into(),
                data: "keep".into(),
            },
            IntSubset::Comment("subset comment".into()),
        ]
    );
}

#[test]
fn ndata_is_for_general_entities_only() {
    let input = b"<!DOCTYPE d [<!ENTITY % pe SYSTEM \"x\" NDATA n>]><d/>";
    assert_eq!(
        collect(input),
        Err(Error::Syntax(
            "'NDATA' is not allowed on a parameter entity".into()
        ))
    );
    // An external parameter entity without the clause stays legal.
    let input = b"<!DOCTYPE d [<!ENTITY % pe SYSTEM \"x\">]><d/>";
    let Production::Doctype(dtd) = &collect(input).unwrap()[0].clone() else {
        panic!("expected a doctype");
    };
    assert_eq!(
        dtd.internal_subset,
        vec![IntSubset::Entity(EntityDecl::Parameter {
            name: "pe".into(),
            def: EntityDef::External {
                id: ExternalId::System("x".into()),
                ndata: None,
            },
        })]
    );
}

#[test]
fn parse_dtd_standalone() {
    let token = parse_dtd(
        "<!ELEMENT p (#PCDATA)>\n<!ATTLIST p id ID #IMPLIED>\n<!ENTITY nbsp \"&#160;\">",
    )
    .unwrap();
    let Production::Doctype(dtd) = token else {
        panic!("expected a doctype");
    };
    assert_eq!(dtd.name, "");
    assert_eq!(dtd.external_id, None);
    assert_eq!(dtd.internal_subset.len(), 3);
    assert_eq!(
        dtd.internal_subset[2],
        IntSubset::Entity(EntityDecl::General {
            name: "nbsp".into(),
            def: EntityDef::Internal("\u{A0}".into()),
        })
    );

    assert!(parse_dtd("<!ELEMENT p (#PCDATA)").is_err());
    assert!(parse_dtd("]>").is_err());
}

// ----------------------------------------------------------------------
// odds and ends

#[test]
fn processing_instructions() {
    check(
        b"<?go there now?><a><?noop?><?q a?b??></a>",
        expect![[r#"
            pi go "there now"
            start a
            pi noop ""
            pi q "a?b?"
            end a
            eod
        "#]],
    );
}

#[test]
fn whitespace_runs_have_their_own_production() {
    check(
        b"<a>\n  <b/> x\n</a>\n",
        expect![[r#"
            start a
            whitespace "\n  "
            empty b
            text " x\n"
            end a
            whitespace "\n"
            eod
        "#]],
    );
}

#[test]
fn nesting_is_the_consumers_problem() {
    // The lexer emits paired events without keeping an element stack;
    // mismatched or trailing content is reported as seen.
    check(
        b"<a></b>trailing</a>",
        expect![[r#"
            start a
            end b
            text "trailing"
            end a
            eod
        "#]],
    );
}

#[test]
fn cdata_keeps_markup_inert() {
    let events = collect(b"<a><![CDATA[ <b>&amp;]]b> ]]></a>").unwrap();
    assert_eq!(events[1], Production::Cdata(" <b>&amp;]]b> ".into()));
}

#[test]
fn rest_buffer_returns_unconsumed_bytes() {
    let mut parser = Parser::new();
    let token = parser.parse(b"<a><b>rest", false).unwrap();
    assert_eq!(token, element("a", &[], false));
    assert_eq!(parser.rest_buffer(), b"<b>rest");
}

#[test]
fn reset_reuses_the_handle() {
    let mut parser = Parser::new();
    parser.parse(b"<a>partial", false).unwrap();
    parser.reset();
    assert!(parser.is_parsing());
    let token = parser.parse(b"<b/>", true).unwrap();
    assert_eq!(token, element("b", &[], true));
}

#[test]
fn set_entity_resolver_replaces_the_resolver() {
    let mut parser = Parser::new();
    parser.set_entity_resolver(|_| Ok("!".into()));
    let events = collect_rest(&mut parser, b"<a>&e;</a>").unwrap();
    assert_eq!(events[1], Production::Text("!".into()));
}

#[test]
fn partial_text_runs_across_suspension() {
    let mut parser = Parser::new();
    assert_eq!(
        parser.parse(b"<a>part", false).unwrap(),
        element("a", &[], false)
    );
    // The run so far is flushed at suspension…
    assert_eq!(
        parser.parse(&[], false).unwrap(),
        Production::Text("part".into())
    );
    assert_eq!(parser.parse(&[], false).unwrap(), Production::EndOfBuffer);
    // …and the continuation arrives as a second Text event.
    assert_eq!(
        parser.parse(b"ial</a>", true).unwrap(),
        Production::Text("ial".into())
    );
}

#[test]
fn split_names() {
    assert_eq!(split_name("a:b"), ("a", "b"));
    assert_eq!(split_name("plain"), ("", "plain"));
    assert_eq!(split_name(":odd"), ("", "odd"));
    assert_eq!(split_name("trailing:"), ("trailing", ""));
}

#[test]
fn doctype_renders_back_to_source_form() {
    let input = b"<!DOCTYPE x [<!ELEMENT p (#PCDATA|q)*><!ATTLIST p id ID #REQUIRED>]><x/>";
    let Production::Doctype(dtd) = &collect(input).unwrap()[0].clone() else {
        panic!("expected a doctype");
    };
    assert_eq!(
        dtd.to_string(),
        "<!DOCTYPE x [<!ELEMENT p (#PCDATA|q)*><!ATTLIST p id ID #REQUIRED>]>"
    );
}
