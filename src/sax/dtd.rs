//! Internal subset parsing for the event parser.
//!
//! Each markup declaration is reported through the matching
//! [`SaxHandler`](super::SaxHandler) callback as soon as it is read.
//! Whitespace between declarations and parameter entity references go to
//! the default channel unexpanded.

use crate::error::Result;
use crate::parser::input::expand_char_refs;

use super::{AttlistDecl, ContentModel, EntityDecl, NotationDecl, Occurrence, SaxParser};

impl SaxParser<'_, '_> {
    /// Parses declarations up to (not including) the closing `]`.
    pub(super) fn parse_internal_subset(&mut self) -> Result<()> {
        loop {
            self.mark();
            let ws = self.input.take_whitespace();
            if !ws.is_empty() {
                self.handler.unclaimed(&ws)?;
                continue;
            }
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in internal subset")
                    .into());
            }
            if self.input.peek() == Some(b']') {
                return Ok(());
            }

            if self.input.looking_at(b"<!--") {
                self.parse_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction()?;
            } else if self.input.looking_at(b"<!ELEMENT") {
                self.parse_element_decl()?;
            } else if self.input.looking_at(b"<!ATTLIST") {
                self.parse_attlist_decl()?;
            } else if self.input.looking_at(b"<!ENTITY") {
                self.parse_entity_decl()?;
            } else if self.input.looking_at(b"<!NOTATION") {
                self.parse_notation_decl()?;
            } else if self.input.peek() == Some(b'%') {
                self.parse_pe_reference()?;
            } else {
                return Err(self
                    .input
                    .fatal(format!(
                        "unexpected character '{}' in internal subset",
                        self.input.peek().map_or('?', |b| b as char)
                    ))
                    .into());
            }
        }
    }

    /// `%name;` between declarations. The referenced text is never read, so
    /// any later undeclared entity may have been declared there.
    fn parse_pe_reference(&mut self) -> Result<()> {
        self.input.expect_byte(b'%')?;
        let name = self.input.parse_name()?;
        self.input.expect_byte(b';')?;
        self.input.entities.mark_incomplete();
        self.handler.unclaimed(&format!("%{name};"))
    }

    // --- ELEMENT declaration ---
    // See XML 1.0 §3.2: [45] elementdecl

    fn parse_element_decl(&mut self) -> Result<()> {
        self.input.expect_str(b"<!ELEMENT")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace_required()?;
        let model = self.parse_content_model()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;
        self.handler.element_decl(&name, &model)
    }

    fn parse_content_model(&mut self) -> Result<ContentModel> {
        if self.input.looking_at(b"EMPTY") {
            self.input.expect_str(b"EMPTY")?;
            return Ok(ContentModel::Empty);
        }
        if self.input.looking_at(b"ANY") {
            self.input.expect_str(b"ANY")?;
            return Ok(ContentModel::Any);
        }

        self.input.expect_byte(b'(')?;
        self.input.skip_whitespace();

        if !self.input.looking_at(b"#PCDATA") {
            return self.parse_group();
        }

        // See XML 1.0 §3.2.2: [51] Mixed
        self.input.expect_str(b"#PCDATA")?;
        self.input.skip_whitespace();
        if self.input.peek() == Some(b')') {
            self.input.advance(1);
            let occurrence = if self.input.peek() == Some(b'*') {
                self.input.advance(1);
                Occurrence::ZeroOrMore
            } else {
                Occurrence::Once
            };
            return Ok(ContentModel::Mixed {
                children: Vec::new(),
                occurrence,
            });
        }

        let mut children = Vec::new();
        while self.input.peek() == Some(b'|') {
            self.input.advance(1);
            self.input.skip_whitespace();
            let name = self.input.parse_name()?;
            children.push(ContentModel::Name {
                name,
                occurrence: Occurrence::Once,
            });
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b')')?;
        self.input.expect_byte(b'*')?;
        Ok(ContentModel::Mixed {
            children,
            occurrence: Occurrence::ZeroOrMore,
        })
    }

    /// Parses a `choice` or `seq` group after its opening `(`.
    ///
    /// The separator is fixed by the first one seen; mixing `,` and `|` in
    /// one group is an error.
    fn parse_group(&mut self) -> Result<ContentModel> {
        let mut children = vec![self.parse_particle()?];
        self.input.skip_whitespace();

        let separator = match self.input.peek() {
            Some(sep @ (b',' | b'|')) => Some(sep),
            _ => None,
        };
        if let Some(separator) = separator {
            while let Some(b) = self.input.peek() {
                if b == b')' {
                    break;
                }
                if b != separator {
                    return Err(self
                        .input
                        .fatal("mixed ',' and '|' in content model group")
                        .into());
                }
                self.input.advance(1);
                self.input.skip_whitespace();
                children.push(self.parse_particle()?);
                self.input.skip_whitespace();
            }
        }
        self.input.expect_byte(b')')?;
        let occurrence = self.parse_occurrence();

        Ok(if separator == Some(b'|') {
            ContentModel::Choice {
                children,
                occurrence,
            }
        } else {
            ContentModel::Seq {
                children,
                occurrence,
            }
        })
    }

    fn parse_particle(&mut self) -> Result<ContentModel> {
        if self.input.peek() == Some(b'(') {
            self.input.advance(1);
            self.input.skip_whitespace();
            return self.parse_group();
        }
        let name = self.input.parse_name()?;
        let occurrence = self.parse_occurrence();
        Ok(ContentModel::Name { name, occurrence })
    }

    fn parse_occurrence(&mut self) -> Occurrence {
        let occurrence = match self.input.peek() {
            Some(b'?') => Occurrence::Optional,
            Some(b'*') => Occurrence::ZeroOrMore,
            Some(b'+') => Occurrence::OneOrMore,
            _ => return Occurrence::Once,
        };
        self.input.advance(1);
        occurrence
    }

    // --- ATTLIST declaration ---
    // See XML 1.0 §3.3: [52] AttlistDecl

    fn parse_attlist_decl(&mut self) -> Result<()> {
        self.input.expect_str(b"<!ATTLIST")?;
        self.input.skip_whitespace_required()?;
        let element = self.input.parse_name()?;

        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') {
                self.input.advance(1);
                return Ok(());
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required").into());
            }

            let attribute = self.input.parse_name()?;
            self.input.skip_whitespace_required()?;
            let attr_type = self.parse_attribute_type()?;
            self.input.skip_whitespace_required()?;
            let (default, required) = self.parse_attribute_default()?;

            self.handler.attlist_decl(&AttlistDecl {
                element: element.clone(),
                attribute,
                attr_type,
                default,
                required,
            })?;
        }
    }

    fn parse_attribute_type(&mut self) -> Result<String> {
        // Longer keywords first: IDREFS before IDREF before ID.
        const KEYWORDS: [&str; 8] = [
            "CDATA", "IDREFS", "IDREF", "ID", "ENTITIES", "ENTITY", "NMTOKENS", "NMTOKEN",
        ];
        if let Some(keyword) = KEYWORDS
            .into_iter()
            .find(|k| self.input.looking_at(k.as_bytes()))
        {
            self.input.expect_str(keyword.as_bytes())?;
            return Ok(keyword.to_string());
        }
        if self.input.looking_at(b"NOTATION") {
            self.input.expect_str(b"NOTATION")?;
            self.input.skip_whitespace_required()?;
            let values = self.parse_enumerated_values(true)?;
            return Ok(format!("NOTATION ({})", values.join("|")));
        }
        if self.input.peek() == Some(b'(') {
            let values = self.parse_enumerated_values(false)?;
            return Ok(format!("({})", values.join("|")));
        }
        Err(self.input.fatal("expected attribute type").into())
    }

    fn parse_enumerated_values(&mut self, names: bool) -> Result<Vec<String>> {
        self.input.expect_byte(b'(')?;
        let mut values = Vec::new();
        loop {
            self.input.skip_whitespace();
            values.push(if names {
                self.input.parse_name()?
            } else {
                self.input.parse_nmtoken()?
            });
            self.input.skip_whitespace();
            if self.input.peek() == Some(b')') {
                self.input.advance(1);
                return Ok(values);
            }
            self.input.expect_byte(b'|')?;
        }
    }

    /// Returns `(default value, required)`.
    fn parse_attribute_default(&mut self) -> Result<(Option<String>, bool)> {
        if self.input.looking_at(b"#REQUIRED") {
            self.input.expect_str(b"#REQUIRED")?;
            return Ok((None, true));
        }
        if self.input.looking_at(b"#IMPLIED") {
            self.input.expect_str(b"#IMPLIED")?;
            return Ok((None, false));
        }
        let fixed = self.input.looking_at(b"#FIXED");
        if fixed {
            self.input.expect_str(b"#FIXED")?;
            self.input.skip_whitespace_required()?;
        }
        let value = self.input.parse_attribute_value()?;
        Ok((Some(value), fixed))
    }

    // --- ENTITY declaration ---
    // See XML 1.0 §4.2: [70] EntityDecl

    fn parse_entity_decl(&mut self) -> Result<()> {
        self.input.expect_str(b"<!ENTITY")?;
        self.input.skip_whitespace_required()?;

        let is_parameter = self.input.peek() == Some(b'%');
        if is_parameter {
            self.input.advance(1);
            self.input.skip_whitespace_required()?;
        }
        let name = self.input.parse_name()?;
        if name.contains(':') {
            return Err(self
                .input
                .fatal(format!("entity name '{name}' must not contain a colon"))
                .into());
        }
        self.input.skip_whitespace_required()?;

        let mut decl = EntityDecl {
            name,
            is_parameter,
            base: self.options.base_uri.clone(),
            ..EntityDecl::default()
        };

        if matches!(self.input.peek(), Some(b'"' | b'\'')) {
            let literal = self.input.parse_quoted_value()?;
            // WFC: PEs in Internal Subset (XML 1.0 §2.8)
            if literal.contains('%') {
                return Err(self
                    .input
                    .fatal("parameter entity reference in entity value")
                    .into());
            }
            let value = expand_char_refs(&literal).ok_or_else(|| {
                self.input
                    .fatal(format!("invalid character reference in entity '{}'", decl.name))
            })?;
            decl.value = Some(value);
        } else {
            let (system_id, public_id) = self.parse_external_id(false)?;
            decl.system_id = system_id;
            decl.public_id = public_id;
        }

        let had_ws = self.input.skip_whitespace();
        if self.input.looking_at(b"NDATA") {
            if decl.value.is_some() || is_parameter {
                return Err(self
                    .input
                    .fatal("NDATA annotation is only allowed on external general entities")
                    .into());
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required before NDATA").into());
            }
            self.input.expect_str(b"NDATA")?;
            self.input.skip_whitespace_required()?;
            decl.notation = Some(self.input.parse_name()?);
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b'>')?;

        if !is_parameter {
            self.input
                .entities
                .declare(&decl.name, decl.value.as_deref());
        }

        self.handler.entity_decl(&decl)
    }

    // --- NOTATION declaration ---
    // See XML 1.0 §4.7: [82] NotationDecl

    fn parse_notation_decl(&mut self) -> Result<()> {
        self.input.expect_str(b"<!NOTATION")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace_required()?;
        if !self.input.looking_at(b"SYSTEM") && !self.input.looking_at(b"PUBLIC") {
            return Err(self
                .input
                .fatal("expected SYSTEM or PUBLIC in NOTATION declaration")
                .into());
        }
        let (system_id, public_id) = self.parse_external_id(true)?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;

        self.handler.notation_decl(&NotationDecl {
            name,
            base: self.options.base_uri.clone(),
            system_id,
            public_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::{parse_sax, SaxHandler};
    use super::*;
    use crate::parser::ParseOptions;
    use crate::Error;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Decls {
        models: Vec<(String, ContentModel)>,
        attlists: Vec<AttlistDecl>,
        entities: Vec<EntityDecl>,
        notations: Vec<NotationDecl>,
        defaults: Vec<String>,
        comments: Vec<String>,
    }

    impl SaxHandler for Decls {
        fn element_decl(&mut self, name: &str, model: &ContentModel) -> Result<()> {
            self.models.push((name.to_string(), model.clone()));
            Ok(())
        }
        fn attlist_decl(&mut self, decl: &AttlistDecl) -> Result<()> {
            self.attlists.push(decl.clone());
            Ok(())
        }
        fn entity_decl(&mut self, decl: &EntityDecl) -> Result<()> {
            self.entities.push(decl.clone());
            Ok(())
        }
        fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
            self.notations.push(decl.clone());
            Ok(())
        }
        fn unclaimed(&mut self, text: &str) -> Result<()> {
            self.defaults.push(text.to_string());
            Ok(())
        }
        fn comment(&mut self, content: &str) -> Result<()> {
            self.comments.push(content.to_string());
            Ok(())
        }
    }

    fn subset(decls: &str) -> Decls {
        let mut handler = Decls::default();
        let doc = format!("<!DOCTYPE r [{decls}]><r/>");
        parse_sax(&doc, &ParseOptions::default(), &mut handler).unwrap();
        handler
    }

    fn name(name: &str, occurrence: Occurrence) -> ContentModel {
        ContentModel::Name {
            name: name.to_string(),
            occurrence,
        }
    }

    #[test]
    fn test_element_decl_sequence() {
        let decls = subset("<!ELEMENT note (to,from,body)>");
        assert_eq!(
            decls.models[0].1,
            ContentModel::Seq {
                children: vec![
                    name("to", Occurrence::Once),
                    name("from", Occurrence::Once),
                    name("body", Occurrence::Once),
                ],
                occurrence: Occurrence::Once,
            }
        );
    }

    #[test]
    fn test_element_decl_nested_choice() {
        let decls = subset("<!ELEMENT a ((b|c)*, d?)+>");
        assert_eq!(
            decls.models[0].1,
            ContentModel::Seq {
                children: vec![
                    ContentModel::Choice {
                        children: vec![name("b", Occurrence::Once), name("c", Occurrence::Once)],
                        occurrence: Occurrence::ZeroOrMore,
                    },
                    name("d", Occurrence::Optional),
                ],
                occurrence: Occurrence::OneOrMore,
            }
        );
    }

    #[test]
    fn test_element_decl_single_particle_group() {
        let decls = subset("<!ELEMENT a (b)>");
        assert_eq!(
            decls.models[0].1,
            ContentModel::Seq {
                children: vec![name("b", Occurrence::Once)],
                occurrence: Occurrence::Once,
            }
        );
    }

    #[test]
    fn test_element_decl_mixed_and_keywords() {
        let decls = subset(
            "<!ELEMENT a EMPTY><!ELEMENT b ANY><!ELEMENT c (#PCDATA)>\
             <!ELEMENT d (#PCDATA)*><!ELEMENT e (#PCDATA|x|y)*>",
        );
        let models: Vec<_> = decls.models.into_iter().map(|(_, m)| m).collect();
        assert_eq!(
            models,
            vec![
                ContentModel::Empty,
                ContentModel::Any,
                ContentModel::Mixed {
                    children: vec![],
                    occurrence: Occurrence::Once
                },
                ContentModel::Mixed {
                    children: vec![],
                    occurrence: Occurrence::ZeroOrMore
                },
                ContentModel::Mixed {
                    children: vec![name("x", Occurrence::Once), name("y", Occurrence::Once)],
                    occurrence: Occurrence::ZeroOrMore
                },
            ]
        );
    }

    #[test]
    fn test_element_decl_mixed_separators_rejected() {
        let err = parse_sax(
            "<!DOCTYPE r [<!ELEMENT a (b,c|d)>]><r/>",
            &ParseOptions::default(),
            &mut Decls::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourceParse(_)));
    }

    #[test]
    fn test_attlist_one_event_per_attribute() {
        let decls = subset(
            "<!ATTLIST img src CDATA #REQUIRED alt CDATA #IMPLIED \
             kind (a|b) \"a\" v CDATA #FIXED '1.0' n NOTATION (gif|png) #IMPLIED>",
        );
        let summary: Vec<_> = decls
            .attlists
            .iter()
            .map(|d| {
                (
                    d.element.as_str(),
                    d.attribute.as_str(),
                    d.attr_type.as_str(),
                    d.default.as_deref(),
                    d.required,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("img", "src", "CDATA", None, true),
                ("img", "alt", "CDATA", None, false),
                ("img", "kind", "(a|b)", Some("a"), false),
                ("img", "v", "CDATA", Some("1.0"), true),
                ("img", "n", "NOTATION (gif|png)", None, false),
            ]
        );
    }

    #[test]
    fn test_entity_decls() {
        let decls = subset(
            "<!ENTITY nb \"a&#160;b\">\
             <!ENTITY % pe \"x\">\
             <!ENTITY pic SYSTEM \"p.gif\" NDATA gif>\
             <!ENTITY ext PUBLIC \"-//X//EN\" \"x.xml\">",
        );
        assert_eq!(decls.entities.len(), 4);
        assert_eq!(decls.entities[0].value.as_deref(), Some("a\u{a0}b"));
        assert!(decls.entities[1].is_parameter);
        assert_eq!(decls.entities[2].notation.as_deref(), Some("gif"));
        assert_eq!(decls.entities[3].public_id.as_deref(), Some("-//X//EN"));
        assert_eq!(decls.entities[3].system_id.as_deref(), Some("x.xml"));
        assert_eq!(decls.entities[0].base, None);
    }

    #[test]
    fn test_entity_value_with_percent_reference_rejected() {
        let result = parse_sax(
            "<!DOCTYPE r [<!ENTITY a \"%pe;\">]><r/>",
            &ParseOptions::default(),
            &mut Decls::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entity_base_uri_from_options() {
        let mut handler = Decls::default();
        parse_sax(
            "<!DOCTYPE r [<!ENTITY a 'x'><!NOTATION n SYSTEM 'n'>]><r/>",
            &ParseOptions::default().base_uri("file:///doc/"),
            &mut handler,
        )
        .unwrap();
        assert_eq!(handler.entities[0].base.as_deref(), Some("file:///doc/"));
        assert_eq!(handler.notations[0].base.as_deref(), Some("file:///doc/"));
    }

    #[test]
    fn test_notation_decls() {
        let decls = subset("<!NOTATION a SYSTEM \"a.exe\"><!NOTATION b PUBLIC \"-//B//EN\">");
        assert_eq!(decls.notations[0].system_id.as_deref(), Some("a.exe"));
        assert_eq!(decls.notations[1].public_id.as_deref(), Some("-//B//EN"));
        assert_eq!(decls.notations[1].system_id, None);
    }

    #[test]
    fn test_subset_whitespace_and_pe_references_go_to_unclaimed() {
        let decls = subset("\n  <!ENTITY % p 'x'>\n%p;\n<!-- note -->");
        assert_eq!(decls.defaults, vec!["\n  ", "\n", "%p;", "\n"]);
        assert_eq!(decls.comments, vec![" note "]);
    }

    #[test]
    fn test_pe_reference_relaxes_entity_check() {
        let mut handler = Decls::default();
        parse_sax(
            "<!DOCTYPE r [<!ENTITY % p SYSTEM 'p.ent'>%p;]><r>&fromp;</r>",
            &ParseOptions::default(),
            &mut handler,
        )
        .unwrap();
        assert!(handler.defaults.contains(&"&fromp;".to_string()));
    }
}
