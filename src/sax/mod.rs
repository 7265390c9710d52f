//! Streaming parse events.
//!
//! The parser fires callbacks on a [`SaxHandler`] as it encounters elements,
//! text, comments, and the declarations of the internal DTD subset. Every
//! callback returns a [`Result`], so a handler can stop the parse by
//! returning an error; that error is handed back unchanged from
//! [`parse_sax`].
//!
//! Names are reported exactly as written (`p:name`), without namespace
//! resolution. Input that no specific callback claims (prolog and subset
//! whitespace, parameter entity references, references to non-predefined
//! general entities in content) goes to [`SaxHandler::unclaimed`] verbatim.
//!
//! # Examples
//!
//! ```
//! use xmlscript::sax::{parse_sax, SaxHandler};
//! use xmlscript::parser::ParseOptions;
//! use xmlscript::Result;
//!
//! struct Counter(usize);
//!
//! impl SaxHandler for Counter {
//!     fn start_element(&mut self, _name: &str, _attributes: &[(String, String)]) -> Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let mut counter = Counter(0);
//! parse_sax("<root><a/><b/><c/></root>", &ParseOptions::default(), &mut counter).unwrap();
//! assert_eq!(counter.0, 4);
//! ```

mod dtd;

use std::collections::HashSet;

use crate::error::{Result, SourceLocation};
use crate::parser::input::{Cursor, Reference};
use crate::parser::ParseOptions;

/// Parsed XML declaration data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    /// XML version (e.g. `"1.0"`).
    pub version: String,
    /// Optional encoding declaration.
    pub encoding: Option<String>,
    /// Optional standalone declaration.
    pub standalone: Option<bool>,
}

/// The opening of a `<!DOCTYPE ...>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeDecl {
    /// The declared root element name.
    pub name: String,
    /// The SYSTEM identifier, if any.
    pub system_id: Option<String>,
    /// The PUBLIC identifier, if any.
    pub public_id: Option<String>,
    /// Whether an internal subset (`[...]`) follows.
    pub has_internal_subset: bool,
}

/// Occurrence indicator for a content particle.
///
/// See XML 1.0 section 3.2.1: `'?' | '*' | '+'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occurrence {
    /// Exactly once (no indicator).
    #[default]
    Once,
    /// Zero or one time (`?`).
    Optional,
    /// Zero or more times (`*`).
    ZeroOrMore,
    /// One or more times (`+`).
    OneOrMore,
}

impl Occurrence {
    /// The indicator as written in a DTD (empty for [`Occurrence::Once`]).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "",
            Self::Optional => "?",
            Self::ZeroOrMore => "*",
            Self::OneOrMore => "+",
        }
    }
}

/// An element declaration's content model as a tree.
///
/// A group with a single particle, such as `(a)`, is reported as a
/// one-child [`ContentModel::Seq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentModel {
    /// `EMPTY`
    Empty,
    /// `ANY`
    Any,
    /// `(#PCDATA)` or `(#PCDATA|a|b)*`; children are [`ContentModel::Name`]s.
    Mixed {
        /// Element names allowed alongside text.
        children: Vec<ContentModel>,
        /// `*` when present.
        occurrence: Occurrence,
    },
    /// A single element name particle.
    Name {
        /// The element name.
        name: String,
        /// The particle's indicator.
        occurrence: Occurrence,
    },
    /// `(a|b|...)`
    Choice {
        /// The alternatives.
        children: Vec<ContentModel>,
        /// The group's indicator.
        occurrence: Occurrence,
    },
    /// `(a,b,...)`
    Seq {
        /// The particles in order.
        children: Vec<ContentModel>,
        /// The group's indicator.
        occurrence: Occurrence,
    },
}

/// An `<!ENTITY ...>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDecl {
    /// The entity name.
    pub name: String,
    /// `true` for a parameter entity (`<!ENTITY % name ...>`).
    pub is_parameter: bool,
    /// Replacement text of an internal entity, character references expanded.
    pub value: Option<String>,
    /// Base URI in effect for the declaration.
    pub base: Option<String>,
    /// The SYSTEM identifier, if any.
    pub system_id: Option<String>,
    /// The PUBLIC identifier, if any.
    pub public_id: Option<String>,
    /// The `NDATA` notation of an unparsed entity.
    pub notation: Option<String>,
}

/// One attribute definition of an `<!ATTLIST ...>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttlistDecl {
    /// The element the attribute belongs to.
    pub element: String,
    /// The attribute name.
    pub attribute: String,
    /// The declared type: `CDATA`, `ID`, ..., `(a|b)` or `NOTATION (a|b)`.
    pub attr_type: String,
    /// The default value, normalized.
    pub default: Option<String>,
    /// `#REQUIRED`, or `#FIXED` when a default is present.
    pub required: bool,
}

/// A `<!NOTATION ...>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationDecl {
    /// The notation name.
    pub name: String,
    /// Base URI in effect for the declaration.
    pub base: Option<String>,
    /// The SYSTEM identifier, if any.
    pub system_id: Option<String>,
    /// The PUBLIC identifier, if any.
    pub public_id: Option<String>,
}

/// A streaming event handler.
///
/// Implement the callbacks you care about; all methods have default no-op
/// implementations. Returning an error from any callback stops the parse.
#[allow(unused_variables)]
pub trait SaxHandler {
    /// Announces the source location of the event about to be delivered.
    fn position(&mut self, location: SourceLocation) {}

    /// Called for the `<?xml ...?>` declaration.
    fn xml_declaration(&mut self, decl: &XmlDeclaration) -> Result<()> {
        Ok(())
    }

    /// Called after the document element and trailing misc have been parsed.
    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when a start tag (or empty-element tag) is encountered.
    ///
    /// `attributes` holds `(qualified_name, value)` pairs in document order.
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        Ok(())
    }

    /// Called when an end tag is encountered (or an empty-element tag ends).
    fn end_element(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    /// Called for character data. A run of text may arrive in several chunks.
    fn characters(&mut self, content: &str) -> Result<()> {
        Ok(())
    }

    /// Called at `<![CDATA[`; the section text follows as [`SaxHandler::characters`].
    fn start_cdata(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called at `]]>`.
    fn end_cdata(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called for comments, in content and in the internal subset.
    fn comment(&mut self, content: &str) -> Result<()> {
        Ok(())
    }

    /// Called for processing instructions.
    fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        Ok(())
    }

    /// Called when `<!DOCTYPE` has been read up to its internal subset.
    fn start_doctype(&mut self, decl: &DoctypeDecl) -> Result<()> {
        Ok(())
    }

    /// Called at the closing `>` of the doctype declaration.
    fn end_doctype(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called for each entity declaration.
    fn entity_decl(&mut self, decl: &EntityDecl) -> Result<()> {
        Ok(())
    }

    /// Called for each element declaration.
    fn element_decl(&mut self, name: &str, model: &ContentModel) -> Result<()> {
        Ok(())
    }

    /// Called once per attribute definition of an attribute-list declaration.
    fn attlist_decl(&mut self, decl: &AttlistDecl) -> Result<()> {
        Ok(())
    }

    /// Called for each notation declaration.
    fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
        Ok(())
    }

    /// Receives input that no other callback claims, verbatim.
    fn unclaimed(&mut self, text: &str) -> Result<()> {
        Ok(())
    }
}

/// A handler that ignores every event. Useful for well-formedness checks.
pub struct DefaultHandler;

impl SaxHandler for DefaultHandler {}

/// Parses XML from a string, firing events on the provided handler.
///
/// # Errors
///
/// Returns [`crate::Error::SourceParse`] if the input is not well-formed,
/// or whatever error a handler callback returned.
pub fn parse_sax(input: &str, options: &ParseOptions, handler: &mut dyn SaxHandler) -> Result<()> {
    SaxParser::new(input, options, handler).parse()
}

/// Decodes raw bytes (BOM and declared encoding) and parses them.
///
/// # Errors
///
/// Encoding problems are reported as [`crate::Error::SourceParse`]; see
/// also [`parse_sax`].
pub fn parse_sax_bytes(
    bytes: &[u8],
    options: &ParseOptions,
    handler: &mut dyn SaxHandler,
) -> Result<()> {
    let text = crate::encoding::decode_to_utf8(bytes).map_err(crate::error::ParseError::from)?;
    parse_sax(&text, options, handler)
}

/// The event-driven XML parser.
struct SaxParser<'a, 'h> {
    input: Cursor<'a>,
    /// Parser options.
    options: ParseOptions,
    /// Event handler.
    handler: &'h mut dyn SaxHandler,
}

impl<'a, 'h> SaxParser<'a, 'h> {
    fn new(input: &'a str, options: &ParseOptions, handler: &'h mut dyn SaxHandler) -> Self {
        Self {
            input: Cursor::with_limits(input, options.limits()),
            options: options.clone(),
            handler,
        }
    }

    /// Reports the current location to the handler.
    fn mark(&mut self) {
        let location = self.input.location();
        self.handler.position(location);
    }

    fn parse(&mut self) -> Result<()> {
        if self.input.looking_at(b"<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n'))
        {
            self.mark();
            let decl = self.input.xml_declaration()?;
            self.handler.xml_declaration(&decl)?;
        }

        self.parse_misc()?;

        if self.input.looking_at(b"<!DOCTYPE") {
            self.parse_doctype()?;
            self.parse_misc()?;
        }

        if self.input.peek() == Some(b'<')
            && self
                .input
                .peek_at(1)
                .is_some_and(|b| b != b'!' && b != b'?')
        {
            self.parse_element()?;
        } else {
            return Err(self.input.fatal("no element found").into());
        }

        self.parse_misc()?;

        if !self.input.at_end() {
            return Err(self.input.fatal("junk after document element").into());
        }

        self.handler.end_document()
    }

    // --- Misc (comments, PIs, whitespace) ---

    fn parse_misc(&mut self) -> Result<()> {
        loop {
            self.mark();
            let ws = self.input.take_whitespace();
            if !ws.is_empty() {
                self.handler.unclaimed(&ws)?;
                continue;
            }
            if self.input.looking_at(b"<!--") {
                self.parse_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction()?;
            } else {
                return Ok(());
            }
        }
    }

    // --- DOCTYPE Declaration ---
    // See XML 1.0 §2.8: [28] doctypedecl

    fn parse_doctype(&mut self) -> Result<()> {
        self.mark();
        self.input.expect_str(b"<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        let had_ws = self.input.skip_whitespace();

        let (system_id, public_id) =
            if had_ws && (self.input.looking_at(b"SYSTEM") || self.input.looking_at(b"PUBLIC")) {
                let ids = self.parse_external_id(false)?;
                self.input.skip_whitespace();
                ids
            } else {
                (None, None)
            };

        let has_internal_subset = self.input.peek() == Some(b'[');
        self.handler.start_doctype(&DoctypeDecl {
            name,
            system_id: system_id.clone(),
            public_id,
            has_internal_subset,
        })?;

        if has_internal_subset {
            self.input.advance(1);
            self.parse_internal_subset()?;
            self.input.expect_byte(b']')?;
            self.input.skip_whitespace();
        }
        self.input.expect_byte(b'>')?;

        // Declarations in an external subset are never read.
        if system_id.is_some() {
            self.input.entities.mark_incomplete();
        }

        self.handler.end_doctype()
    }

    /// Parses `SYSTEM "sys"` or `PUBLIC "pub" "sys"`, returning
    /// `(system_id, public_id)`. Notations may omit the system literal.
    fn parse_external_id(
        &mut self,
        system_optional: bool,
    ) -> Result<(Option<String>, Option<String>)> {
        if self.input.looking_at(b"SYSTEM") {
            self.input.expect_str(b"SYSTEM")?;
            self.input.skip_whitespace_required()?;
            let system_id = self.input.parse_quoted_value()?;
            return Ok((Some(system_id), None));
        }
        self.input.expect_str(b"PUBLIC")?;
        self.input.skip_whitespace_required()?;
        let public_id = self.input.parse_quoted_value()?;
        if let Some(bad) = public_id.chars().find(|&c| !is_pubid_char(c)) {
            return Err(self
                .input
                .fatal(format!("invalid character '{bad}' in public ID"))
                .into());
        }
        let had_ws = self.input.skip_whitespace();
        let quoted_next = matches!(self.input.peek(), Some(b'"' | b'\''));
        if system_optional && !quoted_next {
            return Ok((None, Some(public_id)));
        }
        if !had_ws {
            return Err(self.input.fatal("whitespace required").into());
        }
        let system_id = self.input.parse_quoted_value()?;
        Ok((Some(system_id), Some(public_id)))
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [40] STag, [42] ETag, [44] EmptyElemTag

    fn parse_element(&mut self) -> Result<()> {
        self.input.descend()?;
        self.mark();
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self
                    .input
                    .fatal("whitespace required between attributes")
                    .into());
            }
            let attr_name = self.input.parse_name()?;
            if !seen.insert(attr_name.clone()) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute '{attr_name}'"))
                    .into());
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let attr_value = self.input.parse_attribute_value()?;
            attributes.push((attr_name, attr_value));
        }

        self.handler.start_element(&name, &attributes)?;

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content()?;
            self.mark();
            self.input.expect_str(b"</")?;
            let end_name = self.input.parse_name()?;
            if end_name != name {
                return Err(self
                    .input
                    .fatal(format!(
                        "mismatched end tag: expected </{name}>, found </{end_name}>"
                    ))
                    .into());
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        self.handler.end_element(&name)?;
        self.input.ascend();
        Ok(())
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self) -> Result<()> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content")
                    .into());
            }
            if self.input.looking_at(b"</") {
                return Ok(());
            }
            if self.input.looking_at(b"<![CDATA[") {
                self.parse_cdata()?;
            } else if self.input.looking_at(b"<!--") {
                self.parse_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction()?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element()?;
            } else {
                self.parse_char_data()?;
            }
        }
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    /// Parses text up to the next markup. Character references and
    /// predefined entities are decoded into the text; any other entity
    /// reference ends the run and is passed to the default channel.
    fn parse_char_data(&mut self) -> Result<()> {
        self.mark();
        let mut text = String::new();
        while !self.input.at_end() && self.input.peek() != Some(b'<') {
            if self.input.looking_at(b"]]>") {
                return Err(self
                    .input
                    .fatal("']]>' not allowed in character data")
                    .into());
            }
            if self.input.peek() != Some(b'&') {
                text.push(self.input.next_char()?);
                continue;
            }
            let location = self.input.location();
            match self.input.parse_reference()? {
                Reference::Char(ch) | Reference::Predefined(ch) => text.push(ch),
                Reference::Entity(name) => {
                    self.input.check_entity_declared(&name)?;
                    if !text.is_empty() {
                        self.handler.characters(&text)?;
                    }
                    self.handler.position(location);
                    return self.handler.unclaimed(&format!("&{name};"));
                }
            }
        }
        if text.is_empty() {
            return Ok(());
        }
        self.handler.characters(&text)
    }

    // --- Comments ---
    // See XML 1.0 §2.5: [15] Comment

    fn parse_comment(&mut self) -> Result<()> {
        self.mark();
        let content = self.input.comment()?;
        self.handler.comment(&content)
    }

    // --- CDATA Sections ---
    // See XML 1.0 §2.7: [18] CDSect

    fn parse_cdata(&mut self) -> Result<()> {
        self.mark();
        let content = self.input.cdata_section()?;
        self.handler.start_cdata()?;
        if !content.is_empty() {
            self.handler.characters(&content)?;
        }
        self.handler.end_cdata()
    }

    // --- Processing Instructions ---
    // See XML 1.0 §2.6: [16] PI

    fn parse_processing_instruction(&mut self) -> Result<()> {
        self.mark();
        let (target, data) = self.input.processing_instruction()?;
        self.handler
            .processing_instruction(&target, data.as_deref())
    }
}

/// Returns `true` if `c` is a valid `PubidChar` per XML 1.0 §2.3 `[13]`.
fn is_pubid_char(c: char) -> bool {
    matches!(c,
        ' ' | '\r' | '\n' |
        'a'..='z' | 'A'..='Z' | '0'..='9' |
        '-' | '\'' | '(' | ')' | '+' | ',' | '.' | '/' | ':' |
        '=' | '?' | ';' | '!' | '*' | '#' | '@' | '$' | '_' | '%'
    )
}
