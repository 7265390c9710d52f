//! Input cursor for the event parser.
//!
//! [`Cursor`] walks a UTF-8 document, keeping the [`SourceLocation`] of the
//! next unread character current. It owns the primitives every construct
//! is built from: lookahead, names, references, quoted literals and the
//! delimited bodies of comments, CDATA sections and processing
//! instructions.
//!
//! Work on hostile input is bounded by [`Limits`]: element depth, name
//! length and the number of references expanded. Internal general
//! entities are expanded only inside attribute values, and a
//! self-referencing entity is an error rather than a loop.

use std::collections::{HashMap, HashSet};

use crate::error::{ParseError, SourceLocation};
use crate::sax::XmlDeclaration;

// -------------------------------------------------------------------------
// Character classes (XML 1.0 §2.2, §2.3)
// -------------------------------------------------------------------------

/// `Char` `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// `NameStartChar` `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// `NameChar` `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Splits a raw qualified name at its first colon.
///
/// `"p:x"` gives `(Some("p"), "x")`, `"x"` gives `(None, "x")`.
pub(crate) fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// The character a predefined entity stands for.
pub(crate) fn predefined_entity(name: &str) -> Option<char> {
    Some(match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => return None,
    })
}

/// Expands the character references of an entity literal, leaving entity
/// references in place (XML 1.0 §4.5).
///
/// Returns `None` for a malformed or out-of-range reference.
pub(crate) fn expand_char_refs(literal: &str) -> Option<String> {
    let mut pieces = literal.split("&#");
    let mut out = String::with_capacity(literal.len());
    out.push_str(pieces.next().unwrap_or_default());
    for piece in pieces {
        let (body, tail) = piece.split_once(';')?;
        out.push(decode_char_ref(body)?);
        out.push_str(tail);
    }
    Some(out)
}

/// Decodes the digits of a character reference: `65` or `x41`.
fn decode_char_ref(body: &str) -> Option<char> {
    let (digits, radix) = match body.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let code = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(code).filter(|&c| is_xml_char(c))
}

/// A `&...;` reference as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// `&#65;` or `&#x41;`.
    Char(char),
    /// `&lt;`, `&gt;`, `&amp;`, `&apos;` or `&quot;`.
    Predefined(char),
    /// Any other general entity.
    Entity(String),
}

// -------------------------------------------------------------------------
// Limits and the entity table
// -------------------------------------------------------------------------

/// Resource bounds applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limits {
    pub max_depth: u32,
    pub max_name_length: usize,
    pub max_entity_expansions: u32,
}

/// General entities declared in the internal subset.
#[derive(Debug, Default)]
pub(crate) struct Entities {
    internal: HashMap<String, String>,
    external: HashSet<String>,
    /// Some declarations were never read (an external subset or a
    /// parameter entity reference), so an unknown name is not an error.
    incomplete: bool,
}

impl Entities {
    /// Declares a general entity. The first declaration of a name is
    /// binding (XML 1.0 §4.2); later ones are ignored.
    pub fn declare(&mut self, name: &str, value: Option<&str>) {
        if self.internal.contains_key(name) || self.external.contains(name) {
            return;
        }
        match value {
            Some(value) => {
                self.internal.insert(name.to_owned(), value.to_owned());
            }
            None => {
                self.external.insert(name.to_owned());
            }
        }
    }

    pub fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    fn is_declared(&self, name: &str) -> bool {
        self.incomplete || self.internal.contains_key(name) || self.external.contains(name)
    }
}

// -------------------------------------------------------------------------
// Cursor
// -------------------------------------------------------------------------

/// Position-tracking reader over a UTF-8 document.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    /// Location of the next unread character.
    location: SourceLocation,
    depth: u32,
    expansions: u32,
    limits: Limits,
    pub(crate) entities: Entities,
}

impl<'a> Cursor<'a> {
    /// A cursor with the default limits.
    #[cfg(test)]
    pub fn new(text: &'a str) -> Self {
        Self::with_limits(text, super::ParseOptions::default().limits())
    }

    pub fn with_limits(text: &'a str, limits: Limits) -> Self {
        Self {
            text,
            location: SourceLocation {
                line: 1,
                column: 1,
                byte_offset: 0,
            },
            depth: 0,
            expansions: 0,
            limits,
            entities: Entities::default(),
        }
    }

    /// A parse error at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    // -- Depth --

    /// Enters an element, failing past the depth limit.
    pub fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.limits.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.limits.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Lookahead --

    fn rest(&self) -> &'a str {
        &self.text[self.location.byte_offset..]
    }

    pub fn at_end(&self) -> bool {
        self.location.byte_offset >= self.text.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.rest().as_bytes().first().copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.rest().as_bytes().get(offset).copied()
    }

    pub fn looking_at(&self, prefix: &[u8]) -> bool {
        self.rest().as_bytes().starts_with(prefix)
    }

    // -- Consumption --

    /// Moves past `consumed`, which must be a prefix of the unread input.
    fn consume(&mut self, consumed: &str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }
        self.location.byte_offset += consumed.len();
    }

    /// Moves past `len` bytes of input the caller has already matched.
    pub fn advance(&mut self, len: usize) {
        let rest = self.rest();
        if let Some(consumed) = rest.get(..len.min(rest.len())) {
            self.consume(consumed);
        }
    }

    /// Reads one character, folding `\r\n` and lone `\r` into `\n`
    /// (XML 1.0 §2.11).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let rest = self.rest();
        let c = rest
            .chars()
            .next()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if c == '\r' {
            let len = if rest.starts_with("\r\n") { 2 } else { 1 };
            self.consume(&rest[..len]);
            return Ok('\n');
        }
        if !is_xml_char(c) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", c as u32)));
        }
        self.consume(&rest[..c.len_utf8()]);
        Ok(c)
    }

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(found) if found == expected => {
                self.advance(1);
                Ok(())
            }
            Some(found) => Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, found as char
            ))),
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        if !self.looking_at(expected) {
            return Err(self.fatal(format!(
                "expected '{}'",
                String::from_utf8_lossy(expected)
            )));
        }
        self.advance(expected.len());
        Ok(())
    }

    // -- Whitespace --

    fn space_len(&self) -> usize {
        let rest = self.rest();
        rest.find(|c| !is_space(c)).unwrap_or(rest.len())
    }

    /// Skips whitespace, reporting whether there was any.
    pub fn skip_whitespace(&mut self) -> bool {
        let len = self.space_len();
        self.advance(len);
        len > 0
    }

    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if self.skip_whitespace() {
            Ok(())
        } else {
            Err(self.fatal("whitespace required"))
        }
    }

    /// Consumes whitespace and returns it with line ends normalized.
    pub fn take_whitespace(&mut self) -> String {
        let space = &self.rest()[..self.space_len()];
        self.consume(space);
        space.replace("\r\n", "\n").replace('\r', "\n")
    }

    // -- Names (XML 1.0 §2.3) --

    /// `Name` `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_name_start_char(c) => {}
            Some((_, c)) => return Err(self.fatal(format!("invalid name start character: '{c}'"))),
            None => return Err(self.fatal("expected name, found end of input")),
        }
        let len = chars
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(at, _)| at);
        if len > self.limits.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.limits.max_name_length
            )));
        }
        let name = &rest[..len];
        self.consume(name);
        Ok(name.to_owned())
    }

    /// `Nmtoken` `[7]`.
    pub fn parse_nmtoken(&mut self) -> Result<String, ParseError> {
        let rest = self.rest();
        let len = rest.find(|c| !is_name_char(c)).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.fatal("expected name token"));
        }
        let token = &rest[..len];
        self.consume(token);
        Ok(token.to_owned())
    }

    // -- References (XML 1.0 §4.1) --

    fn count_expansion(&mut self) -> Result<(), ParseError> {
        if self.expansions >= self.limits.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.limits.max_entity_expansions
            )));
        }
        self.expansions += 1;
        Ok(())
    }

    /// Reads one `&...;` reference without expanding general entities.
    /// Counts against the expansion limit.
    pub fn parse_reference(&mut self) -> Result<Reference, ParseError> {
        self.count_expansion()?;
        self.expect_byte(b'&')?;
        if self.peek() != Some(b'#') {
            let name = self.parse_name()?;
            self.expect_byte(b';')?;
            return Ok(match predefined_entity(&name) {
                Some(c) => Reference::Predefined(c),
                None => Reference::Entity(name),
            });
        }
        self.advance(1);
        let rest = self.rest();
        let body = &rest[..rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len())];
        self.consume(body);
        self.expect_byte(b';')?;
        decode_char_ref(body)
            .map(Reference::Char)
            .ok_or_else(|| self.fatal(format!("invalid character reference: &#{body};")))
    }

    /// WFC: Entity Declared, for a reference in content.
    pub fn check_entity_declared(&self, name: &str) -> Result<(), ParseError> {
        if self.entities.is_declared(name) {
            Ok(())
        } else {
            Err(self.fatal(format!("undefined entity: &{name};")))
        }
    }

    /// Expands an internal entity for an attribute value, nested
    /// references included. `open` holds the entities being expanded.
    fn expand_entity(&mut self, name: &str, open: &mut Vec<String>) -> Result<String, ParseError> {
        if self.entities.external.contains(name) {
            return Err(self.fatal(format!(
                "reference to external entity '{name}' in attribute value"
            )));
        }
        if open.iter().any(|n| n == name) {
            return Err(self.fatal(format!("recursive reference to entity '{name}'")));
        }
        let replacement = match self.entities.internal.get(name) {
            Some(value) => value.clone(),
            None if self.entities.incomplete => return Ok(String::new()),
            None => return Err(self.fatal(format!("undefined entity: &{name};"))),
        };

        // WFC: No < in Attribute Values
        if replacement.contains('<') {
            return Err(self.fatal(format!(
                "'<' in attribute value from entity '{name}'"
            )));
        }

        open.push(name.to_owned());
        let mut pieces = replacement.split('&');
        let mut out: String = pieces
            .next()
            .unwrap_or_default()
            .chars()
            .map(space_to_blank)
            .collect();
        for piece in pieces {
            let (inner, tail) = piece
                .split_once(';')
                .ok_or_else(|| self.fatal(format!("incomplete reference in entity '{name}'")))?;
            self.count_expansion()?;
            if let Some(body) = inner.strip_prefix('#') {
                let c = decode_char_ref(body).ok_or_else(|| {
                    self.fatal(format!("invalid character reference in entity '{name}'"))
                })?;
                out.push(c);
            } else if let Some(c) = predefined_entity(inner) {
                out.push(c);
            } else {
                out.push_str(&self.expand_entity(inner, open)?);
            }
            out.extend(tail.chars().map(space_to_blank));
        }
        open.pop();
        Ok(out)
    }

    // -- Literals --

    fn open_quote(&mut self, message: &str) -> Result<u8, ParseError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.advance(1);
                Ok(quote)
            }
            _ => Err(self.fatal(message)),
        }
    }

    /// Reads characters up to `delimiter` and consumes the delimiter.
    fn take_until(&mut self, delimiter: &str, construct: &str) -> Result<String, ParseError> {
        let mut content = String::new();
        while !self.looking_at(delimiter.as_bytes()) {
            if self.at_end() {
                return Err(self.fatal(format!("unexpected end of input in {construct}")));
            }
            content.push(self.next_char()?);
        }
        self.advance(delimiter.len());
        Ok(content)
    }

    /// A quoted literal taken as written: no references, no normalization
    /// beyond line ends.
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let delimiter = match self.open_quote("expected quoted value")? {
            b'"' => "\"",
            _ => "'",
        };
        self.take_until(delimiter, "quoted value")
    }

    /// An attribute value with references resolved and whitespace
    /// normalized (XML 1.0 §3.3.3).
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.open_quote("attribute value must be quoted")?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(b'&') => match self.parse_reference()? {
                    Reference::Char(c) | Reference::Predefined(c) => value.push(c),
                    Reference::Entity(name) => {
                        value.push_str(&self.expand_entity(&name, &mut Vec::new())?);
                    }
                },
                Some(_) => {
                    let c = self.next_char()?;
                    value.push(space_to_blank(c));
                }
            }
        }
    }

    // -- Delimited constructs --

    /// `<!-- ... -->` (XML 1.0 §2.5); returns the body.
    pub fn comment(&mut self) -> Result<String, ParseError> {
        self.expect_str(b"<!--")?;
        let body = self.take_until("--", "comment")?;
        if self.peek() != Some(b'>') {
            return Err(self.fatal("'--' not allowed inside comments"));
        }
        self.advance(1);
        Ok(body)
    }

    /// `<![CDATA[ ... ]]>` (XML 1.0 §2.7); returns the section text.
    pub fn cdata_section(&mut self) -> Result<String, ParseError> {
        self.expect_str(b"<![CDATA[")?;
        self.take_until("]]>", "CDATA section")
    }

    /// `<?target data?>` (XML 1.0 §2.6). Empty data reads as `None`.
    pub fn processing_instruction(&mut self) -> Result<(String, Option<String>), ParseError> {
        self.expect_str(b"<?")?;
        let target = self.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.fatal("PI target 'xml' is reserved"));
        }
        if !self.skip_whitespace() {
            self.expect_str(b"?>")?;
            return Ok((target, None));
        }
        let data = self.take_until("?>", "processing instruction")?;
        Ok((target, Some(data).filter(|d| !d.is_empty())))
    }

    /// `<?xml ...?>` (XML 1.0 §2.8 `[23]`).
    pub fn xml_declaration(&mut self) -> Result<XmlDeclaration, ParseError> {
        const FIELDS: [&str; 3] = ["version", "encoding", "standalone"];

        self.expect_str(b"<?xml")?;
        let mut values: [Option<String>; 3] = [None, None, None];
        let mut spaced = self.skip_whitespace();
        for (slot, field) in values.iter_mut().zip(FIELDS) {
            if !self.looking_at(field.as_bytes()) {
                continue;
            }
            if !spaced {
                return Err(self.fatal(format!("whitespace required before {field}")));
            }
            self.advance(field.len());
            self.skip_whitespace();
            self.expect_byte(b'=')?;
            self.skip_whitespace();
            *slot = Some(self.parse_quoted_value()?);
            spaced = self.skip_whitespace();
        }
        self.expect_str(b"?>")?;

        let [version, encoding, standalone] = values;
        let version = version.ok_or_else(|| self.fatal("XML declaration without version"))?;
        if !is_version_num(&version) {
            return Err(self.fatal(format!("invalid version number: '{version}'")));
        }
        if let Some(name) = encoding.as_deref().filter(|name| !is_enc_name(name)) {
            return Err(self.fatal(format!("invalid encoding name: '{name}'")));
        }
        let standalone = match standalone.as_deref() {
            None => None,
            Some("yes") => Some(true),
            Some("no") => Some(false),
            Some(_) => return Err(self.fatal("standalone must be 'yes' or 'no'")),
        };
        Ok(XmlDeclaration {
            version,
            encoding,
            standalone,
        })
    }
}

fn space_to_blank(c: char) -> char {
    if is_space(c) {
        ' '
    } else {
        c
    }
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_enc_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use pretty_assertions::assert_eq;

    fn limited(text: &str, limits: impl FnOnce(&mut Limits)) -> Cursor<'_> {
        let mut l = ParseOptions::default().limits();
        limits(&mut l);
        Cursor::with_limits(text, l)
    }

    #[test]
    fn test_location_follows_lines() {
        let mut cursor = Cursor::new("a\u{e9}\ncd");
        cursor.advance(1);
        cursor.next_char().unwrap();
        assert_eq!(cursor.location().column, 3);
        assert_eq!(cursor.location().byte_offset, 3);
        cursor.next_char().unwrap();
        assert_eq!(cursor.location().line, 2);
        assert_eq!(cursor.location().column, 1);
        assert_eq!(cursor.peek_at(1), Some(b'd'));
    }

    #[test]
    fn test_line_ends_fold_to_newline() {
        let mut cursor = Cursor::new("a\r\nb\rc");
        let read: String = (0..5).map(|_| cursor.next_char().unwrap()).collect();
        assert_eq!(read, "a\nb\nc");
        assert!(cursor.at_end());

        let mut cursor = Cursor::new(" \r\n\tx");
        assert_eq!(cursor.take_whitespace(), " \n\t");
        assert_eq!(cursor.peek(), Some(b'x'));
    }

    #[test]
    fn test_names() {
        let mut cursor = Cursor::new("p:na-me=tok.1 =");
        assert_eq!(cursor.parse_name().unwrap(), "p:na-me");
        cursor.expect_byte(b'=').unwrap();
        assert_eq!(cursor.parse_nmtoken().unwrap(), "tok.1");
        cursor.skip_whitespace_required().unwrap();
        assert!(cursor.parse_name().is_err());

        let long = "a".repeat(100);
        let err = limited(&long, |l| l.max_name_length = 50)
            .parse_name()
            .unwrap_err();
        assert!(err.message.contains("name length"));
    }

    #[test]
    fn test_references() {
        let mut cursor = Cursor::new("&amp;&#65;&#x42;&custom;&#0;");
        assert_eq!(cursor.parse_reference().unwrap(), Reference::Predefined('&'));
        assert_eq!(cursor.parse_reference().unwrap(), Reference::Char('A'));
        assert_eq!(cursor.parse_reference().unwrap(), Reference::Char('B'));
        assert_eq!(
            cursor.parse_reference().unwrap(),
            Reference::Entity("custom".to_string())
        );
        assert!(cursor.parse_reference().is_err());
    }

    #[test]
    fn test_limits() {
        let mut cursor = limited("&lt;&lt;&lt;", |l| l.max_entity_expansions = 2);
        assert!(cursor.parse_reference().is_ok());
        assert!(cursor.parse_reference().is_ok());
        assert!(cursor.parse_reference().is_err());

        let mut cursor = limited("", |l| l.max_depth = 2);
        assert!(cursor.descend().is_ok());
        assert!(cursor.descend().is_ok());
        assert!(cursor.descend().is_err());
        cursor.ascend();
        assert!(cursor.descend().is_ok());
    }

    #[test]
    fn test_attribute_values() {
        let mut cursor = Cursor::new("\"a &amp; b\"'x\ty\r\nz'");
        assert_eq!(cursor.parse_attribute_value().unwrap(), "a & b");
        assert_eq!(cursor.parse_attribute_value().unwrap(), "x y z");

        let mut cursor = Cursor::new("'x &e; y'");
        cursor.entities.declare("e", Some("1&amp;&f;"));
        cursor.entities.declare("f", Some("2"));
        cursor.entities.declare("f", Some("ignored"));
        assert_eq!(cursor.parse_attribute_value().unwrap(), "x 1&2 y");

        // `&#38;#38;` declares the replacement text `&#38;`, which is a
        // character reference again when the entity is expanded.
        let mut cursor = Cursor::new("'&a;&b;'");
        cursor.entities.declare("a", Some("&#38;"));
        cursor.entities.declare("b", Some("&#x3C;!"));
        assert_eq!(cursor.parse_attribute_value().unwrap(), "&<!");
    }

    #[test]
    fn test_attribute_value_entity_errors() {
        let mut cursor = Cursor::new("'&e;'");
        cursor.entities.declare("e", Some("&e;"));
        let err = cursor.parse_attribute_value().unwrap_err();
        assert!(err.message.contains("recursive"));

        let mut cursor = Cursor::new("'&e;'");
        cursor.entities.declare("e", Some("&#xD800;"));
        let err = cursor.parse_attribute_value().unwrap_err();
        assert!(err.message.contains("invalid character reference"));

        let mut cursor = Cursor::new("'&ext;'");
        cursor.entities.declare("ext", None);
        assert!(cursor.parse_attribute_value().is_err());

        assert!(Cursor::new("'&nope;'").parse_attribute_value().is_err());
        let mut cursor = Cursor::new("'&nope;'");
        cursor.entities.mark_incomplete();
        assert_eq!(cursor.parse_attribute_value().unwrap(), "");
    }

    #[test]
    fn test_expand_char_refs() {
        assert_eq!(expand_char_refs("a&#160;b").as_deref(), Some("a\u{a0}b"));
        assert_eq!(expand_char_refs("&#x25;&ent;").as_deref(), Some("%&ent;"));
        assert_eq!(expand_char_refs("&#xZZ;"), None);
        assert_eq!(expand_char_refs("&#12"), None);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("foo:bar"), (Some("foo"), "bar"));
        assert_eq!(split_name("bar"), (None, "bar"));
    }

    #[test]
    fn test_delimited_constructs() {
        let mut cursor = Cursor::new("<!-- hello --><![CDATA[some <data>]]><?t data?><?t?><?t ?>");
        assert_eq!(cursor.comment().unwrap(), " hello ");
        assert_eq!(cursor.cdata_section().unwrap(), "some <data>");
        assert_eq!(
            cursor.processing_instruction().unwrap(),
            ("t".to_string(), Some("data".to_string()))
        );
        assert_eq!(cursor.processing_instruction().unwrap().1, None);
        assert_eq!(cursor.processing_instruction().unwrap().1, None);
        assert!(cursor.at_end());

        assert!(Cursor::new("<!-- a -- b -->").comment().is_err());
        assert!(Cursor::new("<![CDATA[open").cdata_section().is_err());
        assert!(Cursor::new("<?xml version='1.0'?>").processing_instruction().is_err());
    }

    #[test]
    fn test_xml_declaration() {
        let mut cursor =
            Cursor::new("<?xml version=\"1.0\" encoding='UTF-8' standalone=\"yes\" ?>");
        let decl = cursor.xml_declaration().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(decl.standalone, Some(true));

        for bad in [
            "<?xml version=\"2.0\"?>",
            "<?xml encoding=\"UTF-8\"?>",
            "<?xml version=\"1.0\"encoding=\"UTF-8\"?>",
            "<?xml version=\"1.0\" standalone=\"maybe\"?>",
            "<?xml version=\"1.0\" encoding=\"8bit\"?>",
        ] {
            assert!(Cursor::new(bad).xml_declaration().is_err(), "{bad}");
        }
    }
}
