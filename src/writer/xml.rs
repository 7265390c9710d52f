//! Streaming XML writer.
//!
//! Writes markup as calls arrive, keeping a stack of open constructs so it
//! can refuse calls that would produce malformed output: an attribute after
//! the start tag is closed, a structured comment inside a DTD, an element
//! inside a comment. The pending `>` of a start tag and the ` [` that opens
//! an internal subset are written lazily, when the first child arrives.

use std::io::Write;

use encoding_rs::{Encoding, UTF_8};

use super::{WriteResult, WriterError, WriterOptions, WriterTarget};
use crate::encoding::output_encoding;

#[derive(Debug)]
enum Node {
    Element {
        name: String,
        /// The start tag is still open (`<name attr="v"` written, no `>`).
        open_tag: bool,
        has_text: bool,
        has_children: bool,
    },
    CData,
    Comment,
    Dtd {
        /// ` [` has been written.
        subset_open: bool,
    },
    DtdAttlist,
}

impl Node {
    fn describe(&self) -> &'static str {
        match self {
            Node::Element { .. } => "element",
            Node::CData => "CDATA section",
            Node::Comment => "comment",
            Node::Dtd { .. } => "DTD",
            Node::DtdAttlist => "attribute-list declaration",
        }
    }
}

/// A streaming XML writer over any [`Write`] sink.
///
/// # Examples
///
/// ```
/// use xmlscript::writer::{WriterTarget, XmlWriter};
///
/// let mut w = XmlWriter::new(Vec::new());
/// w.start_element("a").unwrap();
/// w.write_attribute("x", "1 < 2").unwrap();
/// w.start_element("b").unwrap();
/// w.end_element(false).unwrap();
/// w.end_element(false).unwrap();
/// assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "<a x=\"1 &lt; 2\"><b/></a>");
/// ```
pub struct XmlWriter<W: Write> {
    out: W,
    options: WriterOptions,
    encoding: &'static Encoding,
    stack: Vec<Node>,
    started: bool,
    /// Nothing has been written yet, or the last byte written was `\n`.
    at_line_start: bool,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a writer with default options.
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Self {
            out,
            options,
            encoding: UTF_8,
            stack: Vec::new(),
            started: false,
            at_line_start: true,
        }
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a string to the sink in the output encoding. Characters the
    /// encoding cannot represent become numeric character references.
    fn emit(&mut self, s: &str) -> WriteResult {
        if s.is_empty() {
            return Ok(());
        }
        if self.encoding == UTF_8 {
            self.out.write_all(s.as_bytes())?;
        } else {
            let (bytes, _, _) = self.encoding.encode(s);
            self.out.write_all(&bytes)?;
        }
        self.at_line_start = s.ends_with('\n');
        Ok(())
    }

    fn refuse(&self, message: impl Into<String>) -> WriteResult {
        Err(WriterError::new(message))
    }

    /// Number of enclosing constructs that indent their children.
    fn level(&self) -> usize {
        self.stack
            .iter()
            .filter(|n| matches!(n, Node::Element { .. } | Node::Dtd { .. }))
            .count()
    }

    /// Starts a new indented line if indentation applies here.
    fn newline_indent(&mut self, level: usize) -> WriteResult {
        if !self.options.indent {
            return Ok(());
        }
        if let Some(Node::Element { has_text: true, .. }) = self.stack.last() {
            return Ok(());
        }
        let mut s = String::new();
        if !self.at_line_start {
            s.push('\n');
        }
        for _ in 0..level {
            s.push_str(&self.options.indent_str);
        }
        self.emit(&s)
    }

    /// Completes any pending start tag or subset opener before a child is
    /// written, and notes the child on its parent.
    fn prepare_child(&mut self, block: bool) -> WriteResult {
        let pending = match self.stack.last_mut() {
            Some(Node::Element {
                open_tag,
                has_text,
                has_children,
                ..
            }) => {
                let pending = std::mem::replace(open_tag, false);
                if block {
                    *has_children = true;
                } else {
                    *has_text = true;
                }
                pending.then_some(">")
            }
            Some(Node::Dtd { subset_open }) if !*subset_open => {
                *subset_open = true;
                Some(" [")
            }
            _ => None,
        };
        if let Some(pending) = pending {
            self.emit(pending)?;
        }
        if block {
            self.newline_indent(self.level())?;
        }
        Ok(())
    }

    fn require_in_dtd(&self, what: &str) -> WriteResult {
        match self.stack.last() {
            Some(Node::Dtd { .. }) => Ok(()),
            _ => self.refuse(format!("{what} outside of a DTD")),
        }
    }

    fn refuse_inside_text_node(&self, what: &str) -> WriteResult {
        match self.stack.last() {
            Some(node @ (Node::CData | Node::Comment | Node::DtdAttlist)) => {
                self.refuse(format!("cannot write {what} inside a {}", node.describe()))
            }
            _ => Ok(()),
        }
    }

    fn close_top(&mut self) -> WriteResult {
        match self.stack.last() {
            Some(Node::Element { .. }) => self.end_element(false),
            Some(Node::CData) => self.end_cdata(),
            Some(Node::Comment) => self.end_comment(),
            Some(Node::Dtd { .. }) => self.end_dtd(),
            Some(Node::DtdAttlist) => self.end_dtd_attlist(),
            None => Ok(()),
        }
    }

    fn write_external_id(
        &mut self,
        public_id: Option<&str>,
        system_id: Option<&str>,
        system_optional: bool,
    ) -> WriteResult {
        match (public_id, system_id) {
            (Some(public_id), Some(system_id)) => {
                self.emit(&format!(" PUBLIC {} {}", quote(public_id), quote(system_id)))
            }
            (Some(public_id), None) if system_optional => {
                self.emit(&format!(" PUBLIC {}", quote(public_id)))
            }
            (Some(_), None) => self.refuse("public identifier without a system identifier"),
            (None, Some(system_id)) => self.emit(&format!(" SYSTEM {}", quote(system_id))),
            (None, None) => Ok(()),
        }
    }
}

impl<W: Write> WriterTarget for XmlWriter<W> {
    fn start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> WriteResult {
        if self.started || !self.stack.is_empty() {
            return self.refuse("document already started");
        }
        if let Some(label) = encoding {
            self.encoding = output_encoding(label).map_err(|e| WriterError::new(e.message))?;
        }
        self.started = true;

        let mut decl = format!("<?xml version=\"{}\"", version.unwrap_or("1.0"));
        if let Some(encoding) = encoding {
            decl.push_str(&format!(" encoding=\"{encoding}\""));
        }
        if let Some(standalone) = standalone {
            decl.push_str(if standalone {
                " standalone=\"yes\""
            } else {
                " standalone=\"no\""
            });
        }
        decl.push_str("?>\n");
        self.emit(&decl)
    }

    fn end_document(&mut self) -> WriteResult {
        while !self.stack.is_empty() {
            self.close_top()?;
        }
        if !self.at_line_start {
            self.emit("\n")?;
        }
        self.started = false;
        self.flush()
    }

    fn start_element(&mut self, name: &str) -> WriteResult {
        self.start_element_ns(None, name, None)
    }

    fn start_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        uri: Option<&str>,
    ) -> WriteResult {
        if name.is_empty() {
            return self.refuse("empty element name");
        }
        self.refuse_inside_text_node("an element")?;
        if let Some(Node::Dtd { .. }) = self.stack.last() {
            return self.refuse("cannot write an element inside a DTD");
        }
        self.prepare_child(true)?;

        let qname = qualified(prefix, name);
        self.emit(&format!("<{qname}"))?;
        if let Some(uri) = uri {
            let decl = match prefix {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            self.emit(&format!(" {decl}=\"{}\"", escape_attr(uri)))?;
        }
        self.stack.push(Node::Element {
            name: qname,
            open_tag: true,
            has_text: false,
            has_children: false,
        });
        Ok(())
    }

    fn end_element(&mut self, full: bool) -> WriteResult {
        let Some(Node::Element {
            name,
            open_tag,
            has_text,
            has_children,
        }) = self.stack.pop()
        else {
            return self.refuse("no open element to end");
        };
        if open_tag {
            return if full {
                self.emit(&format!("></{name}>"))
            } else {
                self.emit("/>")
            };
        }
        if has_children && !has_text {
            self.newline_indent(self.level())?;
        }
        self.emit(&format!("</{name}>"))
    }

    fn write_attribute(&mut self, name: &str, value: &str) -> WriteResult {
        self.write_attribute_ns(None, name, None, value)
    }

    fn write_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        uri: Option<&str>,
        value: &str,
    ) -> WriteResult {
        if !matches!(self.stack.last(), Some(Node::Element { open_tag: true, .. })) {
            return self.refuse("attribute outside of a start tag");
        }
        let qname = qualified(prefix, name);
        self.emit(&format!(" {qname}=\"{}\"", escape_attr(value)))?;
        if let (Some(prefix), Some(uri)) = (prefix, uri) {
            self.emit(&format!(" xmlns:{prefix}=\"{}\"", escape_attr(uri)))?;
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> WriteResult {
        let escaped = match self.stack.last() {
            Some(Node::CData | Node::Comment) => text.to_string(),
            Some(Node::DtdAttlist) => escape_attr(text),
            _ => escape_text(text),
        };
        self.prepare_child(false)?;
        self.emit(&escaped)
    }

    fn write_raw(&mut self, text: &str) -> WriteResult {
        self.prepare_child(false)?;
        self.emit(text)
    }

    fn start_cdata(&mut self) -> WriteResult {
        self.refuse_inside_text_node("a CDATA section")?;
        if !matches!(self.stack.last(), Some(Node::Element { .. })) {
            return self.refuse("CDATA section outside of an element");
        }
        self.prepare_child(false)?;
        self.emit("<![CDATA[")?;
        self.stack.push(Node::CData);
        Ok(())
    }

    fn write_cdata_raw(&mut self, text: &str) -> WriteResult {
        if !matches!(self.stack.last(), Some(Node::CData)) {
            return self.refuse("no open CDATA section");
        }
        // "]]>" cannot appear inside a section; split it across two.
        self.emit(&text.replace("]]>", "]]]]><![CDATA[>"))
    }

    fn end_cdata(&mut self) -> WriteResult {
        if !matches!(self.stack.last(), Some(Node::CData)) {
            return self.refuse("no open CDATA section to end");
        }
        self.stack.pop();
        self.emit("]]>")
    }

    fn start_comment(&mut self) -> WriteResult {
        match self.stack.last() {
            Some(Node::Dtd { .. } | Node::DtdAttlist) => {
                return self.refuse("comments cannot be started inside a DTD");
            }
            _ => self.refuse_inside_text_node("a comment")?,
        }
        self.prepare_child(true)?;
        self.emit("<!--")?;
        self.stack.push(Node::Comment);
        Ok(())
    }

    fn end_comment(&mut self) -> WriteResult {
        if !matches!(self.stack.last(), Some(Node::Comment)) {
            return self.refuse("no open comment to end");
        }
        self.stack.pop();
        self.emit("-->")
    }

    fn write_pi(&mut self, target: &str, data: Option<&str>) -> WriteResult {
        if target.eq_ignore_ascii_case("xml") {
            return self.refuse("PI target 'xml' is reserved");
        }
        self.refuse_inside_text_node("a processing instruction")?;
        self.prepare_child(true)?;
        match data {
            Some(data) => self.emit(&format!("<?{target} {data}?>")),
            None => self.emit(&format!("<?{target}?>")),
        }
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> WriteResult {
        if !self.stack.is_empty() {
            return self.refuse("DTD must be written at the top level");
        }
        self.newline_indent(0)?;
        self.emit(&format!("<!DOCTYPE {name}"))?;
        self.write_external_id(public_id, system_id, false)?;
        self.stack.push(Node::Dtd { subset_open: false });
        Ok(())
    }

    fn end_dtd(&mut self) -> WriteResult {
        match self.stack.pop() {
            Some(Node::Dtd { subset_open: true }) => {
                if self.options.indent && !self.at_line_start {
                    self.emit("\n")?;
                }
                self.emit("]>")
            }
            Some(Node::Dtd { subset_open: false }) => self.emit(">"),
            Some(other) => {
                self.stack.push(other);
                self.refuse("cannot end DTD: another construct is open")
            }
            None => self.refuse("no open DTD to end"),
        }
    }

    fn start_dtd_attlist(&mut self, name: &str) -> WriteResult {
        self.require_in_dtd("attribute-list declaration")?;
        self.prepare_child(true)?;
        self.emit(&format!("<!ATTLIST {name}"))?;
        self.stack.push(Node::DtdAttlist);
        Ok(())
    }

    fn end_dtd_attlist(&mut self) -> WriteResult {
        if !matches!(self.stack.last(), Some(Node::DtdAttlist)) {
            return self.refuse("no open attribute-list declaration to end");
        }
        self.stack.pop();
        self.emit(">")
    }

    fn write_dtd_element(&mut self, name: &str, model: &str) -> WriteResult {
        self.require_in_dtd("element declaration")?;
        self.prepare_child(true)?;
        self.emit(&format!("<!ELEMENT {name} {model}>"))
    }

    fn write_dtd_entity(
        &mut self,
        is_pe: bool,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        ndata_id: Option<&str>,
        value: Option<&str>,
    ) -> WriteResult {
        self.require_in_dtd("entity declaration")?;
        self.prepare_child(true)?;
        let pe = if is_pe { "% " } else { "" };
        self.emit(&format!("<!ENTITY {pe}{name}"))?;
        match value {
            Some(value) => self.emit(&format!(" {}", quote(value)))?,
            None if public_id.is_none() && system_id.is_none() => self.emit(" \"\"")?,
            None => {
                self.write_external_id(public_id, system_id, false)?;
                if let Some(ndata_id) = ndata_id {
                    if is_pe {
                        return self.refuse("NDATA on a parameter entity");
                    }
                    self.emit(&format!(" NDATA {ndata_id}"))?;
                }
            }
        }
        self.emit(">")
    }

    fn write_dtd_notation(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> WriteResult {
        self.require_in_dtd("notation declaration")?;
        if public_id.is_none() && system_id.is_none() {
            return self.refuse("notation needs a public or system identifier");
        }
        self.prepare_child(true)?;
        self.emit(&format!("<!NOTATION {name}"))?;
        self.write_external_id(public_id, system_id, true)?;
        self.emit(">")
    }

    fn flush(&mut self) -> WriteResult {
        self.out.flush()?;
        Ok(())
    }
}

fn qualified(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}

/// Quotes a literal, preferring double quotes. When both quote characters
/// occur, `"` becomes `&#34;`, which an entity literal still expands.
fn quote(value: &str) -> String {
    match (value.contains('"'), value.contains('\'')) {
        (true, false) => format!("'{value}'"),
        (true, true) => format!("\"{}\"", value.replace('"', "&#34;")),
        _ => format!("\"{value}\""),
    }
}

/// Escapes text content.
///
/// `<`, `>` and `&` use named references; `\r` is written as `&#13;` so it
/// survives end-of-line normalization.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes a double-quoted attribute value. Whitespace other than space is
/// written as character references so that attribute normalization on
/// re-parse leaves it intact.
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
    out
}
