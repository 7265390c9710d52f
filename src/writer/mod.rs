//! Document writer targets.
//!
//! [`WriterTarget`] is the serialization capability a
//! [`Player`](crate::player::Player) drives. Any XML writer that can express
//! these calls satisfies it; two implementations ship with the crate:
//!
//! - [`XmlWriter`], a streaming writer over any [`std::io::Write`] that
//!   enforces document structure and escapes content.
//! - [`TraceWriter`], which records each call as a line of text so call
//!   sequences can be compared directly.

mod trace;
mod xml;

pub use trace::TraceWriter;
pub use xml::XmlWriter;

use thiserror::Error;

/// A writer target rejected an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WriterError {
    /// The target's diagnostic.
    pub message: String,
}

impl WriterError {
    /// Creates a writer error with the given diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for WriterError {
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("write failed: {err}"))
    }
}

/// Result of a writer target call.
pub type WriteResult = Result<(), WriterError>;

/// The serialization capability consumed by the player.
///
/// Each call either succeeds or returns the target's diagnostic. The
/// composite calls ([`write_cdata`](Self::write_cdata),
/// [`write_comment`](Self::write_comment),
/// [`write_dtd_attribute`](Self::write_dtd_attribute)) have default
/// implementations built from the primitive ones.
pub trait WriterTarget {
    /// Writes the XML declaration. `None` fields are omitted.
    fn start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> WriteResult;

    /// Closes every open construct and finishes the document.
    fn end_document(&mut self) -> WriteResult;

    /// Opens an element.
    fn start_element(&mut self, name: &str) -> WriteResult;

    /// Opens an element with a namespace prefix and/or URI.
    fn start_element_ns(&mut self, prefix: Option<&str>, name: &str, uri: Option<&str>)
        -> WriteResult;

    /// Closes the current element; `full` forces `</name>` over `/>`.
    fn end_element(&mut self, full: bool) -> WriteResult;

    /// Writes an attribute on the open start tag.
    fn write_attribute(&mut self, name: &str, value: &str) -> WriteResult;

    /// Writes a namespaced attribute on the open start tag.
    fn write_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        uri: Option<&str>,
        value: &str,
    ) -> WriteResult;

    /// Writes escaped character data.
    fn write_text(&mut self, text: &str) -> WriteResult;

    /// Writes text verbatim.
    fn write_raw(&mut self, text: &str) -> WriteResult;

    /// Opens a CDATA section.
    fn start_cdata(&mut self) -> WriteResult;

    /// Writes text into the open CDATA section.
    fn write_cdata_raw(&mut self, text: &str) -> WriteResult {
        self.write_raw(text)
    }

    /// Closes the open CDATA section.
    fn end_cdata(&mut self) -> WriteResult;

    /// Writes a complete CDATA section.
    fn write_cdata(&mut self, text: &str) -> WriteResult {
        self.start_cdata()?;
        self.write_cdata_raw(text)?;
        self.end_cdata()
    }

    /// Opens a comment.
    fn start_comment(&mut self) -> WriteResult;

    /// Closes the open comment.
    fn end_comment(&mut self) -> WriteResult;

    /// Writes a complete comment.
    fn write_comment(&mut self, text: &str) -> WriteResult {
        self.start_comment()?;
        self.write_raw(text)?;
        self.end_comment()
    }

    /// Writes a processing instruction.
    fn write_pi(&mut self, target: &str, data: Option<&str>) -> WriteResult;

    /// Opens a document type declaration.
    fn start_dtd(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>)
        -> WriteResult;

    /// Closes the document type declaration.
    fn end_dtd(&mut self) -> WriteResult;

    /// Opens an attribute-list declaration for `name`.
    fn start_dtd_attlist(&mut self, name: &str) -> WriteResult;

    /// Closes the open attribute-list declaration.
    fn end_dtd_attlist(&mut self) -> WriteResult;

    /// Writes one attribute definition inside an attribute-list declaration:
    /// ` name [type ](#FIXED "decl" | "decl" | #REQUIRED | #IMPLIED)`.
    fn write_dtd_attribute(
        &mut self,
        name: &str,
        attr_type: Option<&str>,
        decl: Option<&str>,
        required: bool,
    ) -> WriteResult {
        self.write_raw(" ")?;
        self.write_raw(name)?;
        self.write_raw(" ")?;
        if let Some(attr_type) = attr_type {
            // `NOTATION` needs whitespace before its name group.
            match attr_type.strip_prefix("NOTATION") {
                Some(group) if group.starts_with('(') => {
                    self.write_raw("NOTATION ")?;
                    self.write_raw(group)?;
                }
                _ => self.write_raw(attr_type)?,
            }
            self.write_raw(" ")?;
        }
        match decl {
            Some(decl) => {
                self.write_raw(if required { "#FIXED \"" } else { "\"" })?;
                self.write_text(decl)?;
                self.write_raw("\"")
            }
            None => self.write_raw(if required { "#REQUIRED" } else { "#IMPLIED" }),
        }
    }

    /// Writes an element declaration with its content model string.
    fn write_dtd_element(&mut self, name: &str, model: &str) -> WriteResult;

    /// Writes an entity declaration. An internal entity carries `value`;
    /// an external one carries identifiers and possibly an `NDATA` notation.
    fn write_dtd_entity(
        &mut self,
        is_pe: bool,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        ndata_id: Option<&str>,
        value: Option<&str>,
    ) -> WriteResult;

    /// Writes a notation declaration.
    fn write_dtd_notation(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> WriteResult;

    /// Flushes buffered output.
    fn flush(&mut self) -> WriteResult;
}

/// Options controlling [`XmlWriter`] output.
///
/// ```
/// use xmlscript::writer::WriterOptions;
///
/// let opts = WriterOptions::default().indent(true).indent_str("\t");
/// assert_eq!(opts.indent_str, "\t");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Whether to put child constructs on their own indented lines.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string for each level. Defaults to two spaces.
    pub indent_str: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
        }
    }
}

impl WriterOptions {
    /// Enables or disables indented output.
    ///
    /// Elements that contain text are never indented inside, so mixed
    /// content is written exactly as given.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records only the primitive calls, to observe default compositions.
    #[derive(Default)]
    struct Primitives(Vec<String>);

    impl WriterTarget for Primitives {
        fn start_document(&mut self, _: Option<&str>, _: Option<&str>, _: Option<bool>) -> WriteResult {
            Ok(())
        }
        fn end_document(&mut self) -> WriteResult {
            Ok(())
        }
        fn start_element(&mut self, _: &str) -> WriteResult {
            Ok(())
        }
        fn start_element_ns(&mut self, _: Option<&str>, _: &str, _: Option<&str>) -> WriteResult {
            Ok(())
        }
        fn end_element(&mut self, _: bool) -> WriteResult {
            Ok(())
        }
        fn write_attribute(&mut self, _: &str, _: &str) -> WriteResult {
            Ok(())
        }
        fn write_attribute_ns(&mut self, _: Option<&str>, _: &str, _: Option<&str>, _: &str) -> WriteResult {
            Ok(())
        }
        fn write_text(&mut self, text: &str) -> WriteResult {
            self.0.push(format!("text:{text}"));
            Ok(())
        }
        fn write_raw(&mut self, text: &str) -> WriteResult {
            self.0.push(text.to_string());
            Ok(())
        }
        fn start_cdata(&mut self) -> WriteResult {
            self.0.push("<![CDATA[".to_string());
            Ok(())
        }
        fn end_cdata(&mut self) -> WriteResult {
            self.0.push("]]>".to_string());
            Ok(())
        }
        fn start_comment(&mut self) -> WriteResult {
            self.0.push("<!--".to_string());
            Ok(())
        }
        fn end_comment(&mut self) -> WriteResult {
            self.0.push("-->".to_string());
            Ok(())
        }
        fn write_pi(&mut self, _: &str, _: Option<&str>) -> WriteResult {
            Ok(())
        }
        fn start_dtd(&mut self, _: &str, _: Option<&str>, _: Option<&str>) -> WriteResult {
            Ok(())
        }
        fn end_dtd(&mut self) -> WriteResult {
            Ok(())
        }
        fn start_dtd_attlist(&mut self, _: &str) -> WriteResult {
            Ok(())
        }
        fn end_dtd_attlist(&mut self) -> WriteResult {
            Ok(())
        }
        fn write_dtd_element(&mut self, _: &str, _: &str) -> WriteResult {
            Ok(())
        }
        fn write_dtd_entity(
            &mut self,
            _: bool,
            _: &str,
            _: Option<&str>,
            _: Option<&str>,
            _: Option<&str>,
            _: Option<&str>,
        ) -> WriteResult {
            Ok(())
        }
        fn write_dtd_notation(&mut self, _: &str, _: Option<&str>, _: Option<&str>) -> WriteResult {
            Ok(())
        }
        fn flush(&mut self) -> WriteResult {
            Ok(())
        }
    }

    fn dtd_attribute(attr_type: Option<&str>, decl: Option<&str>, required: bool) -> String {
        let mut target = Primitives::default();
        target
            .write_dtd_attribute("a", attr_type, decl, required)
            .unwrap();
        target.0.concat()
    }

    #[test]
    fn test_dtd_attribute_fragment() {
        assert_eq!(dtd_attribute(Some("CDATA"), None, true), " a CDATA #REQUIRED");
        assert_eq!(dtd_attribute(Some("CDATA"), None, false), " a CDATA #IMPLIED");
        assert_eq!(dtd_attribute(Some("(x|y)"), Some("x"), false), " a (x|y) \"text:x\"");
        assert_eq!(dtd_attribute(None, Some("1"), true), " a #FIXED \"text:1\"");
        assert_eq!(dtd_attribute(Some("NOTATION(x|y)"), None, false), " a NOTATION (x|y) #IMPLIED");
        assert_eq!(dtd_attribute(Some("NOTATION (x)"), None, false), " a NOTATION (x) #IMPLIED");
    }

    #[test]
    fn test_composite_defaults() {
        let mut target = Primitives::default();
        target.write_cdata("x").unwrap();
        target.write_comment("c").unwrap();
        assert_eq!(target.0, vec!["<![CDATA[", "x", "]]>", "<!--", "c", "-->"]);
    }
}
