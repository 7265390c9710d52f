//! Capture engine: turns parse events into a command script.
//!
//! [`Recorder`] is a [`SaxHandler`]. Each structural event becomes one or
//! more [`Command`]s, in document order. Along the way it:
//!
//! - splits `prefix:name` into prefix and local name, folding an element's
//!   own `xmlns:prefix` declaration into its `uri` and letting each other
//!   declaration be claimed by the first attribute that uses its prefix;
//! - groups consecutive attribute definitions for one element under a
//!   single `start.dtd-attlist` / `end.dtd-attlist` pair;
//! - flattens element content models to their grammar string;
//! - escapes entity replacement text for the internal subset.
//!
//! Anything it cannot represent faithfully stops the capture with
//! [`Error::UnhandledConstruct`].

mod model;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result, SourceLocation};
use crate::parser::input::{is_name_char, is_name_start_char, split_name};
use crate::parser::ParseOptions;
use crate::sax::{
    parse_sax, parse_sax_bytes, AttlistDecl, ContentModel, DoctypeDecl, EntityDecl, NotationDecl,
    SaxHandler, XmlDeclaration,
};
use crate::script::{Action, Command, Kind, Params, Provenance, Script};

/// Options for a capture run.
///
/// ```
/// use xmlscript::recorder::RecordOptions;
///
/// let opts = RecordOptions::default().debug(true).strip_whitespace(true);
/// assert!(opts.debug && opts.strip_whitespace);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Attach source line, byte offset and handler name to each command.
    pub debug: bool,
    /// Drop default-channel text that is entirely whitespace.
    pub strip_whitespace: bool,
    /// Name given to the recorded script.
    pub name: Option<String>,
    /// Options for parsing the source document.
    pub parse: ParseOptions,
}

impl RecordOptions {
    /// Enables or disables provenance on recorded commands.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enables or disables whitespace stripping.
    #[must_use]
    pub fn strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    /// Sets the script name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the source parse options.
    #[must_use]
    pub fn parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

/// Builds a [`Script`] from parse events.
///
/// # Examples
///
/// ```
/// use xmlscript::recorder::{Recorder, RecordOptions};
///
/// let script = Recorder::record_str("<a x=\"1\"><b/></a>", &RecordOptions::default()).unwrap();
/// let labels: Vec<String> = script.iter().map(|c| c.label()).collect();
/// assert_eq!(labels, ["start.elem", "write.attr", "start.elem", "end.elem", "end.elem"]);
/// ```
#[derive(Debug)]
pub struct Recorder {
    debug: bool,
    strip_whitespace: bool,
    script: Script,
    location: SourceLocation,
    in_dtd: bool,
    /// Element whose attribute-list group is open.
    attlist: Option<String>,
    /// Text of the open CDATA section.
    cdata: Option<String>,
    has_doc: bool,
}

impl Recorder {
    /// Creates a recorder with an empty script.
    #[must_use]
    pub fn new(options: &RecordOptions) -> Self {
        Self {
            debug: options.debug,
            strip_whitespace: options.strip_whitespace,
            script: Script {
                name: options.name.clone(),
                commands: Vec::new(),
            },
            location: SourceLocation::default(),
            in_dtd: false,
            attlist: None,
            cdata: None,
            has_doc: false,
        }
    }

    /// Records a document held in a string.
    ///
    /// # Errors
    ///
    /// [`Error::SourceParse`] if the document is not well-formed, or
    /// [`Error::UnhandledConstruct`] for a construct with no command
    /// mapping. Nothing recorded before the error is returned.
    pub fn record_str(input: &str, options: &RecordOptions) -> Result<Script> {
        let mut recorder = Self::new(options);
        parse_sax(input, &options.parse, &mut recorder)?;
        Ok(recorder.finish())
    }

    /// Records a document from raw bytes, detecting its encoding.
    ///
    /// # Errors
    ///
    /// See [`Recorder::record_str`]; encoding problems are reported as
    /// [`Error::SourceParse`].
    pub fn record_bytes(input: &[u8], options: &RecordOptions) -> Result<Script> {
        let mut recorder = Self::new(options);
        parse_sax_bytes(input, &options.parse, &mut recorder)?;
        Ok(recorder.finish())
    }

    /// Returns the script recorded so far.
    #[must_use]
    pub fn finish(self) -> Script {
        debug!(commands = self.script.len(), "recorded script");
        self.script
    }

    fn emit(&mut self, mut command: Command, handler: &str) {
        if self.debug {
            command.provenance = Some(Provenance {
                line: self.location.line,
                pos: self.location.byte_offset,
                handler: handler.to_string(),
            });
        }
        trace!(%command, "record");
        self.script.push(command);
    }

    fn close_attlist(&mut self, handler: &str) {
        if self.attlist.take().is_some() {
            self.emit(
                Command::new(Action::End, Kind::DtdAttlist, Params::None),
                handler,
            );
        }
    }

    fn unhandled(&self, construct: String) -> Error {
        Error::UnhandledConstruct {
            construct,
            location: self.location,
        }
    }
}

/// Escapes entity replacement text for an internal subset literal.
///
/// A `&` that does not open an entity reference came from a character
/// reference and is written as `&#38;`.
fn escape_entity_value(value: &str) -> String {
    if value == "\u{A0}" {
        return "&#160;".to_string();
    }
    let percent = value.contains('%');
    let mut out = String::with_capacity(value.len() + 8);
    for (i, ch) in value.char_indices() {
        match ch {
            '&' if !opens_entity_reference(&value[i + 1..]) => out.push_str("&#38;"),
            '"' if percent => out.push_str("&quot;"),
            '%' => out.push_str("&#37;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Whether `rest` starts with `Name;`.
fn opens_entity_reference(rest: &str) -> bool {
    let Some((name, _)) = rest.split_once(';') else {
        return false;
    };
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn namespace_params(prefix: Option<&str>, uri: Option<&str>) -> Params {
    if prefix.is_none() && uri.is_none() {
        return Params::None;
    }
    Params::Namespace {
        prefix: prefix.map(str::to_string),
        uri: uri.map(str::to_string),
    }
}

impl SaxHandler for Recorder {
    fn position(&mut self, location: SourceLocation) {
        self.location = location;
    }

    fn xml_declaration(&mut self, decl: &XmlDeclaration) -> Result<()> {
        self.has_doc = true;
        let params = Params::Document {
            version: Some(decl.version.clone()),
            encoding: decl.encoding.clone(),
            standalone: decl.standalone,
        };
        self.emit(Command::new(Action::Start, Kind::Doc, params), "xml_declaration");
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.close_attlist("end_document");
        if self.has_doc {
            self.emit(
                Command::new(Action::End, Kind::Doc, Params::None),
                "end_document",
            );
        }
        Ok(())
    }

    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        const HANDLER: &str = "start_element";
        self.close_attlist(HANDLER);

        let (prefix, local) = split_name(name);
        let mut element_uri = None;
        // Namespace declarations still waiting to be claimed: (prefix, uri).
        let mut pending: Vec<(&str, &str)> = Vec::new();
        let mut plain: Vec<(&str, &str)> = Vec::new();
        for (attr, value) in attributes {
            match attr.strip_prefix("xmlns:") {
                Some(declared) if Some(declared) == prefix => element_uri = Some(value.as_str()),
                Some(declared) => pending.push((declared, value)),
                None => plain.push((attr, value)),
            }
        }

        self.emit(
            Command::new(Action::Start, Kind::Elem, namespace_params(prefix, element_uri))
                .with_name(local),
            HANDLER,
        );

        for (attr, value) in plain {
            let (attr_prefix, attr_local) = split_name(attr);
            let uri = attr_prefix.and_then(|p| {
                let idx = pending.iter().position(|(declared, _)| *declared == p)?;
                Some(pending.remove(idx).1)
            });
            self.emit(
                Command::new(Action::Write, Kind::Attr, namespace_params(attr_prefix, uri))
                    .with_name(attr_local)
                    .with_content(value),
                HANDLER,
            );
        }

        for (declared, uri) in pending {
            self.emit(
                Command::new(Action::Write, Kind::Attr, Params::None)
                    .with_name(format!("xmlns:{declared}"))
                    .with_content(uri),
                HANDLER,
            );
        }
        Ok(())
    }

    fn end_element(&mut self, _name: &str) -> Result<()> {
        self.close_attlist("end_element");
        self.emit(
            Command::new(Action::End, Kind::Elem, Params::EndElem { full: None }),
            "end_element",
        );
        Ok(())
    }

    fn characters(&mut self, content: &str) -> Result<()> {
        if let Some(cdata) = self.cdata.as_mut() {
            cdata.push_str(content);
            return Ok(());
        }
        self.close_attlist("characters");
        self.emit(
            Command::new(Action::Write, Kind::Text, Params::None).with_content(content),
            "characters",
        );
        Ok(())
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.close_attlist("start_cdata");
        self.cdata = Some(String::new());
        Ok(())
    }

    fn end_cdata(&mut self) -> Result<()> {
        let content = self.cdata.take().unwrap_or_default();
        self.emit(
            Command::new(Action::Write, Kind::CData, Params::None).with_content(content),
            "end_cdata",
        );
        Ok(())
    }

    fn comment(&mut self, content: &str) -> Result<()> {
        self.close_attlist("comment");
        self.emit(
            Command::new(Action::Write, Kind::Comment, Params::None).with_content(content),
            "comment",
        );
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        self.close_attlist("processing_instruction");
        let mut command = Command::new(
            Action::Write,
            Kind::Pi,
            Params::Pi {
                target: target.to_string(),
            },
        );
        command.content = data.map(str::to_string);
        self.emit(command, "processing_instruction");
        Ok(())
    }

    fn start_doctype(&mut self, decl: &DoctypeDecl) -> Result<()> {
        self.close_attlist("start_doctype");
        self.in_dtd = true;
        let params = Params::Identifiers {
            public_id: decl.public_id.clone(),
            system_id: decl.system_id.clone(),
        };
        self.emit(
            Command::new(Action::Start, Kind::Dtd, params).with_name(&decl.name),
            "start_doctype",
        );
        Ok(())
    }

    fn end_doctype(&mut self) -> Result<()> {
        self.close_attlist("end_doctype");
        self.in_dtd = false;
        self.emit(
            Command::new(Action::End, Kind::Dtd, Params::None),
            "end_doctype",
        );
        Ok(())
    }

    fn entity_decl(&mut self, decl: &EntityDecl) -> Result<()> {
        self.close_attlist("entity_decl");
        if let Some(base) = decl.base.as_deref().filter(|b| !b.is_empty()) {
            return Err(self.unhandled(format!(
                "dtd-entity base found: entity '{}' has base '{base}'",
                decl.name
            )));
        }
        let mut command = Command::new(
            Action::Write,
            Kind::DtdEntity,
            Params::Entity {
                is_pe: decl.is_parameter,
                public_id: decl.public_id.clone(),
                system_id: decl.system_id.clone(),
                ndata_id: decl.notation.clone(),
            },
        )
        .with_name(&decl.name);
        command.content = decl.value.as_deref().map(escape_entity_value);
        self.emit(command, "entity_decl");
        Ok(())
    }

    fn element_decl(&mut self, name: &str, model: &ContentModel) -> Result<()> {
        self.close_attlist("element_decl");
        let grammar = model::flatten(model).map_err(|construct| self.unhandled(construct))?;
        self.emit(
            Command::new(Action::Write, Kind::DtdElem, Params::None)
                .with_name(name)
                .with_content(grammar),
            "element_decl",
        );
        Ok(())
    }

    fn attlist_decl(&mut self, decl: &AttlistDecl) -> Result<()> {
        const HANDLER: &str = "attlist_decl";
        if self.attlist.as_deref() != Some(decl.element.as_str()) {
            self.close_attlist(HANDLER);
            self.emit(
                Command::new(Action::Start, Kind::DtdAttlist, Params::None)
                    .with_name(&decl.element),
                HANDLER,
            );
            self.attlist = Some(decl.element.clone());
        }
        self.emit(
            Command::new(
                Action::Write,
                Kind::DtdAttr,
                Params::AttrDecl {
                    attr_type: Some(decl.attr_type.clone()),
                    decl: decl.default.clone(),
                    required: decl.required,
                },
            )
            .with_name(&decl.attribute),
            HANDLER,
        );
        Ok(())
    }

    fn notation_decl(&mut self, decl: &NotationDecl) -> Result<()> {
        self.close_attlist("notation_decl");
        if let Some(base) = decl.base.as_deref().filter(|b| !b.is_empty()) {
            return Err(self.unhandled(format!(
                "notation base found: notation '{}' has base '{base}'",
                decl.name
            )));
        }
        let params = Params::Identifiers {
            public_id: decl.public_id.clone(),
            system_id: decl.system_id.clone(),
        };
        self.emit(
            Command::new(Action::Write, Kind::Notation, params).with_name(&decl.name),
            "notation_decl",
        );
        Ok(())
    }

    fn unclaimed(&mut self, text: &str) -> Result<()> {
        self.close_attlist("unclaimed");
        if self.in_dtd && text == "|" {
            warn!(location = %self.location, "dropping stray '|' from unclaimed input");
            return Ok(());
        }
        if self.strip_whitespace && text.chars().all(char::is_whitespace) {
            return Ok(());
        }
        self.emit(
            Command::new(Action::Write, Kind::Raw, Params::Raw { next: true }).with_content(text),
            "unclaimed",
        );
        Ok(())
    }
}
