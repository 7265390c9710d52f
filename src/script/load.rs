//! Reading scripts from their XML form.
//!
//! ```xml
//! <script name="sample" playable="true">
//!   <command action="start" kind="elem" name="a"/>
//!   <command action="write" kind="attr" name="x">1</command>
//!   <command action="end" kind="all"/>
//! </script>
//! ```
//!
//! The document is read with the crate's own event source. Whitespace
//! between commands is ignored, as are comments and processing
//! instructions; any other structure is an [`Error::InvalidScript`].

use std::io::Read;

use tracing::{debug, trace};

use super::{parse_bool, Command, InvalidCommand, Provenance, Script};
use crate::error::{Error, Result};
use crate::parser::ParseOptions;
use crate::sax::{parse_sax, parse_sax_bytes, DoctypeDecl, SaxHandler};

impl Script {
    /// Parses a script document held in a string.
    ///
    /// # Errors
    ///
    /// [`Error::SourceParse`] if the text is not well-formed XML,
    /// [`Error::InvalidScript`] if it is not a playable script, or
    /// [`Error::InvalidCommand`] naming the first command that fails
    /// validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlscript::Script;
    ///
    /// let script = Script::parse(
    ///     r#"<script><command action="start" kind="elem" name="a"/><command action="end" kind="all"/></script>"#,
    /// )
    /// .unwrap();
    /// assert_eq!(script.len(), 2);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let mut loader = ScriptLoader::default();
        parse_sax(input, &ParseOptions::default(), &mut loader)?;
        loader.finish()
    }

    /// Parses a script document from raw bytes, detecting its encoding.
    ///
    /// # Errors
    ///
    /// See [`Script::parse`].
    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        let mut loader = ScriptLoader::default();
        parse_sax_bytes(input, &ParseOptions::default(), &mut loader)?;
        loader.finish()
    }
}

/// Reads a whole script document from `reader`.
///
/// # Errors
///
/// [`Error::Io`] if reading fails, otherwise see [`Script::parse`].
pub fn load_script<R: Read>(mut reader: R) -> Result<Script> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Script::parse_bytes(&bytes)
}

/// A `<command>` element whose content is still arriving.
#[derive(Debug)]
struct PendingCommand {
    action: String,
    kind: String,
    name: Option<String>,
    strip: bool,
    provenance: Option<Provenance>,
    params: Vec<(String, String)>,
    content: String,
}

#[derive(Debug, Default)]
struct ScriptLoader {
    script: Script,
    /// Element depth: 1 inside `<script>`, 2 inside a `<command>`.
    depth: usize,
    seen_root: bool,
    pending: Option<PendingCommand>,
}

impl ScriptLoader {
    fn finish(self) -> Result<Script> {
        if !self.seen_root {
            return Err(invalid_script("no <script> element"));
        }
        debug!(commands = self.script.len(), "loaded script");
        Ok(self.script)
    }

    fn start_root(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        if name != "script" {
            return Err(invalid_script(format!(
                "root element is <{name}>, expected <script>"
            )));
        }
        self.seen_root = true;
        for (attr, value) in attributes {
            match attr.as_str() {
                "name" => self.script.name = Some(value.clone()),
                // `ctester` is the older spelling of the flag.
                "playable" | "ctester" => match parse_bool(value) {
                    Some(true) => {}
                    Some(false) => return Err(invalid_script("script is not playable")),
                    None => {
                        return Err(invalid_script(format!(
                            "{attr} flag is not a boolean: '{value}'"
                        )))
                    }
                },
                _ => {}
            }
        }
        Ok(())
    }

    fn start_command(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        if name != "command" {
            return Err(invalid_script(format!(
                "unexpected <{name}> inside <script>"
            )));
        }
        let index = self.script.len();
        let mut pending = PendingCommand {
            action: String::new(),
            kind: String::new(),
            name: None,
            strip: false,
            provenance: None,
            params: Vec::new(),
            content: String::new(),
        };
        let mut line = None;
        let mut pos = None;
        let mut handler = None;
        for (attr, value) in attributes {
            match attr.as_str() {
                "action" => pending.action.clone_from(value),
                "kind" => pending.kind.clone_from(value),
                "name" => pending.name = Some(value.clone()),
                "ws" => match value.as_str() {
                    "strip" => pending.strip = true,
                    "preserve" => pending.strip = false,
                    other => {
                        return Err(command_error(
                            index,
                            &pending,
                            format!("unknown whitespace mode '{other}'"),
                        ))
                    }
                },
                "line" => line = Some(parse_number(index, &pending, "line", value)?),
                "pos" => pos = Some(parse_number(index, &pending, "pos", value)?),
                "fn" => handler = Some(value.clone()),
                _ => pending.params.push((attr.clone(), value.clone())),
            }
        }
        if line.is_some() || pos.is_some() || handler.is_some() {
            let line = u32::try_from(line.unwrap_or(0))
                .map_err(|_| command_error(index, &pending, "line out of range"))?;
            pending.provenance = Some(Provenance {
                line,
                pos: pos.unwrap_or(0),
                handler: handler.unwrap_or_default(),
            });
        }
        self.pending = Some(pending);
        Ok(())
    }

    fn end_command(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let index = self.script.len();
        let content = if pending.strip {
            collapse_whitespace(&pending.content)
        } else {
            pending.content
        };
        let content = (!content.is_empty()).then_some(content);
        let mut command = Command::parse(
            &pending.action,
            &pending.kind,
            pending.name,
            content,
            &pending.params,
        )
        .map_err(|source| Error::InvalidCommand { index, source })?;
        command.provenance = pending.provenance;
        trace!(index, %command, "load");
        self.script.push(command);
        Ok(())
    }
}

impl SaxHandler for ScriptLoader {
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
        self.depth += 1;
        match self.depth {
            1 => self.start_root(name, attributes),
            2 => self.start_command(name, attributes),
            _ => Err(invalid_script(format!(
                "unexpected <{name}> inside <command>"
            ))),
        }
    }

    fn end_element(&mut self, _name: &str) -> Result<()> {
        if self.depth == 2 {
            self.end_command()?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn characters(&mut self, content: &str) -> Result<()> {
        if let Some(pending) = self.pending.as_mut() {
            pending.content.push_str(content);
            return Ok(());
        }
        if content.chars().all(char::is_whitespace) {
            return Ok(());
        }
        Err(invalid_script(format!(
            "stray text between commands: {:?}",
            content.trim()
        )))
    }

    fn start_doctype(&mut self, _decl: &DoctypeDecl) -> Result<()> {
        Err(invalid_script("scripts cannot carry a document type declaration"))
    }

    fn unclaimed(&mut self, text: &str) -> Result<()> {
        if text.chars().all(char::is_whitespace) {
            return Ok(());
        }
        Err(invalid_script(format!("unexpected markup {text:?}")))
    }
}

fn invalid_script(reason: impl Into<String>) -> Error {
    Error::InvalidScript {
        reason: reason.into(),
    }
}

fn command_error(index: usize, pending: &PendingCommand, reason: impl Into<String>) -> Error {
    Error::InvalidCommand {
        index,
        source: InvalidCommand::new(format!("{}.{}", pending.action, pending.kind), reason),
    }
}

fn parse_number(index: usize, pending: &PendingCommand, key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| command_error(index, pending, format!("'{key}' is not a number: '{value}'")))
}

/// Collapses runs of tab, newline, carriage return and space to one space
/// and trims both ends.
fn collapse_whitespace(text: &str) -> String {
    text.split([' ', '\t', '\n', '\r'])
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::{Action, Kind, Params};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_commands() {
        let script = Script::parse(
            "<script name=\"s\" playable=\"true\">\n\
             <command action=\"start\" kind=\"elem\" name=\"a\" prefix=\"p\"/>\n\
             <command action=\"write\" kind=\"text\">x &amp; y</command>\n\
             <command action=\"end\" kind=\"elem\" full=\"yes\"/>\n\
             </script>",
        )
        .unwrap();
        assert_eq!(script.name.as_deref(), Some("s"));
        assert_eq!(script.len(), 3);
        assert_eq!(
            script.commands[0].params,
            Params::Namespace {
                prefix: Some("p".into()),
                uri: None,
            }
        );
        assert_eq!(script.commands[1].content.as_deref(), Some("x & y"));
        assert_eq!(script.commands[2].params, Params::EndElem { full: Some(true) });
    }

    #[test]
    fn test_load_playable_flag() {
        assert!(Script::parse("<script/>").is_ok());
        let err = Script::parse("<script playable=\"false\"/>").unwrap_err();
        assert!(matches!(err, Error::InvalidScript { .. }));
        let err = Script::parse("<script playable=\"maybe\"/>").unwrap_err();
        assert!(matches!(err, Error::InvalidScript { .. }));
    }

    #[test]
    fn test_load_ctester_flag() {
        assert!(Script::parse("<script ctester=\"true\"/>").is_ok());
        let err = Script::parse(
            "<script ctester=\"false\"><command action=\"end\" kind=\"all\"/></script>",
        )
        .unwrap_err();
        let Error::InvalidScript { reason } = err else {
            panic!("expected InvalidScript");
        };
        assert_eq!(reason, "script is not playable");
        let err = Script::parse("<script ctester=\"2\"/>").unwrap_err();
        assert!(err.to_string().contains("ctester flag is not a boolean"));
    }

    #[test]
    fn test_load_rejects_bad_structure() {
        for input in [
            "<commands/>",
            "<script><cmd/></script>",
            "<script><command action=\"write\" kind=\"text\"><b/></command></script>",
            "<script>text</script>",
            "<!DOCTYPE script><script/>",
        ] {
            let err = Script::parse(input).unwrap_err();
            assert!(matches!(err, Error::InvalidScript { .. }), "{input}: {err}");
        }
    }

    #[test]
    fn test_load_reports_command_index() {
        let err = Script::parse(
            "<script><command action=\"start\" kind=\"elem\" name=\"a\"/>\
             <command action=\"end\" kind=\"text\"/></script>",
        )
        .unwrap_err();
        let Error::InvalidCommand { index, source } = err else {
            panic!("expected InvalidCommand");
        };
        assert_eq!(index, 1);
        assert_eq!(source.label, "end.text");
    }

    #[test]
    fn test_load_whitespace_modes() {
        let script = Script::parse(
            "<script><command action=\"write\" kind=\"text\" ws=\"strip\">\n\t a \r\n b  </command>\
             <command action=\"write\" kind=\"text\" ws=\"preserve\"> c </command></script>",
        )
        .unwrap();
        assert_eq!(script.commands[0].content.as_deref(), Some("a b"));
        assert_eq!(script.commands[1].content.as_deref(), Some(" c "));

        let err = Script::parse(
            "<script><command action=\"write\" kind=\"text\" ws=\"squash\">a</command></script>",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { index: 0, .. }));
    }

    #[test]
    fn test_load_provenance_not_params() {
        let script = Script::parse(
            "<script><command action=\"write\" kind=\"comment\" line=\"3\" pos=\"17\" fn=\"comment\">c</command></script>",
        )
        .unwrap();
        let cmd = &script.commands[0];
        assert_eq!((cmd.action, cmd.kind), (Action::Write, Kind::Comment));
        assert_eq!(cmd.params, Params::None);
        assert_eq!(
            cmd.provenance,
            Some(Provenance {
                line: 3,
                pos: 17,
                handler: "comment".into(),
            })
        );
    }

    #[test]
    fn test_load_cdata_content_and_alias() {
        let script = Script::parse(
            "<script><command action=\"start\" kind=\"dtd-att-list\" name=\"e\"/>\
             <command action=\"write\" kind=\"raw\"><![CDATA[<x>]]></command></script>",
        )
        .unwrap();
        assert_eq!(script.commands[0].kind, Kind::DtdAttlist);
        assert_eq!(script.commands[1].content.as_deref(), Some("<x>"));
    }

    #[test]
    fn test_load_script_from_reader() {
        let bytes: &[u8] = b"<script><command action=\"end\" kind=\"all\"/></script>";
        let script = load_script(bytes).unwrap();
        assert_eq!(script.commands[0].label(), "end.all");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t"), "a b");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
