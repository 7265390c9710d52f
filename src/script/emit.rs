//! Writing scripts in their XML form.

use std::io::{self, Write};

use super::Script;
use crate::error::{Error, Result};
use crate::writer::{WriterError, WriterOptions, WriterTarget, XmlWriter};

impl Script {
    /// Serializes the script to an indented UTF-8 document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the writer rejects the output.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlscript::script::{Action, Command, Kind, Params, Script};
    ///
    /// let mut script = Script::new().with_name("demo");
    /// script.push(Command::new(Action::Start, Kind::Elem, Params::None).with_name("a"));
    /// script.push(Command::new(Action::End, Kind::All, Params::None));
    /// let xml = script.to_xml().unwrap();
    /// assert!(xml.contains("<script name=\"demo\" playable=\"true\">"));
    /// assert!(xml.contains("<command action=\"end\" kind=\"all\"/>"));
    /// ```
    pub fn to_xml(&self) -> Result<String> {
        let mut out = Vec::new();
        write_script(self, &mut out)?;
        String::from_utf8(out).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// Writes `script` to `out` as an indented UTF-8 document.
///
/// # Errors
///
/// [`Error::Io`] if writing to `out` fails.
pub fn write_script<W: Write>(script: &Script, out: W) -> Result<()> {
    let mut w = XmlWriter::with_options(out, WriterOptions::default().indent(true));
    write_commands(script, &mut w).map_err(|e| Error::Io(io::Error::other(e.message)))
}

fn write_commands(script: &Script, w: &mut dyn WriterTarget) -> Result<(), WriterError> {
    w.start_document(Some("1.0"), Some("UTF-8"), None)?;
    w.start_element("script")?;
    if let Some(name) = &script.name {
        w.write_attribute("name", name)?;
    }
    w.write_attribute("playable", "true")?;

    for command in script {
        w.start_element("command")?;
        w.write_attribute("action", command.action.as_str())?;
        w.write_attribute("kind", command.kind.as_str())?;
        if let Some(provenance) = &command.provenance {
            w.write_attribute("line", &provenance.line.to_string())?;
            w.write_attribute("pos", &provenance.pos.to_string())?;
            w.write_attribute("fn", &provenance.handler)?;
        }
        if let Some(name) = &command.name {
            w.write_attribute("name", name)?;
        }
        for (key, value) in command.params.to_pairs() {
            w.write_attribute(key, &value)?;
        }
        if let Some(content) = command.content.as_deref().filter(|c| !c.is_empty()) {
            w.write_text(content)?;
        }
        w.end_element(false)?;
    }

    w.end_element(false)?;
    w.end_document()
}
