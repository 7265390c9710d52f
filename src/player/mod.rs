//! Replay engine: drives a [`WriterTarget`] from a command script.
//!
//! Commands run strictly in order. Every scope-opening operation pushes a
//! [`Closer`] onto the player's scope stack; `end.<kind>` pops the innermost
//! closer, which must be of that kind, and `end.all` unwinds the whole
//! stack. The first failure stops the run.
//!
//! # Examples
//!
//! ```
//! use xmlscript::player::Player;
//! use xmlscript::recorder::{RecordOptions, Recorder};
//! use xmlscript::writer::XmlWriter;
//!
//! let script = Recorder::record_str("<a x=\"1\"><b/></a>", &RecordOptions::default()).unwrap();
//! let mut writer = XmlWriter::new(Vec::new());
//! let mut player = Player::new(&mut writer);
//! player.play(&script).unwrap();
//! player.finish().unwrap();
//! assert_eq!(writer.into_inner(), b"<a x=\"1\"><b/></a>");
//! ```

mod operation;

pub use operation::Closer;

use operation::Operation;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::script::{Command, Kind, Script, OPERATIONS};
use crate::writer::{WriteResult, WriterTarget};

/// Executes commands against a writer target.
///
/// A player is single-use state for one replay: the scope stack and the
/// command position carry over between [`step`](Self::step) calls.
pub struct Player<'t> {
    target: &'t mut dyn WriterTarget,
    stack: Vec<Closer>,
    position: usize,
}

impl<'t> Player<'t> {
    /// Creates a player with an empty scope stack.
    pub fn new(target: &'t mut dyn WriterTarget) -> Self {
        Self {
            target,
            stack: Vec::new(),
            position: 0,
        }
    }

    /// The open scopes, outermost first.
    #[must_use]
    pub fn open_scopes(&self) -> &[Closer] {
        &self.stack
    }

    /// Number of commands executed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Executes every command of `script`.
    ///
    /// # Errors
    ///
    /// The first error from [`step`](Self::step).
    pub fn play(&mut self, script: &Script) -> Result<()> {
        for command in script {
            self.step(command)?;
        }
        debug!(
            commands = script.len(),
            open_scopes = self.stack.len(),
            "played script"
        );
        Ok(())
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownOperation`] if the (action, kind) pair has no
    ///   operation.
    /// - [`Error::InvalidCommand`] if the command is missing a field its
    ///   operation needs.
    /// - [`Error::UnbalancedScope`] if an `end` command finds no open scope
    ///   or a scope of another kind.
    /// - [`Error::WriterFailure`] if the target rejects a call.
    pub fn step(&mut self, command: &Command) -> Result<()> {
        let index = self.position;
        self.position += 1;
        trace!(index, %command, "play");

        if !OPERATIONS.contains(&(command.action, command.kind)) {
            return Err(Error::UnknownOperation {
                index,
                label: command.label(),
            });
        }
        command
            .validate()
            .map_err(|source| Error::InvalidCommand { index, source })?;
        let operation = Operation::from_command(command).ok_or_else(|| Error::UnknownOperation {
            index,
            label: command.label(),
        })?;
        self.execute(index, command, operation)
    }

    /// Closes every open scope and flushes the target.
    ///
    /// # Errors
    ///
    /// [`Error::WriterFailure`] if a close or the flush fails.
    pub fn finish(mut self) -> Result<()> {
        let index = self.position;
        if !self.stack.is_empty() {
            debug!(open_scopes = self.stack.len(), "closing scopes left open");
        }
        self.unwind()
            .and_then(|()| self.target.flush())
            .map_err(|e| Error::WriterFailure {
                index,
                label: "end.all".to_string(),
                message: e.message,
            })
    }

    fn execute(&mut self, index: usize, command: &Command, operation: Operation<'_>) -> Result<()> {
        let in_dtd = self.in_dtd();
        let target = &mut *self.target;
        let opened = match operation {
            Operation::End { kind, full } => return self.end(index, command, kind, full),
            Operation::EndAll => {
                return self
                    .unwind()
                    .map_err(|e| writer_failure(index, command, e.message))
            }
            Operation::StartDoc {
                version,
                encoding,
                standalone,
            } => target
                .start_document(version, encoding, standalone)
                .map(|()| Some(Closer::Document)),
            Operation::StartElem { prefix, name, uri } => {
                let started = if prefix.is_some() || uri.is_some() {
                    target.start_element_ns(prefix, name, uri)
                } else {
                    target.start_element(name)
                };
                started.map(|()| Some(Closer::Element { full: false }))
            }
            Operation::StartDtd {
                name,
                public_id,
                system_id,
            } => target
                .start_dtd(name, public_id, system_id)
                .map(|()| Some(Closer::Dtd)),
            Operation::StartDtdAttlist { name } => target
                .start_dtd_attlist(name)
                .map(|()| Some(Closer::DtdAttlist)),
            Operation::StartCData => target.start_cdata().map(|()| Some(Closer::CData)),
            Operation::StartComment if in_dtd => target
                .write_raw("<!--")
                .map(|()| Some(Closer::Comment { raw: true })),
            Operation::StartComment => target
                .start_comment()
                .map(|()| Some(Closer::Comment { raw: false })),
            Operation::WriteAttr {
                prefix,
                name,
                uri,
                value,
            } => {
                let written = if prefix.is_some() || uri.is_some() {
                    target.write_attribute_ns(prefix, name, uri, value)
                } else {
                    target.write_attribute(name, value)
                };
                written.map(|()| None)
            }
            Operation::WriteText(text) => target.write_text(text).map(|()| None),
            Operation::WriteRaw(text) => target.write_raw(text).map(|()| None),
            Operation::WriteCData(text) => target.write_cdata(text).map(|()| None),
            Operation::WriteCDataContent(text) => target.write_cdata_raw(text).map(|()| None),
            Operation::WriteComment(text) if in_dtd => {
                write_raw_comment(target, text).map(|()| None)
            }
            Operation::WriteComment(text) => target.write_comment(text).map(|()| None),
            Operation::WritePi { target: pi, data } => target.write_pi(pi, data).map(|()| None),
            Operation::WriteDtdAttr {
                name,
                attr_type,
                decl,
                required,
            } => target
                .write_dtd_attribute(name, attr_type, decl, required)
                .map(|()| None),
            Operation::WriteDtdElem { name, model } => {
                target.write_dtd_element(name, model).map(|()| None)
            }
            Operation::WriteDtdEntity {
                is_pe,
                name,
                public_id,
                system_id,
                ndata_id,
                value,
            } => target
                .write_dtd_entity(is_pe, name, public_id, system_id, ndata_id, value)
                .map(|()| None),
            Operation::WriteNotation {
                name,
                public_id,
                system_id,
            } => target
                .write_dtd_notation(name, public_id, system_id)
                .map(|()| None),
        }
        .map_err(|e| writer_failure(index, command, e.message))?;

        if let Some(closer) = opened {
            self.stack.push(closer);
        }
        Ok(())
    }

    fn end(&mut self, index: usize, command: &Command, kind: Kind, full: Option<bool>) -> Result<()> {
        let unbalanced = |reason: String| Error::UnbalancedScope {
            index,
            label: command.label(),
            reason,
        };
        let Some(&closer) = self.stack.last() else {
            return Err(unbalanced("no open scope".to_string()));
        };
        if closer.kind() != kind {
            return Err(unbalanced(format!("innermost open scope is {closer}")));
        }
        self.stack.pop();
        closer
            .close(self.target, full)
            .map_err(|e| writer_failure(index, command, e.message))
    }

    /// Pops and closes every open scope, innermost first.
    fn unwind(&mut self) -> WriteResult {
        while let Some(closer) = self.stack.pop() {
            closer.close(self.target, None)?;
        }
        Ok(())
    }

    fn in_dtd(&self) -> bool {
        self.stack.contains(&Closer::Dtd)
    }
}

/// Writes a comment with raw delimiters, for targets that refuse
/// structured comments inside a DTD.
fn write_raw_comment(target: &mut dyn WriterTarget, text: &str) -> WriteResult {
    target.write_raw("<!--")?;
    target.write_raw(text)?;
    target.write_raw("-->")
}

fn writer_failure(index: usize, command: &Command, message: String) -> Error {
    Error::WriterFailure {
        index,
        label: command.label(),
        message,
    }
}

/// Replays `script` against `target`, closes anything left open and
/// flushes.
///
/// # Errors
///
/// See [`Player::step`] and [`Player::finish`].
pub fn run(script: &Script, target: &mut dyn WriterTarget) -> Result<()> {
    let mut player = Player::new(target);
    player.play(script)?;
    player.finish()
}
