//! The dispatch table: one [`Operation`] per executable (action, kind) pair,
//! and the [`Closer`]s that scope-opening operations leave on the stack.

use std::fmt;

use crate::script::{Action, Command, Kind, Params};
use crate::writer::{WriteResult, WriterTarget};

/// A command resolved to the writer calls it performs.
///
/// Borrowed from the [`Command`] it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operation<'c> {
    StartDoc {
        version: Option<&'c str>,
        encoding: Option<&'c str>,
        standalone: Option<bool>,
    },
    StartElem {
        prefix: Option<&'c str>,
        name: &'c str,
        uri: Option<&'c str>,
    },
    StartDtd {
        name: &'c str,
        public_id: Option<&'c str>,
        system_id: Option<&'c str>,
    },
    StartDtdAttlist {
        name: &'c str,
    },
    StartCData,
    StartComment,
    WriteAttr {
        prefix: Option<&'c str>,
        name: &'c str,
        uri: Option<&'c str>,
        value: &'c str,
    },
    WriteText(&'c str),
    WriteRaw(&'c str),
    WriteCData(&'c str),
    WriteCDataContent(&'c str),
    WriteComment(&'c str),
    WritePi {
        target: &'c str,
        data: Option<&'c str>,
    },
    WriteDtdAttr {
        name: &'c str,
        attr_type: Option<&'c str>,
        decl: Option<&'c str>,
        required: bool,
    },
    WriteDtdElem {
        name: &'c str,
        model: &'c str,
    },
    WriteDtdEntity {
        is_pe: bool,
        name: &'c str,
        public_id: Option<&'c str>,
        system_id: Option<&'c str>,
        ndata_id: Option<&'c str>,
        value: Option<&'c str>,
    },
    WriteNotation {
        name: &'c str,
        public_id: Option<&'c str>,
        system_id: Option<&'c str>,
    },
    /// Pops the innermost scope, which must be of `kind`. `full` only
    /// applies to elements.
    End {
        kind: Kind,
        full: Option<bool>,
    },
    EndAll,
}

impl<'c> Operation<'c> {
    /// Resolves a command. Returns `None` for a pair outside the table, or
    /// for a command missing the fields its operation needs.
    pub(crate) fn from_command(command: &'c Command) -> Option<Self> {
        let name = command.name.as_deref();
        let content = command.content.as_deref();
        let text = content.unwrap_or("");

        Some(match (command.action, command.kind, &command.params) {
            (
                Action::Start,
                Kind::Doc,
                Params::Document {
                    version,
                    encoding,
                    standalone,
                },
            ) => Self::StartDoc {
                version: version.as_deref(),
                encoding: encoding.as_deref(),
                standalone: *standalone,
            },
            (Action::Start, Kind::Doc, Params::None) => Self::StartDoc {
                version: None,
                encoding: None,
                standalone: None,
            },
            (Action::Start, Kind::Elem, Params::Namespace { prefix, uri }) => Self::StartElem {
                prefix: prefix.as_deref(),
                name: name?,
                uri: uri.as_deref(),
            },
            (Action::Start, Kind::Elem, Params::None) => Self::StartElem {
                prefix: None,
                name: name?,
                uri: None,
            },
            (
                Action::Start,
                Kind::Dtd,
                Params::Identifiers {
                    public_id,
                    system_id,
                },
            ) => Self::StartDtd {
                name: name?,
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
            },
            (Action::Start, Kind::Dtd, Params::None) => Self::StartDtd {
                name: name?,
                public_id: None,
                system_id: None,
            },
            (Action::Start, Kind::DtdAttlist, Params::None) => {
                Self::StartDtdAttlist { name: name? }
            }
            (Action::Start, Kind::CData, Params::None) => Self::StartCData,
            (Action::Start, Kind::Comment, Params::None) => Self::StartComment,

            (Action::Write, Kind::Attr, Params::Namespace { prefix, uri }) => Self::WriteAttr {
                prefix: prefix.as_deref(),
                name: name?,
                uri: uri.as_deref(),
                value: text,
            },
            (Action::Write, Kind::Attr, Params::None) => Self::WriteAttr {
                prefix: None,
                name: name?,
                uri: None,
                value: text,
            },
            (Action::Write, Kind::Text, Params::None) => Self::WriteText(text),
            (Action::Write, Kind::Raw, Params::Raw { next: true }) => Self::WriteRaw(text),
            (Action::Write, Kind::CData, Params::None) => Self::WriteCData(text),
            (Action::Write, Kind::CDataContent, Params::None) => Self::WriteCDataContent(text),
            (Action::Write, Kind::Comment, Params::None) => Self::WriteComment(text),
            (Action::Write, Kind::Pi, Params::Pi { target }) => Self::WritePi {
                target: target.as_str(),
                data: content,
            },
            (
                Action::Write,
                Kind::DtdAttr,
                Params::AttrDecl {
                    attr_type,
                    decl,
                    required,
                },
            ) => Self::WriteDtdAttr {
                name: name?,
                attr_type: attr_type.as_deref(),
                decl: decl.as_deref(),
                required: *required,
            },
            (Action::Write, Kind::DtdElem, Params::None) => Self::WriteDtdElem {
                name: name?,
                model: text,
            },
            (
                Action::Write,
                Kind::DtdEntity,
                Params::Entity {
                    is_pe,
                    public_id,
                    system_id,
                    ndata_id,
                },
            ) => Self::WriteDtdEntity {
                is_pe: *is_pe,
                name: name?,
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
                ndata_id: ndata_id.as_deref(),
                value: content,
            },
            (
                Action::Write,
                Kind::Notation,
                Params::Identifiers {
                    public_id,
                    system_id,
                },
            ) => Self::WriteNotation {
                name: name?,
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
            },
            (Action::Write, Kind::Notation, Params::None) => Self::WriteNotation {
                name: name?,
                public_id: None,
                system_id: None,
            },

            (Action::End, Kind::All, Params::None) => Self::EndAll,
            (Action::End, Kind::Elem, Params::EndElem { full }) => Self::End {
                kind: Kind::Elem,
                full: *full,
            },
            (
                Action::End,
                kind @ (Kind::Elem
                | Kind::Doc
                | Kind::Dtd
                | Kind::DtdAttlist
                | Kind::CData
                | Kind::Comment),
                Params::None,
            ) => Self::End { kind, full: None },

            _ => return None,
        })
    }
}

/// The pending close of an open scope.
///
/// Pushed when a scope opens and invoked when the matching `end` command,
/// or an `end.all`, pops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    /// Ends the document.
    Document,
    /// Ends an element. `full` is the end style used when the closing
    /// command does not choose one.
    Element {
        /// Write `</name>` rather than `/>`.
        full: bool,
    },
    /// Ends the document type declaration.
    Dtd,
    /// Ends an attribute-list declaration.
    DtdAttlist,
    /// Ends a CDATA section.
    CData,
    /// Ends a comment. A comment opened inside a DTD was started with raw
    /// markup and is closed the same way.
    Comment {
        /// Close with raw `-->`.
        raw: bool,
    },
}

impl Closer {
    /// The script kind whose `end` command pops this closer.
    #[must_use]
    pub fn kind(self) -> Kind {
        match self {
            Self::Document => Kind::Doc,
            Self::Element { .. } => Kind::Elem,
            Self::Dtd => Kind::Dtd,
            Self::DtdAttlist => Kind::DtdAttlist,
            Self::CData => Kind::CData,
            Self::Comment { .. } => Kind::Comment,
        }
    }

    /// Closes the scope on `target`. `full` overrides an element's default
    /// end style.
    pub(crate) fn close(self, target: &mut dyn WriterTarget, full: Option<bool>) -> WriteResult {
        match self {
            Self::Document => target.end_document(),
            Self::Element { full: default } => target.end_element(full.unwrap_or(default)),
            Self::Dtd => target.end_dtd(),
            Self::DtdAttlist => target.end_dtd_attlist(),
            Self::CData => target.end_cdata(),
            Self::Comment { raw: true } => target.write_raw("-->"),
            Self::Comment { raw: false } => target.end_comment(),
        }
    }
}

impl fmt::Display for Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::OPERATIONS;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_valid_operation_resolves() {
        for (action, kind) in OPERATIONS {
            let params = match (action, kind) {
                (Action::Write, Kind::Pi) => vec![("target".to_string(), "t".to_string())],
                _ => Vec::new(),
            };
            let command =
                Command::parse(action.as_str(), kind.as_str(), Some("n".into()), None, &params)
                    .unwrap();
            assert!(
                Operation::from_command(&command).is_some(),
                "{}",
                command.label()
            );
        }
    }

    #[test]
    fn test_pairs_outside_table_do_not_resolve() {
        let command = Command::new(Action::End, Kind::Text, Params::None);
        assert_eq!(Operation::from_command(&command), None);
        let command = Command::new(Action::Write, Kind::Raw, Params::Raw { next: false });
        assert_eq!(Operation::from_command(&command), None);
    }

    #[test]
    fn test_end_elem_carries_full() {
        let command = Command::new(Action::End, Kind::Elem, Params::EndElem { full: Some(true) });
        assert_eq!(
            Operation::from_command(&command),
            Some(Operation::End {
                kind: Kind::Elem,
                full: Some(true),
            })
        );
    }
}
