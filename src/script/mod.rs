//! Command model: one serialization instruction and ordered scripts of them.
//!
//! A [`Command`] pairs an [`Action`] (open a scope, write something, close a
//! scope) with the [`Kind`] of construct it acts on, plus an optional name,
//! optional content, and the kind-specific [`Params`]. A [`Script`] is an
//! ordered list of commands; nesting is carried by order alone and rebuilt
//! by the player's scope stack.
//!
//! Only the (action, kind) pairs listed in [`OPERATIONS`] are valid. Use
//! [`Command::parse`] to build a command from raw field values with full
//! validation, or [`Command::new`] with the builder methods when the values
//! are already typed.

mod emit;
mod load;

pub use emit::write_script;
pub use load::load_script;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What a command does to its construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Opens a scope.
    Start,
    /// Writes a construct in one step.
    Write,
    /// Closes a scope.
    End,
}

impl Action {
    /// The action's spelling in scripts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Write => "write",
            Self::End => "end",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "write" => Ok(Self::Write),
            "end" => Ok(Self::End),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The construct a command acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Every open scope; only valid with [`Action::End`].
    All,
    /// An attribute.
    Attr,
    /// A CDATA section.
    CData,
    /// Raw text inside an open CDATA section.
    CDataContent,
    /// A comment.
    Comment,
    /// The document.
    Doc,
    /// The document type declaration.
    Dtd,
    /// One attribute definition inside an attribute-list declaration.
    DtdAttr,
    /// An attribute-list declaration.
    DtdAttlist,
    /// An element declaration.
    DtdElem,
    /// An entity declaration.
    DtdEntity,
    /// An element.
    Elem,
    /// A notation declaration.
    Notation,
    /// A processing instruction.
    Pi,
    /// Text written without escaping.
    Raw,
    /// Escaped character data.
    Text,
}

impl Kind {
    /// The kind's spelling in scripts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Attr => "attr",
            Self::CData => "cdata",
            Self::CDataContent => "cdata-content",
            Self::Comment => "comment",
            Self::Doc => "doc",
            Self::Dtd => "dtd",
            Self::DtdAttr => "dtd-attr",
            Self::DtdAttlist => "dtd-attlist",
            Self::DtdElem => "dtd-elem",
            Self::DtdEntity => "dtd-entity",
            Self::Elem => "elem",
            Self::Notation => "notation",
            Self::Pi => "pi",
            Self::Raw => "raw",
            Self::Text => "text",
        }
    }

    /// Whether commands of this kind must carry a name.
    fn requires_name(self, action: Action) -> bool {
        match self {
            Self::Elem | Self::DtdAttlist | Self::Dtd => action == Action::Start,
            Self::Attr | Self::DtdAttr | Self::DtdElem | Self::DtdEntity | Self::Notation => true,
            _ => false,
        }
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "attr" => Self::Attr,
            "cdata" => Self::CData,
            "cdata-content" => Self::CDataContent,
            "comment" => Self::Comment,
            "doc" => Self::Doc,
            "dtd" => Self::Dtd,
            "dtd-attr" => Self::DtdAttr,
            "dtd-attlist" | "dtd-att-list" => Self::DtdAttlist,
            "dtd-elem" => Self::DtdElem,
            "dtd-entity" => Self::DtdEntity,
            "elem" => Self::Elem,
            "notation" => Self::Notation,
            "pi" => Self::Pi,
            "raw" => Self::Raw,
            "text" => Self::Text,
            other => return Err(format!("unknown kind '{other}'")),
        })
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every (action, kind) pair a player can execute.
pub const OPERATIONS: [(Action, Kind); 24] = [
    (Action::Write, Kind::Attr),
    (Action::Write, Kind::CData),
    (Action::Write, Kind::CDataContent),
    (Action::Write, Kind::Comment),
    (Action::Write, Kind::DtdElem),
    (Action::Write, Kind::DtdAttr),
    (Action::Write, Kind::DtdEntity),
    (Action::Write, Kind::Notation),
    (Action::Write, Kind::Pi),
    (Action::Write, Kind::Raw),
    (Action::Write, Kind::Text),
    (Action::Start, Kind::CData),
    (Action::Start, Kind::Comment),
    (Action::Start, Kind::Doc),
    (Action::Start, Kind::Dtd),
    (Action::Start, Kind::DtdAttlist),
    (Action::Start, Kind::Elem),
    (Action::End, Kind::All),
    (Action::End, Kind::CData),
    (Action::End, Kind::Comment),
    (Action::End, Kind::Doc),
    (Action::End, Kind::Dtd),
    (Action::End, Kind::DtdAttlist),
    (Action::End, Kind::Elem),
];

/// Kind-specific command parameters.
///
/// Each (action, kind) pair recognizes one variant; [`Params::None`] is
/// used by kinds that take no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
    /// No parameters.
    #[default]
    None,
    /// `start.elem` and `write.attr`: namespace prefix and URI.
    Namespace {
        /// The prefix, without the colon.
        prefix: Option<String>,
        /// The namespace URI.
        uri: Option<String>,
    },
    /// `start.doc`: the XML declaration.
    Document {
        /// `version` pseudo-attribute.
        version: Option<String>,
        /// `encoding` pseudo-attribute.
        encoding: Option<String>,
        /// `standalone` pseudo-attribute; absent when not declared.
        standalone: Option<bool>,
    },
    /// `start.dtd` and `write.notation`: external identifiers.
    Identifiers {
        /// The PUBLIC identifier.
        public_id: Option<String>,
        /// The SYSTEM identifier.
        system_id: Option<String>,
    },
    /// `write.dtd-entity`.
    Entity {
        /// Parameter entity (`<!ENTITY % ...>`).
        is_pe: bool,
        /// The PUBLIC identifier.
        public_id: Option<String>,
        /// The SYSTEM identifier.
        system_id: Option<String>,
        /// Notation of an unparsed entity.
        ndata_id: Option<String>,
    },
    /// `write.dtd-attr`.
    AttrDecl {
        /// The attribute type (`CDATA`, `(a|b)`, ...).
        attr_type: Option<String>,
        /// The default value.
        decl: Option<String>,
        /// `#REQUIRED`, or `#FIXED` when a default is present.
        required: bool,
    },
    /// `write.pi`.
    Pi {
        /// The PI target.
        target: String,
    },
    /// `write.raw`.
    Raw {
        /// Insert before the next sibling; the only supported placement.
        next: bool,
    },
    /// `end.elem`.
    EndElem {
        /// Close with a full end tag instead of `/>`; absent defers to the
        /// player's default.
        full: Option<bool>,
    },
}

impl Params {
    /// The parameters as `(name, value)` pairs in their script spelling.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &'static str, value: Option<&String>| {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        };
        match self {
            Self::None => {}
            Self::Namespace { prefix, uri } => {
                push("prefix", prefix.as_ref());
                push("uri", uri.as_ref());
            }
            Self::Document {
                version,
                encoding,
                standalone,
            } => {
                push("version", version.as_ref());
                push("encoding", encoding.as_ref());
                push("standalone", standalone.map(bool_str).as_ref());
            }
            Self::Identifiers {
                public_id,
                system_id,
            } => {
                push("public-id", public_id.as_ref());
                push("system-id", system_id.as_ref());
            }
            Self::Entity {
                is_pe,
                public_id,
                system_id,
                ndata_id,
            } => {
                push("is-pe", Some(&bool_str(*is_pe)));
                push("public-id", public_id.as_ref());
                push("system-id", system_id.as_ref());
                push("ndata-id", ndata_id.as_ref());
            }
            Self::AttrDecl {
                attr_type,
                decl,
                required,
            } => {
                push("type", attr_type.as_ref());
                push("decl", decl.as_ref());
                push("required", Some(&bool_str(*required)));
            }
            Self::Pi { target } => push("target", Some(target)),
            Self::Raw { next } => push("next", Some(&bool_str(*next))),
            Self::EndElem { full } => push("full", full.map(bool_str).as_ref()),
        }
        pairs
    }
}

fn bool_str(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Where a recorded command came from. Attached in debug mode only; never
/// affects replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// 1-based source line of the event.
    pub line: u32,
    /// 0-based byte offset of the event.
    pub pos: usize,
    /// The event handler that emitted the command.
    pub handler: String,
}

/// A command failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}: {reason}")]
pub struct InvalidCommand {
    /// The `action.kind` label as written.
    pub label: String,
    /// What was wrong.
    pub reason: String,
}

impl InvalidCommand {
    fn new(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// One instruction in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// What the command does.
    pub action: Action,
    /// The construct acted upon.
    pub kind: Kind,
    /// Element, attribute, entity, notation or doctype name.
    pub name: Option<String>,
    /// Text payload: text, attribute value, comment body, model string...
    pub content: Option<String>,
    /// Kind-specific parameters.
    pub params: Params,
    /// Debug-mode origin of the command.
    pub provenance: Option<Provenance>,
}

impl Command {
    /// Creates a command with no name or content.
    #[must_use]
    pub fn new(action: Action, kind: Kind, params: Params) -> Self {
        Self {
            action,
            kind,
            name: None,
            content: None,
            params,
            provenance: None,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the provenance.
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Builds a command from raw field values.
    ///
    /// `raw_params` holds the kind-specific parameters by their script
    /// names (`prefix`, `public-id`, `is-pe`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCommand`] if the action or kind is unknown, the pair
    /// is not in [`OPERATIONS`], a parameter is not recognized for the kind,
    /// a required name or parameter is missing, or a boolean parameter is
    /// not one of `true`, `false`, `yes`, `no`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlscript::script::{Command, Params};
    ///
    /// let params = [("prefix".to_string(), "p".to_string())];
    /// let cmd = Command::parse("start", "elem", Some("a".into()), None, &params).unwrap();
    /// assert_eq!(cmd.label(), "start.elem");
    /// assert!(matches!(cmd.params, Params::Namespace { prefix: Some(_), uri: None }));
    ///
    /// assert!(Command::parse("end", "text", None, None, &[]).is_err());
    /// ```
    pub fn parse(
        action: &str,
        kind: &str,
        name: Option<String>,
        content: Option<String>,
        raw_params: &[(String, String)],
    ) -> Result<Self, InvalidCommand> {
        let label = format!("{action}.{kind}");
        let action_v = action
            .parse::<Action>()
            .map_err(|reason| InvalidCommand::new(&label, reason))?;
        let kind_v = kind
            .parse::<Kind>()
            .map_err(|reason| InvalidCommand::new(&label, reason))?;
        if !OPERATIONS.contains(&(action_v, kind_v)) {
            return Err(InvalidCommand::new(label, "no such operation"));
        }

        let mut fields = RawParams::new(&label, raw_params);
        let params = fields.build(action_v, kind_v)?;
        fields.finish()?;

        let cmd = Self {
            action: action_v,
            kind: kind_v,
            name,
            content,
            params,
            provenance: None,
        };
        cmd.validate()?;
        Ok(cmd)
    }

    /// The `action.kind` label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.action, self.kind)
    }

    /// Checks the command against the dispatch table and its kind's
    /// required fields.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCommand`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InvalidCommand> {
        let invalid = |reason: &str| Err(InvalidCommand::new(self.label(), reason));
        if !OPERATIONS.contains(&(self.action, self.kind)) {
            return invalid("no such operation");
        }
        if self.kind.requires_name(self.action) && self.name.as_deref().map_or(true, str::is_empty)
        {
            return invalid("missing name");
        }
        let params_fit = match (&self.params, self.action, self.kind) {
            (Params::None, _, _) => !matches!(
                (self.action, self.kind),
                (Action::Write, Kind::Pi | Kind::Raw | Kind::DtdEntity | Kind::DtdAttr)
            ),
            (Params::Namespace { .. }, Action::Start, Kind::Elem)
            | (Params::Namespace { .. }, Action::Write, Kind::Attr)
            | (Params::Document { .. }, Action::Start, Kind::Doc)
            | (Params::Identifiers { .. }, Action::Start, Kind::Dtd)
            | (Params::Identifiers { .. }, Action::Write, Kind::Notation)
            | (Params::Entity { .. }, Action::Write, Kind::DtdEntity)
            | (Params::AttrDecl { .. }, Action::Write, Kind::DtdAttr)
            | (Params::Pi { .. }, Action::Write, Kind::Pi)
            | (Params::EndElem { .. }, Action::End, Kind::Elem) => true,
            (Params::Raw { next }, Action::Write, Kind::Raw) => {
                if !next {
                    return invalid("raw text can only be placed before the next sibling");
                }
                true
            }
            _ => false,
        };
        if !params_fit {
            return invalid("parameters do not match the command kind");
        }
        if let Params::Pi { target } = &self.params {
            if target.is_empty() {
                return invalid("missing target");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        if let Some(name) = &self.name {
            write!(f, " name={name}")?;
        }
        for (key, value) in self.params.to_pairs() {
            write!(f, " {key}={value}")?;
        }
        if let Some(content) = &self.content {
            write!(f, " {content:?}")?;
        }
        Ok(())
    }
}

/// Raw parameter values being consumed into a [`Params`] value.
struct RawParams<'a> {
    label: &'a str,
    pending: Vec<(&'a str, &'a str)>,
}

impl<'a> RawParams<'a> {
    fn new(label: &'a str, raw: &'a [(String, String)]) -> Self {
        Self {
            label,
            pending: raw.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
        }
    }

    fn take(&mut self, key: &str) -> Option<String> {
        let idx = self.pending.iter().position(|(k, _)| *k == key)?;
        Some(self.pending.remove(idx).1.to_string())
    }

    fn take_bool(&mut self, key: &str) -> Result<Option<bool>, InvalidCommand> {
        self.take(key)
            .map(|value| {
                parse_bool(&value).ok_or_else(|| {
                    InvalidCommand::new(
                        self.label,
                        format!("parameter '{key}' is not a boolean: '{value}'"),
                    )
                })
            })
            .transpose()
    }

    fn build(&mut self, action: Action, kind: Kind) -> Result<Params, InvalidCommand> {
        Ok(match (action, kind) {
            (Action::Start, Kind::Elem) | (Action::Write, Kind::Attr) => Params::Namespace {
                prefix: self.take("prefix"),
                uri: self.take("uri"),
            },
            (Action::Start, Kind::Doc) => Params::Document {
                version: self.take("version"),
                encoding: self.take("encoding"),
                standalone: self.take_bool("standalone")?,
            },
            (Action::Start, Kind::Dtd) | (Action::Write, Kind::Notation) => Params::Identifiers {
                public_id: self.take("public-id"),
                system_id: self.take("system-id"),
            },
            (Action::Write, Kind::DtdEntity) => Params::Entity {
                is_pe: self.take_bool("is-pe")?.unwrap_or(false),
                public_id: self.take("public-id"),
                system_id: self.take("system-id"),
                ndata_id: self.take("ndata-id"),
            },
            (Action::Write, Kind::DtdAttr) => Params::AttrDecl {
                attr_type: self.take("type"),
                decl: self.take("decl"),
                required: self.take_bool("required")?.unwrap_or(false),
            },
            (Action::Write, Kind::Pi) => Params::Pi {
                target: self.take("target").ok_or_else(|| {
                    InvalidCommand::new(self.label, "missing required parameter 'target'")
                })?,
            },
            (Action::Write, Kind::Raw) => Params::Raw {
                next: self.take_bool("next")?.unwrap_or(true),
            },
            (Action::End, Kind::Elem) => Params::EndElem {
                full: self.take_bool("full")?,
            },
            _ => Params::None,
        })
    }

    fn finish(self) -> Result<(), InvalidCommand> {
        match self.pending.first() {
            Some((key, _)) => Err(InvalidCommand::new(
                self.label,
                format!("unrecognized parameter '{key}'"),
            )),
            None => Ok(()),
        }
    }
}

/// Parses `true`/`false`/`yes`/`no`, ignoring ASCII case.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// An ordered, optionally named sequence of commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    /// Name carried on the script's root element.
    pub name: Option<String>,
    /// The commands in execution order.
    pub commands: Vec<Command>,
}

impl Script {
    /// Creates an empty, unnamed script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the script has no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates the commands in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl FromIterator<Command> for Script {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            name: None,
            commands: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_every_operation_parses() {
        for (action, kind) in OPERATIONS {
            let name = kind.requires_name(action).then(|| "n".to_string());
            let params = if kind == Kind::Pi {
                raw(&[("target", "t")])
            } else {
                Vec::new()
            };
            let cmd = Command::parse(action.as_str(), kind.as_str(), name, None, &params);
            assert!(cmd.is_ok(), "{action}.{kind}: {cmd:?}");
        }
    }

    #[test]
    fn test_unknown_pairs_rejected() {
        for (action, kind) in [("end", "text"), ("start", "attr"), ("write", "all"), ("start", "all")] {
            let err = Command::parse(action, kind, Some("n".into()), None, &[]).unwrap_err();
            assert_eq!(err.reason, "no such operation");
        }
        let err = Command::parse("stop", "elem", None, None, &[]).unwrap_err();
        assert_eq!(err.to_string(), "stop.elem: unknown action 'stop'");
        assert!(Command::parse("write", "pcdata", None, None, &[]).is_err());
    }

    #[test]
    fn test_attlist_alias() {
        let cmd = Command::parse("start", "dtd-att-list", Some("e".into()), None, &[]).unwrap();
        assert_eq!(cmd.kind, Kind::DtdAttlist);
        assert_eq!(cmd.label(), "start.dtd-attlist");
    }

    #[test]
    fn test_boolean_parameters() {
        let cmd = Command::parse(
            "write",
            "dtd-attr",
            Some("id".into()),
            None,
            &raw(&[("type", "ID"), ("required", "YES")]),
        )
        .unwrap();
        assert_eq!(
            cmd.params,
            Params::AttrDecl {
                attr_type: Some("ID".to_string()),
                decl: None,
                required: true,
            }
        );

        let err = Command::parse("end", "elem", None, None, &raw(&[("full", "maybe")])).unwrap_err();
        assert!(err.reason.contains("not a boolean"));
    }

    #[test]
    fn test_unrecognized_parameter_rejected() {
        let err = Command::parse("write", "text", None, None, &raw(&[("prefix", "p")])).unwrap_err();
        assert_eq!(err.reason, "unrecognized parameter 'prefix'");
    }

    #[test]
    fn test_required_fields() {
        assert!(Command::parse("start", "elem", None, None, &[]).is_err());
        assert!(Command::parse("write", "pi", None, None, &[]).is_err());
        assert!(Command::parse("end", "elem", None, None, &[]).is_ok());
        assert!(Command::parse("start", "dtd-attlist", Some(String::new()), None, &[]).is_err());
    }

    #[test]
    fn test_raw_next_false_rejected() {
        let err = Command::parse("write", "raw", None, None, &raw(&[("next", "false")])).unwrap_err();
        assert!(err.reason.contains("next sibling"));
        let cmd = Command::parse("write", "raw", None, Some("x".into()), &[]).unwrap();
        assert_eq!(cmd.params, Params::Raw { next: true });
    }

    #[test]
    fn test_validate_built_commands() {
        let ok = Command::new(Action::Start, Kind::Elem, Params::None).with_name("a");
        assert!(ok.validate().is_ok());

        let missing = Command::new(Action::Write, Kind::Attr, Params::None);
        assert_eq!(missing.validate().unwrap_err().reason, "missing name");

        let mismatched = Command::new(Action::Write, Kind::Text, Params::Pi { target: "t".into() });
        assert!(mismatched.validate().is_err());

        let no_op = Command::new(Action::End, Kind::Text, Params::None);
        assert_eq!(no_op.validate().unwrap_err().reason, "no such operation");
    }

    #[test]
    fn test_display() {
        let cmd = Command::new(
            Action::Write,
            Kind::Attr,
            Params::Namespace {
                prefix: Some("p".into()),
                uri: Some("urn:p".into()),
            },
        )
        .with_name("x")
        .with_content("1");
        assert_eq!(cmd.to_string(), "write.attr name=x prefix=p uri=urn:p \"1\"");
    }

    #[test]
    fn test_params_to_pairs_order() {
        let params = Params::Entity {
            is_pe: true,
            public_id: None,
            system_id: Some("e.ent".into()),
            ndata_id: None,
        };
        assert_eq!(
            params.to_pairs(),
            vec![("is-pe", "true".to_string()), ("system-id", "e.ent".to_string())]
        );
    }
}
