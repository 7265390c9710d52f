//! Structural comparison of scripts.
//!
//! Two documents are structurally equivalent when their normalized scripts
//! are equal. Normalization removes what a serializer is free to change:
//! debug provenance, whitespace-only raw text, the split of character data
//! into chunks, attribute order within a start tag, and the split of one
//! element's attribute definitions across adjacent attribute-list
//! declarations.

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::player;
use crate::recorder::{RecordOptions, Recorder};
use crate::script::{Action, Command, Kind, Params, Script};
use crate::writer::XmlWriter;

/// The first point where two normalized scripts disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// Position in the normalized scripts.
    pub index: usize,
    /// The left command, or `None` if the left script ended first.
    pub left: Option<Command>,
    /// The right command, or `None` if the right script ended first.
    pub right: Option<Command>,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scripts diverge at command {}: ", self.index)?;
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => write!(f, "{left} != {right}"),
            (Some(left), None) => write!(f, "{left} != end of script"),
            (None, Some(right)) => write!(f, "end of script != {right}"),
            (None, None) => f.write_str("no difference"),
        }
    }
}

/// Returns the canonical form of `script` used for structural comparison.
///
/// ```
/// use xmlscript::diff::normalize;
/// use xmlscript::recorder::{RecordOptions, Recorder};
///
/// let a = Recorder::record_str("<r b=\"2\" a=\"1\"/>", &RecordOptions::default()).unwrap();
/// let b = Recorder::record_str("<r a=\"1\" b=\"2\"/>", &RecordOptions::default()).unwrap();
/// assert_ne!(a, b);
/// assert_eq!(normalize(&a), normalize(&b));
/// ```
#[must_use]
pub fn normalize(script: &Script) -> Script {
    let mut out: Vec<Command> = Vec::with_capacity(script.len());
    for command in script {
        if command.kind == Kind::Raw
            && command
                .content
                .as_deref()
                .map_or(true, |c| c.chars().all(char::is_whitespace))
        {
            continue;
        }
        let mut command = command.clone();
        command.provenance = None;

        if is_text(&command) {
            if let Some(prev) = out.last_mut().filter(|prev| is_text(prev)) {
                let extra = command.content.unwrap_or_default();
                prev.content.get_or_insert_with(String::new).push_str(&extra);
                continue;
            }
        }
        let closes_same_group = command.action == Action::Start
            && command.kind == Kind::DtdAttlist
            && out
                .last()
                .is_some_and(|prev| prev.action == Action::End && prev.kind == Kind::DtdAttlist)
            && reopens_last_attlist(&out, command.name.as_deref());
        if closes_same_group {
            out.pop();
            continue;
        }
        out.push(command);
    }

    sort_attribute_runs(&mut out);
    Script {
        name: None,
        commands: out,
    }
}

/// Compares two scripts structurally.
///
/// Returns `None` when the normalized scripts are equal.
#[must_use]
pub fn structural_diff(left: &Script, right: &Script) -> Option<Divergence> {
    let left = normalize(left);
    let right = normalize(right);
    let len = left.len().max(right.len());
    (0..len).find_map(|index| {
        let l = left.commands.get(index);
        let r = right.commands.get(index);
        (l != r).then(|| Divergence {
            index,
            left: l.cloned(),
            right: r.cloned(),
        })
    })
}

/// Records `document`, replays the script through an [`XmlWriter`],
/// records the output and compares the two scripts.
///
/// # Errors
///
/// Any error from recording the source, replaying the script, or recording
/// the replayed output.
///
/// # Examples
///
/// ```
/// use xmlscript::diff::round_trip;
/// use xmlscript::recorder::RecordOptions;
///
/// let doc = "<!DOCTYPE note [<!ELEMENT note (to,from,body)>]><note a=\"1\">hi</note>";
/// assert_eq!(round_trip(doc.as_bytes(), &RecordOptions::default()).unwrap(), None);
/// ```
pub fn round_trip(document: &[u8], options: &RecordOptions) -> Result<Option<Divergence>> {
    let original = Recorder::record_bytes(document, options)?;
    let mut writer = XmlWriter::new(Vec::new());
    player::run(&original, &mut writer)?;
    let replayed = writer.into_inner();
    let rerecorded = Recorder::record_bytes(&replayed, options)?;
    let divergence = structural_diff(&original, &rerecorded);
    debug!(
        commands = original.len(),
        output_bytes = replayed.len(),
        diverged = divergence.is_some(),
        "round trip"
    );
    Ok(divergence)
}

fn is_text(command: &Command) -> bool {
    command.action == Action::Write && command.kind == Kind::Text
}

/// Whether the attribute-list group just closed at the end of `out` was
/// opened for `name`.
fn reopens_last_attlist(out: &[Command], name: Option<&str>) -> bool {
    out.iter()
        .rev()
        .find(|c| c.action == Action::Start && c.kind == Kind::DtdAttlist)
        .is_some_and(|start| start.name.as_deref() == name)
}

fn sort_attribute_runs(commands: &mut [Command]) {
    let mut start = 0;
    while start < commands.len() {
        let len = commands[start..]
            .iter()
            .take_while(|c| c.action == Action::Write && c.kind == Kind::Attr)
            .count();
        if len > 1 {
            commands[start..start + len].sort_by(|a, b| attr_key(a).cmp(&attr_key(b)));
        }
        start += len.max(1);
    }
}

fn attr_key(command: &Command) -> (Option<&str>, Option<&str>) {
    let prefix = match &command.params {
        Params::Namespace { prefix, .. } => prefix.as_deref(),
        _ => None,
    };
    (prefix, command.name.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::script::Provenance;
    use pretty_assertions::assert_eq;

    fn record(input: &str) -> Script {
        Recorder::record_str(input, &RecordOptions::default()).unwrap()
    }

    #[test]
    fn test_normalize_merges_text_and_drops_whitespace_raw() {
        let mut script = Script::new();
        script.push(Command::new(Action::Start, Kind::Elem, Params::None).with_name("a"));
        script.push(Command::new(Action::Write, Kind::Text, Params::None).with_content("x"));
        script.push(Command::new(Action::Write, Kind::Text, Params::None).with_content("y"));
        script.push(
            Command::new(Action::Write, Kind::Raw, Params::Raw { next: true }).with_content("\n "),
        );
        script.push(
            Command::new(Action::End, Kind::Elem, Params::EndElem { full: None }).with_provenance(
                Provenance {
                    line: 1,
                    pos: 0,
                    handler: "end_element".into(),
                },
            ),
        );
        let labels: Vec<String> = normalize(&script).iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["start.elem name=a", "write.text \"xy\"", "end.elem"]);
    }

    #[test]
    fn test_normalize_merges_split_attlists() {
        let split = record(
            "<!DOCTYPE e [<!ATTLIST e a CDATA #IMPLIED>\n<!ATTLIST e b CDATA #IMPLIED>]><e/>",
        );
        let joined = record("<!DOCTYPE e [<!ATTLIST e a CDATA #IMPLIED b CDATA #IMPLIED>]><e/>");
        assert_ne!(split, joined);
        assert_eq!(structural_diff(&split, &joined), None);

        let other = record(
            "<!DOCTYPE e [<!ATTLIST e a CDATA #IMPLIED>\n<!ATTLIST f b CDATA #IMPLIED>]><e/>",
        );
        assert!(structural_diff(&split, &other).is_some());
    }

    #[test]
    fn test_structural_diff_reports_first_divergence() {
        let left = record("<a><b/></a>");
        let right = record("<a><c/></a>");
        let divergence = structural_diff(&left, &right).unwrap();
        assert_eq!(divergence.index, 1);
        assert_eq!(
            divergence.to_string(),
            "scripts diverge at command 1: start.elem name=b != start.elem name=c"
        );

        let shorter = record("<a/>");
        let divergence = structural_diff(&record("<a>t</a>"), &shorter).unwrap();
        assert_eq!(divergence.right.map(|c| c.label()), Some("end.elem".to_string()));
    }

    #[test]
    fn test_round_trip_documents() {
        for doc in [
            "<a x=\"1\"><b/></a>",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<r>t &amp; <![CDATA[c]]><!--k--><?p d?></r>\n",
            "<p:a xmlns:p=\"urn:p\" xmlns:q=\"urn:q\" q:x=\"1\" y=\"&lt;\"/>",
            "<!DOCTYPE r [\n<!ELEMENT r (#PCDATA|s)*>\n<!ATTLIST r id ID #REQUIRED v CDATA \"d\">\n<!ENTITY e \"v\">\n<!NOTATION n SYSTEM \"n\">\n]>\n<r id=\"1\">a&e;b</r>",
        ] {
            assert_eq!(round_trip(doc.as_bytes(), &RecordOptions::default()).unwrap(), None, "{doc}");
        }
    }
}
