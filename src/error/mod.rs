//! Error types for recording and replaying command scripts.
//!
//! Parsing problems in a source document carry a [`SourceLocation`] with
//! line, column, and byte offset, matching the reporting model of the
//! parser. Everything else a run can fail with is a variant of [`Error`];
//! every variant is fatal to the current record or replay run.

use std::fmt;

use thiserror::Error;

use crate::script::InvalidCommand;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when a source document cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the fatal error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<crate::encoding::EncodingError> for ParseError {
    fn from(err: crate::encoding::EncodingError) -> Self {
        Self {
            message: err.to_string(),
            location: SourceLocation::default(),
        }
    }
}

/// Everything that can stop a record or replay run.
#[derive(Debug, Error)]
pub enum Error {
    /// A command in a script failed schema validation.
    #[error("command {index} is invalid: {source}")]
    InvalidCommand {
        /// Position of the command in the script.
        index: usize,
        /// What was wrong with it.
        #[source]
        source: InvalidCommand,
    },

    /// The script document itself is malformed (wrong root, stray content,
    /// disabled feature flag).
    #[error("invalid script: {reason}")]
    InvalidScript {
        /// Human-readable cause.
        reason: String,
    },

    /// No operation exists for the command's (action, kind) pair.
    #[error("command {index} ({label}): unknown operation")]
    UnknownOperation {
        /// Position of the command in the script.
        index: usize,
        /// The `action.kind` label.
        label: String,
    },

    /// An end command found an empty scope stack or a scope of another kind.
    #[error("command {index} ({label}): unbalanced scope: {reason}")]
    UnbalancedScope {
        /// Position of the command in the script.
        index: usize,
        /// The `action.kind` label.
        label: String,
        /// What the stack held instead.
        reason: String,
    },

    /// The recorder met a construct it has no mapping for.
    #[error("unhandled construct at {location}: {construct}")]
    UnhandledConstruct {
        /// Description of the construct.
        construct: String,
        /// Where the construct started in the source.
        location: SourceLocation,
    },

    /// The writer target rejected an operation.
    #[error("command {index} ({label}) failed: {message}")]
    WriterFailure {
        /// Position of the command in the script.
        index: usize,
        /// The `action.kind` label.
        label: String,
        /// The target's diagnostic.
        message: String,
    },

    /// The source document could not be parsed to completion.
    #[error(transparent)]
    SourceParse(#[from] ParseError),

    /// Reading input or writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_source_parse_is_transparent() {
        let err = Error::from(ParseError {
            message: "no element found".to_string(),
            location: SourceLocation::default(),
        });
        assert_eq!(err.to_string(), "parse error at 0:0: no element found");
    }

    #[test]
    fn test_replay_errors_name_the_command() {
        let err = Error::WriterFailure {
            index: 3,
            label: "write.attr".to_string(),
            message: "attribute outside of a start tag".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "command 3 (write.attr) failed: attribute outside of a start tag"
        );

        let err = Error::UnbalancedScope {
            index: 0,
            label: "end.elem".to_string(),
            reason: "no open scope".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "command 0 (end.elem): unbalanced scope: no open scope"
        );
    }
}
