//! Pseudo-attribute scanner for the XML declaration.
//!
//! Pulls `name="value"` pairs out of the bytes following `<?xml` without
//! running the full parser. The grammar is deliberately narrow: pairs are
//! separated by ASCII whitespace, `=` must follow the name directly, the
//! value must be quoted, and `?` ends the scan.

use thiserror::Error;

/// Why a declaration could not be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclError {
    /// A name was followed by something other than `=`.
    #[error("expected '=' after '{name}' at byte {offset}")]
    BareToken {
        /// The token read so far.
        name: String,
        /// Offset of the offending byte.
        offset: usize,
    },
    /// `=` was not followed by a quote character.
    #[error("expected quoted value for '{name}' at byte {offset}")]
    UnquotedValue {
        /// The pseudo-attribute being read.
        name: String,
        /// Offset of the offending byte.
        offset: usize,
    },
    /// Input ended inside a name or value.
    #[error("unterminated declaration after {consumed} bytes")]
    Unterminated {
        /// Bytes consumed before input ran out.
        consumed: usize,
    },
}

#[derive(Clone, Copy)]
enum State {
    Start,
    Name { start: usize },
    Quote { name_end: usize, start: usize },
    Value { quote: u8, name: (usize, usize), start: usize },
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Scans the pseudo-attributes of an XML declaration.
///
/// `input` holds the bytes immediately following `<?xml`. Returns the
/// pairs in document order; the scan stops at the first `?` outside a value.
/// Names and values are decoded lossily, since a declaration is ASCII in
/// every encoding this crate reads it from.
///
/// # Errors
///
/// Returns [`DeclError`] when a name is not followed by `=`, a value is not
/// quoted, or the input ends in the middle of a pair.
///
/// # Examples
///
/// ```
/// use xmlscript::encoding::scan_declaration;
///
/// let pairs = scan_declaration(b" version=\"1.0\" encoding='latin1'?>").unwrap();
/// assert_eq!(pairs[1], ("encoding".to_string(), "latin1".to_string()));
/// ```
pub fn scan_declaration(input: &[u8]) -> Result<Vec<(String, String)>, DeclError> {
    let text = |start: usize, end: usize| String::from_utf8_lossy(&input[start..end]).into_owned();
    let mut pairs = Vec::new();
    let mut state = State::Start;

    for (i, &b) in input.iter().enumerate() {
        state = match state {
            State::Start if b == b'?' => return Ok(pairs),
            State::Start if is_space(b) => State::Start,
            State::Start => State::Name { start: i },
            State::Name { start } if b == b'=' => State::Quote {
                name_end: i,
                start,
            },
            State::Name { start } if b == b'?' || is_space(b) => {
                return Err(DeclError::BareToken {
                    name: text(start, i),
                    offset: i,
                });
            }
            State::Name { start } => State::Name { start },
            State::Quote { name_end, start } if b == b'"' || b == b'\'' => State::Value {
                quote: b,
                name: (start, name_end),
                start: i + 1,
            },
            State::Quote { name_end, start } => {
                return Err(DeclError::UnquotedValue {
                    name: text(start, name_end),
                    offset: i,
                });
            }
            State::Value { quote, name, start } if b == quote => {
                pairs.push((text(name.0, name.1), text(start, i)));
                State::Start
            }
            value @ State::Value { .. } => value,
        };
    }

    match state {
        State::Start => Ok(pairs),
        _ => Err(DeclError::Unterminated {
            consumed: input.len(),
        }),
    }
}

/// Returns the declared encoding of a document, upper-cased.
///
/// Looks only at a leading `<?xml` declaration. Returns `Ok(None)` when
/// there is no declaration or it names no encoding.
///
/// # Errors
///
/// Propagates [`DeclError`] from a malformed declaration.
pub fn declared_encoding(bytes: &[u8]) -> Result<Option<String>, DeclError> {
    let Some(rest) = bytes.strip_prefix(b"<?xml") else {
        return Ok(None);
    };
    // A declaration must be followed by whitespace; `<?xml-stylesheet` is a PI.
    if !rest.first().copied().is_some_and(is_space) {
        return Ok(None);
    }
    let pairs = scan_declaration(rest)?;
    Ok(pairs
        .into_iter()
        .find(|(name, _)| name == "encoding")
        .map(|(_, value)| value.to_ascii_uppercase()))
}
