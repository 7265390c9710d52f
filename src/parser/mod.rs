//! Parser configuration and the input cursor.
//!
//! The event parser in [`crate::sax`] reads documents and recorded scripts
//! alike. [`ParseOptions`] bounds the work it may do on hostile input and
//! carries the base URI reported with entity and notation declarations.
//! No external entity or subset is ever fetched.

pub(crate) mod input;

/// Default maximum element nesting depth.
const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in bytes) of a name.
const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of reference expansions per document.
const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// Options for the event parser.
///
/// ```
/// use xmlscript::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .max_depth(128)
///     .base_uri("file:///srv/corpus/");
/// assert_eq!(opts.max_depth, 128);
/// assert_eq!(opts.base_uri.as_deref(), Some("file:///srv/corpus/"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum length in bytes of any name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum number of character and entity references expanded per
    /// document, nested expansions included (default: 10,000).
    pub max_entity_expansions: u32,
    /// Base URI reported with entity and notation declarations.
    ///
    /// Unset by default, in which case declarations carry no base.
    pub base_uri: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
            base_uri: None,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum number of reference expansions.
    #[must_use]
    pub fn max_entity_expansions(mut self, max: u32) -> Self {
        self.max_entity_expansions = max;
        self
    }

    /// Sets the base URI reported with entity and notation declarations.
    #[must_use]
    pub fn base_uri(mut self, base: impl Into<String>) -> Self {
        self.base_uri = Some(base.into());
        self
    }

    pub(crate) fn limits(&self) -> input::Limits {
        input::Limits {
            max_depth: self.max_depth,
            max_name_length: self.max_name_length,
            max_entity_expansions: self.max_entity_expansions,
        }
    }
}
