//! # xmlscript
//!
//! Capture an XML document as a linear script of serialization commands,
//! and replay such scripts against any XML writer.
//!
//! The two directions together form a differential-testing harness: a
//! document is recorded once, the script is replayed by different writer
//! implementations, and their outputs (or their call sequences) are
//! compared.
//!
//! - [`recorder`] turns parse events into a [`Script`].
//! - [`player`] drives a [`writer::WriterTarget`] from a script, keeping a
//!   scope stack so every opened construct is closed in order.
//! - [`script`] holds the command model and the script's own XML form.
//! - [`diff`] compares scripts structurally and checks round trips.
//!
//! ## Quick Start
//!
//! ```
//! use xmlscript::{player, Recorder, RecordOptions, Script};
//! use xmlscript::writer::XmlWriter;
//!
//! let script = Recorder::record_str("<a x=\"1\"><b/></a>", &RecordOptions::default()).unwrap();
//!
//! // Scripts are documents too.
//! let reloaded = Script::parse(&script.to_xml().unwrap()).unwrap();
//! assert_eq!(reloaded, script);
//!
//! let mut writer = XmlWriter::new(Vec::new());
//! player::run(&reloaded, &mut writer).unwrap();
//! assert_eq!(writer.into_inner(), b"<a x=\"1\"><b/></a>");
//! ```

pub mod diff;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod player;
pub mod recorder;
pub mod sax;
pub mod script;
pub mod writer;

// Re-export primary types at the crate root for convenience.
pub use error::{Error, ParseError, Result, SourceLocation};
pub use player::Player;
pub use recorder::{RecordOptions, Recorder};
pub use script::{Action, Command, Kind, Params, Script};
