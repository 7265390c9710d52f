//! Command-line front end: record documents, replay scripts, and compare
//! serializations.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xmlscript::diff::{round_trip, structural_diff};
use xmlscript::encoding::declared_encoding;
use xmlscript::parser::ParseOptions;
use xmlscript::player;
use xmlscript::writer::{TraceWriter, WriterOptions, XmlWriter};
use xmlscript::{Error, RecordOptions, Recorder, Script};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlscript -- record XML documents as command scripts and replay them.
#[derive(Parser, Debug)]
#[command(name = "xmlscript", version, about, long_about = None)]
struct Cli {
    /// Log progress to stderr (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a document and print its script.
    Record {
        #[command(flatten)]
        record: RecordArgs,

        /// Name carried on the script's root element.
        #[arg(long)]
        name: Option<String>,

        /// Document to record (use `-` for stdin).
        #[arg(default_value = "-")]
        file: String,
    },
    /// Replay a script and print the document.
    Play {
        /// Put child constructs on their own indented lines.
        #[arg(long)]
        indent: bool,

        /// Script to replay (use `-` for stdin).
        #[arg(default_value = "-")]
        file: String,
    },
    /// Replay a script and print the writer calls it makes.
    Trace {
        /// Script to replay (use `-` for stdin).
        #[arg(default_value = "-")]
        file: String,
    },
    /// Record, replay and re-record a document, and compare the scripts.
    Check {
        #[command(flatten)]
        record: RecordArgs,

        /// Document to check (use `-` for stdin).
        #[arg(default_value = "-")]
        file: String,
    },
    /// Compare two documents structurally.
    Diff {
        #[command(flatten)]
        record: RecordArgs,

        /// First document.
        left: String,

        /// Second document.
        right: String,
    },
    /// Print the encoding named in a document's XML declaration.
    Encoding {
        /// Document to inspect (use `-` for stdin).
        #[arg(default_value = "-")]
        file: String,
    },
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Attach source line, byte offset and handler name to each command.
    #[arg(short, long)]
    debug: bool,

    /// Drop whitespace-only text outside of elements.
    #[arg(short, long)]
    strip_whitespace: bool,

    /// Base URI reported with entity and notation declarations.
    #[arg(long, value_name = "URI")]
    base: Option<String>,
}

impl RecordArgs {
    fn options(&self) -> RecordOptions {
        let mut parse = ParseOptions::default();
        if let Some(base) = &self.base {
            parse = parse.base_uri(base.as_str());
        }
        RecordOptions::default()
            .debug(self.debug)
            .strip_whitespace(self.strip_whitespace)
            .parse_options(parse)
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_INVALID_SCRIPT: u8 = 2;
const EXIT_REPLAY_ERROR: u8 = 3;
const EXIT_UNHANDLED: u8 = 4;
const EXIT_DIVERGENCE: u8 = 5;

fn exit_code(err: &Error) -> u8 {
    match err {
        Error::SourceParse(_) | Error::Io(_) => EXIT_PARSE_ERROR,
        Error::InvalidCommand { .. } | Error::InvalidScript { .. } => EXIT_INVALID_SCRIPT,
        Error::UnknownOperation { .. }
        | Error::UnbalancedScope { .. }
        | Error::WriterFailure { .. } => EXIT_REPLAY_ERROR,
        Error::UnhandledConstruct { .. } => EXIT_UNHANDLED,
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("xmlscript: {err}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn run(command: &Command) -> Result<u8, Error> {
    match command {
        Command::Record { record, name, file } => {
            let mut options = record.options();
            options.name.clone_from(name);
            let script = Recorder::record_bytes(&read_input(file)?, &options)?;
            xmlscript::script::write_script(&script, io::stdout().lock())?;
            Ok(EXIT_SUCCESS)
        }
        Command::Play { indent, file } => {
            let script = Script::parse_bytes(&read_input(file)?)?;
            let options = WriterOptions::default().indent(*indent);
            let mut writer = XmlWriter::with_options(io::stdout().lock(), options);
            player::run(&script, &mut writer)?;
            Ok(EXIT_SUCCESS)
        }
        Command::Trace { file } => {
            let script = Script::parse_bytes(&read_input(file)?)?;
            let mut trace = TraceWriter::new();
            let result = player::run(&script, &mut trace);
            // The calls made before a failure are the useful part of a trace.
            print!("{trace}");
            io::stdout().flush()?;
            result?;
            Ok(EXIT_SUCCESS)
        }
        Command::Check { record, file } => {
            match round_trip(&read_input(file)?, &record.options())? {
                Some(divergence) => {
                    println!("{file}: {divergence}");
                    Ok(EXIT_DIVERGENCE)
                }
                None => Ok(EXIT_SUCCESS),
            }
        }
        Command::Diff {
            record,
            left,
            right,
        } => {
            let options = record.options();
            let left_script = Recorder::record_bytes(&read_input(left)?, &options)?;
            let right_script = Recorder::record_bytes(&read_input(right)?, &options)?;
            match structural_diff(&left_script, &right_script) {
                Some(divergence) => {
                    println!("{left} {right}: {divergence}");
                    Ok(EXIT_DIVERGENCE)
                }
                None => Ok(EXIT_SUCCESS),
            }
        }
        Command::Encoding { file } => {
            let bytes = read_input(file)?;
            match declared_encoding(&bytes) {
                Ok(Some(encoding)) => println!("{encoding}"),
                Ok(None) => {}
                Err(err) => {
                    eprintln!("{file}: {err}");
                    return Ok(EXIT_PARSE_ERROR);
                }
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}
