//! A writer target that records calls instead of writing markup.

use std::fmt;

use super::{WriteResult, WriterTarget};

/// Records each [`WriterTarget`] call as one line of text.
///
/// Two players driven from the same script produce identical traces, so a
/// trace is a convenient form for comparing call sequences.
///
/// ```
/// use xmlscript::writer::{TraceWriter, WriterTarget};
///
/// let mut trace = TraceWriter::new();
/// trace.start_element("a").unwrap();
/// trace.end_element(false).unwrap();
/// assert_eq!(trace.lines(), ["start_element(\"a\")", "end_element(false)"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceWriter {
    lines: Vec<String>,
}

impl TraceWriter {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded calls, oldest first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the trace, returning the recorded calls.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    fn record(&mut self, line: String) -> WriteResult {
        self.lines.push(line);
        Ok(())
    }
}

impl fmt::Display for TraceWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl WriterTarget for TraceWriter {
    fn start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> WriteResult {
        self.record(format!(
            "start_document({version:?}, {encoding:?}, {standalone:?})"
        ))
    }

    fn end_document(&mut self) -> WriteResult {
        self.record("end_document()".to_string())
    }

    fn start_element(&mut self, name: &str) -> WriteResult {
        self.record(format!("start_element({name:?})"))
    }

    fn start_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        uri: Option<&str>,
    ) -> WriteResult {
        self.record(format!("start_element_ns({prefix:?}, {name:?}, {uri:?})"))
    }

    fn end_element(&mut self, full: bool) -> WriteResult {
        self.record(format!("end_element({full})"))
    }

    fn write_attribute(&mut self, name: &str, value: &str) -> WriteResult {
        self.record(format!("write_attribute({name:?}, {value:?})"))
    }

    fn write_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        uri: Option<&str>,
        value: &str,
    ) -> WriteResult {
        self.record(format!(
            "write_attribute_ns({prefix:?}, {name:?}, {uri:?}, {value:?})"
        ))
    }

    fn write_text(&mut self, text: &str) -> WriteResult {
        self.record(format!("write_text({text:?})"))
    }

    fn write_raw(&mut self, text: &str) -> WriteResult {
        self.record(format!("write_raw({text:?})"))
    }

    fn start_cdata(&mut self) -> WriteResult {
        self.record("start_cdata()".to_string())
    }

    fn write_cdata_raw(&mut self, text: &str) -> WriteResult {
        self.record(format!("write_cdata_raw({text:?})"))
    }

    fn end_cdata(&mut self) -> WriteResult {
        self.record("end_cdata()".to_string())
    }

    fn write_cdata(&mut self, text: &str) -> WriteResult {
        self.record(format!("write_cdata({text:?})"))
    }

    fn start_comment(&mut self) -> WriteResult {
        self.record("start_comment()".to_string())
    }

    fn end_comment(&mut self) -> WriteResult {
        self.record("end_comment()".to_string())
    }

    fn write_comment(&mut self, text: &str) -> WriteResult {
        self.record(format!("write_comment({text:?})"))
    }

    fn write_pi(&mut self, target: &str, data: Option<&str>) -> WriteResult {
        self.record(format!("write_pi({target:?}, {data:?})"))
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> WriteResult {
        self.record(format!("start_dtd({name:?}, {public_id:?}, {system_id:?})"))
    }

    fn end_dtd(&mut self) -> WriteResult {
        self.record("end_dtd()".to_string())
    }

    fn start_dtd_attlist(&mut self, name: &str) -> WriteResult {
        self.record(format!("start_dtd_attlist({name:?})"))
    }

    fn end_dtd_attlist(&mut self) -> WriteResult {
        self.record("end_dtd_attlist()".to_string())
    }

    fn write_dtd_attribute(
        &mut self,
        name: &str,
        attr_type: Option<&str>,
        decl: Option<&str>,
        required: bool,
    ) -> WriteResult {
        self.record(format!(
            "write_dtd_attribute({name:?}, {attr_type:?}, {decl:?}, {required})"
        ))
    }

    fn write_dtd_element(&mut self, name: &str, model: &str) -> WriteResult {
        self.record(format!("write_dtd_element({name:?}, {model:?})"))
    }

    fn write_dtd_entity(
        &mut self,
        is_pe: bool,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        ndata_id: Option<&str>,
        value: Option<&str>,
    ) -> WriteResult {
        self.record(format!(
            "write_dtd_entity({is_pe}, {name:?}, {public_id:?}, {system_id:?}, {ndata_id:?}, {value:?})"
        ))
    }

    fn write_dtd_notation(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> WriteResult {
        self.record(format!(
            "write_dtd_notation({name:?}, {public_id:?}, {system_id:?})"
        ))
    }

    fn flush(&mut self) -> WriteResult {
        Ok(())
    }
}
