//! Console sink implementation

use std::io::Write;

use super::traits::{render_error_chain, ErrorPayload, LogSink, SinkResult};
use crate::level::Level;

/// A sink that writes to the process console (stdout/stderr)
///
/// `Info` goes to stdout, every other level to stderr. Lines follow the
/// logcat shape `<prefix> D/<tag>: <message>`, with the error chain appended
/// on the following lines when present.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    prefix: String,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    /// Create a new console sink with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "[TechWizards]".to_string(),
        }
    }

    /// Create a console sink with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build the text written for one record, without the trailing newline
    pub fn format_line(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) -> String {
        let mut line = format!("{} {}/{}: {}", self.prefix, level.letter(), tag, message);
        if let Some(err) = error {
            line.push('\n');
            line.push_str(&render_error_chain(err));
        }
        line
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) -> SinkResult<()> {
        let line = self.format_line(level, tag, message, error);
        match level {
            Level::Info => writeln!(std::io::stdout().lock(), "{}", line)?,
            _ => writeln!(std::io::stderr().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}
