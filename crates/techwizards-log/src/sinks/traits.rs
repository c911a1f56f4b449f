//! Sink trait definition

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use crate::level::Level;

/// Error payload attached to a record, rendered by sinks as an error chain
pub type ErrorPayload<'a> = &'a (dyn StdError + 'static);

/// Errors a sink may report from `emit` or `flush`
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background writer has stopped")]
    WorkerStopped,

    #[error("Sink error: {0}")]
    Other(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Backend that receives sanitized log records
///
/// Implementations:
/// - `ConsoleSink`: stdout/stderr
/// - `FileSink`: rotating file written by a background worker
/// - `NoOpSink`: discards everything
///
/// The logger hands over records that are already filtered, masked and
/// truncated. An `Err` or a panic from `emit` is contained by the logger and
/// never reaches the code that logged.
pub trait LogSink: Send + Sync + 'static {
    /// Deliver one record
    fn emit(
        &self,
        level: Level,
        tag: &str,
        message: &str,
        error: Option<ErrorPayload<'_>>,
    ) -> SinkResult<()>;

    /// Wait until every previously emitted record has been persisted
    fn flush(&self) -> SinkResult<()> {
        Ok(())
    }
}

/// Type alias for an Arc-wrapped sink
pub type SharedSink = Arc<dyn LogSink>;

/// Render an error and its `source()` chain, one cause per line
pub fn render_error_chain(error: ErrorPayload<'_>) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, "\n    caused by: {}", cause);
        source = cause.source();
    }
    out
}
