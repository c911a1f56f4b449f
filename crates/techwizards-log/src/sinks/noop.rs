//! No-op sink implementation

use super::traits::{ErrorPayload, LogSink, SinkResult};
use crate::level::Level;

/// A sink that discards every record
///
/// Registering it keeps the logger from falling back to the console while
/// producing no output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl NoOpSink {
    /// Create a new no-op sink
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for NoOpSink {
    fn emit(&self, _level: Level, _tag: &str, _message: &str, _error: Option<ErrorPayload<'_>>) -> SinkResult<()> {
        Ok(())
    }
}
