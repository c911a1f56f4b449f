//! Log sinks: backends that receive sanitized records
//!
//! - `LogSink` trait for implementing custom backends
//! - Built-in implementations: `ConsoleSink`, `FileSink`, `NoOpSink`

mod traits;
mod noop;
mod console;
pub mod file_sink;

pub use traits::{render_error_chain, ErrorPayload, LogSink, SharedSink, SinkError, SinkResult};
pub use noop::NoOpSink;
pub use console::ConsoleSink;
pub use file_sink::{FileSink, FileSinkOptions};
