//! TechWizards Log
//!
//! Multi-sink logging for the TechWizards dice game.
//! A single `DecentralizedLogger` filters records by level, redacts PII from
//! messages and fans them out to console and rotating-file sinks. Logging
//! never fails the caller: sink errors and panics are contained and reported
//! as one warning on the console fallback path.
//!
//! ## Start-up
//!
//! ```rust,no_run
//! use techwizards_log::{config, info_log};
//!
//! config::init().expect("logging configuration");
//! info_log!("Partida", "nueva partida con {} monedas", 10);
//! ```
//!
//! ## Explicit context
//!
//! ```rust
//! use std::sync::Arc;
//! use techwizards_log::{DecentralizedLogger, Level};
//! use techwizards_log::sinks::NoOpSink;
//!
//! let logger = DecentralizedLogger::new();
//! logger.set_min_level(Level::Debug);
//! logger.register_sink(Arc::new(NoOpSink::new()));
//! logger.debug("Controlador", "tirada=4");
//! ```

pub mod level;
pub mod sinks;
pub mod logger;
pub mod config;

// Re-export commonly used types
pub use level::Level;

pub use logger::{
    global, DecentralizedLogger,
    FALLBACK_TAG, MAX_MESSAGE_LEN, MAX_TAG_LEN, REDACTION,
};

pub use sinks::{
    ConsoleSink, ErrorPayload, FileSink, FileSinkOptions, LogSink, NoOpSink,
    SharedSink, SinkError, SinkResult,
};

pub use config::{ConfigError, ConfigResult, LoggingConfig};
