//! Multi-sink log router
//!
//! `DecentralizedLogger` filters records by level, sanitizes the tag, masks
//! PII in the message and fans the result out to every registered sink.
//! A failing or panicking sink never affects the caller or the other sinks.
//!
//! ```rust
//! use std::sync::Arc;
//! use regex::Regex;
//! use techwizards_log::{DecentralizedLogger, Level};
//! use techwizards_log::sinks::NoOpSink;
//!
//! let logger = DecentralizedLogger::new();
//! logger.set_min_level(Level::Info);
//! logger.register_sink(Arc::new(NoOpSink::new()));
//! logger.add_pii_mask(Regex::new(r"[0-9]{16}").unwrap());
//!
//! logger.info("Tienda", "card=1234567812345678");
//! ```

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::level::Level;
use crate::sinks::{ConsoleSink, ErrorPayload, LogSink, SharedSink};

/// Longest tag delivered to sinks, in characters
pub const MAX_TAG_LEN: usize = 23;
/// Longest message delivered to sinks, in characters
pub const MAX_MESSAGE_LEN: usize = 4000;
/// Tag used when the caller passes a blank one
pub const FALLBACK_TAG: &str = "Untagged";
/// Replacement for every PII mask match
pub const REDACTION: &str = "***";

/// Tag of the warnings the logger emits about itself
const SELF_TAG: &str = "DecentralizedLogger";
/// Characters of a sink failure kept in the aggregated warning
const FAILURE_EXCERPT_LEN: usize = 120;

#[derive(Clone)]
struct RegisteredSink {
    kind: TypeId,
    name: &'static str,
    sink: SharedSink,
}

/// Log router owning the sink registry, the level threshold and the PII masks
///
/// Every method takes `&self` and is safe to call from any thread. Emission
/// clones a snapshot of the registry and never holds a lock while a sink runs.
pub struct DecentralizedLogger {
    min_level: AtomicU8,
    sinks: RwLock<Arc<[RegisteredSink]>>,
    masks: RwLock<Arc<[Regex]>>,
    fallback: SharedSink,
}

impl Default for DecentralizedLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl DecentralizedLogger {
    /// Create a logger with no sinks, no masks and a `Verbose` threshold
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(ConsoleSink::new()))
    }

    /// Create a logger whose fallback path writes to `fallback`
    ///
    /// The fallback receives records while no sink is registered, plus the
    /// logger's own warnings about missing or failing sinks.
    pub fn with_fallback(fallback: SharedSink) -> Self {
        Self {
            min_level: AtomicU8::new(Level::Verbose.ordinal()),
            sinks: RwLock::new(Arc::from(Vec::new())),
            masks: RwLock::new(Arc::from(Vec::new())),
            fallback,
        }
    }

    /// Register a sink unless one of the same concrete type is already present
    ///
    /// Returns `true` if the sink was added.
    pub fn register_sink<S: LogSink>(&self, sink: Arc<S>) -> bool {
        let kind = TypeId::of::<S>();
        let mut sinks = self.sinks.write();
        if sinks.iter().any(|s| s.kind == kind) {
            return false;
        }

        let mut next = sinks.to_vec();
        next.push(RegisteredSink {
            kind,
            name: short_type_name(type_name::<S>()),
            sink,
        });
        *sinks = next.into();
        true
    }

    /// Number of registered sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    /// Type names of the registered sinks, in registration order
    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.read().iter().map(|s| s.name).collect()
    }

    /// Replace the threshold; applies to every later call
    pub fn set_min_level(&self, level: Level) {
        self.min_level.store(level.ordinal(), Ordering::Relaxed);
    }

    /// Set the threshold from a label; unknown labels normalize to `Info`
    pub fn set_min_level_label(&self, label: &str) {
        self.set_min_level(Level::from_label(label));
    }

    /// Current threshold
    pub fn min_level(&self) -> Level {
        Level::from_ordinal(self.min_level.load(Ordering::Relaxed))
    }

    /// Whether a record at `level` would reach the sinks
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level.ordinal() >= self.min_level.load(Ordering::Relaxed)
    }

    /// Append a PII mask; matches in messages are replaced with `***`
    pub fn add_pii_mask(&self, pattern: Regex) {
        let mut masks = self.masks.write();
        let mut next = masks.to_vec();
        next.push(pattern);
        *masks = next.into();
    }

    /// Whether a mask with exactly this pattern is registered
    pub fn has_pii_mask(&self, pattern: &str) -> bool {
        self.masks.read().iter().any(|mask| mask.as_str() == pattern)
    }

    /// Number of registered PII masks
    pub fn mask_count(&self) -> usize {
        self.masks.read().len()
    }

    pub fn verbose(&self, tag: &str, message: &str) {
        self.log(Level::Verbose, tag, message, None);
    }

    pub fn debug(&self, tag: &str, message: &str) {
        self.log(Level::Debug, tag, message, None);
    }

    pub fn info(&self, tag: &str, message: &str) {
        self.log(Level::Info, tag, message, None);
    }

    pub fn warn(&self, tag: &str, message: &str) {
        self.log(Level::Warn, tag, message, None);
    }

    pub fn error(&self, tag: &str, message: &str) {
        self.log(Level::Error, tag, message, None);
    }

    /// Log a verbose record with an attached error
    pub fn verbose_with_error(&self, tag: &str, message: &str, error: ErrorPayload<'_>) {
        self.log(Level::Verbose, tag, message, Some(error));
    }

    /// Log a debug record with an attached error
    pub fn debug_with_error(&self, tag: &str, message: &str, error: ErrorPayload<'_>) {
        self.log(Level::Debug, tag, message, Some(error));
    }

    /// Log an info record with an attached error
    pub fn info_with_error(&self, tag: &str, message: &str, error: ErrorPayload<'_>) {
        self.log(Level::Info, tag, message, Some(error));
    }

    /// Log a warning with an attached error
    pub fn warn_with_error(&self, tag: &str, message: &str, error: ErrorPayload<'_>) {
        self.log(Level::Warn, tag, message, Some(error));
    }

    /// Log an error with an attached error
    pub fn error_with_error(&self, tag: &str, message: &str, error: ErrorPayload<'_>) {
        self.log(Level::Error, tag, message, Some(error));
    }

    /// Route one record to the sinks
    ///
    /// Never fails: records below the threshold are dropped, sink faults are
    /// reported as a single warning on the fallback path.
    pub fn log(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) {
        if !self.is_enabled(level) {
            return;
        }

        let tag = sanitize_tag(tag);
        let masked = self.apply_masks(message);
        let message = truncate_chars(&masked, MAX_MESSAGE_LEN);

        let sinks = Arc::clone(&*self.sinks.read());
        if sinks.is_empty() {
            let _ = guarded(|| self.fallback.emit(level, tag, message, error));
            self.self_warning("No sinks registered; record routed to the console fallback");
            return;
        }

        let failures: Vec<String> = sinks
            .iter()
            .filter_map(|entry| {
                guarded(|| entry.sink.emit(level, tag, message, error))
                    .err()
                    .map(|reason| format!("{}: {}", entry.name, truncate_chars(&reason, FAILURE_EXCERPT_LEN)))
            })
            .collect();

        if !failures.is_empty() {
            self.self_warning(&format!(
                "{} sink(s) failed: {}",
                failures.len(),
                failures.join("; ")
            ));
        }
    }

    /// Flush every registered sink, reporting failures on the fallback path
    pub fn flush(&self) {
        let sinks = Arc::clone(&*self.sinks.read());
        let failures: Vec<String> = sinks
            .iter()
            .filter_map(|entry| {
                guarded(|| entry.sink.flush())
                    .err()
                    .map(|reason| format!("{}: {}", entry.name, truncate_chars(&reason, FAILURE_EXCERPT_LEN)))
            })
            .collect();

        if !failures.is_empty() {
            self.self_warning(&format!("{} sink(s) failed to flush: {}", failures.len(), failures.join("; ")));
        }
    }

    fn apply_masks<'a>(&self, message: &'a str) -> Cow<'a, str> {
        let masks = Arc::clone(&*self.masks.read());
        let mut out = Cow::Borrowed(message);
        for mask in masks.iter() {
            let replaced = match mask.replace_all(&out, REDACTION) {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if let Some(text) = replaced {
                out = Cow::Owned(text);
            }
        }
        out
    }

    fn self_warning(&self, message: &str) {
        let _ = guarded(|| self.fallback.emit(Level::Warn, SELF_TAG, message, None));
    }
}

impl std::fmt::Debug for DecentralizedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecentralizedLogger")
            .field("min_level", &self.min_level())
            .field("sinks", &self.sink_names())
            .field("masks", &self.mask_count())
            .finish()
    }
}

/// Run a sink call, turning both `Err` and panics into a failure description
fn guarded<E: std::fmt::Display>(call: impl FnOnce() -> Result<(), E>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

/// Trim, cap at [`MAX_TAG_LEN`] characters, substitute [`FALLBACK_TAG`] if blank
pub fn sanitize_tag(tag: &str) -> &str {
    let tag = truncate_chars(tag.trim(), MAX_TAG_LEN);
    if tag.trim().is_empty() {
        FALLBACK_TAG
    } else {
        tag
    }
}

/// Cut `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `a::b::Sink<c::D>` -> `Sink`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Process-wide logger instance
static GLOBAL: Lazy<DecentralizedLogger> = Lazy::new(DecentralizedLogger::new);

/// The process-wide logger used by the free functions and `*_log!` macros
pub fn global() -> &'static DecentralizedLogger {
    &GLOBAL
}

/// Log through the global logger
pub fn log(level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) {
    global().log(level, tag, message, error);
}

pub fn verbose(tag: &str, message: &str) {
    global().verbose(tag, message);
}

pub fn debug(tag: &str, message: &str) {
    global().debug(tag, message);
}

pub fn info(tag: &str, message: &str) {
    global().info(tag, message);
}

pub fn warn(tag: &str, message: &str) {
    global().warn(tag, message);
}

pub fn error(tag: &str, message: &str) {
    global().error(tag, message);
}

/// Macros taking an explicit logger; the message is only formatted when the
/// level is enabled.
#[macro_export]
macro_rules! log_verbose {
    ($logger:expr, $tag:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::Level::Verbose) {
            logger.verbose($tag, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $tag:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::Level::Debug) {
            logger.debug($tag, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $tag:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::Level::Info) {
            logger.info($tag, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $tag:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::Level::Warn) {
            logger.warn($tag, &format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $tag:expr, $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_enabled($crate::Level::Error) {
            logger.error($tag, &format!($($arg)*));
        }
    }};
}

/// Convenience macros for the global logger
#[macro_export]
macro_rules! verbose_log {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_verbose!($crate::global(), $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_log {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_debug!($crate::global(), $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! info_log {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_info!($crate::global(), $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn_log {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_warn!($crate::global(), $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! error_log {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_error!($crate::global(), $tag, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{SinkError, SinkResult};
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        level: Level,
        tag: String,
        message: String,
        error: Option<String>,
    }

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<Record>>,
    }

    impl RecordingSink {
        fn records(&self) -> Vec<Record> {
            self.records.lock().clone()
        }

        fn messages(&self) -> Vec<String> {
            self.records.lock().iter().map(|r| r.message.clone()).collect()
        }
    }

    impl LogSink for RecordingSink {
        fn emit(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) -> SinkResult<()> {
            self.records.lock().push(Record {
                level,
                tag: tag.to_string(),
                message: message.to_string(),
                error: error.map(|e| e.to_string()),
            });
            Ok(())
        }
    }

    /// Stand-in for the console fallback so tests can observe it
    #[derive(Default)]
    struct FallbackRecorder(RecordingSink);

    impl LogSink for FallbackRecorder {
        fn emit(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) -> SinkResult<()> {
            self.0.emit(level, tag, message, error)
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn emit(&self, _: Level, _: &str, _: &str, _: Option<ErrorPayload<'_>>) -> SinkResult<()> {
            Err(SinkError::Other("disk quota exceeded".to_string()))
        }

        fn flush(&self) -> SinkResult<()> {
            Err(SinkError::WorkerStopped)
        }
    }

    struct PanickingSink;

    impl LogSink for PanickingSink {
        fn emit(&self, _: Level, _: &str, _: &str, _: Option<ErrorPayload<'_>>) -> SinkResult<()> {
            panic!("renderer exploded");
        }
    }

    fn logger_with_recorders() -> (DecentralizedLogger, Arc<RecordingSink>, Arc<FallbackRecorder>) {
        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());
        let sink = Arc::new(RecordingSink::default());
        assert!(logger.register_sink(sink.clone()));
        (logger, sink, fallback)
    }

    #[test]
    fn test_defaults() {
        let logger = DecentralizedLogger::new();
        assert_eq!(logger.min_level(), Level::Verbose);
        assert_eq!(logger.sink_count(), 0);
        assert_eq!(logger.mask_count(), 0);
    }

    #[test]
    fn test_emits_when_level_is_enabled() {
        let (logger, sink, _) = logger_with_recorders();
        logger.set_min_level(Level::Debug);

        logger.debug("Test", "hola");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "hola");
        assert_eq!(records[0].level, Level::Debug);
        assert_eq!(records[0].tag, "Test");
    }

    #[test]
    fn test_below_threshold_is_dropped() {
        let (logger, sink, fallback) = logger_with_recorders();
        logger.set_min_level(Level::Warn);

        logger.verbose("Test", "v");
        logger.debug("Test", "d");
        logger.info("Test", "i");
        assert!(sink.records().is_empty());
        assert!(fallback.0.records().is_empty());

        logger.warn("Test", "w");
        logger.error("Test", "e");
        assert_eq!(sink.messages(), vec!["w", "e"]);
    }

    #[test]
    fn test_threshold_from_label() {
        let logger = DecentralizedLogger::new();
        logger.set_min_level_label("error");
        assert_eq!(logger.min_level(), Level::Error);

        logger.set_min_level_label("nonsense");
        assert_eq!(logger.min_level(), Level::Info);
    }

    #[test]
    fn test_masks_pii() {
        let (logger, sink, _) = logger_with_recorders();
        logger.add_pii_mask(Regex::new("[0-9]{16}").unwrap());

        logger.info("Test", "card=1234567812345678");

        assert_eq!(sink.messages(), vec!["card=***"]);
    }

    #[test]
    fn test_masks_apply_in_order_to_every_match() {
        let (logger, sink, _) = logger_with_recorders();
        logger.add_pii_mask(Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
        logger.add_pii_mask(Regex::new(r"\*\*\*").unwrap());
        logger.add_pii_mask(Regex::new(r"secret").unwrap());

        logger.info("secret", "a@b.io and c@d.org keep secret");

        let records = sink.records();
        // The second mask re-matches the first mask's output
        assert_eq!(records[0].message, "*** and *** keep ***");
        assert_eq!(records[0].tag, "secret");
    }

    #[test]
    fn test_same_sink_type_registers_once() {
        let logger = DecentralizedLogger::new();
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());

        assert!(logger.register_sink(first.clone()));
        assert!(!logger.register_sink(second.clone()));
        assert_eq!(logger.sink_count(), 1);
        assert_eq!(logger.sink_names(), vec!["RecordingSink"]);

        logger.info("Test", "once");
        assert_eq!(first.records().len() + second.records().len(), 1);
        assert_eq!(first.records().len(), 1);
    }

    #[test]
    fn test_tag_sanitization() {
        assert_eq!(sanitize_tag("  Repo  "), "Repo");
        assert_eq!(sanitize_tag("ABCDEFGHIJKLMNOPQRSTUVWXYZ"), "ABCDEFGHIJKLMNOPQRSTUVW");
        assert_eq!(sanitize_tag(""), FALLBACK_TAG);
        assert_eq!(sanitize_tag("   \t "), FALLBACK_TAG);
        assert_eq!(sanitize_tag("ñññññññññññññññññññññññññ").chars().count(), MAX_TAG_LEN);
    }

    #[test]
    fn test_tag_sanitized_before_delivery() {
        let (logger, sink, _) = logger_with_recorders();
        logger.info(&"x".repeat(40), "long");
        logger.info("  ", "blank");

        let records = sink.records();
        assert_eq!(records[0].tag, "x".repeat(MAX_TAG_LEN));
        assert_eq!(records[1].tag, FALLBACK_TAG);
    }

    #[test]
    fn test_message_truncated_after_masking() {
        let (logger, sink, _) = logger_with_recorders();
        logger.add_pii_mask(Regex::new("a+").unwrap());

        logger.info("Test", &"a".repeat(10_000));
        logger.info("Test", &"b".repeat(MAX_MESSAGE_LEN + 10));

        let messages = sink.messages();
        assert_eq!(messages[0], REDACTION);
        assert_eq!(messages[1].chars().count(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_no_sinks_falls_back_to_console() {
        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());

        logger.info("Test", "sin sinks");

        let records = fallback.0.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "sin sinks");
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[1].level, Level::Warn);
        assert_eq!(records[1].tag, "DecentralizedLogger");
        assert!(records[1].message.contains("No sinks registered"));
    }

    #[test]
    fn test_no_sinks_with_default_console_does_not_panic() {
        let logger = DecentralizedLogger::new();
        logger.error("Test", "goes to stderr");
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());
        let healthy = Arc::new(RecordingSink::default());
        logger.register_sink(Arc::new(FailingSink));
        logger.register_sink(healthy.clone());

        logger.info("Test", "still delivered");

        assert_eq!(healthy.messages(), vec!["still delivered"]);
        let warnings = fallback.0.records();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, Level::Warn);
        assert_eq!(
            warnings[0].message,
            "1 sink(s) failed: FailingSink: Sink error: disk quota exceeded"
        );
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());
        let healthy = Arc::new(RecordingSink::default());
        logger.register_sink(Arc::new(PanickingSink));
        logger.register_sink(Arc::new(FailingSink));
        logger.register_sink(healthy.clone());

        logger.warn("Test", "survives");

        assert_eq!(healthy.messages(), vec!["survives"]);
        let warnings = fallback.0.messages();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("2 sink(s) failed: PanickingSink: panicked: renderer exploded"));
        assert!(warnings[0].contains("FailingSink: Sink error: disk quota exceeded"));
    }

    #[test]
    fn test_error_payload_is_forwarded() {
        let (logger, sink, _) = logger_with_recorders();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "db closed");

        logger.verbose_with_error("Room", "v", &err);
        logger.debug_with_error("Room", "d", &err);
        logger.info_with_error("Room", "i", &err);
        logger.warn_with_error("Room", "w", &err);
        logger.error_with_error("Room", "e", &err);

        let records = sink.records();
        assert_eq!(records.len(), 5);
        for (record, level) in records.iter().zip(Level::ALL) {
            assert_eq!(record.level, level);
            assert_eq!(record.error.as_deref(), Some("db closed"));
        }
    }

    #[test]
    fn test_error_payload_respects_threshold() {
        let (logger, sink, _) = logger_with_recorders();
        logger.set_min_level(Level::Info);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "ignored");

        logger.verbose_with_error("Room", "v", &err);
        logger.debug_with_error("Room", "d", &err);
        logger.info_with_error("Room", "i", &err);

        assert_eq!(sink.messages(), vec!["i"]);
    }

    #[test]
    fn test_has_pii_mask() {
        let logger = DecentralizedLogger::new();
        logger.add_pii_mask(Regex::new("[0-9]{16}").unwrap());

        assert!(logger.has_pii_mask("[0-9]{16}"));
        assert!(!logger.has_pii_mask("[0-9]{4}"));
    }

    #[test]
    fn test_flush_reports_failures() {
        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());
        logger.register_sink(Arc::new(RecordingSink::default()));
        logger.flush();
        assert!(fallback.0.records().is_empty());

        logger.register_sink(Arc::new(FailingSink));
        logger.flush();
        let warnings = fallback.0.messages();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("FailingSink: Background writer has stopped"));
    }

    #[test]
    fn test_failure_excerpt_is_truncated() {
        struct VerboseFailure;
        impl LogSink for VerboseFailure {
            fn emit(&self, _: Level, _: &str, _: &str, _: Option<ErrorPayload<'_>>) -> SinkResult<()> {
                Err(SinkError::Other("x".repeat(500)))
            }
        }

        let fallback = Arc::new(FallbackRecorder::default());
        let logger = DecentralizedLogger::with_fallback(fallback.clone());
        logger.register_sink(Arc::new(VerboseFailure));
        logger.info("Test", "m");

        let warning = &fallback.0.messages()[0];
        let excerpt = warning.split("VerboseFailure: ").nth(1).unwrap();
        assert_eq!(excerpt.chars().count(), FAILURE_EXCERPT_LEN);
    }

    #[test]
    fn test_concurrent_logging() {
        let (logger, sink, _) = logger_with_recorders();
        let logger = Arc::new(logger);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        logger.info("Hilo", &format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let messages = sink.messages();
        assert_eq!(messages.len(), 800);
        // Per-thread order is preserved
        for t in 0..8 {
            let prefix = format!("{}-", t);
            let seen: Vec<usize> = messages
                .iter()
                .filter_map(|m| m.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..100).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_macros_format_only_when_enabled() {
        let (logger, sink, _) = logger_with_recorders();
        logger.set_min_level(Level::Info);

        crate::log_debug!(logger, "Macro", "hidden {}", 1);
        crate::log_info!(logger, "Macro", "tirada={} monedas={}", 6, 12);
        crate::log_warn!(logger, "Macro", "aviso");
        crate::log_error!(logger, "Macro", "fallo {}", "grave");
        crate::log_verbose!(logger, "Macro", "hidden");

        assert_eq!(sink.messages(), vec!["tirada=6 monedas=12", "aviso", "fallo grave"]);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::FileSink"), "FileSink");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("áéíóú", 3), "áéí");
        assert_eq!(truncate_chars("", 3), "");
    }
}
