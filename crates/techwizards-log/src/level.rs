//! Log severity levels

use serde::{Deserialize, Serialize};

/// Severity of a log record, ordered from most to least verbose.
///
/// Threshold checks compare [`Level::ordinal`], never the label. Conversions
/// from foreign representations are total: anything unrecognised becomes
/// [`Level::Info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Level {
    #[default]
    Verbose = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Platform priority codes (`android.util.Log`)
mod priority {
    pub const VERBOSE: i32 = 2;
    pub const DEBUG: i32 = 3;
    pub const INFO: i32 = 4;
    pub const WARN: i32 = 5;
    pub const ERROR: i32 = 6;
    pub const ASSERT: i32 = 7;
}

impl Level {
    /// Every level in ascending order
    pub const ALL: [Level; 5] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    /// Position in the ordering, used for threshold comparisons
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Level::ordinal`]; out-of-range values become `Info`
    pub const fn from_ordinal(ordinal: u8) -> Level {
        match ordinal {
            0 => Level::Verbose,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Info,
        }
    }

    /// Native priority code of this level
    pub const fn native_priority(self) -> i32 {
        match self {
            Level::Verbose => priority::VERBOSE,
            Level::Debug => priority::DEBUG,
            Level::Info => priority::INFO,
            Level::Warn => priority::WARN,
            Level::Error => priority::ERROR,
        }
    }

    /// Convert a native priority code into a level.
    ///
    /// `ASSERT` folds into `Error`; unknown codes normalize to `Info`.
    pub const fn from_native_priority(priority: i32) -> Level {
        match priority {
            priority::VERBOSE => Level::Verbose,
            priority::DEBUG => Level::Debug,
            priority::INFO => Level::Info,
            priority::WARN => Level::Warn,
            priority::ERROR | priority::ASSERT => Level::Error,
            _ => Level::Info,
        }
    }

    /// Canonical label used in formatted output
    pub const fn label(self) -> &'static str {
        match self {
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Parse a label case-insensitively; unknown labels normalize to `Info`
    pub fn from_label(label: &str) -> Level {
        let label = label.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(label))
            .unwrap_or(Level::Info)
    }

    /// Single-letter form used by the console sink (`D/tag: ...`)
    pub const fn letter(self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

impl From<String> for Level {
    fn from(label: String) -> Self {
        Level::from_label(&label)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.label().to_string()
    }
}
