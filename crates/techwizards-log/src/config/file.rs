//! YAML-backed logging configuration
//!
//! ```yaml
//! min_level: info
//! console: true
//! file:
//!   dir: /var/lib/techwizards/logs
//!   max_bytes: 5242880
//!   backup_count: 3
//!   file_name: app.log
//! pii_masks:
//!   - "[0-9]{16}"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::level::Level;
use crate::logger::{global, DecentralizedLogger};
use crate::sinks::{ConsoleSink, FileSink, FileSinkOptions};

/// Overrides the threshold (`debug`, `info`, ...); unknown values mean `info`
pub const ENV_LOG_LEVEL: &str = "TECHWIZARDS_LOG_LEVEL";
/// Overrides the file sink directory
pub const ENV_LOG_DIR: &str = "TECHWIZARDS_LOG_DIR";

/// Email addresses
pub const EMAIL_MASK: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";
/// Hyphenated UUIDs
pub const UUID_MASK: &str = r"[0-9a-fA-F]{8}-([0-9a-fA-F]{4}-){3}[0-9a-fA-F]{12}";

/// File sink section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileSettings {
    /// Log directory; defaults to [`default_log_dir`]
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(flatten)]
    pub options: FileSinkOptions,
}

/// Logging configuration applied at start-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level delivered to sinks
    pub min_level: Level,
    /// Register the console sink
    pub console: bool,
    /// Prefix for console lines
    pub console_prefix: Option<String>,
    /// Register a rotating file sink; `None` disables it
    pub file: Option<FileSettings>,
    /// Regex patterns redacted from every message
    pub pii_masks: Vec<String>,
}

impl Default for LoggingConfig {
    /// Debug builds log from `Debug`, release builds from `Info`; console and
    /// file sinks on; emails and UUIDs masked.
    fn default() -> Self {
        Self {
            min_level: if cfg!(debug_assertions) { Level::Debug } else { Level::Info },
            console: true,
            console_prefix: None,
            file: Some(FileSettings::default()),
            pii_masks: vec![EMAIL_MASK.to_string(), UUID_MASK.to_string()],
        }
    }
}

/// Platform log directory (`<data_local_dir>/techwizards/logs`)
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("techwizards").join("logs"))
}

impl LoggingConfig {
    /// Load a configuration file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Write this configuration as YAML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Apply [`ENV_LOG_LEVEL`] and [`ENV_LOG_DIR`] from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.min_level = Level::from_label(&level);
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|d| !d.trim().is_empty()) {
            self.file.get_or_insert_with(FileSettings::default).dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Compile the configured masks
    pub fn compile_masks(&self) -> ConfigResult<Vec<Regex>> {
        self.pii_masks
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidMask {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Configure `logger`: threshold, sinks, then masks.
    ///
    /// Masks are validated before anything is changed, so an invalid pattern
    /// leaves the logger untouched. Applying again registers nothing twice:
    /// sinks are unique by type and patterns already present are skipped.
    pub fn apply(&self, logger: &DecentralizedLogger) -> ConfigResult<()> {
        let masks = self.compile_masks()?;

        let file_sink = match &self.file {
            Some(settings) => {
                let dir = match &settings.dir {
                    Some(dir) => dir.clone(),
                    None => default_log_dir().ok_or(ConfigError::NoLogDir)?,
                };
                Some(FileSink::with_options(dir, settings.options.clone())?)
            }
            None => None,
        };

        logger.set_min_level(self.min_level);

        if self.console {
            let console = match &self.console_prefix {
                Some(prefix) => ConsoleSink::with_prefix(prefix.clone()),
                None => ConsoleSink::new(),
            };
            logger.register_sink(Arc::new(console));
        }
        if let Some(sink) = file_sink {
            logger.register_sink(Arc::new(sink));
        }

        for mask in masks {
            if !logger.has_pii_mask(mask.as_str()) {
                logger.add_pii_mask(mask);
            }
        }
        Ok(())
    }
}

/// Configure the global logger from the defaults plus environment overrides
pub fn init() -> ConfigResult<()> {
    LoggingConfig::default().with_env_overrides().apply(global())
}

/// Configure the global logger from a YAML file plus environment overrides
pub fn init_from(path: impl AsRef<Path>) -> ConfigResult<()> {
    LoggingConfig::load(path)?.with_env_overrides().apply(global())
}
