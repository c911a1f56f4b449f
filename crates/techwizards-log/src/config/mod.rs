//! Start-up configuration of the logger
//!
//! `LoggingConfig` describes which sinks to register, the threshold and the
//! PII masks. It can be built in code, loaded from YAML, adjusted from the
//! environment and applied to any `DecentralizedLogger`.

mod error;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use file::{
    default_log_dir, init, init_from, FileSettings, LoggingConfig, EMAIL_MASK, ENV_LOG_DIR,
    ENV_LOG_LEVEL, UUID_MASK,
};
