//! The process-wide default logger.
//!
//! Built on first use from [`LoggerConfig::from_env`] and never replaced.
//! It writes to stderr; derive a logger with [`with_sink`] or [`to_writer`]
//! to send lines elsewhere.

use std::io::Write;
use std::sync::{Arc, LazyLock};

use crate::config::LoggerConfig;
use crate::encode::Encode;
use crate::error::LogError;
use crate::logger::Logger;
use crate::sink::Sink;

static DEFAULT: LazyLock<Logger> = LazyLock::new(|| Logger::from_config(&LoggerConfig::from_env()));

/// The default logger.
pub fn logger() -> &'static Logger {
    &DEFAULT
}

/// Default logger with `flat` added to its context.
pub fn with(flat: &[&dyn Encode]) -> Logger {
    DEFAULT.with(flat)
}

/// Default logger with other key names.
pub fn with_key_names(timestamp_key: &str, message_key: &str) -> Logger {
    DEFAULT.with_key_names(timestamp_key, message_key)
}

/// Default logger writing to `sink`.
pub fn with_sink(sink: Arc<dyn Sink>) -> Logger {
    DEFAULT.with_sink(sink)
}

/// Default logger writing to `writer`.
pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Logger {
    DEFAULT.with_sink(Arc::new(std::sync::Mutex::new(writer)))
}

/// Write a line through the default logger.
pub fn write(message: &str, flat: &[&dyn Encode]) {
    DEFAULT.write(message, flat);
}

/// [`Logger::log`] on the default logger.
pub fn log(keyvals: &[&dyn Encode]) -> Result<(), LogError> {
    DEFAULT.log(keyvals)
}
