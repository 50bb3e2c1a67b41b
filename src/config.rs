//! Logger configuration from defaults, environment variables or a
//! deserialized config file.
//!
//! The core logger types never read the environment themselves; only
//! [`LoggerConfig::from_env`] and the process-wide default instance do.

use serde::Deserialize;

use crate::line::{DEFAULT_MESSAGE_KEY, DEFAULT_TIMESTAMP_KEY};

/// Name of the timestamp key, e.g. `time`.
pub const TIMESTAMP_KEY_ENV: &str = "LINELOG_TIMESTAMP_KEY";

/// Name of the message key, e.g. `message`.
pub const MESSAGE_KEY_ENV: &str = "LINELOG_MESSAGE_KEY";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Key names used by a [`Logger`](crate::logger::Logger).
///
/// **Fields**
/// - `timestamp_key`: key of the timestamp, `ts` by default.
/// - `message_key`: key of the message, `msg` by default.
///
/// Missing fields deserialize to their defaults; empty strings are treated
/// as unset when the logger is built.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub timestamp_key: String,
    pub message_key: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            timestamp_key: DEFAULT_TIMESTAMP_KEY.to_string(),
            message_key: DEFAULT_MESSAGE_KEY.to_string(),
        }
    }
}

impl LoggerConfig {
    /// Build a config from [`TIMESTAMP_KEY_ENV`] and [`MESSAGE_KEY_ENV`].
    pub fn from_env() -> Self {
        Self {
            timestamp_key: env_or(TIMESTAMP_KEY_ENV, DEFAULT_TIMESTAMP_KEY),
            message_key: env_or(MESSAGE_KEY_ENV, DEFAULT_MESSAGE_KEY),
        }
    }
}

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is added
///   next to the bridge and events are also printed to the console.
/// - `include_metadata`: if `true`, every line carries the event's `level`
///   and `target` as ordinary fields.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub enable_stdout: bool,
    pub include_metadata: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enable_stdout: false,
            include_metadata: true,
        }
    }
}
