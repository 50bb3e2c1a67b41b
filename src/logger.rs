use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::config::LoggerConfig;
use crate::encode::Encode;
use crate::error::LogError;
use crate::fields::FieldList;
use crate::line::{self, KeyNames, Message};
use crate::noop_sink::DiscardSink;
use crate::pool::ScratchPool;
use crate::sink::{Sink, StderrSink};

/// A JSON line logger.
///
/// A `Logger` is a cheap-to-clone value: a destination, the reserved key
/// names, the context fields captured by [`with`](Self::with), and the
/// [`ScratchPool`] used while assembling lines. Every method that changes
/// one of these returns a new logger and leaves `self` untouched, so one
/// logger can be shared freely between threads.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use linelog::Logger;
///
/// let out = Arc::new(Mutex::new(Vec::<u8>::new()));
/// let logger = Logger::new().with_sink(out.clone()).with(&[&"request_id", &42]);
/// logger.write("handled", &[&"status", &200]);
///
/// let line = String::from_utf8(out.lock().unwrap().clone()).unwrap();
/// assert!(line.ends_with("\"msg\": \"handled\", \"request_id\": 42, \"status\": 200 }\n"));
/// ```
#[derive(Clone)]
pub struct Logger {
    sink: Option<Arc<dyn Sink>>,
    keys: Arc<KeyNames>,
    fields: Arc<FieldList>,
    pool: Arc<ScratchPool>,
}

impl Logger {
    /// A logger writing to stderr with the default key names.
    pub fn new() -> Self {
        Logger {
            sink: None,
            keys: Arc::new(KeyNames::default()),
            fields: Arc::new(FieldList::new()),
            pool: ScratchPool::shared(),
        }
    }

    /// A logger that drops every line.
    pub fn discard() -> Self {
        Self::new().with_sink(Arc::new(DiscardSink))
    }

    /// A logger writing to `writer`, serialized behind a mutex.
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::new().with_sink(Arc::new(Mutex::new(writer)))
    }

    /// A logger using the key names from `config`.
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new().with_key_names(&config.timestamp_key, &config.message_key)
    }

    /// Copy of this logger writing to `sink`.
    pub fn with_sink(&self, sink: Arc<dyn Sink>) -> Self {
        Logger {
            sink: Some(sink),
            ..self.clone()
        }
    }

    /// Copy of this logger taking scratch objects from `pool`.
    pub fn with_pool(&self, pool: Arc<ScratchPool>) -> Self {
        Logger {
            pool,
            ..self.clone()
        }
    }

    /// Copy of this logger with the given fields added to its context.
    ///
    /// Values are encoded immediately, so later changes to them are not
    /// seen. A key already in the context gets the new value.
    pub fn with(&self, flat: &[&dyn Encode]) -> Self {
        let mut fields = FieldList::clone(&self.fields);
        fields.append_flat(flat);
        Logger {
            fields: Arc::new(fields),
            ..self.clone()
        }
    }

    /// Copy of this logger using other names for the timestamp and message
    /// keys. Empty names select the defaults.
    pub fn with_key_names(&self, timestamp_key: &str, message_key: &str) -> Self {
        Logger {
            keys: Arc::new(KeyNames::new(timestamp_key, message_key)),
            ..self.clone()
        }
    }

    /// The context fields.
    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    pub fn timestamp_key(&self) -> &str {
        self.keys.timestamp()
    }

    pub fn message_key(&self) -> &str {
        self.keys.message()
    }

    /// Write one line with `message` and the alternating key/value `flat`.
    ///
    /// Context fields win over call-site fields with the same key; within
    /// `flat` the last value of a key wins. Never panics and never reports
    /// failure: a sink error is dropped after a `tracing` warning.
    pub fn write(&self, message: &str, flat: &[&dyn Encode]) {
        if let Err(err) = self.try_write(message, flat) {
            tracing::warn!(error = %err, "dropping log line");
        }
    }

    /// Like [`write`](Self::write), but returns the sink's error.
    pub fn try_write(&self, message: &str, flat: &[&dyn Encode]) -> Result<(), LogError> {
        let mut merged = self.pool.fields();
        merged.merge_from(&self.fields);
        let floor = merged.len();
        merged.append_flat_above(floor, flat);

        self.emit(Message::Text(message), &merged)
    }

    /// Write a line whose call-site fields are already encoded.
    pub fn try_write_fields(&self, message: &str, fields: &FieldList) -> Result<(), LogError> {
        let mut merged = self.pool.fields();
        merged.merge_from(&self.fields);
        let floor = merged.len();
        merged.merge_above(floor, fields);

        self.emit(Message::Text(message), &merged)
    }

    /// Write a line given only alternating keys and values.
    ///
    /// The message is the value stored under the message key, or empty if
    /// there is none. Unlike [`write`](Self::write), sink errors are returned.
    pub fn log(&self, keyvals: &[&dyn Encode]) -> Result<(), LogError> {
        let mut call = self.pool.fields();
        call.append_flat(keyvals);

        let text;
        let message = match call.index_of(self.keys.message_encoded()) {
            Some(i) => {
                let fragment = call.iter().nth(i).map(|field| field.value()).unwrap_or("");
                if fragment.starts_with('"') {
                    Message::Encoded(fragment)
                } else {
                    text = fragment.to_owned();
                    Message::Text(&text)
                }
            }
            None => Message::Text(""),
        };

        let mut merged = self.pool.fields();
        merged.merge_from(&self.fields);
        let floor = merged.len();
        merged.merge_above(floor, &call);

        self.emit(message, &merged)
    }

    fn emit(&self, message: Message<'_>, fields: &FieldList) -> Result<(), LogError> {
        let now = Utc::now();
        let mut buf = self.pool.buffer();
        line::assemble(&mut buf, &self.keys, now, message, fields)?;

        let sink: &dyn Sink = match &self.sink {
            Some(sink) => sink.as_ref(),
            None => &StderrSink,
        };
        sink.write_line(&buf)?;
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("timestamp_key", &self.keys.timestamp())
            .field("message_key", &self.keys.message())
            .field("fields", &self.fields)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
