use std::error::Error;
use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::config::BridgeConfig;
use crate::encode::{self, quote, to_json, Encode};
use crate::fields::{EncodedField, FieldList};
use crate::logger::Logger;

/// Events from this crate are never rendered, so a failing sink cannot
/// feed its own warnings back into itself.
const OWN_TARGET: &str = "linelog";

/// `tracing_subscriber` layer that renders every event as one JSON line
/// through a [`Logger`].
///
/// The event's `message` becomes the line's message; every other field is
/// encoded into a call-site field, so the logger's context fields take
/// precedence over event fields with the same name.
pub struct LineLayer {
    logger: Logger,
    include_metadata: bool,
}

impl LineLayer {
    pub fn new(logger: Logger) -> Self {
        Self::with_config(logger, &BridgeConfig::default())
    }

    pub fn with_config(logger: Logger, config: &BridgeConfig) -> Self {
        LineLayer {
            logger,
            include_metadata: config.include_metadata,
        }
    }
}

impl<S> Layer<S> for LineLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut fields = FieldList::new();
        if self.include_metadata {
            fields.insert(EncodedField::from_parts("level", quote(meta.level().as_str())));
            fields.insert(EncodedField::from_parts("target", quote(meta.target())));
        }

        let mut message = String::new();
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        if let Err(err) = self.logger.try_write_fields(&message, &fields) {
            tracing::warn!(error = %err, "dropping tracing event");
        }
    }
}

/// Encodes the fields of one event into a [`FieldList`].
pub struct FieldVisitor<'a> {
    pub fields: &'a mut FieldList,
    pub message: &'a mut String,
}

impl FieldVisitor<'_> {
    fn put(&mut self, field: &Field, encoded: String) {
        self.fields
            .insert(EncodedField::from_parts(field.name(), encoded));
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_owned();
        } else {
            self.put(field, quote(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, to_json(&value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, to_json(&value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, to_json(&value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, to_json(&value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.put(field, encode::error(value).encode());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value);
        } else {
            self.put(field, quote(&format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    fn lines(out: &Mutex<Vec<u8>>) -> Vec<serde_json::Value> {
        let bytes = out.lock().unwrap();
        std::str::from_utf8(&bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn renders_events_as_lines() {
        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        let logger = Logger::new().with_sink(out.clone()).with(&[&"service", &"api"]);
        let subscriber = tracing_subscriber::registry().with(LineLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", user_id = 42, ok = true, ratio = 0.5, "user {} logged in", "ann");
        });

        let lines = lines(&out);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["msg"], "user ann logged in");
        assert_eq!(line["user_id"], 42);
        assert_eq!(line["ok"], true);
        assert_eq!(line["ratio"], 0.5);
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["target"], "app");
        assert_eq!(line["service"], "api");
    }

    #[test]
    fn context_wins_over_event_fields() {
        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        let logger = Logger::new().with_sink(out.clone()).with(&[&"user_id", &1]);
        let config = BridgeConfig {
            enable_stdout: false,
            include_metadata: false,
        };
        let subscriber = tracing_subscriber::registry().with(LineLayer::with_config(logger, &config));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app", user_id = 2, "collision");
        });

        let lines = lines(&out);
        assert_eq!(lines[0]["user_id"], 1);
        assert!(lines[0].get("level").is_none());
    }

    #[test]
    fn own_events_are_ignored() {
        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        let logger = Logger::new().with_sink(out.clone());
        let subscriber = tracing_subscriber::registry().with(LineLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "linelog::logger", "dropping log line");
        });

        assert!(lines(&out).is_empty());
    }
}
