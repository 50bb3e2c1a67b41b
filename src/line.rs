//! Assembly of one JSON log line into a byte buffer.
//!
//! Output shape, whitespace included:
//!
//! ```text
//! { "ts": "2024-05-01T12:00:00.000000000Z", "msg": "hello", "k": 1 }
//! ```

use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::encode::quote;
use crate::fields::FieldList;

/// Fixed-width RFC 3339 timestamp with nanoseconds and a literal `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

const TIMESTAMP_LEN: usize = "2006-01-02T15:04:05.000000000Z".len();

pub const DEFAULT_TIMESTAMP_KEY: &str = "ts";
pub const DEFAULT_MESSAGE_KEY: &str = "msg";

/// The reserved key names of a logger, kept in plain and encoded form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyNames {
    timestamp: String,
    message: String,
    timestamp_encoded: String,
    message_encoded: String,
}

impl KeyNames {
    /// Empty names fall back to [`DEFAULT_TIMESTAMP_KEY`] / [`DEFAULT_MESSAGE_KEY`].
    pub fn new(timestamp: &str, message: &str) -> Self {
        let timestamp = if timestamp.is_empty() {
            DEFAULT_TIMESTAMP_KEY
        } else {
            timestamp
        };
        let message = if message.is_empty() {
            DEFAULT_MESSAGE_KEY
        } else {
            message
        };
        KeyNames {
            timestamp: timestamp.to_owned(),
            message: message.to_owned(),
            timestamp_encoded: quote(timestamp),
            message_encoded: quote(message),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn message_encoded(&self) -> &str {
        &self.message_encoded
    }

    fn is_reserved(&self, encoded_key: &str) -> bool {
        encoded_key == self.timestamp_encoded || encoded_key == self.message_encoded
    }
}

impl Default for KeyNames {
    fn default() -> Self {
        KeyNames::new(DEFAULT_TIMESTAMP_KEY, DEFAULT_MESSAGE_KEY)
    }
}

/// The message of a line.
#[derive(Clone, Copy, Debug)]
pub enum Message<'a> {
    /// Plain text, encoded while the line is written.
    Text(&'a str),
    /// A JSON string fragment, written as is.
    Encoded(&'a str),
}

impl Message<'_> {
    fn len_hint(&self) -> usize {
        match self {
            Message::Text(text) => text.len() + 2,
            Message::Encoded(fragment) => fragment.len(),
        }
    }
}

/// Bytes needed for a line, ignoring escapes.
pub fn line_capacity(keys: &KeyNames, message: &Message<'_>, fields: &FieldList) -> usize {
    let fields_len: usize = fields
        .iter()
        .filter(|field| !keys.is_reserved(field.key()))
        .map(|field| 2 + field.key().len() + 2 + field.value().len())
        .sum();

    2 + keys.timestamp_encoded.len() + 3 + TIMESTAMP_LEN + 3
        + keys.message_encoded.len() + 2 + message.len_hint()
        + fields_len + 3
}

/// Append one complete line, terminated by `\n`, to `buf`.
///
/// Fields whose key is a reserved name are skipped; the timestamp and
/// message always come from `now` and `message`.
pub fn assemble(
    buf: &mut Vec<u8>,
    keys: &KeyNames,
    now: DateTime<Utc>,
    message: Message<'_>,
    fields: &FieldList,
) -> io::Result<()> {
    buf.reserve(line_capacity(keys, &message, fields));

    buf.extend_from_slice(b"{ ");
    buf.extend_from_slice(keys.timestamp_encoded.as_bytes());
    buf.extend_from_slice(b": \"");
    write!(buf, "{}", now.format(TIMESTAMP_FORMAT))?;
    buf.extend_from_slice(b"\", ");
    buf.extend_from_slice(keys.message_encoded.as_bytes());
    buf.extend_from_slice(b": ");
    write_message(buf, message)?;

    for field in fields {
        if keys.is_reserved(field.key()) {
            continue;
        }
        buf.extend_from_slice(b", ");
        buf.extend_from_slice(field.key().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(field.value().as_bytes());
    }

    buf.extend_from_slice(b" }\n");
    Ok(())
}

fn write_message(buf: &mut Vec<u8>, message: Message<'_>) -> io::Result<()> {
    match message {
        Message::Encoded(fragment) => {
            buf.extend_from_slice(fragment.as_bytes());
            Ok(())
        }
        Message::Text(text) => {
            let start = buf.len();
            if serde_json::to_writer(&mut *buf, text).is_err() {
                buf.truncate(start);
                write!(buf, "{:?}", text)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
            + chrono::Duration::nanoseconds(1_500)
    }

    fn render(keys: &KeyNames, message: Message<'_>, fields: &FieldList) -> String {
        let mut buf = Vec::new();
        assemble(&mut buf, keys, fixed_time(), message, fields).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn exact_shape_without_fields() {
        let line = render(&KeyNames::default(), Message::Text("hello"), &FieldList::new());
        assert_eq!(
            line,
            "{ \"ts\": \"2024-05-01T12:30:45.000001500Z\", \"msg\": \"hello\" }\n"
        );
    }

    #[test]
    fn fields_follow_in_list_order() {
        let fields = FieldList::from_flat(&[&"b", &2, &"a", &"x"]);
        let line = render(&KeyNames::default(), Message::Text("m"), &fields);
        assert_eq!(
            line,
            "{ \"ts\": \"2024-05-01T12:30:45.000001500Z\", \"msg\": \"m\", \"b\": 2, \"a\": \"x\" }\n"
        );
    }

    #[test]
    fn reserved_keys_are_suppressed() {
        let fields = FieldList::from_flat(&[&"ts", &"forged", &"msg", &"forged", &"ok", &1]);
        let line = render(&KeyNames::default(), Message::Text("real"), &fields);
        assert!(!line.contains("forged"));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "real");
        assert_eq!(parsed["ok"], 1);
    }

    #[test]
    fn custom_key_names() {
        let keys = KeyNames::new("time", "message");
        let fields = FieldList::from_flat(&[&"ts", &1, &"time", &2]);
        let line = render(&keys, Message::Text("x"), &fields);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "x");
        assert_eq!(parsed["time"], "2024-05-01T12:30:45.000001500Z");
        assert_eq!(parsed["ts"], 1);
    }

    #[test]
    fn empty_key_names_fall_back() {
        let keys = KeyNames::new("", "");
        assert_eq!(keys, KeyNames::default());
        assert_eq!(keys.timestamp(), "ts");
        assert_eq!(keys.message(), "msg");
    }

    #[test]
    fn message_is_escaped() {
        let line = render(&KeyNames::default(), Message::Text("say \"hi\"\n"), &FieldList::new());
        assert!(line.contains(r#""msg": "say \"hi\"\n""#));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn encoded_message_written_verbatim() {
        let line = render(&KeyNames::default(), Message::Encoded(r#""pre""#), &FieldList::new());
        assert!(line.contains(r#""msg": "pre" }"#));
    }

    #[test]
    fn capacity_covers_line() {
        let fields = FieldList::from_flat(&[&"key", &"value", &"n", &12345]);
        let keys = KeyNames::default();
        let line = render(&keys, Message::Text("message"), &fields);
        assert!(line_capacity(&keys, &Message::Text("message"), &fields) >= line.len());
    }
}
