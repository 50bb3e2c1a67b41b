//! Conversion of arbitrary values into canonical JSON fragments.
//!
//! Every field value handed to a [`Logger`](crate::logger::Logger) passes
//! through [`Encode`]. Anything implementing [`serde::Serialize`] is encoded
//! with `serde_json`; error values go through [`error`] / [`maybe_error`] or
//! [`WrappedError`]; handle-only values go through [`Opaque`].
//!
//! Encoding never fails: a value whose serialization reports an error is
//! replaced by that error's message as a JSON string.

use std::error::Error;
use std::fmt::Display;

use serde::ser::{Impossible, Serialize, SerializeMap, Serializer};

use crate::error::WrappedError;

/// A value that can be written into a log line.
///
/// Implemented for every `Serialize` type. Flat field lists are passed as
/// `&[&dyn Encode]`.
pub trait Encode {
    /// Encode the value as one self-contained JSON value.
    fn encode(&self) -> String;

    /// Encode the value for use as a key.
    ///
    /// Returns `None` unless the value is a string; such keys are dropped
    /// together with their value. Values that only render as a JSON string
    /// (`char`, `Some("k")`, unit variants, timestamps) are not strings.
    fn encode_key(&self) -> Option<String> {
        None
    }
}

impl<T: Serialize + ?Sized> Encode for T {
    fn encode(&self) -> String {
        to_json(self)
    }

    fn encode_key(&self) -> Option<String> {
        self.serialize(KeySerializer).ok()
    }
}

fn not_a_string() -> serde_json::Error {
    serde::ser::Error::custom("key must be a string")
}

macro_rules! reject {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _value: $ty) -> Result<String, serde_json::Error> {
                Err(not_a_string())
            }
        )*
    };
}

/// Accepts exactly one `serialize_str` call and yields the quoted key.
struct KeySerializer;

impl Serializer for KeySerializer {
    type Ok = String;
    type Error = serde_json::Error;
    type SerializeSeq = Impossible<String, serde_json::Error>;
    type SerializeTuple = Impossible<String, serde_json::Error>;
    type SerializeTupleStruct = Impossible<String, serde_json::Error>;
    type SerializeTupleVariant = Impossible<String, serde_json::Error>;
    type SerializeMap = Impossible<String, serde_json::Error>;
    type SerializeStruct = Impossible<String, serde_json::Error>;
    type SerializeStructVariant = Impossible<String, serde_json::Error>;

    fn serialize_str(self, value: &str) -> Result<String, serde_json::Error> {
        Ok(quote(value))
    }

    reject! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    }

    fn serialize_none(self) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_unit(self) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, serde_json::Error> {
        Err(not_a_string())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, serde_json::Error> {
        Err(not_a_string())
    }

    // The default forwards Display output to `serialize_str`.
    fn collect_str<T: ?Sized + Display>(self, _value: &T) -> Result<String, serde_json::Error> {
        Err(not_a_string())
    }
}

/// Encode `value` with `serde_json`, substituting the error message on failure.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| quote(&err.to_string()))
}

/// Quote and escape `text` as a JSON string.
pub fn quote(text: &str) -> String {
    // `Value`'s Display cannot fail, unlike `to_string`.
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Loggable view of an optional error.
///
/// Absent errors encode as `null`; present ones as their message, or as the
/// captured trace when the error is (or wraps) a [`WrappedError`].
#[derive(Clone, Copy)]
pub struct ErrorValue<'a>(Option<&'a (dyn Error + 'static)>);

/// Log an error by its message.
pub fn error<'a>(err: &'a (dyn Error + 'static)) -> ErrorValue<'a> {
    ErrorValue(Some(err))
}

/// Log an optional error; `None` becomes JSON `null`.
pub fn maybe_error<'a, E: Error + 'static>(err: Option<&'a E>) -> ErrorValue<'a> {
    ErrorValue(err.map(|e| e as &(dyn Error + 'static)))
}

impl<'a> From<Option<&'a (dyn Error + 'static)>> for ErrorValue<'a> {
    fn from(err: Option<&'a (dyn Error + 'static)>) -> Self {
        ErrorValue(err)
    }
}

impl Encode for ErrorValue<'_> {
    fn encode(&self) -> String {
        match self.0 {
            None => String::from("null"),
            Some(err) => quote(&render_error(err)),
        }
    }
}

impl Encode for WrappedError {
    fn encode(&self) -> String {
        quote(self.details())
    }
}

/// Message text for `err`, carrying the frames of the first wrapped error in
/// its source chain.
fn render_error(err: &(dyn Error + 'static)) -> String {
    if let Some(wrapped) = err.downcast_ref::<WrappedError>() {
        return wrapped.details().to_owned();
    }

    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        if let Some(wrapped) = inner.downcast_ref::<WrappedError>() {
            for frame in wrapped.frames() {
                rendered.push('\n');
                rendered.push_str(frame);
            }
            break;
        }
        cause = inner.source();
    }
    rendered
}

/// Placeholder for values with no structural form (channels, closures,
/// raw locks). Always encodes as `{}`.
pub struct Opaque<'a, T: ?Sized>(pub &'a T);

impl<T: ?Sized> Serialize for Opaque<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}
