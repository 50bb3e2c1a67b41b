//! JSON-lines logging with persistent context fields.
//!
//! Every call to [`Logger::write`] emits exactly one line:
//!
//! ```text
//! { "ts": "2024-05-01T12:30:45.000001500Z", "msg": "handled", "request_id": 42 }
//! ```
//!
//! There are no levels and no filtering: if something should not be logged,
//! do not log it. Fields attached with [`Logger::with`] are repeated on every
//! later line of the derived logger and win over fields passed to `write`.

pub mod encode;
pub mod error;
pub mod fields;
pub mod line;
pub mod pool;

pub mod config;
pub mod logger;
pub mod noop_sink;
pub mod sink;

pub mod context;
pub mod global;

#[cfg(feature = "bridge")]
pub mod init;
#[cfg(feature = "bridge")]
pub mod layer;

pub use encode::{error as error_value, maybe_error, Encode, ErrorValue, Opaque};
pub use error::{wrap, LogError, WrapErr, WrappedError};
pub use fields::{EncodedField, FieldList};
pub use logger::Logger;
pub use pool::ScratchPool;
pub use sink::Sink;
