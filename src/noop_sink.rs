use std::io;

use crate::sink::Sink;

/// A sink that drops every line.
///
/// Backs [`Logger::discard`](crate::logger::Logger::discard), the fallback of
/// [`context::current`](crate::context::current). Also useful for measuring
/// the cost of line assembly without any I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink;

impl Sink for DiscardSink {
    fn write_line(&self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
