use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Destination for assembled log lines.
///
/// Implementations receive one complete line, newline included, per call and
/// should write it with a single underlying write so concurrent lines do not
/// interleave. The logger calls `write_line` on the caller's thread.
pub trait Sink: Send + Sync {
    /// Write one line.
    ///
    /// **Parameters**
    /// - `line`: a full JSON object followed by `\n`.
    ///
    /// **Returns**
    /// - `Ok(())` if the destination accepted the bytes.
    /// - `Err(..)` on an I/O failure. [`Logger::write`](crate::logger::Logger::write)
    ///   swallows it; the `try_` variants surface it as [`LogError`](crate::error::LogError).
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// Any writer behind a mutex is a sink: files, sockets, `Vec<u8>` in tests.
impl<W: Write + Send> Sink for Mutex<W> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line)?;
        writer.flush()
    }
}

/// Process stderr; used when a logger has no sink configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        io::stderr().lock().write_all(line)
    }
}

/// Sink for tests: each line goes through `print!`, which the test harness
/// captures per test and shows only for failing tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestSink;

impl Sink for TestSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        print!("{}", String::from_utf8_lossy(line));
        Ok(())
    }
}
