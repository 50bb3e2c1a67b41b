use std::io;
use std::sync::{Arc, Mutex};

use linelog::{wrap, Logger, Sink};

/// Example of shipping lines to a destination this crate knows nothing
/// about by implementing the `Sink` trait directly. Imagine this hands
/// each line to some proprietary collector.
#[derive(Default)]
struct MyCollectorSink {
    sent: Mutex<usize>,
}

impl Sink for MyCollectorSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        // Here you would call your own client library for the collector.
        // For the sake of example we just print the line.
        let mut sent = self.sent.lock().map_err(|_| io::Error::other("collector poisoned"))?;
        *sent += 1;
        print!("[my-collector #{}] {}", *sent, String::from_utf8_lossy(line));
        Ok(())
    }
}

fn main() {
    let sink = Arc::new(MyCollectorSink::default());
    let logger = Logger::new()
        .with_sink(sink.clone())
        .with(&[&"service", &"custom-sink-example"]);

    logger.write("custom sink example started", &[]);

    let err = io::Error::new(io::ErrorKind::ConnectionRefused, "collector unreachable");
    if let Some(wrapped) = wrap(Some(err)) {
        logger.write("simulated error sent via custom sink", &[&"db", &"my-collector", &"error", &wrapped]);
    }

    if let Ok(sent) = sink.sent.lock() {
        println!("lines sent: {}", *sent);
    };
}
