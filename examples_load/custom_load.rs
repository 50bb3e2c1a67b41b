use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use linelog::config::BridgeConfig;
use linelog::context::{current, scope_async};
use linelog::init::init_tracing_with_config;
use linelog::noop_sink::DiscardSink;
use linelog::Logger;

#[tokio::main]
async fn main() {
    let logger = Logger::new()
        .with_sink(Arc::new(DiscardSink))
        .with_key_names("time", "message")
        .with(&[&"service", &"load-test"]);

    let bridge_config = BridgeConfig {
        enable_stdout: false,
        include_metadata: true,
    };

    if let Err(err) = init_tracing_with_config(logger.clone(), bridge_config) {
        eprintln!("failed to install tracing bridge: {err}");
        return;
    }

    let n: u64 = 100_000;

    let start = Instant::now();
    for i in 0..n {
        error!(iteration = i, "custom load test error");
    }
    let bridged = start.elapsed();

    let start = Instant::now();
    scope_async(logger.with(&[&"request_id", &"req-7"]), async {
        for i in 0..n {
            current().write("custom load test line", &[&"iteration", &i]);
        }
    })
    .await;
    let scoped = start.elapsed();

    println!("custom config: bridged {} events in {:?} (~{:.0} ev/s)",
        n,
        bridged,
        n as f64 / bridged.as_secs_f64()
    );
    println!("custom config: scoped {} lines in {:?} (~{:.0} lines/s)",
        n,
        scoped,
        n as f64 / scoped.as_secs_f64()
    );
}
