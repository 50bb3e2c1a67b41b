use std::sync::Arc;
use std::thread;
use std::time::Instant;

use linelog::noop_sink::DiscardSink;
use linelog::Logger;

fn main() {
    let logger = Logger::new()
        .with_sink(Arc::new(DiscardSink))
        .with(&[&"service", &"load-test", &"region", &"eu-west-1"]);

    let threads: u64 = 4;
    let n: u64 = 100_000;
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|worker| {
            let logger = logger.with(&[&"worker", &worker]);
            thread::spawn(move || {
                for i in 0..n {
                    logger.write("default load test line", &[&"iteration", &i, &"ok", &true]);
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("writer thread panicked");
        }
    }

    let total = threads * n;
    let elapsed = start.elapsed();
    println!("default config: wrote {} lines in {:?} (~{:.0} lines/s)",
        total,
        elapsed,
        total as f64 / elapsed.as_secs_f64()
    );
}
