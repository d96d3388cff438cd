use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing_leveled_sink::config::LoggerConfig;
use tracing_leveled_sink::init::build_router;
use tracing_leveled_sink::record::Field;

/// Several threads writing into real rotating files with a small size
/// bound, so rotation and compression happen during the run.
fn main() {
    let dir = std::env::temp_dir().join("leveled-load");
    let mut config = LoggerConfig::new("load", "bench", "perf");
    config.log_dir = dir.clone();
    config.max_size_mb = 1;
    config.max_backups = 3;

    let router = Arc::new(build_router(&config));

    let threads: u64 = 4;
    let per_thread: u64 = 50_000;
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                for i in 0..per_thread {
                    router.info(
                        "custom load test record",
                        &[Field::new("thread", t), Field::new("iteration", i)],
                    );
                }
            })
        })
        .collect();
    for (t, h) in handles.into_iter().enumerate() {
        if h.join().is_err() {
            eprintln!("writer thread {t} panicked");
            std::process::exit(1);
        }
    }
    router.flush();

    let n = threads * per_thread;
    let elapsed = start.elapsed();
    println!(
        "file routing: wrote {} records in {:?} (~{:.0} rec/s) under {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        dir.display()
    );
}
