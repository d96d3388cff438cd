use std::sync::Arc;
use std::time::Instant;

use tracing_leveled_sink::level::{Severity, SeverityPredicate};
use tracing_leveled_sink::noop_sink::NoopSink;
use tracing_leveled_sink::record::Field;
use tracing_leveled_sink::router::{LeveledRouter, Route};

fn main() {
    let routes = Severity::ALL
        .iter()
        .map(|s| Route::new(SeverityPredicate::file_partition(*s), Arc::new(NoopSink)))
        .collect();
    let router = LeveledRouter::new(routes);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        router.warn("default load test warning", &[Field::new("iteration", i)]);
    }

    let elapsed = start.elapsed();
    println!(
        "routing only: sent {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
