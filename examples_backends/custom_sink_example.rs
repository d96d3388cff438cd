use std::sync::Arc;

use tracing_leveled_sink::level::{Severity, SeverityPredicate};
use tracing_leveled_sink::record::LogRecord;
use tracing_leveled_sink::router::{LeveledRouter, Route};
use tracing_leveled_sink::sink::{LogSink, SinkError};

/// Example of plugging in a destination this crate does not ship by
/// implementing the `LogSink` trait directly. Imagine this forwards to
/// an alerting system that only cares about errors.
struct PagerSink;

impl LogSink for PagerSink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        println!("[pager] {} {} ({})", record.formatted_timestamp(), record.message, record.caller);
        Ok(())
    }
}

fn main() {
    let router = LeveledRouter::new(vec![Route::new(
        SeverityPredicate::AtLeast(Severity::Error),
        Arc::new(PagerSink),
    )]);

    router.info("not paged", &[]);
    router.error("disk almost full", &std::io::Error::new(std::io::ErrorKind::Other, "95% used"));
}
