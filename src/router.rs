use crate::level::{Severity, SeverityPredicate};
use crate::record::{short_caller, Field, LogRecord};
use crate::sink::LogSink;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A destination paired with the predicate that decides which records
/// it receives.
#[derive(Clone)]
pub struct Route {
    predicate: SeverityPredicate,
    sink: Arc<dyn LogSink>,
}

impl Route {
    pub fn new(predicate: SeverityPredicate, sink: Arc<dyn LogSink>) -> Self {
        Route { predicate, sink }
    }

    pub fn predicate(&self) -> SeverityPredicate {
        self.predicate
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.predicate.accepts(severity)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("predicate", &self.predicate).finish_non_exhaustive()
    }
}

/// Fans each emitted record out to every route whose predicate accepts
/// its severity.
///
/// The route set is fixed at construction. Emission never fails from the
/// caller's point of view: sink errors are counted in
/// [`write_failures`](Self::write_failures) and the record moves on to the
/// remaining routes.
pub struct LeveledRouter {
    routes: Vec<Route>,
    /// Records accepted by at least one route.
    pub emitted_records: AtomicU64,
    /// Sink writes that failed and were dropped.
    pub write_failures: AtomicU64,
}

impl LeveledRouter {
    pub fn new(routes: Vec<Route>) -> Self {
        LeveledRouter {
            routes,
            emitted_records: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// A router without destinations; every emission is a no-op.
    pub fn noop() -> Self {
        LeveledRouter::new(Vec::new())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Whether any route accepts `severity`.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.routes.iter().any(|r| r.accepts(severity))
    }

    /// Hand an already-built record to every accepting route.
    pub fn dispatch(&self, record: &LogRecord) {
        let mut delivered = false;
        for route in self.routes.iter().filter(|r| r.accepts(record.severity)) {
            delivered = true;
            if route.sink.send(record).is_err() {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        if delivered {
            self.emitted_records.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Build a record and dispatch it. Error-level records carry a stack
    /// trace of the emitting thread.
    pub fn log(&self, severity: Severity, message: &str, fields: Vec<Field>, caller: String) {
        if !self.enabled(severity) {
            return;
        }

        let mut record = LogRecord::new(severity, message, caller).with_fields(fields);
        if severity >= Severity::Error {
            record = record.with_stacktrace(capture_stacktrace());
        }
        self.dispatch(&record);
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Debug, message, fields.to_vec(), caller_here());
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Info, message, fields.to_vec(), caller_here());
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Severity::Warn, message, fields.to_vec(), caller_here());
    }

    /// Emit at error severity with `err`'s description under `error`.
    #[track_caller]
    pub fn error(&self, message: &str, err: &dyn Error) {
        self.log(Severity::Error, message, vec![Field::error(err)], caller_here());
    }

    /// Flush every destination, ignoring failures.
    pub fn flush(&self) {
        for route in &self.routes {
            if route.sink.flush().is_err() {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Default for LeveledRouter {
    fn default() -> Self {
        LeveledRouter::noop()
    }
}

impl fmt::Debug for LeveledRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeveledRouter")
            .field("routes", &self.routes)
            .field("emitted_records", &self.emitted_records.load(Ordering::Relaxed))
            .field("write_failures", &self.write_failures.load(Ordering::Relaxed))
            .finish()
    }
}

#[track_caller]
fn caller_here() -> String {
    let loc = Location::caller();
    short_caller(loc.file(), loc.line())
}

/// Symbol prefixes of frames that belong to the capture itself or to the
/// logging path leading to it.
const INTERNAL_FRAMES: [&str; 8] = [
    "std::backtrace",
    "tracing_leveled_sink::",
    "<tracing_leveled_sink::",
    "tracing_core::",
    "<tracing_core::",
    "tracing_subscriber::",
    "<tracing_subscriber::",
    "<tracing::",
];

fn capture_stacktrace() -> String {
    trim_internal_frames(&Backtrace::force_capture().to_string())
}

/// Drop the leading frames of `trace` that belong to the logging path, so
/// the first frame shown is the code that emitted the record. A trace made
/// only of such frames is returned unchanged.
fn trim_internal_frames(trace: &str) -> String {
    let mut skipping = true;
    let mut out = String::with_capacity(trace.len());
    for line in trace.lines() {
        if skipping {
            match frame_symbol(line) {
                Some(symbol) if !INTERNAL_FRAMES.iter().any(|p| symbol.starts_with(p)) => skipping = false,
                _ => continue,
            }
        }
        out.push_str(line);
        out.push('\n');
    }

    if out.is_empty() {
        trace.to_string()
    } else {
        out
    }
}

/// Symbol of a `  N: symbol` frame line; `None` for `at file:line` lines.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())).then_some(symbol)
}
