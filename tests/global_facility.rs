//! The process-wide facility is shared state, so the whole lifecycle runs
//! in a single test.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use tracing_leveled_sink::config::LoggerConfig;
use tracing_leveled_sink::global;
use tracing_leveled_sink::init::{init_logger, init_tracing, InitError};
use tracing_leveled_sink::level::Severity;
use tracing_leveled_sink::record::Field;

fn config(base: &Path) -> LoggerConfig {
    let mut cfg = LoggerConfig::new("foo", "bar", "staging");
    cfg.log_dir = base.to_path_buf();
    cfg
}

fn messages(cfg: &LoggerConfig, severity: Severity) -> Vec<String> {
    fs::read_to_string(cfg.destination_path(severity))
        .unwrap_or_default()
        .lines()
        .map(|l| {
            let v: Value = serde_json::from_str(l).unwrap();
            v["message"].as_str().unwrap().to_string()
        })
        .collect()
}

#[test]
fn reconfiguration_replaces_destinations() {
    // Unconfigured: emission is a no-op.
    global::info("before configuration", &[]);
    assert!(global::current().routes().is_empty());

    let tmp = tempfile::tempdir().unwrap();
    let first = config(&tmp.path().join("first"));
    let second = config(&tmp.path().join("second"));

    init_logger(&first);
    global::info("one", &[Field::string("phase", "first")]);

    init_logger(&second);
    global::info("two", &[]);
    global::error("three", &io::Error::new(io::ErrorKind::Other, "broken pipe"));

    assert_eq!(messages(&first, Severity::Info), vec!["one"]);
    assert!(messages(&first, Severity::Error).is_empty());
    assert_eq!(messages(&second, Severity::Info), vec!["two"]);
    assert_eq!(messages(&second, Severity::Error), vec!["three"]);

    let info_line: Value = serde_json::from_str(
        fs::read_to_string(second.destination_path(Severity::Info)).unwrap().trim_end(),
    )
    .unwrap();
    assert!(info_line["caller"].as_str().unwrap().starts_with("tests/global_facility.rs:"));

    // tracing events follow the installed router.
    init_tracing().unwrap();
    tracing::warn!(queue = "orders", "backlog growing");
    tracing::debug!(target: "hyper::proto::h1", "parsed headers");
    assert_eq!(messages(&second, Severity::Warn), vec!["backlog growing"]);
    assert!(messages(&second, Severity::Debug).is_empty());
    assert!(matches!(init_tracing(), Err(InitError::AlreadySet(_))));

    global::reset();
    global::info("after reset", &[]);
    assert_eq!(messages(&second, Severity::Info), vec!["two"]);
}
