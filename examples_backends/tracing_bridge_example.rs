use tracing::{error, info, warn};
use tracing_leveled_sink::config::LoggerConfig;
use tracing_leveled_sink::init::{init_logger, init_tracing};

/// `tracing` macros end up in the same level files as the direct API.
fn main() {
    let mut config = LoggerConfig::new("foo", "bar", "staging");
    config.log_dir = std::env::temp_dir().join("leveled-tracing");
    config.console_enable = true;

    init_logger(&config);
    if let Err(err) = init_tracing() {
        eprintln!("{err}");
        return;
    }

    info!(port = 8080, "service started");
    warn!(retries = 3, "upstream flaky");
    error!(error = "connection reset", "upstream gave up");
}
