//! Logging for {{ project_name }}/{{ app_name }}.

use std::path::Path;

pub use tracing_leveled_sink::config::{ConfigError, ServiceConfig};
pub use tracing_leveled_sink::global::{debug, error, info, warn};
pub use tracing_leveled_sink::record::Field;

pub fn load_config(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    ServiceConfig::load(path)
}

/// Install the leveled file logger and route `tracing` events into it.
pub fn init(config: &ServiceConfig, env: &str) {
    tracing_leveled_sink::init::init_logger(&config.logger_config(env));
    if let Err(err) = tracing_leveled_sink::init::init_tracing() {
        eprintln!("tracing bridge not installed: {err}");
    }
}
