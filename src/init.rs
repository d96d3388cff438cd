use crate::config::{ConfigError, LoggerConfig, ServiceConfig};
use crate::console_sink::ConsoleSink;
use crate::env;
use crate::file_sink::FileSink;
use crate::global;
use crate::layer::LeveledLayer;
use crate::level::SeverityPredicate;
use crate::router::{LeveledRouter, Route};
use crate::sink::LogSink;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Build the router described by `config` without installing it.
///
/// **Routes**
/// - one JSON [`FileSink`] per severity, with non-overlapping predicates
///   (debug, info and warn accept only themselves; error accepts error and
///   above), all sharing the same rotation policy;
/// - if `console_enable` is set, a [`ConsoleSink`] on stdout accepting
///   the configured level and everything more severe.
///
/// Files are opened lazily, so an unwritable log directory does not fail
/// construction; it shows up as write failures on the router.
pub fn build_router(config: &LoggerConfig) -> LeveledRouter {
    build_router_with_console(config, Arc::new(ConsoleSink::stdout()))
}

/// Same as [`build_router`], with `console` standing in for stdout.
/// `console` is only used when `console_enable` is set.
pub fn build_router_with_console(config: &LoggerConfig, console: Arc<dyn LogSink>) -> LeveledRouter {
    let policy = config.rotation_policy();

    let mut routes: Vec<Route> = config
        .destination_paths()
        .into_iter()
        .map(|(severity, path)| {
            let sink: Arc<dyn LogSink> = Arc::new(FileSink::new(path, policy.clone()));
            Route::new(SeverityPredicate::file_partition(severity), sink)
        })
        .collect();

    if config.console_enable {
        routes.push(Route::new(SeverityPredicate::AtLeast(config.console_level()), console));
    }

    LeveledRouter::new(routes)
}

/// Build the router for `config` and install it as the process-wide
/// facility, replacing (not extending) whatever was installed before.
pub fn init_logger(config: &LoggerConfig) -> Arc<LeveledRouter> {
    let router = Arc::new(build_router(config));
    let previous = global::install(Arc::clone(&router));
    previous.flush();
    router
}

/// Service startup path: read `conf.yaml`, take the environment from
/// `envID` and install the resulting router.
///
/// Fails if the configuration cannot be read; callers should abort.
pub fn init_from_file(path: impl AsRef<Path>) -> Result<Arc<LeveledRouter>, ConfigError> {
    let service = ServiceConfig::load(path)?;
    let config = service.logger_config(&env::environment());
    Ok(init_logger(&config))
}

/// Error type returned by [`init_tracing`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber that forwards events at info and
/// above to the process-wide router. Debug and trace events, including
/// those of dependencies such as HTTP stacks, are dropped before a record is
/// built; use [`init_tracing_with`] to let them through for chosen targets.
///
/// The subscriber follows later calls to [`init_logger`], so this only
/// needs to run once per process.
pub fn init_tracing() -> Result<(), InitError> {
    init_tracing_with(default_targets())
}

/// Same as [`init_tracing`], forwarding only the events `targets` enables.
///
/// ```no_run
/// use tracing_subscriber::filter::{LevelFilter, Targets};
///
/// let targets = Targets::new()
///     .with_default(LevelFilter::INFO)
///     .with_target("order_svc", LevelFilter::DEBUG);
/// tracing_leveled_sink::init::init_tracing_with(targets).ok();
/// ```
pub fn init_tracing_with(targets: Targets) -> Result<(), InitError> {
    let subscriber = Registry::default().with(LeveledLayer::global().with_filter(targets));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Info and above from every target.
pub fn default_targets() -> Targets {
    Targets::new().with_default(LevelFilter::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use std::path::PathBuf;

    #[test]
    fn four_file_routes_without_console() {
        let cfg = LoggerConfig::new("foo", "bar", "prod");
        let router = build_router(&cfg);
        let predicates: Vec<SeverityPredicate> = router.routes().iter().map(|r| r.predicate()).collect();
        assert_eq!(
            predicates,
            vec![
                SeverityPredicate::Exactly(Severity::Debug),
                SeverityPredicate::Exactly(Severity::Info),
                SeverityPredicate::Exactly(Severity::Warn),
                SeverityPredicate::AtLeast(Severity::Error),
            ]
        );
    }

    #[test]
    fn console_route_uses_configured_threshold() {
        let mut cfg = LoggerConfig::new("foo", "bar", "prod");
        cfg.console_enable = true;
        cfg.level = "warn".to_string();

        let router = build_router(&cfg);
        assert_eq!(router.routes().len(), 5);
        assert_eq!(router.routes()[4].predicate(), SeverityPredicate::AtLeast(Severity::Warn));
    }

    #[test]
    fn construction_does_not_touch_the_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = LoggerConfig::new("foo", "bar", "prod");
        cfg.log_dir = tmp.path().to_path_buf();

        let _router = build_router(&cfg);
        assert!(!PathBuf::from(tmp.path()).join("prod").exists());
    }
}
