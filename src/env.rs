//! Environment variable names read by this crate.
//!
//! These are purely helpers; [`LoggerConfig`](crate::config::LoggerConfig)
//! itself never touches the environment.

/// Deployment environment tag (`dev`, `test`, `prod`, ...).
pub const ENVIRONMENT_ENV: &str = "envID";

/// Environment used when [`ENVIRONMENT_ENV`] is unset or empty.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Prefix of variables overriding `conf.yaml` keys, nested with `__`
/// (e.g. `SERVICE_LOG__LEVEL=debug`).
pub const CONFIG_ENV_PREFIX: &str = "SERVICE_";

/// Git URL of the service template repository used by `svc-template`.
pub const TEMPLATE_REPO_ENV: &str = "SVC_TEMPLATE_REPO";

/// Read an environment variable or fall back to a provided default.
/// Empty values count as unset.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Current deployment environment.
pub fn environment() -> String {
    env_or(ENVIRONMENT_ENV, DEFAULT_ENVIRONMENT)
}
