use crate::env::CONFIG_ENV_PREFIX;
use crate::level::{parse_level, Severity};
use crate::rotate::RotationPolicy;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment whose logs go to the working directory.
pub const DEV_ENVIRONMENT: &str = "dev";

pub const DEFAULT_LOG_DIR: &str = "/service/logs";
pub const DEFAULT_LEVEL: &str = "info";
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_MAX_AGE_DAYS: u64 = 15;
pub const DEFAULT_MAX_BACKUPS: usize = 30;
pub const DEFAULT_COMPRESS: bool = true;

/// Everything needed to build a [`LeveledRouter`](crate::router::LeveledRouter).
///
/// Values are taken as given; defaulting of unset fields happens in
/// [`ServiceConfig::logger_config`].
///
/// **Fields**
/// - `project`, `app`: identify the service in destination paths.
/// - `env`: deployment environment; `dev` logs to the working directory.
/// - `log_dir`: base directory for non-dev environments.
/// - `level`: minimum severity mirrored to the console.
/// - `max_size_mb`, `max_age_days`, `max_backups`, `compress`: rotation
///   bounds shared by all four level files.
/// - `console_enable`: mirror records to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub project: String,
    pub app: String,
    pub env: String,
    pub log_dir: PathBuf,
    pub level: String,
    pub max_size_mb: u64,
    pub max_age_days: u64,
    pub max_backups: usize,
    pub compress: bool,
    pub console_enable: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            project: String::new(),
            app: String::new(),
            env: DEV_ENVIRONMENT.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            level: DEFAULT_LEVEL.to_string(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            max_backups: DEFAULT_MAX_BACKUPS,
            compress: DEFAULT_COMPRESS,
            console_enable: false,
        }
    }
}

impl LoggerConfig {
    pub fn new(project: impl Into<String>, app: impl Into<String>, env: impl Into<String>) -> Self {
        LoggerConfig {
            project: project.into(),
            app: app.into(),
            env: env.into(),
            ..LoggerConfig::default()
        }
    }

    pub fn is_dev(&self) -> bool {
        self.env == DEV_ENVIRONMENT
    }

    /// File that receives records of `severity`.
    ///
    /// - non-dev: `<log_dir>/<env>/<project>/<app>/<level>.log`
    /// - dev: `./<project>-<app>-<level>.log`
    pub fn destination_path(&self, severity: Severity) -> PathBuf {
        if self.is_dev() {
            PathBuf::from(format!("./{}-{}-{}.log", self.project, self.app, severity.as_str()))
        } else {
            self.log_dir
                .join(&self.env)
                .join(&self.project)
                .join(&self.app)
                .join(format!("{}.log", severity.as_str()))
        }
    }

    pub fn destination_paths(&self) -> [(Severity, PathBuf); 4] {
        Severity::ALL.map(|s| (s, self.destination_path(s)))
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new(self.max_size_mb, self.max_age_days, self.max_backups, self.compress)
    }

    pub fn console_level(&self) -> Severity {
        parse_level(&self.level)
    }
}

/// Error type returned when loading `conf.yaml`.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("configuration file {0} not found")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub port: Option<u16>,
}

/// `log` section of `conf.yaml`. Zero and empty values mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub file: Option<PathBuf>,
    pub level: String,
    pub maxsize: u64,
    pub max_age: u64,
    pub max_backup: usize,
    pub compress: Option<bool>,
    pub console_enable: bool,
}

/// Service configuration as laid out in `conf.yaml`:
///
/// ```yaml
/// project:
///   name: foo
/// app:
///   name: bar
///   port: 8080
/// log:
///   file: /service/logs
///   level: info
///   maxsize: 100
///   max_age: 15
///   max_backup: 30
///   compress: true
///   console_enable: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub project: ProjectSection,
    pub app: AppSection,
    pub log: LogSection,
}

impl ServiceConfig {
    /// Load `path`, then apply `SERVICE_`-prefixed environment overrides.
    ///
    /// A missing file is an error: a service must not start without its
    /// configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, CONFIG_ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: impl AsRef<Path>, prefix: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let config: ServiceConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(prefix).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, without environment overrides.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(Figment::new().merge(Yaml::string(yaml)).extract()?)
    }

    /// Logger settings for `env`, with unset values defaulted:
    /// size 100 MB, age 15 days, 30 backups, compression on, level `info`.
    pub fn logger_config(&self, env: &str) -> LoggerConfig {
        let log = &self.log;
        LoggerConfig {
            project: self.project.name.clone(),
            app: self.app.name.clone(),
            env: env.to_string(),
            log_dir: log.file.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            level: if log.level.trim().is_empty() {
                DEFAULT_LEVEL.to_string()
            } else {
                log.level.clone()
            },
            max_size_mb: if log.maxsize == 0 { DEFAULT_MAX_SIZE_MB } else { log.maxsize },
            max_age_days: if log.max_age == 0 { DEFAULT_MAX_AGE_DAYS } else { log.max_age },
            max_backups: if log.max_backup == 0 { DEFAULT_MAX_BACKUPS } else { log.max_backup },
            compress: log.compress.unwrap_or(DEFAULT_COMPRESS),
            console_enable: log.console_enable,
        }
    }
}
