use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// Lower-case name, used in destination file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Upper-case name, as rendered in the `level` field.
    pub fn upper(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.upper())
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// Parse a configured level name. Unknown or empty names fall back to
/// [`Severity::Info`].
pub fn parse_level(name: &str) -> Severity {
    match name.trim().to_ascii_lowercase().as_str() {
        "debug" => Severity::Debug,
        "info" => Severity::Info,
        "warn" => Severity::Warn,
        "error" => Severity::Error,
        _ => Severity::Info,
    }
}

/// Gate deciding whether a destination accepts a record of a given severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityPredicate {
    /// Accepts exactly one severity.
    Exactly(Severity),
    /// Accepts the given severity and everything more severe.
    AtLeast(Severity),
}

impl SeverityPredicate {
    pub fn accepts(self, severity: Severity) -> bool {
        match self {
            SeverityPredicate::Exactly(s) => severity == s,
            SeverityPredicate::AtLeast(s) => severity >= s,
        }
    }

    /// Predicate of the file destination for `severity`.
    ///
    /// The four file predicates partition the severity space: every record
    /// lands in exactly one level file.
    pub fn file_partition(severity: Severity) -> Self {
        match severity {
            Severity::Error => SeverityPredicate::AtLeast(Severity::Error),
            other => SeverityPredicate::Exactly(other),
        }
    }
}
