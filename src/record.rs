use crate::level::Severity;
use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Format of the `timestamp` field: millisecond precision, colon before
/// the milliseconds (`2024-01-02 15:04:05:000`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";

pub const TIMESTAMP_KEY: &str = "timestamp";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "message";
pub const CALLER_KEY: &str = "caller";
pub const STACKTRACE_KEY: &str = "stacktrace";

const RESERVED_KEYS: [&str; 5] = [TIMESTAMP_KEY, LEVEL_KEY, MESSAGE_KEY, CALLER_KEY, STACKTRACE_KEY];

/// A structured key/value attachment on a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(key, Value::String(value.into()))
    }

    /// Durations are rendered as floating-point seconds.
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Field::new(key, value.as_secs_f64())
    }

    pub fn display(key: impl Into<String>, value: impl fmt::Display) -> Self {
        Field::string(key, value.to_string())
    }

    pub fn debug(key: impl Into<String>, value: impl fmt::Debug) -> Self {
        Field::string(key, format!("{:?}", value))
    }

    /// The error's description under the `error` key.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Field::string("error", err.to_string())
    }
}

/// One emitted log record. Records are built at the call site, handed to
/// every accepting sink and then dropped.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
    pub caller: String,
    pub fields: Vec<Field>,
    pub stacktrace: Option<String>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>, caller: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Local::now(),
            severity,
            message: message.into(),
            caller: caller.into(),
            fields: Vec::new(),
            stacktrace: None,
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Look up an attachment by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Attachments keyed as they appear in the encoded output.
    pub(crate) fn attachment_entries(&self) -> impl Iterator<Item = (String, &Value)> {
        self.fields.iter().map(|f| {
            let key = if RESERVED_KEYS.contains(&f.key.as_str()) {
                format!("fields.{}", f.key)
            } else {
                f.key.clone()
            };
            (key, &f.value)
        })
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(TIMESTAMP_KEY, &self.formatted_timestamp())?;
        map.serialize_entry(LEVEL_KEY, self.severity.upper())?;
        map.serialize_entry(MESSAGE_KEY, &self.message)?;
        map.serialize_entry(CALLER_KEY, &self.caller)?;
        for (key, value) in self.attachment_entries() {
            map.serialize_entry(&key, value)?;
        }
        if let Some(trace) = &self.stacktrace {
            map.serialize_entry(STACKTRACE_KEY, trace)?;
        }
        map.end()
    }
}

/// Render a source location as `<dir>/<file>:<line>`, keeping only the
/// last directory component.
pub fn short_caller(file: &str, line: u32) -> String {
    let normalized = file.replace('\\', "/");
    let mut parts = normalized.rsplitn(3, '/');
    let name = parts.next().unwrap_or_default();
    match parts.next() {
        Some(dir) => format!("{}/{}:{}", dir, name, line),
        None => format!("{}:{}", name, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogRecord {
        LogRecord::new(Severity::Info, "hello", "handlers/mod.rs:12")
            .with_fields([Field::string("name", "world"), Field::new("status", 200)])
    }

    #[test]
    fn json_has_fixed_keys_and_attachments() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["caller", "level", "message", "name", "status", "timestamp"]);
        assert_eq!(obj["level"], "INFO");
        assert_eq!(obj["message"], "hello");
        assert_eq!(obj["status"], 200);
    }

    #[test]
    fn timestamp_uses_millisecond_colon_format() {
        let ts = sample().formatted_timestamp();
        // 2024-01-02 15:04:05:000
        assert_eq!(ts.len(), 23);
        let bytes = ts.as_bytes();
        assert_eq!(bytes[4], b'-');
        assert_eq!(bytes[7], b'-');
        assert_eq!(bytes[10], b' ');
        assert_eq!(bytes[13], b':');
        assert_eq!(bytes[16], b':');
        assert_eq!(bytes[19], b':');
        assert!(ts[20..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn reserved_attachment_keys_are_prefixed() {
        let record = sample().with_fields([Field::string("message", "shadow")]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["message"], "hello");
        assert_eq!(value["fields.message"], "shadow");
    }

    #[test]
    fn stacktrace_only_when_present() {
        let plain = serde_json::to_value(sample()).unwrap();
        assert!(plain.get("stacktrace").is_none());

        let traced = serde_json::to_value(sample().with_stacktrace("frame 0")).unwrap();
        assert_eq!(traced["stacktrace"], "frame 0");
    }

    #[test]
    fn short_caller_keeps_last_directory() {
        assert_eq!(short_caller("src/handlers/mod.rs", 7), "handlers/mod.rs:7");
        assert_eq!(short_caller("main.rs", 3), "main.rs:3");
        assert_eq!(short_caller("C:\\svc\\src\\lib.rs", 9), "src/lib.rs:9");
    }

    #[test]
    fn durations_render_as_seconds() {
        let f = Field::duration("cost", Duration::from_millis(1500));
        assert_eq!(f.value, serde_json::json!(1.5));
    }
}
