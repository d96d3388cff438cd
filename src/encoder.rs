use crate::record::LogRecord;
use serde_json::{Map, Value};

/// How a sink turns a [`LogRecord`] into bytes.
///
/// Both encoders share the same field names and timestamp format; they
/// only differ in layout. Every encoded record ends with a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// One JSON object per line.
    Json,
    /// Tab-separated, human-readable line with attachments as trailing JSON.
    Console,
}

impl Encoder {
    pub fn encode(&self, record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Encoder::Json => {
                let mut buf = serde_json::to_vec(record)?;
                buf.push(b'\n');
                Ok(buf)
            }
            Encoder::Console => encode_console(record),
        }
    }
}

fn encode_console(record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = format!(
        "{}\t{}\t{}\t{}",
        record.formatted_timestamp(),
        record.severity.upper(),
        record.caller,
        record.message
    );

    if !record.fields.is_empty() {
        let attachments: Map<String, Value> = record
            .attachment_entries()
            .map(|(k, v)| (k, v.clone()))
            .collect();
        line.push('\t');
        line.push_str(&serde_json::to_string(&attachments)?);
    }

    if let Some(trace) = &record.stacktrace {
        line.push('\n');
        line.push_str(trace.trim_end());
    }

    line.push('\n');
    Ok(line.into_bytes())
}
