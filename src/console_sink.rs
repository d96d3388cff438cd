use crate::encoder::Encoder;
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable sink, stdout by default.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    encoder: Encoder,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        ConsoleSink::with_writer(io::stdout())
    }

    /// Write console-encoded records to an arbitrary writer.
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        ConsoleSink {
            writer: Mutex::new(Box::new(writer)),
            encoder: Encoder::Console,
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        ConsoleSink::stdout()
    }
}

impl LogSink for ConsoleSink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = self.encoder.encode(record)?;
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        writer.write_all(&line)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        writer.flush()?;
        Ok(())
    }
}
