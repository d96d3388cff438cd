use crate::encoder::Encoder;
use crate::record::LogRecord;
use crate::rotate::{RotatingFile, RotationPolicy};
use crate::sink::{LogSink, SinkError};
use std::path::{Path, PathBuf};

/// JSON-lines sink backed by a [`RotatingFile`].
pub struct FileSink {
    file: RotatingFile,
    encoder: Encoder,
}

impl FileSink {
    /// Create a sink writing to `path`. Nothing is opened until the first
    /// record arrives.
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        FileSink {
            file: RotatingFile::new(path, policy),
            encoder: Encoder::Json,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn rotating_file(&self) -> &RotatingFile {
        &self.file
    }
}

impl LogSink for FileSink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = self.encoder.encode(record)?;
        self.file.write(&line)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.file.sync()?;
        Ok(())
    }
}
