use crate::record::LogRecord;
use crate::rotate::RotateError;
use std::io;

/// Destination for [`LogRecord`]s routed by the
/// [`LeveledRouter`](crate::router::LeveledRouter).
///
/// Implementations own their encoding and their transport (a rotating
/// file, stdout, memory). `send` is called synchronously on the emitting
/// thread, possibly from many threads at once, so implementations must
/// serialize their own writes.
pub trait LogSink: Send + Sync {
    /// Write a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was written.
    /// - `Err(..)` if encoding or I/O failed. The router counts the failure
    ///   and moves on; the record is not retried.
    fn send(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Flush anything buffered by the sink.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Error type returned by [`LogSink`] implementations.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("rotating file write failed: {0}")]
    Rotate(#[from] RotateError),

    #[error("log write failed: {0}")]
    Io(#[from] io::Error),
}
