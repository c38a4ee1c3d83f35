use std::error::Error;

/// Destination for finished JSON log lines produced by the layer.
///
/// Implementations are responsible for transporting lines to a concrete
/// backend (stdout, a file, a socket, ...). The layer calls `write_line`
/// synchronously from the thread that emitted the event, so
/// implementations must be cheap and must never panic.
pub trait LogSink: Send + Sync {
    /// Write a single serialized record.
    ///
    /// **Parameters**
    /// - `line`: one compact JSON object, without a trailing newline.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted.
    /// - `Err(..)` if the transport failed. The layer counts and reports
    ///   the failure; it never retries.
    fn write_line(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered lines, if the sink buffers.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn write_line(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).write_line(line)
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        (**self).flush()
    }
}
