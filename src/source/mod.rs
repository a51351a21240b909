//! Reading source abstraction.
//!
//! This module provides a trait-based abstraction for receiving sensor
//! readings from various transports (a capture file, a TCP or serial byte
//! stream, or an in-process channel). Payload decoding happens inside the
//! source, so malformed payloads never reach the pipeline.

mod channel;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use crate::wire::Decoded;

/// Trait for receiving sensor readings from various sources.
///
/// Readings are returned one at a time, in arrival order.
///
/// # Example
///
/// ```
/// use vitalwatch::{FileSource, ReadingSource};
///
/// let mut source = FileSource::new("vitals.ndjson");
/// while let Some(decoded) = source.poll() {
///     println!("Got {} channels", decoded.reading.len());
/// }
/// ```
pub trait ReadingSource: Send + Debug {
    /// Poll for the next reading.
    ///
    /// Returns `Some(decoded)` if a reading is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Decoded>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The last error encountered, if any.
    ///
    /// Errors are informational: the source keeps going after a bad payload.
    fn error(&self) -> Option<String>;

    /// Whether the source will never produce another reading.
    fn is_closed(&self) -> bool {
        false
    }
}
