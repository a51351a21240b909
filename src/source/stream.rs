//! Stream-based reading source.
//!
//! Receives sensor payloads from an async byte stream. This covers TCP
//! bridges and serial device nodes (`/dev/ttyUSB0`) opened as plain files,
//! as well as payloads pushed from another transport as raw bytes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vitalwatch_types::current_timestamp_ms;

use super::ReadingSource;
use crate::wire::{decode_slice, Decoded};

/// State shared between the source and its background reader task.
#[derive(Debug, Default)]
struct Shared {
    last_error: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl Shared {
    fn set_error(&self, message: String) {
        *self.last_error.lock() = Some(message);
    }

    fn clear_error(&self) {
        *self.last_error.lock() = None;
    }
}

/// A source that receives sensor payloads from an async stream.
///
/// This source spawns a background task that reads newline-delimited JSON
/// from the provided async reader and makes decoded readings available via
/// `poll()`. Readings are stamped when their line is decoded.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use vitalwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"heartRate\": 72}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Decoded>,
    description: String,
    shared: Arc<Shared>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// Each line is decoded as one sensor payload. Lines that fail to decode
    /// are skipped and recorded as the last error.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let shared = Arc::new(Shared::default());
        let task_shared = shared.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();

            loop {
                line.clear();
                // Raw bytes, so a corrupt line fails decoding rather than the read
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => {
                        info!(source = %desc, "Stream closed");
                        task_shared.set_error("Connection closed".to_string());
                        break;
                    }
                    Ok(_) => {
                        if line.iter().all(u8::is_ascii_whitespace) {
                            continue;
                        }
                        match decode_slice(&line, current_timestamp_ms()) {
                            Ok(decoded) => {
                                task_shared.clear_error();
                                if tx.send(decoded).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(source = %desc, "Skipping payload: {}", e);
                                task_shared.set_error(format!("Parse error: {}", e));
                            }
                        }
                    }
                    Err(e) => {
                        warn!(source = %desc, "Read error: {}", e);
                        task_shared.set_error(format!("Read error: {}", e));
                        break;
                    }
                }
            }
            task_shared.closed.store(true, Ordering::Release);
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            shared,
        }
    }

    /// Create a StreamSource from a channel of raw payloads.
    ///
    /// Each message is one complete JSON payload; no line framing is needed.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, decoded_rx) = mpsc::channel(64);
        let shared = Arc::new(Shared::default());
        let task_shared = shared.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match decode_slice(&bytes, current_timestamp_ms()) {
                    Ok(decoded) => {
                        task_shared.clear_error();
                        if tx.send(decoded).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(source = %desc, "Skipping payload: {}", e);
                        task_shared.set_error(format!("Parse error: {}", e));
                    }
                }
            }
            task_shared.closed.store(true, Ordering::Release);
        });

        Self {
            receiver: decoded_rx,
            description: format!("stream: {}", description),
            shared,
        }
    }
}

impl ReadingSource for StreamSource {
    fn poll(&mut self) -> Option<Decoded> {
        match self.receiver.try_recv() {
            Ok(decoded) => Some(decoded),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.shared.closed.store(true, Ordering::Release);
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.shared.last_error.lock().clone()
    }

    fn is_closed(&self) -> bool {
        // Buffered readings are still delivered after the task exits
        self.shared.closed.load(Ordering::Acquire) && self.receiver.is_empty()
    }
}
