//! Channel-based reading source.
//!
//! Receives already-decoded readings via a tokio mpsc channel. This is
//! useful when readings are produced in-process, for example by a device
//! driver or a test harness, rather than parsed from JSON.

use tokio::sync::mpsc;
use vitalwatch_types::RawReading;

use super::ReadingSource;
use crate::wire::Decoded;

/// A source that receives raw readings via a channel.
///
/// The producer sends readings through the channel, and this source hands
/// them to the monitor in send order.
///
/// # Example
///
/// ```
/// use vitalwatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("bedside-monitor", 16);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<RawReading>,
    description: String,
    closed: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - A description of where readings come from
    pub fn new(receiver: mpsc::Receiver<RawReading>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            closed: false,
        }
    }

    /// Create a channel pair for sending readings to a ChannelSource.
    ///
    /// Returns (sender, source). Dropping every sender closes the source.
    pub fn create(source_description: &str, buffer: usize) -> (mpsc::Sender<RawReading>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx, source_description))
    }
}

impl ReadingSource for ChannelSource {
    fn poll(&mut self) -> Option<Decoded> {
        match self.receiver.try_recv() {
            Ok(reading) => Some(Decoded {
                reading,
                rejected: Vec::new(),
            }),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        // Channel sources don't have errors in the same way file sources do
        None
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
