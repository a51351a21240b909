//! Bounded per-channel history of raw values.

use std::collections::{BTreeMap, VecDeque};

use vitalwatch_types::Channel;

/// Default number of raw values retained per channel.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Rolling FIFO history for every channel.
///
/// Each channel gets its own buffer the first time a value is appended.
/// Buffers never exceed `capacity`; the oldest value is evicted first.
#[derive(Debug, Clone)]
pub struct WindowStore {
    capacity: usize,
    buffers: BTreeMap<Channel, VecDeque<f64>>,
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl WindowStore {
    /// Create an empty store. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push a value onto a channel's buffer, evicting the oldest if full.
    pub fn append(&mut self, channel: Channel, value: f64) {
        let capacity = self.capacity;
        let buffer = self
            .buffers
            .entry(channel)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        buffer.push_back(value);
        if buffer.len() > capacity {
            buffer.pop_front();
        }
    }

    /// Current contents of a channel's buffer, oldest first.
    ///
    /// Returns an empty Vec for a channel that has never been seen.
    pub fn snapshot(&self, channel: Channel) -> Vec<f64> {
        self.buffers
            .get(&channel)
            .map(|b| b.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of values currently held for a channel.
    pub fn len(&self, channel: Channel) -> usize {
        self.buffers.get(&channel).map_or(0, VecDeque::len)
    }

    /// Whether no channel has any history yet.
    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(VecDeque::is_empty)
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}
