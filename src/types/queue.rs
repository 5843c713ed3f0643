use std::time::{SystemTime, UNIX_EPOCH};

use super::track::QueueItem;

/// The player's ordered playback queue
///
/// Carries a persisted identity and a last-changed timestamp; append and
/// replace operations bump the timestamp.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    /// Persisted queue identity
    pub id: Option<String>,

    /// Display name of the queue
    pub name: Option<String>,

    /// Millisecond timestamp of the last content change
    pub changed_timestamp: u64,

    items: Vec<QueueItem>,
}

impl PlaybackQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All items in order
    #[must_use]
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Get item by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Queue length
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the whole queue content, bumping the timestamp
    pub fn replace(&mut self, items: Vec<QueueItem>) {
        self.items = items;
        self.touch();
    }

    /// Append items to the end of the queue, bumping the timestamp
    pub fn append(&mut self, items: Vec<QueueItem>) {
        self.items.extend(items);
        self.touch();
    }

    /// Shuffle the queue in place, bumping the timestamp
    pub fn shuffle(&mut self) {
        use rand::seq::SliceRandom;
        self.items.shuffle(&mut rand::thread_rng());
        self.touch();
    }

    fn touch(&mut self) {
        self.changed_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
    }
}
