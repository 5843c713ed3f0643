use serde::{Deserialize, Serialize};

use super::queue::PlaybackQueue;
use super::track::QueueItem;

/// Queue traversal mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueMode {
    /// Play the queue once, stop at the end
    #[default]
    #[serde(rename = "QUEUE")]
    Linear,

    /// Wrap to the start when the queue ends
    #[serde(rename = "QUEUE_REPEAT")]
    Repeat,

    /// Wrap to the start and reshuffle when the queue ends
    #[serde(rename = "QUEUE_REPEAT_SHUFFLE")]
    RepeatShuffle,
}

/// Cloud registration state reported in status notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudCoreStatus {
    /// Device carries a valid-looking access token
    Registered,
    /// No access token stored
    Unregistered,
}

/// The player's complete playback state
///
/// Exactly one instance exists per player process; only the playback
/// engine mutates it. Invariant: `current_index` is `None` iff the queue
/// is empty; seek is non-negative; volume stays in `[0, 1]`.
#[derive(Debug, Clone, Default)]
pub struct PlayerStatus {
    /// The playback queue
    pub queue: PlaybackQueue,

    /// Index of the current item, `None` iff the queue is empty
    pub current_index: Option<usize>,

    /// Whether playback is running
    pub playing: bool,

    /// Position in the current item (seconds)
    pub seek_pos: f64,

    /// Volume level in `[0, 1]`
    pub volume: f64,

    /// Whether output is muted
    pub muted: bool,

    /// Queue traversal mode
    pub queue_mode: QueueMode,
}

impl PlayerStatus {
    /// Create a fresh stopped status with an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            volume: 0.5,
            ..Self::default()
        }
    }

    /// The current queue item, if any
    #[must_use]
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    /// Restore the `current_index` invariant after a queue change
    pub(crate) fn reconcile_index(&mut self) {
        if self.queue.is_empty() {
            self.current_index = None;
        } else {
            match self.current_index {
                None => self.current_index = Some(0),
                Some(i) if i >= self.queue.len() => {
                    self.current_index = Some(self.queue.len() - 1);
                }
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_status_default() {
        let status = PlayerStatus::new();
        assert!(!status.playing);
        assert!(status.current_item().is_none());
        assert_eq!(status.queue_mode, QueueMode::Linear);
        assert!((status.volume - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_queue_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&QueueMode::RepeatShuffle).unwrap(),
            "\"QUEUE_REPEAT_SHUFFLE\""
        );
        assert_eq!(
            serde_json::from_str::<QueueMode>("\"QUEUE\"").unwrap(),
            QueueMode::Linear
        );
    }

    #[test]
    fn test_reconcile_index() {
        let mut status = PlayerStatus::new();
        status.reconcile_index();
        assert_eq!(status.current_index, None);

        status
            .queue
            .replace(vec![crate::types::QueueItem::new("svc:1", "One")]);
        status.reconcile_index();
        assert_eq!(status.current_index, Some(0));

        status.queue.replace(Vec::new());
        status.reconcile_index();
        assert_eq!(status.current_index, None);
    }
}
