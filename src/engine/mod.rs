//! Simulated playback engine
//!
//! Owns the player's [`PlayerStatus`] and drives it from three sides:
//! local/remote commands, a 1-second progress tick while playing, and
//! queue edits. Playback is simulated; the engine tracks position and
//! track boundaries without touching audio hardware.
//!
//! The progress ticker is an epoch-checked task loop rather than an
//! aborted handle: restarting playback bumps the epoch and stale loops
//! exit on their own, so a restart triggered from within the tick path
//! never cancels itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::cloud::{ContentProvider, ScrobbleSink, ServiceUrlResolver};
use crate::error::{MeshError, Result};
use crate::types::{PlayerStatus, PlaybackQueue, QueueItem, QueueMode, StreamingRef};

mod commands;
mod notify;


pub use commands::PlayerCommandService;
pub use notify::NotificationEmitter;

/// Mutable engine state behind one coarse lock
///
/// The lock is held only for state mutation; streaming resolution and
/// scrobble reporting happen outside it.
#[derive(Debug, Default)]
struct EngineState {
    status: PlayerStatus,

    /// The track whose playback is in progress and not yet reported
    now_playing: Option<QueueItem>,

    /// Resolved streaming reference of the current track
    current_ref: Option<StreamingRef>,
}

/// What a tick decided while the lock was held
enum TickAction {
    /// Still inside the current track
    Keep,
    /// Track finished, moved to the next item
    Advance { finished: Option<QueueItem> },
    /// Track finished at the end of the queue, wrapped to the start
    Wrap {
        finished: Option<QueueItem>,
        shuffle: bool,
    },
    /// Track finished at the end of a linear queue, playback stops
    Stop { finished: Option<QueueItem> },
}

/// The playback state machine
pub struct PlaybackEngine {
    state: Mutex<EngineState>,
    tick_epoch: AtomicU64,
    tick_interval: Duration,
    notifier: NotificationEmitter,
    scrobble: Option<Arc<dyn ScrobbleSink>>,
    content: Option<Arc<dyn ContentProvider>>,
    service_urls: Option<Arc<dyn ServiceUrlResolver>>,
}

impl PlaybackEngine {
    /// Create an engine broadcasting through the given emitter
    #[must_use]
    pub fn new(notifier: NotificationEmitter, tick_interval: Duration) -> Self {
        Self {
            state: Mutex::new(EngineState {
                status: PlayerStatus::new(),
                now_playing: None,
                current_ref: None,
            }),
            tick_epoch: AtomicU64::new(0),
            tick_interval,
            notifier,
            scrobble: None,
            content: None,
            service_urls: None,
        }
    }

    /// Attach a scrobble sink for played-track reports
    #[must_use]
    pub fn with_scrobble(mut self, scrobble: Arc<dyn ScrobbleSink>) -> Self {
        self.scrobble = Some(scrobble);
        self
    }

    /// Attach a content provider for play-time streaming resolution
    #[must_use]
    pub fn with_content_provider(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.content = Some(content);
        self
    }

    /// Attach a resolver for deferred `service://` references
    #[must_use]
    pub fn with_service_urls(mut self, resolver: Arc<dyn ServiceUrlResolver>) -> Self {
        self.service_urls = Some(resolver);
        self
    }

    /// Snapshot of the current player status
    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        self.state.lock().unwrap().status.clone()
    }

    /// The resolved streaming reference of the current track, if any
    #[must_use]
    pub fn current_streaming_ref(&self) -> Option<StreamingRef> {
        self.state.lock().unwrap().current_ref.clone()
    }

    /// Start or restart playback of the current queue item
    ///
    /// Returns `false` without side effects when the queue is empty.
    /// Otherwise resolves a streaming reference for the current item,
    /// restarts the progress ticker and broadcasts a status notification.
    pub async fn play(self: &Arc<Self>) -> bool {
        let previous = {
            let mut state = self.state.lock().unwrap();
            state.status.reconcile_index();
            let Some(current) = state.status.current_item() else {
                return false;
            };
            let current_id = current.id.clone();
            match &state.now_playing {
                Some(item) if item.id != current_id => state.now_playing.take(),
                _ => None,
            }
        };
        if let Some(item) = previous {
            self.report_played(item).await;
        }

        self.begin_current().await;
        self.state.lock().unwrap().status.playing = true;
        self.start_ticker();
        self.notify_status().await;
        true
    }

    /// Pause playback, reporting the in-progress track as played
    pub async fn pause(&self) {
        // Kill the ticker
        self.tick_epoch.fetch_add(1, Ordering::SeqCst);
        let finished = {
            let mut state = self.state.lock().unwrap();
            state.status.playing = false;
            state.now_playing.take()
        };
        if let Some(item) = finished {
            self.report_played(item).await;
        }
        self.notify_status().await;
    }

    /// Store a volume level, clamped to `[0, 1]`; returns the stored value
    pub fn set_volume(&self, volume: f64) -> f64 {
        let clamped = volume.clamp(0.0, 1.0);
        self.state.lock().unwrap().status.volume = clamped;
        clamped
    }

    /// Set or clear output muting
    pub fn set_muted(&self, muted: bool) {
        self.state.lock().unwrap().status.muted = muted;
    }

    /// Jump to a queue position and seek offset
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] when the index is out of
    /// range or the position is negative.
    pub fn set_seek(&self, index: usize, position: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if index >= state.status.queue.len() {
            return Err(MeshError::InvalidParameter {
                name: "playbackQueuePos".to_string(),
                message: format!("index {index} out of range"),
            });
        }
        if position < 0.0 {
            return Err(MeshError::InvalidParameter {
                name: "seekPos".to_string(),
                message: "negative seek position".to_string(),
            });
        }
        state.status.current_index = Some(index);
        state.status.seek_pos = position;
        state.current_ref = None;
        Ok(())
    }

    /// Change the queue traversal mode and broadcast the new status
    pub async fn set_queue_mode(&self, mode: QueueMode) {
        self.state.lock().unwrap().status.queue_mode = mode;
        self.notify_status().await;
    }

    /// Replace the queue content, resetting position to the start
    pub async fn replace_queue(
        &self,
        id: Option<String>,
        name: Option<String>,
        items: Vec<QueueItem>,
    ) -> usize {
        let queue = {
            let mut state = self.state.lock().unwrap();
            state.status.queue.id = id;
            state.status.queue.name = name;
            state.status.queue.replace(items);
            state.status.current_index = if state.status.queue.is_empty() {
                None
            } else {
                Some(0)
            };
            state.status.seek_pos = 0.0;
            state.current_ref = None;
            state.status.queue.clone()
        };
        self.notify_queue_changed(&queue).await;
        queue.len()
    }

    /// Append items to the end of the queue
    pub async fn append_tracks(&self, items: Vec<QueueItem>) -> usize {
        let queue = {
            let mut state = self.state.lock().unwrap();
            state.status.queue.append(items);
            state.status.reconcile_index();
            state.status.queue.clone()
        };
        self.notify_queue_changed(&queue).await;
        queue.len()
    }

    /// Stop the progress ticker; in-flight work completes harmlessly
    pub fn shutdown(&self) {
        self.tick_epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn start_ticker(self: &Arc<Self>) {
        let epoch = self.tick_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(engine.tick_interval).await;
                if engine.tick_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                if !engine.on_tick().await {
                    break;
                }
            }
        });
    }

    /// One progress tick: advance the seek position and handle track
    /// boundaries. Returns whether playback is still running.
    ///
    /// The internal ticker calls this every tick interval; tests and
    /// embedders that want deterministic time can drive it directly.
    ///
    /// Beginning a new track inside a tick applies that track's first
    /// seek increment in the same call (the loop re-entry), matching a
    /// timer whose first tick fires immediately on start.
    pub async fn on_tick(&self) -> bool {
        loop {
            let action = {
                let mut state = self.state.lock().unwrap();
                if !state.status.playing {
                    return false;
                }
                state.status.seek_pos += 1.0;
                let duration = state
                    .status
                    .current_item()
                    .and_then(|item| item.attributes())
                    .and_then(|attrs| attrs.duration);
                match duration {
                    Some(d) if state.status.seek_pos > d => {
                        let finished = state.now_playing.take();
                        state.current_ref = None;
                        state.status.seek_pos = 0.0;
                        let index = state.status.current_index.unwrap_or(0);
                        if index + 1 < state.status.queue.len() {
                            state.status.current_index = Some(index + 1);
                            TickAction::Advance { finished }
                        } else {
                            state.status.current_index = Some(0);
                            match state.status.queue_mode {
                                QueueMode::Linear => {
                                    state.status.playing = false;
                                    TickAction::Stop { finished }
                                }
                                QueueMode::Repeat => TickAction::Wrap {
                                    finished,
                                    shuffle: false,
                                },
                                QueueMode::RepeatShuffle => TickAction::Wrap {
                                    finished,
                                    shuffle: true,
                                },
                            }
                        }
                    }
                    _ => TickAction::Keep,
                }
            };

            match action {
                TickAction::Keep => return true,
                TickAction::Stop { finished } => {
                    if let Some(item) = finished {
                        self.report_played(item).await;
                    }
                    debug!("end of queue reached, playback stopped");
                    self.notify_status().await;
                    return false;
                }
                TickAction::Advance { finished } => {
                    if let Some(item) = finished {
                        self.report_played(item).await;
                    }
                    self.begin_current().await;
                    self.notify_status().await;
                }
                TickAction::Wrap { finished, shuffle } => {
                    if let Some(item) = finished {
                        self.report_played(item).await;
                    }
                    if shuffle {
                        let queue = {
                            let mut state = self.state.lock().unwrap();
                            state.status.queue.shuffle();
                            state.status.queue.clone()
                        };
                        self.notify_queue_changed(&queue).await;
                    }
                    self.begin_current().await;
                    self.notify_status().await;
                }
            }
        }
    }

    /// Resolve a streaming reference for the current item and mark it as
    /// the in-progress track
    ///
    /// Resolution order: the item's first pre-supplied reference, then a
    /// content-service lookup keyed by the item's `"<service>:"` id
    /// prefix. A deferred reference that cannot be resolved to a base URL
    /// is invalidated; playback proceeds without one.
    async fn begin_current(&self) {
        let item = {
            let state = self.state.lock().unwrap();
            state.status.current_item().cloned()
        };
        let Some(item) = item else { return };

        let mut resolved = item.streaming_refs.first().cloned();
        if resolved.is_none() {
            resolved = self.fetch_streaming_ref(&item).await;
        }
        if let Some(StreamingRef::Deferred {
            service,
            path,
            format,
        }) = resolved.clone()
        {
            let base = self
                .service_urls
                .as_ref()
                .and_then(|resolver| resolver.service_url(&service));
            resolved = match base {
                Some(base) => Some(StreamingRef::Direct {
                    url: format!("{base}{path}"),
                    format,
                }),
                None => {
                    warn!(service, "deferred streaming reference is unresolvable");
                    None
                }
            };
        }

        let mut state = self.state.lock().unwrap();
        state.current_ref = resolved;
        state.now_playing = Some(item);
    }

    async fn fetch_streaming_ref(&self, item: &QueueItem) -> Option<StreamingRef> {
        let provider = self.content.as_ref()?;
        let prefix = item.service_prefix()?;
        let service = provider.content_service(prefix)?;
        match service.get_item_streaming_ref(&item.id).await {
            Ok(streaming_ref) => Some(streaming_ref),
            Err(e) => {
                warn!(item = %item.id, error = %e, "streaming resolution failed");
                None
            }
        }
    }

    async fn report_played(&self, item: QueueItem) {
        let Some(scrobble) = &self.scrobble else {
            return;
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        if let Err(e) = scrobble.report_played(item, timestamp).await {
            warn!(error = %e, "played-track report failed");
        }
    }

    async fn notify_status(&self) {
        let status = self.status();
        // Emitter already logs failures
        let _ = self.notifier.player_status_changed(&status).await;
    }

    async fn notify_queue_changed(&self, queue: &PlaybackQueue) {
        let _ = self.notifier.playback_queue_changed(queue).await;
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("PlaybackEngine")
            .field("playing", &state.status.playing)
            .field("queue_len", &state.status.queue.len())
            .finish_non_exhaustive()
    }
}
