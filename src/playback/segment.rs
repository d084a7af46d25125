//! One playable clip with independent load and play state.
//!
//! A segment keeps its own playback position. Backends that have their own clock
//! report it through [`Voice::position`]; for everything else the segment anchors
//! playback to the host [`AudioClock`] and computes
//! `now - anchor + start_offset`.
//!
//! Every `play()` is tagged with a fresh generation. `pause`, `stop`, `seek` and
//! completion retire the generation, so an end-of-playback signal belonging to an
//! earlier `play()` can never complete the segment after it has moved on.

use super::clock::{AudioClock, SystemClock};
use super::error::LoadError;
use super::voice::{Backend, EndedSignal, SegmentEvent, Voice};
use crate::constants::COMPLETION_EPSILON;
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::{Arc, mpsc};

pub type CompletionCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

pub struct Segment {
    source: String,
    load_state: LoadState,
    load_error: Option<LoadError>,
    voice: Option<Box<dyn Voice>>,
    duration: f64,
    play_state: PlayState,
    start_offset: f64,
    anchor: f64,
    generation: u64,
    clock: Arc<dyn AudioClock>,
    link: Option<(usize, mpsc::Sender<SegmentEvent>)>,
    completion: Option<CompletionCallback>,
}

impl Segment {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            load_state: LoadState::Unloaded,
            load_error: None,
            voice: None,
            duration: 0.0,
            play_state: PlayState::Stopped,
            start_offset: 0.0,
            anchor: 0.0,
            generation: 0,
            clock: Arc::new(SystemClock::new()),
            link: None,
            completion: None,
        }
    }

    /// Register a one-shot callback fired when playback reaches the end of the clip.
    pub fn on_completion(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.set_on_completion(callback);
        self
    }

    pub fn set_on_completion(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.completion = Some(Box::new(callback));
    }

    /// Wire the segment to the player that owns it.
    pub(crate) fn attach(
        &mut self,
        index: usize,
        clock: Arc<dyn AudioClock>,
        events: mpsc::Sender<SegmentEvent>,
    ) {
        self.clock = clock;
        self.link = Some((index, events));
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// File name of the source, or the whole source when it has none.
    pub fn name(&self) -> &str {
        Path::new(&self.source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source)
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn is_playing(&self) -> bool {
        self.play_state == PlayState::Playing
    }

    /// Clip length in seconds; zero until the segment is ready.
    pub fn duration(&self) -> f64 {
        if self.is_loaded() { self.duration } else { 0.0 }
    }

    /// Offset the next `play()` resumes from.
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Load synchronously through `backend`.
    ///
    /// Idempotent: a ready segment returns `Ok`, a failed one returns its original
    /// error, and a segment whose load is in flight on the load barrier is left
    /// alone (its outcome arrives through the barrier).
    pub fn load(&mut self, backend: &dyn Backend) -> Result<(), LoadError> {
        match self.load_state {
            LoadState::Ready | LoadState::Loading => Ok(()),
            LoadState::Failed => self.load_error.clone().map_or(Ok(()), Err),
            LoadState::Unloaded => {
                self.load_state = LoadState::Loading;
                let result = backend.load(&self.source);
                self.settle(result)
            }
        }
    }

    /// Claim the segment for a background load. Returns the source to load, or
    /// `None` when the segment is already loading or settled.
    pub(crate) fn begin_load(&mut self) -> Option<String> {
        if self.load_state != LoadState::Unloaded {
            return None;
        }
        self.load_state = LoadState::Loading;
        Some(self.source.clone())
    }

    /// Record the outcome of a load. A segment that is already ready ignores it.
    pub(crate) fn settle(
        &mut self,
        result: Result<Box<dyn Voice>, LoadError>,
    ) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        let result = result.and_then(|voice| {
            let duration = voice.duration();
            if duration.is_finite() && duration > 0.0 {
                Ok((voice, duration))
            } else {
                Err(LoadError::Empty {
                    clip: self.source.clone(),
                })
            }
        });

        match result {
            Ok((voice, duration)) => {
                info!("Loaded {} ({duration:.2}s)", self.source);
                self.voice = Some(voice);
                self.duration = duration;
                self.load_state = LoadState::Ready;
                self.load_error = None;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to load {}: {err}", self.source);
                self.load_state = LoadState::Failed;
                self.load_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Make a failed segment loadable again. Returns false for any other state.
    pub fn retry(&mut self) -> bool {
        if self.load_state != LoadState::Failed {
            return false;
        }
        self.load_state = LoadState::Unloaded;
        self.load_error = None;
        true
    }

    /// Start or resume playback from the current start offset.
    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }

        self.generation += 1;
        let ended = self.ended_signal();
        let Some(voice) = self.voice.as_mut() else {
            debug!("Ignoring play for {}: not loaded", self.source);
            return;
        };

        match voice.start(self.start_offset, ended) {
            Ok(()) => {
                self.anchor = self.clock.now();
                self.play_state = PlayState::Playing;
                debug!(
                    "Playing {} from {:.3}s (generation {})",
                    self.source, self.start_offset, self.generation
                );
            }
            Err(e) => error!("Could not start output for {}: {e}", self.source),
        }
    }

    /// Start playback at `offset` seconds. No-op while already playing.
    pub fn play_from(&mut self, offset: f64) {
        if self.is_playing() || !self.is_loaded() {
            return;
        }
        self.start_offset = self.clamp(offset);
        self.play();
    }

    /// Capture the current position and stop output. A later `play()` resumes here.
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.start_offset = self.current_time();
        self.halt_voice();
        self.play_state = PlayState::Paused;
    }

    /// Stop output and rewind to the start of the clip.
    pub fn stop(&mut self) {
        if !self.is_loaded() {
            return;
        }
        if self.is_playing() {
            self.halt_voice();
        } else {
            self.generation += 1;
        }
        self.start_offset = 0.0;
        self.play_state = PlayState::Stopped;
    }

    /// Stop, then park at `position`. Playback does not resume on its own.
    pub fn seek(&mut self, position: f64) {
        if !self.is_loaded() {
            return;
        }
        self.stop();
        self.start_offset = self.clamp(position);
    }

    /// Playback position in seconds, always within `[0, duration]`.
    pub fn current_time(&self) -> f64 {
        if !self.is_loaded() {
            return 0.0;
        }
        let time = match self.play_state {
            PlayState::Playing => self
                .voice
                .as_ref()
                .and_then(|v| v.position())
                .unwrap_or_else(|| self.clock.now() - self.anchor + self.start_offset),
            PlayState::Stopped | PlayState::Paused => self.start_offset,
        };
        self.clamp(time)
    }

    pub fn reached_end(&self) -> bool {
        self.is_loaded() && (self.current_time() - self.duration).abs() < COMPLETION_EPSILON
    }

    /// Apply an end-of-playback signal. Returns true when the signal completed the
    /// segment, false when it belonged to a superseded `play()`.
    pub(crate) fn handle_ended(&mut self, generation: u64) -> bool {
        if !self.is_playing() || generation != self.generation {
            debug!(
                "Dropping stale ended signal for {} (generation {generation}, current {})",
                self.source, self.generation
            );
            return false;
        }

        self.halt_voice();
        self.start_offset = self.duration;
        self.play_state = PlayState::Stopped;
        info!("Finished {}", self.source);

        if let Some(callback) = self.completion.take() {
            callback();
        }
        true
    }

    fn halt_voice(&mut self) {
        if let Some(voice) = self.voice.as_mut() {
            voice.halt();
        }
        self.generation += 1;
    }

    fn ended_signal(&self) -> EndedSignal {
        match &self.link {
            Some((index, tx)) => EndedSignal::new(tx.clone(), *index, self.generation),
            None => EndedSignal::detached(0, self.generation),
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        if seconds.is_nan() {
            return 0.0;
        }
        seconds.clamp(0.0, self.duration())
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("source", &self.source)
            .field("load_state", &self.load_state)
            .field("play_state", &self.play_state)
            .field("duration", &self.duration)
            .field("start_offset", &self.start_offset)
            .field("generation", &self.generation)
            .finish()
    }
}
