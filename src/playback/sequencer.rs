//! The segment sequencing state machine.
//!
//! A [`Player`] plays its segments one after another. It is driven by a host frame
//! loop: `update()` once per frame, then `draw()`, with input events forwarded in
//! between. Neither `update()` nor `draw()` ever waits.
//!
//! Two things happen behind the frame loop's back. Segments load on worker threads
//! and report through the load barrier, and voices announce the end of a clip
//! from the audio thread. Both are only ever applied inside `update()`, each as a
//! single transition, so input handlers and drawing never observe a half-applied
//! change.

use super::clock::AudioClock;
use super::layout::{self, Geometry, SegmentSpan};
use super::loader::{LoadBarrier, LoadOutcome};
use super::segment::{LoadState, Segment};
use super::surface::CanvasSize;
use super::voice::{Backend, SegmentEvent};
use log::{debug, info, warn};
use std::str::FromStr;
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// What happens when a segment finishes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancePolicy {
    /// Stop after each segment; the next `play()` starts the following one.
    #[default]
    Manual,
    /// Start the next segment immediately.
    Auto,
}

impl FromStr for AdvancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(AdvancePolicy::Manual),
            "auto" => Ok(AdvancePolicy::Auto),
            _ => Err(format!("Unknown advance policy '{s}' (expected 'manual' or 'auto')")),
        }
    }
}

impl std::fmt::Display for AdvancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvancePolicy::Manual => write!(f, "manual"),
            AdvancePolicy::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Active,
    /// Every segment has been played; the next `play()` starts over.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRequest {
    Started,
    /// Loading is still in progress; playback starts the frame it completes.
    Deferred,
    AlreadyPlaying,
    NothingToPlay,
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Button,
    Segment(usize),
    Nothing,
}

pub type FinishedCallback = Box<dyn FnMut() + Send>;

pub struct Player {
    segments: Vec<Segment>,
    active: usize,
    playing: bool,
    all_loaded: bool,
    play_requested: bool,
    pending_seek: Option<f64>,
    finished_fired: bool,
    layout: Vec<SegmentSpan>,
    last_width: f64,
    canvas: CanvasSize,
    geometry: Geometry,
    advance: AdvancePolicy,
    barrier: LoadBarrier,
    backend: Arc<dyn Backend>,
    events: mpsc::Receiver<SegmentEvent>,
    on_finished: Option<FinishedCallback>,
}

impl Player {
    /// Take ownership of `segments` (in playback order) and start loading them.
    pub fn new(
        segments: Vec<Segment>,
        backend: Arc<dyn Backend>,
        clock: Arc<dyn AudioClock>,
    ) -> Self {
        let (tx, events) = mpsc::channel();
        let mut segments = segments;
        for (index, segment) in segments.iter_mut().enumerate() {
            segment.attach(index, clock.clone(), tx.clone());
        }

        let mut player = Self {
            segments,
            active: 0,
            playing: false,
            all_loaded: false,
            play_requested: false,
            pending_seek: None,
            finished_fired: false,
            layout: Vec::new(),
            last_width: 0.0,
            canvas: CanvasSize::default(),
            geometry: Geometry::default(),
            advance: AdvancePolicy::default(),
            barrier: LoadBarrier::new(),
            backend,
            events,
            on_finished: None,
        };

        info!(
            "Loading {} segments with the {} backend",
            player.segments.len(),
            player.backend.name()
        );
        player.dispatch_loads();
        player
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self.relayout();
        self
    }

    pub fn with_advance_policy(mut self, advance: AdvancePolicy) -> Self {
        self.advance = advance;
        self
    }

    /// Called once each time playback runs past the last segment.
    pub fn on_finished(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.set_on_finished(callback);
        self
    }

    pub fn set_on_finished(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True once every segment has finished loading, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.all_loaded
    }

    pub fn has_failures(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.load_state() == LoadState::Failed)
    }

    pub fn loaded_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_loaded()).count()
    }

    pub fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    pub fn play_requested(&self) -> bool {
        self.play_requested
    }

    pub fn layout(&self) -> &[SegmentSpan] {
        &self.layout
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn advance_policy(&self) -> AdvancePolicy {
        self.advance
    }

    pub fn state(&self) -> PlayerState {
        if self.active >= self.segments.len() {
            PlayerState::Exhausted
        } else if self.playing {
            PlayerState::Active
        } else {
            PlayerState::Idle
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Position in the whole sequence: finished segments plus the active one.
    pub fn elapsed(&self) -> f64 {
        let before: f64 = self
            .segments
            .iter()
            .take(self.active)
            .map(Segment::duration)
            .sum();
        before
            + self
                .segments
                .get(self.active)
                .map_or(0.0, Segment::current_time)
    }

    /// Start or resume the active segment.
    pub fn play(&mut self) -> PlayRequest {
        if !self.all_loaded {
            if !self.play_requested {
                info!("Play requested while loading; starting once loading completes");
            }
            self.play_requested = true;
            return PlayRequest::Deferred;
        }
        if self.playing {
            return PlayRequest::AlreadyPlaying;
        }
        if self.loaded_count() == 0 {
            warn!("Nothing to play: no segment loaded");
            return PlayRequest::NothingToPlay;
        }
        if self.active >= self.segments.len() {
            self.restart();
        }

        while let Some(segment) = self.segments.get(self.active) {
            if segment.is_loaded() {
                break;
            }
            warn!("Skipping {}: not loaded", segment.source());
            self.pending_seek = None;
            self.active += 1;
        }

        let Some(segment) = self.segments.get_mut(self.active) else {
            self.finish_sequence();
            return PlayRequest::NothingToPlay;
        };

        if let Some(offset) = self.pending_seek.take() {
            segment.seek(offset);
        }
        segment.play();
        self.playing = segment.is_playing();

        if self.playing {
            info!("Playing segment {} ({})", self.active, segment.name());
            PlayRequest::Started
        } else {
            PlayRequest::NothingToPlay
        }
    }

    /// Pause the active segment, or withdraw a play request made during loading.
    pub fn pause(&mut self) {
        self.play_requested = false;
        if !self.playing {
            return;
        }
        if let Some(segment) = self.segments.get_mut(self.active) {
            segment.pause();
        }
        self.playing = false;
        info!("Paused at {:.2}s", self.elapsed());
    }

    pub fn toggle_play(&mut self) {
        if self.playing || self.play_requested {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Route a click at canvas pixel `(x, y)`.
    pub fn handle_click(&mut self, x: f64, y: f64) -> Hit {
        if self.geometry.hits_button(self.canvas, x, y) {
            self.toggle_play();
            return Hit::Button;
        }
        if !self.all_loaded || !self.geometry.hits_progress_bar(self.canvas, x, y) {
            return Hit::Nothing;
        }
        let Some(index) = layout::segment_at(&self.layout, x) else {
            return Hit::Nothing;
        };
        if !self.segments[index].is_loaded() {
            return Hit::Nothing;
        }

        let span = self.layout[index];
        let offset = (x - span.x) / span.width * self.segments[index].duration();
        self.select(index, offset);
        Hit::Segment(index)
    }

    /// Forward a typed character. Space toggles playback.
    pub fn key_typed(&mut self, key: char) -> bool {
        match key {
            ' ' => {
                self.toggle_play();
                true
            }
            _ => false,
        }
    }

    /// Make `index` the active segment, positioned `offset` seconds in.
    ///
    /// Playing carries on from the new position. While paused the position is
    /// remembered and used by the next `play()`.
    pub fn select(&mut self, index: usize, offset: f64) {
        if index >= self.segments.len() || !self.segments[index].is_loaded() {
            return;
        }

        let was_playing = self.playing;
        if let Some(current) = self.segments.get_mut(self.active) {
            current.stop();
        }

        self.active = index;
        self.finished_fired = false;
        let segment = &mut self.segments[index];
        segment.seek(offset);
        let offset = segment.start_offset();
        debug!("Selected segment {index} at {offset:.3}s");

        if was_playing {
            self.pending_seek = None;
            segment.play();
            self.playing = segment.is_playing();
        } else {
            self.pending_seek = Some(offset);
        }
    }

    /// Jump to the start of the neighbouring loaded segment in `direction`.
    pub fn skip(&mut self, direction: isize) {
        if direction == 0 {
            return;
        }
        let mut index = self.active.min(self.segments.len()) as isize;
        loop {
            index += direction.signum();
            if index < 0 || index as usize >= self.segments.len() {
                return;
            }
            if self.segments[index as usize].is_loaded() {
                self.select(index as usize, 0.0);
                return;
            }
        }
    }

    /// Load failed segments again. They rejoin the layout once they load.
    pub fn retry_failed(&mut self) -> usize {
        let mut retried = 0;
        for segment in &mut self.segments {
            if segment.retry() {
                retried += 1;
            }
        }
        if retried > 0 {
            info!("Retrying {retried} failed segments");
            self.dispatch_loads();
        }
        retried
    }

    /// Per-frame bookkeeping. Never blocks.
    pub fn update(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;

        let outcomes = self.barrier.poll();
        self.apply_load_outcomes(outcomes);
        self.drain_segment_events();

        if canvas.width != self.last_width {
            self.last_width = canvas.width;
            self.relayout();
        }
    }

    /// Block until loading settles or `timeout` passes. Returns whether everything
    /// has loaded. For callers outside the frame loop.
    pub fn wait_until_loaded(&mut self, timeout: Duration) -> bool {
        let outcomes = self.barrier.wait(timeout);
        self.apply_load_outcomes(outcomes);
        self.all_loaded
    }

    fn dispatch_loads(&mut self) {
        for (index, segment) in self.segments.iter_mut().enumerate() {
            if let Some(source) = segment.begin_load() {
                self.barrier.dispatch(index, source, self.backend.clone());
            }
        }
    }

    fn apply_load_outcomes(&mut self, outcomes: Vec<LoadOutcome>) {
        let arrived = !outcomes.is_empty();
        for outcome in outcomes {
            if let Some(segment) = self.segments.get_mut(outcome.index) {
                // Failures are recorded on the segment and logged there.
                let _ = segment.settle(outcome.result);
            }
        }

        if !self.barrier.is_settled() {
            return;
        }
        if !self.all_loaded {
            self.all_loaded = true;
            info!(
                "Loading complete: {}/{} segments ready",
                self.loaded_count(),
                self.segments.len()
            );
            self.relayout();
            if self.play_requested {
                self.play_requested = false;
                self.play();
            }
        } else if arrived {
            self.relayout();
        }
    }

    fn drain_segment_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SegmentEvent::Ended {
                    segment,
                    generation,
                } => self.segment_ended(segment, generation),
            }
        }
    }

    fn segment_ended(&mut self, index: usize, generation: u64) {
        if index != self.active {
            debug!("Ignoring ended signal from inactive segment {index}");
            return;
        }
        let Some(segment) = self.segments.get_mut(index) else {
            return;
        };
        if !segment.handle_ended(generation) {
            return;
        }

        self.active += 1;
        self.playing = false;

        if self.active >= self.segments.len() {
            self.finish_sequence();
        } else if self.advance == AdvancePolicy::Auto {
            self.play();
        }
    }

    /// Fires `on_finished` once per pass through the sequence.
    fn finish_sequence(&mut self) {
        if self.finished_fired {
            return;
        }
        self.finished_fired = true;
        info!("Reached the end of the sequence");
        if let Some(callback) = self.on_finished.as_mut() {
            callback();
        }
    }

    fn restart(&mut self) {
        debug!("Restarting sequence");
        for segment in &mut self.segments {
            segment.stop();
        }
        self.active = 0;
        self.pending_seek = None;
        self.finished_fired = false;
    }

    fn relayout(&mut self) {
        let durations: Vec<f64> = self.segments.iter().map(Segment::duration).collect();
        self.layout = layout::calc_segment_positions(&durations, &self.geometry, self.last_width);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        for segment in &mut self.segments {
            segment.stop();
        }
        debug!("Player dropped; released segment output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::ManualClock;
    use crate::playback::segment::PlayState;
    use crate::playback::testing::ScriptedBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CANVAS: CanvasSize = CanvasSize {
        width: 400.0,
        height: 200.0,
    };

    struct Rig {
        player: Player,
        backend: Arc<ScriptedBackend>,
        clock: ManualClock,
        finished: Arc<AtomicUsize>,
    }

    fn rig_with(clips: &[(&str, f64)], sources: &[&str], advance: AdvancePolicy) -> Rig {
        let backend = Arc::new(ScriptedBackend::new(clips));
        let clock = ManualClock::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let segments = sources.iter().map(|s| Segment::new(*s)).collect();
        let mut player = Player::new(segments, backend.clone(), Arc::new(clock.clone()))
            .with_advance_policy(advance)
            .on_finished(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        assert!(player.wait_until_loaded(Duration::from_secs(5)));
        player.update(CANVAS);
        Rig {
            player,
            backend,
            clock,
            finished,
        }
    }

    fn rig() -> Rig {
        rig_with(
            &[("a.wav", 2.0), ("b.wav", 4.0)],
            &["a.wav", "b.wav"],
            AdvancePolicy::Manual,
        )
    }

    #[test]
    fn test_loaded_player_initial_state() {
        let rig = rig();
        assert!(rig.player.is_loaded());
        assert!(!rig.player.is_playing());
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.player.state(), PlayerState::Idle);
        assert_eq!(rig.player.total_duration(), 6.0);
        assert!(!rig.player.has_failures());
    }

    #[test]
    fn test_layout_computed_when_loaded() {
        let rig = rig();
        let layout = rig.player.layout();
        assert_eq!(layout[0], SegmentSpan { x: 70.0, width: 100.0 });
        assert_eq!(layout[1], SegmentSpan { x: 170.0, width: 200.0 });
    }

    #[test]
    fn test_layout_follows_canvas_width() {
        let mut rig = rig();
        rig.player.update(CanvasSize::new(700.0, 200.0));
        let layout = rig.player.layout();
        assert_eq!(layout[0].width, 200.0);
        assert_eq!(layout[1], SegmentSpan { x: 270.0, width: 400.0 });
    }

    #[test]
    fn test_play_starts_active_segment() {
        let mut rig = rig();
        assert_eq!(rig.player.play(), PlayRequest::Started);
        assert!(rig.player.is_playing());
        assert_eq!(rig.player.state(), PlayerState::Active);
        assert!(rig.player.segments()[0].is_playing());
    }

    #[test]
    fn test_play_twice_is_idempotent() {
        let mut rig = rig();
        rig.player.play();
        let generation = rig.player.segments()[0].generation();

        assert_eq!(rig.player.play(), PlayRequest::AlreadyPlaying);

        assert_eq!(rig.player.segments()[0].generation(), generation);
        assert_eq!(rig.backend.probe("a.wav").lock().unwrap().starts.len(), 1);
    }

    #[test]
    fn test_pause_keeps_active_index() {
        let mut rig = rig();
        rig.player.play();
        rig.clock.advance(0.5);
        rig.player.pause();

        assert!(!rig.player.is_playing());
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.player.segments()[0].play_state(), PlayState::Paused);
        assert!((rig.player.elapsed() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_space_toggles_playback() {
        let mut rig = rig();
        assert!(rig.player.key_typed(' '));
        assert!(rig.player.is_playing());
        assert!(rig.player.key_typed(' '));
        assert!(!rig.player.is_playing());
        assert!(!rig.player.key_typed('x'));
    }

    #[test]
    fn test_completion_advances_without_autoplay() {
        let mut rig = rig();
        rig.player.play();
        rig.clock.advance(2.0);
        rig.backend.finish("a.wav");

        rig.player.update(CANVAS);

        assert_eq!(rig.player.active_index(), 1);
        assert!(!rig.player.is_playing());
        assert_eq!(rig.player.state(), PlayerState::Idle);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 0);
        assert!(!rig.player.segments()[1].is_playing());
    }

    #[test]
    fn test_play_after_completion_starts_next_segment() {
        let mut rig = rig();
        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.play(), PlayRequest::Started);
        assert!(rig.player.segments()[1].is_playing());
    }

    #[test]
    fn test_finishing_last_segment_fires_once() {
        let mut rig = rig();
        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);
        rig.player.play();
        rig.backend.finish("b.wav");
        rig.backend.finish("b.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.state(), PlayerState::Exhausted);
        assert_eq!(rig.player.active_index(), 2);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exhausted_player_restarts_from_beginning() {
        let mut rig = rig();
        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);
        rig.player.play();
        rig.backend.finish("b.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.play(), PlayRequest::Started);

        assert_eq!(rig.player.active_index(), 0);
        let starts = rig.backend.probe("a.wav").lock().unwrap().starts.clone();
        assert_eq!(starts, vec![0.0, 0.0]);
        assert_eq!(rig.player.segments()[1].start_offset(), 0.0);
    }

    #[test]
    fn test_auto_advance_plays_next_segment() {
        let mut rig = rig_with(
            &[("a.wav", 2.0), ("b.wav", 4.0)],
            &["a.wav", "b.wav"],
            AdvancePolicy::Auto,
        );
        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.active_index(), 1);
        assert!(rig.player.is_playing());
        assert!(rig.player.segments()[1].is_playing());
    }

    #[test]
    fn test_ended_signal_from_superseded_play_is_ignored() {
        let mut rig = rig();
        rig.player.play();
        let superseded = rig.backend.probe("a.wav").lock().unwrap().ended.clone();

        // Clicking segment 0 again restarts it with a new generation.
        assert_eq!(rig.player.handle_click(120.0, 170.0), Hit::Segment(0));
        if let Some(signal) = superseded {
            signal.raise();
        }
        rig.player.update(CANVAS);

        assert!(rig.player.is_playing());
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.backend.probe("a.wav").lock().unwrap().starts, vec![0.0, 1.0]);
    }

    #[test]
    fn test_click_while_paused_stashes_seek() {
        let mut rig = rig();

        // Halfway through segment 1: 170 + 100 = 270.
        let hit = rig.player.handle_click(270.0, 170.0);

        assert_eq!(hit, Hit::Segment(1));
        assert_eq!(rig.player.active_index(), 1);
        assert_eq!(rig.player.pending_seek(), Some(2.0));
        assert!(!rig.player.is_playing());

        rig.player.play();
        assert!(rig.player.segments()[1].is_playing());
        assert!(!rig.player.segments()[0].is_playing());
        assert_eq!(rig.backend.probe("b.wav").lock().unwrap().starts, vec![2.0]);
        assert_eq!(rig.player.pending_seek(), None);
    }

    #[test]
    fn test_click_while_playing_jumps_immediately() {
        let mut rig = rig();
        rig.player.play();
        rig.clock.advance(1.0);

        let hit = rig.player.handle_click(220.0, 170.0);

        assert_eq!(hit, Hit::Segment(1));
        assert!(rig.player.is_playing());
        assert_eq!(rig.player.segments()[0].play_state(), PlayState::Stopped);
        assert_eq!(rig.backend.probe("b.wav").lock().unwrap().starts, vec![1.0]);
        assert_eq!(rig.player.pending_seek(), None);
    }

    #[test]
    fn test_stopped_segment_ended_signal_is_dropped() {
        let mut rig = rig();
        rig.player.play();
        rig.player.handle_click(220.0, 170.0);

        // Segment 0 was stopped by the click; its late signal must not advance.
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.active_index(), 1);
        assert!(rig.player.is_playing());
    }

    #[test]
    fn test_button_click_toggles() {
        let mut rig = rig();
        assert_eq!(rig.player.handle_click(30.0, 170.0), Hit::Button);
        assert!(rig.player.is_playing());
        assert_eq!(rig.player.handle_click(30.0, 170.0), Hit::Button);
        assert!(!rig.player.is_playing());
    }

    #[test]
    fn test_click_outside_is_noop() {
        let mut rig = rig();
        assert_eq!(rig.player.handle_click(200.0, 20.0), Hit::Nothing);
        assert_eq!(rig.player.handle_click(390.0, 170.0), Hit::Nothing);
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.player.pending_seek(), None);
    }

    #[test]
    fn test_skip_moves_between_segments() {
        let mut rig = rig();
        rig.player.skip(1);
        assert_eq!(rig.player.active_index(), 1);
        rig.player.skip(1);
        assert_eq!(rig.player.active_index(), 1);
        rig.player.skip(-1);
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.player.pending_seek(), Some(0.0));
    }

    #[test]
    fn test_failed_segment_is_skipped() {
        let mut rig = rig_with(
            &[("a.wav", 2.0), ("c.wav", 3.0)],
            &["a.wav", "missing.wav", "c.wav"],
            AdvancePolicy::Manual,
        );
        assert!(rig.player.is_loaded());
        assert!(rig.player.has_failures());
        assert_eq!(rig.player.layout()[1].width, 0.0);

        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);
        assert_eq!(rig.player.active_index(), 1);

        assert_eq!(rig.player.play(), PlayRequest::Started);
        assert_eq!(rig.player.active_index(), 2);
        assert!(rig.player.segments()[2].is_playing());
    }

    #[test]
    fn test_all_failed_has_nothing_to_play() {
        let mut rig = rig_with(&[], &["x.wav", "y.wav"], AdvancePolicy::Manual);
        assert!(rig.player.is_loaded());
        assert_eq!(rig.player.play(), PlayRequest::NothingToPlay);
        assert!(!rig.player.is_playing());
        assert_eq!(rig.player.layout()[0].width, 150.0);
        assert_eq!(rig.player.play(), PlayRequest::NothingToPlay);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trailing_failed_segment_finishes_sequence() {
        let mut rig = rig_with(
            &[("a.wav", 2.0)],
            &["a.wav", "missing.wav"],
            AdvancePolicy::Auto,
        );

        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);

        assert_eq!(rig.player.state(), PlayerState::Exhausted);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 1);
        assert_eq!(rig.backend.probe("a.wav").lock().unwrap().starts, vec![0.0]);
    }

    #[test]
    fn test_manual_play_past_trailing_failure_finishes_once() {
        let mut rig = rig_with(
            &[("a.wav", 2.0)],
            &["a.wav", "missing.wav"],
            AdvancePolicy::Manual,
        );

        rig.player.play();
        rig.backend.finish("a.wav");
        rig.player.update(CANVAS);
        assert_eq!(rig.player.active_index(), 1);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 0);

        assert_eq!(rig.player.play(), PlayRequest::NothingToPlay);
        assert_eq!(rig.player.state(), PlayerState::Exhausted);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 1);

        assert_eq!(rig.player.play(), PlayRequest::Started);
        assert_eq!(rig.player.active_index(), 0);
        assert_eq!(rig.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_click_on_failed_span_hits_nothing() {
        let mut rig = rig_with(&[], &["x.wav", "y.wav"], AdvancePolicy::Manual);
        let before = rig.player.pending_seek();

        assert_eq!(rig.player.handle_click(100.0, 170.0), Hit::Nothing);
        assert_eq!(rig.player.handle_click(300.0, 170.0), Hit::Nothing);
        assert_eq!(rig.player.pending_seek(), before);
    }

    #[test]
    fn test_play_during_loading_is_deferred() {
        let backend = Arc::new(ScriptedBackend::new(&[("a.wav", 1.0)]));
        let mut player = Player::new(
            vec![Segment::new("a.wav")],
            backend,
            Arc::new(ManualClock::new()),
        );

        // Nothing has been polled yet, so the barrier has not been observed.
        assert_eq!(player.play(), PlayRequest::Deferred);
        assert!(player.play_requested());

        player.wait_until_loaded(Duration::from_secs(5));

        assert!(!player.play_requested());
        assert!(player.is_playing());
    }

    #[test]
    fn test_pause_withdraws_deferred_play() {
        let backend = Arc::new(ScriptedBackend::new(&[("a.wav", 1.0)]));
        let mut player = Player::new(
            vec![Segment::new("a.wav")],
            backend,
            Arc::new(ManualClock::new()),
        );

        player.toggle_play();
        player.toggle_play();
        player.wait_until_loaded(Duration::from_secs(5));

        assert!(!player.is_playing());
    }

    #[test]
    fn test_retry_failed_reloads() {
        let mut rig = rig_with(&[("a.wav", 2.0)], &["a.wav", "b.wav"], AdvancePolicy::Manual);
        assert!(rig.player.has_failures());

        assert_eq!(rig.player.retry_failed(), 1);
        rig.player.wait_until_loaded(Duration::from_secs(5));

        assert!(rig.player.has_failures());
        assert_eq!(rig.backend.load_count("b.wav"), 2);
        assert_eq!(rig.player.retry_failed(), 1);
    }

    #[test]
    fn test_empty_player() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let mut player = Player::new(Vec::new(), backend, Arc::new(ManualClock::new()));
        player.update(CANVAS);

        assert!(player.is_loaded());
        assert_eq!(player.state(), PlayerState::Exhausted);
        assert_eq!(player.play(), PlayRequest::NothingToPlay);
    }

    #[test]
    fn test_drop_stops_playing_segment() {
        let rig = rig();
        let Rig {
            mut player,
            backend,
            ..
        } = rig;
        player.play();
        drop(player);
        assert_eq!(backend.probe("a.wav").lock().unwrap().halts, 1);
    }

    #[test]
    fn test_advance_policy_parsing() {
        assert_eq!("auto".parse::<AdvancePolicy>(), Ok(AdvancePolicy::Auto));
        assert_eq!("Manual".parse::<AdvancePolicy>(), Ok(AdvancePolicy::Manual));
        assert!("sometimes".parse::<AdvancePolicy>().is_err());
        assert_eq!(AdvancePolicy::Auto.to_string(), "auto");
    }
}
