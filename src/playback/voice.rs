//! The audio backend contract.
//!
//! A [`Backend`] fetches and decodes a clip into a [`Voice`]. The voice exclusively
//! owns the decoded audio and whatever output node is currently playing it; the
//! segment that holds the voice is the only thing that ever touches it.
//!
//! When output runs off the end of the clip the voice raises the [`EndedSignal`]
//! it was started with. That signal is the backend's own end-of-playback event and
//! is the only way the player learns a segment has finished.

use super::error::LoadError;
use std::error::Error;
use std::sync::mpsc;

/// Fetches and decodes clips. Called from loader threads.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(&self, source: &str) -> Result<Box<dyn Voice>, LoadError>;
}

/// A decoded, playable clip.
pub trait Voice: Send {
    /// Clip length in seconds. Always positive for a loaded voice.
    fn duration(&self) -> f64;

    /// Start output `offset` seconds into the clip. `ended` must be raised once
    /// output reaches the end of the clip, and never after [`Voice::halt`].
    fn start(&mut self, offset: f64, ended: EndedSignal) -> Result<(), Box<dyn Error>>;

    /// Stop output immediately.
    fn halt(&mut self);

    /// Position in seconds according to the backend's own clock, for backends
    /// that keep one. `None` means the caller tracks time itself.
    fn position(&self) -> Option<f64> {
        None
    }
}

/// Messages from voices to the player that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvent {
    Ended { segment: usize, generation: u64 },
}

/// Notice that a particular `play()` of a particular segment ran to its end.
///
/// The generation identifies the `play()` call. Raising a signal from a call that
/// has since been paused, stopped or sought past is harmless: the segment drops it.
#[derive(Debug, Clone)]
pub struct EndedSignal {
    tx: mpsc::Sender<SegmentEvent>,
    segment: usize,
    generation: u64,
}

impl EndedSignal {
    pub fn new(tx: mpsc::Sender<SegmentEvent>, segment: usize, generation: u64) -> Self {
        Self {
            tx,
            segment,
            generation,
        }
    }

    /// A signal nobody listens to, for segments not attached to a player.
    pub fn detached(segment: usize, generation: u64) -> Self {
        let (tx, _rx) = mpsc::channel();
        Self::new(tx, segment, generation)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn raise(&self) {
        // The receiver is gone once the player is torn down; nothing left to tell.
        let _ = self.tx.send(SegmentEvent::Ended {
            segment: self.segment,
            generation: self.generation,
        });
    }
}
