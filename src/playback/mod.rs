//! Sequential segment playback core.
//!
//! Everything in here is independent of any particular audio device or terminal
//! toolkit. A [`Player`] owns an ordered list of [`Segment`]s, loads them in the
//! background, lays them out proportionally on a progress bar and turns clicks and
//! key presses into segment operations. Audio output is reached only through the
//! [`Backend`] and [`Voice`] traits, and drawing only through [`Surface`].

pub mod clock;
pub mod error;
pub mod layout;
pub mod loader;
pub mod render;
pub mod segment;
pub mod sequencer;
pub mod surface;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{AudioClock, ManualClock, SystemClock};
pub use error::LoadError;
pub use layout::{Geometry, SegmentSpan};
pub use segment::{LoadState, PlayState, Segment};
pub use sequencer::{AdvancePolicy, Hit, PlayRequest, Player, PlayerState};
pub use surface::{CanvasSize, DisplayList, DrawCommand, Rgb, Surface};
pub use voice::{Backend, EndedSignal, SegmentEvent, Voice};
