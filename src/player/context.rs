//! Lazily opened audio output.
//!
//! The output device is not opened until the user first interacts with the player
//! ([`AudioContext::unlock`]). Voices never hold the device itself, only the
//! shared [`OutputSlot`], and look up the current stream handle whenever they start.

use log::{debug, info};
use rodio::{OutputStream, OutputStreamHandle};
use std::error::Error;
use std::sync::{Arc, RwLock};

/// Where voices find the open output, if any.
#[derive(Clone, Default)]
pub struct OutputSlot(Arc<RwLock<Option<OutputStreamHandle>>>);

impl OutputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the open output stream.
    pub fn handle(&self) -> Result<OutputStreamHandle, Box<dyn Error>> {
        let guard = self
            .0
            .read()
            .map_err(|_| "audio output lock was poisoned")?;
        guard
            .clone()
            .ok_or_else(|| "audio output is not open".into())
    }

    pub fn is_open(&self) -> bool {
        self.0.read().map(|g| g.is_some()).unwrap_or(false)
    }

    fn publish(&self, handle: Option<OutputStreamHandle>) {
        match self.0.write() {
            Ok(mut guard) => *guard = handle,
            Err(poisoned) => *poisoned.into_inner() = handle,
        }
    }
}

/// Owner of the output stream. Lives on the thread that created it.
pub struct AudioContext {
    stream: Option<OutputStream>,
    slot: OutputSlot,
}

impl AudioContext {
    /// A closed context. Nothing is opened until [`unlock`](Self::unlock).
    pub fn new() -> Self {
        Self {
            stream: None,
            slot: OutputSlot::new(),
        }
    }

    pub fn slot(&self) -> OutputSlot {
        self.slot.clone()
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the default output device if it is not open yet.
    pub fn unlock(&mut self) -> Result<(), Box<dyn Error>> {
        if self.stream.is_some() {
            return Ok(());
        }
        let (stream, handle) = OutputStream::try_default()?;
        self.slot.publish(Some(handle));
        self.stream = Some(stream);
        info!("Audio output opened");
        Ok(())
    }

    /// Release the output device. Voices started afterwards fail to start.
    pub fn close(&mut self) {
        self.slot.publish(None);
        if self.stream.take().is_some() {
            info!("Audio output closed");
        }
    }
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("Audio context dropped while open; closing");
        }
        self.close();
    }
}
