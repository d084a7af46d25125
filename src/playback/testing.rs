//! Scripted backend for exercising the playback core without an audio device.

use super::error::LoadError;
use super::voice::{Backend, EndedSignal, Voice};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// What a scripted voice has been asked to do.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub starts: Vec<f64>,
    pub halts: usize,
    pub loads: usize,
    pub ended: Option<EndedSignal>,
}

pub(crate) type SharedProbe = Arc<Mutex<Probe>>;

/// Backend whose clips exist only as names with durations. Unknown names fail.
pub(crate) struct ScriptedBackend {
    durations: HashMap<String, f64>,
    probes: Mutex<HashMap<String, SharedProbe>>,
    position: Option<f64>,
    fail_start: bool,
}

impl ScriptedBackend {
    pub fn new(clips: &[(&str, f64)]) -> Self {
        Self {
            durations: clips
                .iter()
                .map(|(name, duration)| (name.to_string(), *duration))
                .collect(),
            probes: Mutex::new(HashMap::new()),
            position: None,
            fail_start: false,
        }
    }

    /// Voices report this fixed position while playing, like an engine with its own clock.
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn probe(&self, source: &str) -> SharedProbe {
        self.probes
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_default()
            .clone()
    }

    pub fn load_count(&self, source: &str) -> usize {
        self.probe(source).lock().unwrap().loads
    }

    /// Raise the end-of-playback signal of the latest `start` of `source`.
    pub fn finish(&self, source: &str) {
        let signal = self.probe(source).lock().unwrap().ended.clone();
        if let Some(signal) = signal {
            signal.raise();
        }
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn load(&self, source: &str) -> Result<Box<dyn Voice>, LoadError> {
        let probe = self.probe(source);
        probe.lock().unwrap().loads += 1;
        match self.durations.get(source) {
            Some(duration) => Ok(Box::new(ScriptedVoice {
                duration: *duration,
                probe,
                position: self.position,
                fail_start: self.fail_start,
                started: false,
            })),
            None => Err(LoadError::io(source, "No such file or directory")),
        }
    }
}

struct ScriptedVoice {
    duration: f64,
    probe: SharedProbe,
    position: Option<f64>,
    fail_start: bool,
    started: bool,
}

impl Voice for ScriptedVoice {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn start(&mut self, offset: f64, ended: EndedSignal) -> Result<(), Box<dyn Error>> {
        if self.fail_start {
            return Err("no output device".into());
        }
        let mut probe = self.probe.lock().unwrap();
        probe.starts.push(offset);
        probe.ended = Some(ended);
        self.started = true;
        Ok(())
    }

    fn halt(&mut self) {
        self.probe.lock().unwrap().halts += 1;
        self.started = false;
    }

    fn position(&self) -> Option<f64> {
        if self.started { self.position } else { None }
    }
}
