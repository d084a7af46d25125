//! Streaming backend driven by rodio's own decoder.
//!
//! Loading only probes the clip for its length. Each start re-opens the file,
//! skips to the offset and queues an [`EmptyCallback`] behind the clip; the sink
//! reaching that callback is the end-of-playback event. Position comes from the
//! sink's own clock.

use super::context::OutputSlot;
use crate::playback::{Backend, EndedSignal, LoadError, Voice};
use log::{debug, info};
use rodio::source::EmptyCallback;
use rodio::{Decoder, Sink, Source};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct EngineBackend {
    output: OutputSlot,
}

impl EngineBackend {
    pub fn new(output: OutputSlot) -> Self {
        Self { output }
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, Box<dyn Error>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

/// Clip length in seconds, from the container when it says, otherwise by counting.
fn probe_duration(source: &str) -> Result<f64, LoadError> {
    let file = File::open(source).map_err(|e| LoadError::io(source, e))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| LoadError::decode(source, e))?;

    if let Some(duration) = decoder.total_duration() {
        return Ok(duration.as_secs_f64());
    }

    let channels = decoder.channels().max(1) as f64;
    let sample_rate = decoder.sample_rate();
    if sample_rate == 0 {
        return Ok(0.0);
    }
    let samples = decoder.count() as f64;
    Ok(samples / channels / sample_rate as f64)
}

impl Backend for EngineBackend {
    fn name(&self) -> &'static str {
        "engine"
    }

    fn load(&self, source: &str) -> Result<Box<dyn Voice>, LoadError> {
        let duration = probe_duration(source)?;
        info!("Probed {source}: {duration:.2}s");
        Ok(Box::new(EngineVoice {
            path: PathBuf::from(source),
            duration,
            output: self.output.clone(),
            sink: None,
            offset: 0.0,
        }))
    }
}

struct EngineVoice {
    path: PathBuf,
    duration: f64,
    output: OutputSlot,
    sink: Option<Sink>,
    offset: f64,
}

impl Voice for EngineVoice {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn start(&mut self, offset: f64, ended: EndedSignal) -> Result<(), Box<dyn Error>> {
        self.halt();
        let handle = self.output.handle()?;
        let decoder = open_decoder(&self.path)?;
        let sink = Sink::try_new(&handle)?;

        sink.append(decoder.skip_duration(Duration::from_secs_f64(offset.max(0.0))));
        sink.append(EmptyCallback::<f32>::new(Box::new(move || ended.raise())));
        sink.play();

        debug!("Streaming {} from {offset:.3}s", self.path.display());
        self.offset = offset;
        self.sink = Some(sink);
        Ok(())
    }

    fn halt(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn position(&self) -> Option<f64> {
        self.sink
            .as_ref()
            .map(|sink| self.offset + sink.get_pos().as_secs_f64())
    }
}

impl Drop for EngineVoice {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, frames: usize) -> String {
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample((i % 50) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_probe_reports_duration() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, 4_000);

        let backend = EngineBackend::new(OutputSlot::new());
        let voice = backend.load(&path).unwrap();

        assert!((voice.duration() - 0.5).abs() < 1e-3);
        assert_eq!(voice.position(), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let backend = EngineBackend::new(OutputSlot::new());
        let err = backend.load("/nonexistent/clip.ogg").err().unwrap();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_undecodable_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let backend = EngineBackend::new(OutputSlot::new());
        let err = backend.load(&path.to_string_lossy()).err().unwrap();

        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_start_without_output_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, 800);

        let backend = EngineBackend::new(OutputSlot::new());
        let mut voice = backend.load(&path).unwrap();

        assert!(voice.start(0.0, EndedSignal::detached(0, 1)).is_err());
        assert_eq!(voice.position(), None);
    }
}
