//! Decode-up-front backend.
//!
//! Clips are decoded completely when they load (WAV through `hound`, FLAC through
//! `claxon`) and kept in memory as interleaved `f32` samples. Every start builds a
//! fresh [`Sink`] playing a [`ClipSource`] over the shared samples, so starting
//! again at a new offset never re-reads the file. Timing is left to the segment's
//! clock.

use super::context::OutputSlot;
use crate::playback::{Backend, EndedSignal, LoadError, Voice};
use log::{debug, info};
use rodio::{Sink, Source};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A fully decoded clip. Cloning shares the samples.
#[derive(Debug, Clone)]
pub struct DecodedClip {
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedClip {
    pub fn decode(source: &str) -> Result<Self, LoadError> {
        let path = Path::new(source);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let file = File::open(path).map_err(|e| LoadError::io(source, e))?;
        let reader = BufReader::new(file);

        let clip = match ext.as_str() {
            "wav" => decode_wav(source, reader)?,
            "flac" => decode_flac(source, reader)?,
            _ => {
                return Err(LoadError::Unsupported {
                    clip: source.to_string(),
                    extension: ext,
                });
            }
        };

        if clip.samples.is_empty() || clip.channels == 0 || clip.sample_rate == 0 {
            return Err(LoadError::Empty {
                clip: source.to_string(),
            });
        }

        info!(
            "Decoded {source}: {} Hz, {} channels, {:.2}s",
            clip.sample_rate,
            clip.channels,
            clip.duration()
        );
        Ok(clip)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// A source playing the clip from `offset` seconds, raising `ended` when it runs out.
    pub fn source_from(&self, offset: f64, ended: Option<EndedSignal>) -> ClipSource {
        let frame = (offset.max(0.0) * self.sample_rate as f64) as usize;
        let position = (frame * self.channels as usize).min(self.samples.len());
        ClipSource {
            clip: self.clone(),
            position,
            ended,
        }
    }
}

fn decode_wav(source: &str, reader: BufReader<File>) -> Result<DecodedClip, LoadError> {
    let mut reader = hound::WavReader::new(reader).map_err(|e| LoadError::decode(source, e))?;
    let spec = reader.spec();
    debug!("WAV format for {source}: {spec:?}");

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => reader.samples::<f32>().collect(),
        (hound::SampleFormat::Int, 8) => read_ints::<i8>(&mut reader, 8),
        (hound::SampleFormat::Int, 16) => read_ints::<i16>(&mut reader, 16),
        (hound::SampleFormat::Int, bits @ (24 | 32)) => read_ints::<i32>(&mut reader, bits),
        (_, bits) => {
            return Err(LoadError::decode(
                source,
                format!("unsupported bit depth: {bits}"),
            ));
        }
    }
    .map_err(|e| LoadError::decode(source, e))?;

    Ok(DecodedClip {
        samples: Arc::new(samples),
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

fn read_ints<T>(
    reader: &mut hound::WavReader<BufReader<File>>,
    bits: u16,
) -> Result<Vec<f32>, hound::Error>
where
    T: hound::Sample + Into<i32>,
{
    let scale = (1i64 << (bits - 1)) as f32;
    reader
        .samples::<T>()
        .map(|s| s.map(|v| Into::<i32>::into(v) as f32 / scale))
        .collect()
}

fn decode_flac(source: &str, reader: BufReader<File>) -> Result<DecodedClip, LoadError> {
    let mut reader = claxon::FlacReader::new(reader).map_err(|e| LoadError::decode(source, e))?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample.clamp(1, 32) - 1)) as f32;

    let samples = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LoadError::decode(source, e))?;

    Ok(DecodedClip {
        samples: Arc::new(samples),
        channels: info.channels as u16,
        sample_rate: info.sample_rate,
    })
}

/// Plays a [`DecodedClip`] and raises its ended signal on exhaustion.
pub struct ClipSource {
    clip: DecodedClip,
    position: usize,
    ended: Option<EndedSignal>,
}

impl Iterator for ClipSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        match self.clip.samples.get(self.position) {
            Some(&sample) => {
                self.position += 1;
                Some(sample)
            }
            None => {
                if let Some(ended) = self.ended.take() {
                    ended.raise();
                }
                None
            }
        }
    }
}

impl Source for ClipSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clip.channels
    }

    fn sample_rate(&self) -> u32 {
        self.clip.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(self.clip.duration()))
    }
}

pub struct BufferBackend {
    output: OutputSlot,
}

impl BufferBackend {
    pub fn new(output: OutputSlot) -> Self {
        Self { output }
    }
}

impl Backend for BufferBackend {
    fn name(&self) -> &'static str {
        "buffer"
    }

    fn load(&self, source: &str) -> Result<Box<dyn Voice>, LoadError> {
        let clip = DecodedClip::decode(source)?;
        Ok(Box::new(BufferVoice {
            clip,
            output: self.output.clone(),
            sink: None,
        }))
    }
}

struct BufferVoice {
    clip: DecodedClip,
    output: OutputSlot,
    sink: Option<Sink>,
}

impl Voice for BufferVoice {
    fn duration(&self) -> f64 {
        self.clip.duration()
    }

    fn start(&mut self, offset: f64, ended: EndedSignal) -> Result<(), Box<dyn Error>> {
        self.halt();
        let handle = self.output.handle()?;
        let sink = Sink::try_new(&handle)?;
        sink.append(self.clip.source_from(offset, Some(ended)));
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn halt(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl Drop for BufferVoice {
    fn drop(&mut self) {
        self.halt();
    }
}
