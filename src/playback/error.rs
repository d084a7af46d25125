//! Failure taxonomy for segment loading.

use thiserror::Error;

/// Why a segment could not be made ready for playback.
///
/// Load errors stay local to the segment that produced them; the load barrier
/// still settles and the remaining segments stay playable. The error is `Clone`
/// so a failed segment reports the same outcome on every later `load()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("could not read {clip}: {message}")]
    Io { clip: String, message: String },

    #[error("unsupported audio format '{extension}' for {clip}")]
    Unsupported { clip: String, extension: String },

    #[error("could not decode {clip}: {message}")]
    Decode { clip: String, message: String },

    #[error("{clip} contains no audio")]
    Empty { clip: String },

    #[error("audio output unavailable for {clip}: {message}")]
    Output { clip: String, message: String },

    #[error("loader for {clip} panicked")]
    Panicked { clip: String },
}

impl LoadError {
    /// The clip identity the error refers to.
    pub fn clip(&self) -> &str {
        match self {
            LoadError::Io { clip, .. }
            | LoadError::Unsupported { clip, .. }
            | LoadError::Decode { clip, .. }
            | LoadError::Empty { clip }
            | LoadError::Output { clip, .. }
            | LoadError::Panicked { clip } => clip,
        }
    }

    pub fn io(source: &str, err: impl std::fmt::Display) -> Self {
        LoadError::Io {
            clip: source.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(source: &str, err: impl std::fmt::Display) -> Self {
        LoadError::Decode {
            clip: source.to_string(),
            message: err.to_string(),
        }
    }
}
