//! Project-wide constants used across multiple modules.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Audio file extensions accepted on the command line
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg"];

/// How close to the end of a clip (in seconds) counts as having reached it
pub const COMPLETION_EPSILON: f64 = 0.01;

/// How long transient messages stay on screen
pub const MESSAGE_TIMEOUT_SECS: u64 = 3;

/// How long a non-interactive run waits for segments to load
pub const LOAD_TIMEOUT_SECS: u64 = 30;
