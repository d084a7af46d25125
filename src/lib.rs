pub mod config;
pub mod constants;
pub mod playback;
pub mod utils;

#[cfg(feature = "player")]
pub mod player;
