//! Application configuration management.
//!
//! Persistent settings for segue: which audio backend decodes the clips, what
//! happens when a segment finishes, how fast the terminal frame loop ticks, how
//! terminal cells map to canvas pixels, logging, and the progress bar geometry.
//! Configuration is stored in the user's config directory (typically
//! ~/.config/segue/config.toml). A missing file means defaults.

use crate::playback::{AdvancePolicy, Geometry};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Which decoding strategy turns files into voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Decode the whole clip into memory when loading.
    #[default]
    Buffer,
    /// Stream from disk through the audio engine's decoder on every start.
    Engine,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buffer" => Ok(BackendKind::Buffer),
            "engine" => Ok(BackendKind::Engine),
            _ => Err(format!("Unknown backend '{s}' (expected 'buffer' or 'engine')")),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Buffer => write!(f, "buffer"),
            BackendKind::Engine => write!(f, "engine"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub advance: AdvancePolicy,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_cell_width")]
    pub cell_width: f64,
    #[serde(default = "default_cell_height")]
    pub cell_height: f64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub geometry: Geometry,
}

fn default_frame_interval_ms() -> u64 {
    50
}

fn default_cell_width() -> f64 {
    8.0
}

fn default_cell_height() -> f64 {
    16.0
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join("segue.log")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend: BackendKind::default(),
            advance: AdvancePolicy::default(),
            frame_interval_ms: default_frame_interval_ms(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            geometry: Geometry::default(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("segue")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("segue")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Log file path with `~` expanded.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "backend" => self.backend = value.parse()?,
            "advance" => self.advance = value.parse()?,
            "frame_interval_ms" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
                if ms == 0 {
                    return Err("frame_interval_ms must be greater than zero".into());
                }
                self.frame_interval_ms = ms;
            }
            "cell_width" => self.cell_width = parse_positive(value)?,
            "cell_height" => self.cell_height = parse_positive(value)?,
            "log_file" => self.log_file = value.to_string(),
            "log_level" => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(format!(
                        "Unknown log level '{value}' (expected one of: {})",
                        LOG_LEVELS.join(", ")
                    )
                    .into());
                }
                self.log_level = level;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

fn parse_positive(value: &str) -> Result<f64, Box<dyn Error>> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err("Value must be a positive number".into()),
    }
}
