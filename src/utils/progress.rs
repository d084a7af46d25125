//! Progress indicators for non-interactive playback.
//!
//! Standardized spinner and bar styles so every command that reports progress on
//! the terminal looks the same.

use crate::constants::SPINNER_CHARS;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a standard progress spinner with consistent styling.
///
/// # Example
///
/// ```ignore
/// use crate::utils::progress::create_progress_spinner;
///
/// let spinner = create_progress_spinner();
/// spinner.set_message("Loading segments...");
/// // ... do work ...
/// spinner.finish_and_clear();
/// ```
pub fn create_progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_CHARS);
    spinner.set_style(style);
    spinner
}

/// Create a playback bar measured in milliseconds.
///
/// The bar shows elapsed and total time as `mm:ss` in its prefix, which the
/// caller keeps current with [`set_playback_prefix`].
pub fn create_playback_bar(total_ms: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_ms);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {prefix} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(SPINNER_CHARS)
        .progress_chars("█▓░");
    pb.set_style(style);
    pb
}

pub fn set_playback_prefix(pb: &ProgressBar, elapsed: f64, total: f64) {
    pb.set_prefix(format!(
        "{} / {}",
        super::time::format_clock(elapsed),
        super::time::format_clock(total)
    ));
}
