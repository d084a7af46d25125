//! Progress bar geometry and segment layout.
//!
//! All coordinates are canvas pixels with the origin at the top-left corner. The
//! control strip occupies the bottom `bar_height` pixels of the canvas: the play
//! button on the left, the segmented progress bar between the margins.

use super::surface::CanvasSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub left_margin: f64,
    pub right_margin: f64,
    pub bar_height: f64,
    pub progress_bar_height: f64,
    pub play_button_diameter: f64,
    pub play_button_x: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left_margin: 70.0,
            right_margin: 30.0,
            bar_height: 60.0,
            progress_bar_height: 20.0,
            play_button_diameter: 40.0,
            play_button_x: 30.0,
        }
    }
}

impl Geometry {
    /// Width available to the progress bar. Never negative.
    pub fn bar_width(&self, canvas_width: f64) -> f64 {
        (canvas_width - self.left_margin - self.right_margin).max(0.0)
    }

    /// Top edge of the control strip.
    pub fn bar_top(&self, size: CanvasSize) -> f64 {
        size.height - self.bar_height
    }

    pub fn button_center(&self, size: CanvasSize) -> (f64, f64) {
        (
            self.play_button_x,
            self.bar_top(size) + self.bar_height / 2.0,
        )
    }

    /// Top edge of the progress bar, centred vertically in the control strip.
    pub fn progress_top(&self, size: CanvasSize) -> f64 {
        self.bar_top(size) + self.bar_height / 2.0 - self.progress_bar_height / 2.0
    }

    pub fn hits_button(&self, size: CanvasSize, x: f64, y: f64) -> bool {
        let (cx, cy) = self.button_center(size);
        (x - cx).hypot(y - cy) < self.play_button_diameter / 2.0
    }

    pub fn hits_progress_bar(&self, size: CanvasSize, x: f64, y: f64) -> bool {
        let top = self.progress_top(size);
        x >= self.left_margin
            && x <= self.left_margin + self.bar_width(size.width)
            && y >= top
            && y <= top + self.progress_bar_height
    }
}

/// Horizontal extent of one segment on the progress bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    pub x: f64,
    pub width: f64,
}

impl SegmentSpan {
    pub fn end(&self) -> f64 {
        self.x + self.width
    }
}

/// Lay segments out left to right, each as wide as its share of the total duration.
///
/// Spans are contiguous and together fill the bar. When the durations sum to zero
/// (nothing loaded, or every clip failed) the bar is split evenly instead.
pub fn calc_segment_positions(
    durations: &[f64],
    geometry: &Geometry,
    canvas_width: f64,
) -> Vec<SegmentSpan> {
    let bar_width = geometry.bar_width(canvas_width);
    let total: f64 = durations.iter().map(|d| d.max(0.0)).sum();

    let mut x = geometry.left_margin;
    durations
        .iter()
        .map(|duration| {
            let width = if total > 0.0 {
                duration.max(0.0) * bar_width / total
            } else {
                bar_width / durations.len() as f64
            };
            let span = SegmentSpan { x, width };
            x += width;
            span
        })
        .collect()
}

/// Index of the segment under `x`.
///
/// Spans are half-open, `[x, x + width)`, so a boundary belongs to the segment on
/// its right. The last non-empty span also owns the right edge of the bar.
/// Zero-width spans are never hit.
pub fn segment_at(layout: &[SegmentSpan], x: f64) -> Option<usize> {
    let last = layout.iter().rposition(|span| span.width > 0.0)?;
    layout.iter().enumerate().position(|(i, span)| {
        span.width > 0.0 && x >= span.x && (x < span.end() || (i == last && x <= span.end()))
    })
}
