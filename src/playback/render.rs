//! Drawing the player onto a [`Surface`].

use super::segment::LoadState;
use super::sequencer::Player;
use super::surface::{Rgb, Surface};

const BUTTON_FILL: Rgb = Rgb::gray(100);
const BUTTON_STROKE: Rgb = Rgb::gray(50);
const GLYPH: Rgb = Rgb::gray(255);
const BAR_BACKGROUND: Rgb = Rgb::gray(150);
const COMPLETED: Rgb = Rgb(100, 200, 100);
const CURRENT: Rgb = Rgb(100, 150, 255);
const UPCOMING: Rgb = Rgb::gray(200);
const PROGRESS: Rgb = Rgb(50, 100, 200);
const SEPARATOR: Rgb = Rgb::gray(100);
const FAILED: Rgb = Rgb(200, 80, 80);
const ERROR: Rgb = Rgb(255, 0, 0);

pub const LOADING_GLYPH: &str = "...";
pub const ERROR_GLYPH: &str = "!";

impl Player {
    /// Draw the control strip. Reads state only; safe to call every frame.
    pub fn draw(&self, surface: &mut dyn Surface) {
        let size = surface.size();
        let geometry = *self.geometry();
        let (cx, cy) = geometry.button_center(size);

        surface.circle(
            cx,
            cy,
            geometry.play_button_diameter,
            BUTTON_FILL,
            BUTTON_STROKE,
        );

        if !self.is_loaded() {
            surface.text(cx, cy, LOADING_GLYPH, GLYPH);
            return;
        }

        if !self.segments().is_empty() && self.loaded_count() == 0 {
            surface.text(cx, cy, ERROR_GLYPH, ERROR);
        } else if self.is_playing() {
            surface.fill_rect(cx - 8.0, cy - 10.0, 6.0, 20.0, GLYPH);
            surface.fill_rect(cx + 2.0, cy - 10.0, 6.0, 20.0, GLYPH);
        } else {
            surface.fill_triangle(
                (cx - 6.0, cy - 10.0),
                (cx - 6.0, cy + 10.0),
                (cx + 8.0, cy),
                GLYPH,
            );
        }

        let top = geometry.progress_top(size);
        let height = geometry.progress_bar_height;
        surface.fill_rect(
            geometry.left_margin,
            top,
            geometry.bar_width(size.width),
            height,
            BAR_BACKGROUND,
        );

        let active = self.active_index();
        for (i, (span, segment)) in self.layout().iter().zip(self.segments()).enumerate() {
            if span.width <= 0.0 {
                continue;
            }
            let color = if segment.load_state() == LoadState::Failed {
                FAILED
            } else if i < active {
                COMPLETED
            } else if i == active {
                CURRENT
            } else {
                UPCOMING
            };
            surface.fill_rect(span.x, top, span.width, height, color);

            if i == active && segment.duration() > 0.0 {
                let fraction = segment.current_time() / segment.duration();
                surface.fill_rect(span.x, top, span.width * fraction, height, PROGRESS);
            }
        }

        // Separators between neighbouring segments only.
        for span in self.layout().iter().skip(1) {
            surface.line(span.x, top, span.x, top + height, SEPARATOR);
        }

        if self.has_failures() {
            let x = size.width - geometry.right_margin / 2.0;
            surface.text(x, top + height / 2.0, ERROR_GLYPH, ERROR);
        }
    }
}
