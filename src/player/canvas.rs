//! Painting player primitives onto a ratatui canvas.
//!
//! The playback core draws in virtual pixels with the origin at the top-left. A
//! terminal cell stands for `cell_width × cell_height` of those pixels and the
//! ratatui canvas has its y axis pointing up, so every y is flipped on the way
//! through. Filled shapes are drawn as horizontal scanlines, one per braille dot row.

use crate::playback::{CanvasSize, Rgb, Surface};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::canvas::{Circle, Context, Line};

/// Pixel dimensions of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Braille cells have four dot rows.
    fn scanline_step(&self) -> f64 {
        (self.height / 4.0).max(1.0)
    }
}

fn scanlines(top: f64, bottom: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = ((bottom - top) / step).floor().max(0.0) as usize;
    (0..=count).map(move |i| top + i as f64 * step)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub struct TerminalSurface<'c, 'a> {
    ctx: &'c mut Context<'a>,
    size: CanvasSize,
    cell: CellSize,
}

impl<'c, 'a> TerminalSurface<'c, 'a> {
    pub fn new(ctx: &'c mut Context<'a>, size: CanvasSize, cell: CellSize) -> Self {
        Self { ctx, size, cell }
    }

    fn flip(&self, y: f64) -> f64 {
        self.size.height - y
    }

    fn hline(&mut self, x1: f64, x2: f64, y: f64, color: Color) {
        let y = self.flip(y);
        self.ctx.draw(&Line {
            x1,
            y1: y,
            x2,
            y2: y,
            color,
        });
    }

    /// Draws the pending shapes as their own layer so later shapes cover them.
    fn commit(&mut self) {
        self.ctx.layer();
    }

    /// Faint grid over the area above the control strip.
    pub fn draw_grid(&mut self, bottom: f64, spacing: f64, rgb: Rgb) {
        if spacing <= 0.0 {
            return;
        }
        let grid = color(rgb);
        let mut x = 0.0;
        while x <= self.size.width {
            let (y1, y2) = (self.flip(0.0), self.flip(bottom));
            self.ctx.draw(&Line {
                x1: x,
                y1,
                x2: x,
                y2,
                color: grid,
            });
            x += spacing;
        }
        let mut y = 0.0;
        while y <= bottom {
            self.hline(0.0, self.size.width, y, grid);
            y += spacing;
        }
        self.commit();
    }
}

impl Surface for TerminalSurface<'_, '_> {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, rgb: Rgb) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let c = color(rgb);
        for line_y in scanlines(y, y + height, self.cell.scanline_step()) {
            self.hline(x, x + width, line_y, c);
        }
        self.commit();
    }

    fn circle(&mut self, cx: f64, cy: f64, diameter: f64, fill: Rgb, stroke: Rgb) {
        let radius = diameter / 2.0;
        let c = color(fill);
        for line_y in scanlines(cy - radius, cy + radius, self.cell.scanline_step()) {
            let dy = line_y - cy;
            let half = (radius * radius - dy * dy).max(0.0).sqrt();
            self.hline(cx - half, cx + half, line_y, c);
        }
        let y = self.flip(cy);
        self.ctx.draw(&Circle {
            x: cx,
            y,
            radius,
            color: color(stroke),
        });
        self.commit();
    }

    fn fill_triangle(&mut self, a: (f64, f64), b: (f64, f64), c: (f64, f64), rgb: Rgb) {
        let top = a.1.min(b.1).min(c.1);
        let bottom = a.1.max(b.1).max(c.1);
        let edges = [(a, b), (b, c), (c, a)];
        let fill = color(rgb);

        for line_y in scanlines(top, bottom, self.cell.scanline_step()) {
            let crossings: Vec<f64> = edges
                .iter()
                .filter(|(p, q)| (p.1 - q.1).abs() > f64::EPSILON)
                .filter(|(p, q)| line_y >= p.1.min(q.1) && line_y <= p.1.max(q.1))
                .map(|(p, q)| p.0 + (line_y - p.1) * (q.0 - p.0) / (q.1 - p.1))
                .collect();
            let left = crossings.iter().copied().fold(f64::INFINITY, f64::min);
            let right = crossings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if left <= right {
                self.hline(left, right, line_y, fill);
            }
        }
        self.commit();
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, rgb: Rgb) {
        let (y1, y2) = (self.flip(y1), self.flip(y2));
        self.ctx.draw(&Line {
            x1,
            y1,
            x2,
            y2,
            color: color(rgb),
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, rgb: Rgb) {
        let half_width = text.chars().count() as f64 * self.cell.width / 2.0;
        let y = self.flip(y);
        self.ctx.print(
            (x - half_width).max(0.0),
            y,
            Span::styled(text.to_string(), Style::default().fg(color(rgb))),
        );
    }
}
