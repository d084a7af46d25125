//! Immediate-mode drawing contract.
//!
//! The player issues a handful of primitives in canvas pixel space and never owns
//! the canvas. [`DisplayList`] records those primitives so a host can replay them
//! onto whatever it actually draws with.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn gray(level: u8) -> Self {
        Rgb(level, level, level)
    }
}

pub trait Surface {
    fn size(&self) -> CanvasSize;

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb);

    /// Filled circle with an outline.
    fn circle(&mut self, cx: f64, cy: f64, diameter: f64, fill: Rgb, stroke: Rgb);

    fn fill_triangle(&mut self, a: (f64, f64), b: (f64, f64), c: (f64, f64), color: Rgb);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb);

    /// Text centred on `(x, y)`.
    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgb);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
    },
    Circle {
        cx: f64,
        cy: f64,
        diameter: f64,
        fill: Rgb,
        stroke: Rgb,
    },
    Triangle {
        points: [(f64, f64); 3],
        color: Rgb,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: Rgb,
    },
}

/// A surface that records what was drawn on it.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    size: CanvasSize,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Every text primitive, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rects_with_color(&self, wanted: Rgb) -> Vec<&DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { color, .. } if *color == wanted))
            .collect()
    }
}

impl Surface for DisplayList {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn circle(&mut self, cx: f64, cy: f64, diameter: f64, fill: Rgb, stroke: Rgb) {
        self.commands.push(DrawCommand::Circle {
            cx,
            cy,
            diameter,
            fill,
            stroke,
        });
    }

    fn fill_triangle(&mut self, a: (f64, f64), b: (f64, f64), c: (f64, f64), color: Rgb) {
        self.commands.push(DrawCommand::Triangle {
            points: [a, b, c],
            color,
        });
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb) {
        self.commands.push(DrawCommand::Line {
            from: (x1, y1),
            to: (x2, y2),
            color,
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgb) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }
}
