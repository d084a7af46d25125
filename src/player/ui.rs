use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, canvas::Canvas},
};

use super::app::App;
use super::canvas::TerminalSurface;
use crate::playback::{PlayerState, Rgb};
use crate::utils::time::format_clock;

const GRID_SPACING: f64 = 32.0;
const GRID_COLOR: Rgb = Rgb(25, 40, 55);

struct Areas {
    title: Rect,
    status: Rect,
    canvas: Rect,
    controls: Rect,
    message: Rect,
}

fn areas(size: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Status
            Constraint::Min(8),    // Canvas
            Constraint::Length(2), // Controls
            Constraint::Length(1), // Message
        ])
        .split(size);

    Areas {
        title: chunks[0],
        status: chunks[1],
        canvas: chunks[2],
        controls: chunks[3],
        message: chunks[4],
    }
}

/// The drawable part of the canvas (inside its border), for a terminal of `size`.
pub fn canvas_area(size: Rect) -> Rect {
    areas(size).canvas.inner(Margin {
        horizontal: 1,
        vertical: 1,
    })
}

pub fn draw(f: &mut Frame, app: &App) {
    let areas = areas(f.area());

    let title = Paragraph::new("🎵 segue")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, areas.title);

    draw_status(f, areas.status, app);
    draw_canvas(f, areas.canvas, app);
    draw_controls(f, areas.controls, app);

    if let Some(message) = &app.message {
        let message = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(message, areas.message);
    }
}

fn state_label(app: &App) -> (&'static str, Color) {
    let player = &app.player;
    if !player.is_loaded() {
        return ("Loading", Color::Yellow);
    }
    match player.state() {
        PlayerState::Active => ("▶ Playing", Color::Green),
        PlayerState::Exhausted => ("■ Finished", Color::Blue),
        PlayerState::Idle if player.play_requested() => ("Starting", Color::Yellow),
        PlayerState::Idle => ("⏸ Paused", Color::Gray),
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let player = &app.player;
    let count = player.segments().len();
    let (label, color) = state_label(app);

    let segment_text = match player.segment(player.active_index()) {
        Some(segment) => format!(
            "Segment {}/{}  {}",
            player.active_index() + 1,
            count,
            segment.name()
        ),
        None if count == 0 => "No segments".to_string(),
        None => format!("Segment {count}/{count}"),
    };

    let mut spans = vec![
        Span::styled(segment_text, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
    ];

    if player.is_loaded() {
        spans.push(Span::styled(
            format!(
                "{} / {}",
                format_clock(player.elapsed()),
                format_clock(player.total_duration())
            ),
            Style::default().fg(Color::Cyan),
        ));
    } else {
        spans.push(Span::styled(
            format!("{}/{} loaded", player.loaded_count(), count),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let failed = player
        .segments()
        .iter()
        .filter(|s| s.load_error().is_some())
        .count();
    if failed > 0 {
        spans.push(Span::styled(
            format!("  ({failed} failed)"),
            Style::default().fg(Color::Red),
        ));
    }

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(status, area);
}

fn draw_canvas(f: &mut Frame, area: Rect, app: &App) {
    let size = app.canvas_size();
    let bar_top = app.player.geometry().bar_top(size);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, size.width])
        .y_bounds([0.0, size.height])
        .paint(|ctx| {
            let mut surface = TerminalSurface::new(ctx, size, app.cell);
            surface.draw_grid(bar_top, GRID_SPACING, GRID_COLOR);
            app.player.draw(&mut surface);
        });

    f.render_widget(canvas, area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let playing = app.player.is_playing();
    let controls = vec![
        if playing {
            Span::styled("[space]", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("[space]", Style::default().fg(Color::Green))
        },
        Span::raw(if playing { " pause  " } else { " play  " }),
        Span::styled("[←→]", Style::default().fg(Color::Magenta)),
        Span::raw(" segment  "),
        Span::styled("[click]", Style::default().fg(Color::Blue)),
        Span::raw(" seek  "),
        Span::styled("[r]", Style::default().fg(Color::Cyan)),
        Span::raw(" retry  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let widget = Paragraph::new(Line::from(controls))
        .block(Block::default().borders(Borders::TOP))
        .alignment(Alignment::Center);
    f.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_area_sits_inside_border() {
        let size = Rect::new(0, 0, 80, 30);
        let outer = areas(size).canvas;
        let inner = canvas_area(size);

        assert_eq!(inner.x, outer.x + 1);
        assert_eq!(inner.y, outer.y + 1);
        assert_eq!(inner.width, outer.width - 2);
        assert_eq!(inner.height, outer.height - 2);
    }

    #[test]
    fn test_canvas_takes_remaining_height() {
        // 30 rows minus margins (2), title (2), status (3), controls (2), message (1).
        let inner = canvas_area(Rect::new(0, 0, 80, 30));
        assert_eq!(inner.height, 20 - 2);
        assert_eq!(inner.width, 78 - 2);
    }
}
