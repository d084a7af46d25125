//! Application state and the terminal frame loop.
//!
//! The loop follows the usual ratatui shape: measure the terminal, let the player
//! do its per-frame bookkeeping, draw, then wait up to one frame interval for an
//! input event and forward it. Mouse positions arrive as terminal cells and are
//! converted to canvas pixels before they reach the player.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use super::canvas::CellSize;
use super::context::AudioContext;
use super::ui;
use crate::constants::MESSAGE_TIMEOUT_SECS;
use crate::playback::{CanvasSize, Hit, Player};

pub struct App {
    pub should_quit: bool,
    pub player: Player,
    context: AudioContext,
    pub cell: CellSize,
    pub canvas_area: Rect,
    pub message: Option<String>,
    message_timer: Option<Instant>,
}

impl App {
    pub fn new(player: Player, context: AudioContext, cell: CellSize) -> Self {
        Self {
            should_quit: false,
            player,
            context,
            cell,
            canvas_area: Rect::default(),
            message: None,
            message_timer: None,
        }
    }

    /// Pixel size of the canvas area.
    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::new(
            self.canvas_area.width as f64 * self.cell.width,
            self.canvas_area.height as f64 * self.cell.height,
        )
    }

    pub fn set_canvas_area(&mut self, area: Rect) {
        self.canvas_area = area;
    }

    /// Centre of the terminal cell `(column, row)` in canvas pixels, if it lies on the canvas.
    pub fn to_canvas(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.canvas_area;
        if column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        Some((
            (column - area.x) as f64 * self.cell.width + self.cell.width / 2.0,
            (row - area.y) as f64 * self.cell.height + self.cell.height / 2.0,
        ))
    }

    pub fn show_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.message_timer = Some(Instant::now());
    }

    /// Clear the message once it has been on screen long enough.
    pub fn expire_message(&mut self, now: Instant) {
        if let Some(timer) = self.message_timer
            && now.duration_since(timer) > Duration::from_secs(MESSAGE_TIMEOUT_SECS)
        {
            self.message = None;
            self.message_timer.take();
        }
    }

    /// Per-frame work before drawing.
    pub fn tick(&mut self) {
        self.expire_message(Instant::now());
        let size = self.canvas_size();
        self.player.update(size);
    }

    fn unlock_audio(&mut self) {
        if self.context.is_open() {
            return;
        }
        if let Err(e) = self.context.unlock() {
            error!("Could not open audio output: {e}");
            self.show_message(format!("Audio output unavailable: {e}"));
        }
    }

    fn is_active(&self) -> bool {
        self.player.is_playing() || self.player.play_requested()
    }

    /// Tell the user why a play request went nowhere.
    fn report_failed_start(&mut self, was_active: bool) {
        if was_active || self.is_active() {
            return;
        }
        if self.player.loaded_count() == 0 {
            self.show_message("No playable segments");
        } else if !self.context.is_open() {
            self.show_message("Audio output unavailable");
        } else {
            self.show_message("Could not start playback (see log)");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        self.unlock_audio();
        match key.code {
            KeyCode::Char(' ') => {
                let was_active = self.is_active();
                self.player.key_typed(' ');
                self.report_failed_start(was_active);
            }
            KeyCode::Left => self.player.skip(-1),
            KeyCode::Right => self.player.skip(1),
            KeyCode::Char('r') => {
                let retried = self.player.retry_failed();
                if retried > 0 {
                    self.show_message(format!("Retrying {retried} segment(s)"));
                }
            }
            KeyCode::Char(c) => {
                self.player.key_typed(c);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some((x, y)) = self.to_canvas(mouse.column, mouse.row) else {
            return;
        };

        self.unlock_audio();
        let was_active = self.is_active();
        if self.player.handle_click(x, y) == Hit::Button {
            self.report_failed_start(was_active);
        }
    }

    /// Stop playback and release the output device.
    pub fn shutdown(&mut self) {
        self.player.pause();
        self.context.close();
    }
}

pub fn run_tui(mut app: App, frame_interval: Duration) -> Result<(), Box<dyn Error>> {
    info!("Starting segue player");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, frame_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown();
    if let Err(e) = &res {
        error!("Player exited with error: {e}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        app.set_canvas_area(ui::canvas_area(Rect::new(0, 0, size.width, size.height)));
        app.tick();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with a short timeout to allow continuous rendering
        if event::poll(frame_interval)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::ManualClock;
    use crate::player::buffer::BufferBackend;
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;

    fn app() -> App {
        let context = AudioContext::new();
        let backend = Arc::new(BufferBackend::new(context.slot()));
        let player = Player::new(Vec::new(), backend, Arc::new(ManualClock::new()));
        let mut app = App::new(player, context, CellSize::new(8.0, 16.0));
        app.set_canvas_area(Rect::new(1, 10, 50, 12));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_new_app_initial_state() {
        let app = app();
        assert!(!app.should_quit);
        assert!(app.message.is_none());
        assert!(!app.player.is_playing());
    }

    #[test]
    fn test_canvas_size_in_pixels() {
        let app = app();
        assert_eq!(app.canvas_size(), CanvasSize::new(400.0, 192.0));
    }

    #[test]
    fn test_to_canvas_uses_cell_centre() {
        let app = app();
        assert_eq!(app.to_canvas(1, 10), Some((4.0, 8.0)));
        assert_eq!(app.to_canvas(4, 20), Some((28.0, 168.0)));
        assert_eq!(app.to_canvas(50, 21), Some((396.0, 184.0)));
    }

    #[test]
    fn test_to_canvas_outside_area() {
        let app = app();
        assert_eq!(app.to_canvas(0, 10), None);
        assert_eq!(app.to_canvas(5, 9), None);
        assert_eq!(app.to_canvas(51, 12), None);
        assert_eq!(app.to_canvas(5, 22), None);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = self::app();
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_message_expires() {
        let mut app = app();
        app.show_message("Audio output unavailable");
        let shown = app.message_timer.unwrap();

        app.expire_message(shown + Duration::from_secs(1));
        assert!(app.message.is_some());

        app.expire_message(shown + Duration::from_secs(MESSAGE_TIMEOUT_SECS + 1));
        assert!(app.message.is_none());
    }

    #[test]
    fn test_clicks_outside_canvas_are_ignored() {
        let mut app = app();
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!app.context.is_open());
        assert!(app.message.is_none());
    }
}
