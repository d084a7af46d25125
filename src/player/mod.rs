//! Audio output and the terminal front end.

pub mod app;
pub mod buffer;
pub mod canvas;
pub mod context;
pub mod engine;
pub mod headless;
pub mod ui;

use crate::config::{BackendKind, Config};
use crate::playback::{AdvancePolicy, Backend, Player, Segment, SystemClock};
use buffer::BufferBackend;
use canvas::CellSize;
use context::{AudioContext, OutputSlot};
use engine::EngineBackend;
use log::info;
use std::error::Error;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

pub fn build_backend(kind: BackendKind, output: OutputSlot) -> Arc<dyn Backend> {
    match kind {
        BackendKind::Buffer => Arc::new(BufferBackend::new(output)),
        BackendKind::Engine => Arc::new(EngineBackend::new(output)),
    }
}

pub fn build_player(files: &[String], config: &Config, output: OutputSlot) -> Player {
    let segments = files.iter().map(Segment::new).collect();
    Player::new(
        segments,
        build_backend(config.backend, output),
        Arc::new(SystemClock::new()),
    )
    .with_geometry(config.geometry)
    .with_advance_policy(config.advance)
}

/// Play `files` in order, interactively or straight through.
pub fn run(files: &[String], config: &Config, headless: bool) -> Result<(), Box<dyn Error>> {
    init_logging(config)?;
    info!(
        "Starting with {} files, backend {}, advance {}",
        files.len(),
        config.backend,
        config.advance
    );

    let context = AudioContext::new();
    let frame_interval = Duration::from_millis(config.frame_interval_ms.max(1));

    if headless {
        let player = build_player(files, config, context.slot())
            .with_advance_policy(AdvancePolicy::Auto);
        return headless::run(player, context, frame_interval);
    }

    let player = build_player(files, config, context.slot());
    let cell = CellSize::new(config.cell_width, config.cell_height);
    app::run_tui(app::App::new(player, context, cell), frame_interval)
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};

    CombinedLogger::init(vec![WriteLogger::new(
        config.log_level_filter(),
        simplelog::Config::default(),
        File::create(config.log_path())?,
    )])?;

    Ok(())
}
