//! Playing a sequence straight through without the terminal UI.

use super::context::AudioContext;
use crate::constants::LOAD_TIMEOUT_SECS;
use crate::playback::{CanvasSize, PlayRequest, Player};
use crate::utils::progress::{create_playback_bar, create_progress_spinner, set_playback_prefix};
use log::{info, warn};
use owo_colors::OwoColorize;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Running,
    Finished,
    Stalled,
}

/// One frame of unattended playback. Restarts output when it has stopped short of
/// the end, and reports a stall when it cannot.
fn step(player: &mut Player, finished: &AtomicBool) -> Step {
    player.update(CanvasSize::default());
    if finished.load(Ordering::SeqCst) {
        return Step::Finished;
    }
    if player.is_playing() {
        return Step::Running;
    }

    match player.play() {
        PlayRequest::Started | PlayRequest::AlreadyPlaying => Step::Running,
        _ if finished.load(Ordering::SeqCst) => Step::Finished,
        request => {
            warn!("Headless playback stalled: {request:?}");
            Step::Stalled
        }
    }
}

pub fn run(
    mut player: Player,
    mut context: AudioContext,
    frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    player.set_on_finished(move || flag.store(true, Ordering::SeqCst));

    let count = player.segments().len();
    let spinner = create_progress_spinner();
    spinner.set_message(format!("Loading {count} segments..."));

    let deadline = Instant::now() + Duration::from_secs(LOAD_TIMEOUT_SECS);
    while !player.is_loaded() {
        if Instant::now() >= deadline {
            spinner.finish_and_clear();
            return Err(format!("Timed out loading segments after {LOAD_TIMEOUT_SECS}s").into());
        }
        player.wait_until_loaded(frame_interval);
        spinner.set_message(format!(
            "Loading segments... {}/{count}",
            player.loaded_count()
        ));
        spinner.tick();
    }
    spinner.finish_and_clear();

    for segment in player.segments() {
        if let Some(err) = segment.load_error() {
            eprintln!("{} {err}", "Skipping:".yellow().bold());
        }
    }
    if player.loaded_count() == 0 {
        return Err("No playable segments".into());
    }

    context.unlock()?;

    if player.play() != PlayRequest::Started {
        return Err("Could not start playback".into());
    }

    let total = player.total_duration();
    let bar = create_playback_bar((total * 1000.0) as u64);

    loop {
        match step(&mut player, &finished) {
            Step::Running => {}
            Step::Finished => break,
            Step::Stalled => {
                bar.abandon();
                context.close();
                return Err(format!(
                    "Playback stopped at segment {} of {count} (see log)",
                    player.active_index() + 1
                )
                .into());
            }
        }

        let elapsed = player.elapsed();
        bar.set_position((elapsed * 1000.0) as u64);
        set_playback_prefix(&bar, elapsed, total);
        if let Some(segment) = player.segment(player.active_index()) {
            bar.set_message(segment.name().to_string());
        }
        thread::sleep(frame_interval);
    }

    bar.finish_and_clear();
    context.close();

    let played = player.loaded_count();
    info!("Headless playback finished ({played}/{count} segments)");
    println!(
        "{} Played {} of {} segments ({})",
        "✓".green(),
        played.to_string().cyan(),
        count,
        crate::utils::time::format_clock(total)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::ScriptedBackend;
    use crate::playback::{AdvancePolicy, ManualClock, Segment};

    type Rig = (Player, Arc<ScriptedBackend>, Arc<AtomicBool>);

    fn player(backend: ScriptedBackend, sources: &[&str]) -> Rig {
        let backend = Arc::new(backend);
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let segments = sources.iter().map(|s| Segment::new(*s)).collect();
        let mut player = Player::new(segments, backend.clone(), Arc::new(ManualClock::new()))
            .with_advance_policy(AdvancePolicy::Auto)
            .on_finished(move || flag.store(true, Ordering::SeqCst));
        assert!(player.wait_until_loaded(Duration::from_secs(5)));
        (player, backend, finished)
    }

    #[test]
    fn test_step_runs_while_playing() {
        let (mut player, _backend, finished) =
            player(ScriptedBackend::new(&[("a.wav", 2.0)]), &["a.wav"]);
        assert_eq!(player.play(), PlayRequest::Started);
        assert_eq!(step(&mut player, &finished), Step::Running);
    }

    #[test]
    fn test_step_finishes_past_trailing_failure() {
        let (mut player, backend, finished) = player(
            ScriptedBackend::new(&[("a.wav", 2.0)]),
            &["a.wav", "missing.wav"],
        );
        player.play();
        backend.finish("a.wav");

        assert_eq!(step(&mut player, &finished), Step::Finished);
        assert_eq!(backend.probe("a.wav").lock().unwrap().starts, vec![0.0]);
    }

    #[test]
    fn test_step_reports_output_that_will_not_start() {
        let (mut player, _backend, finished) = player(
            ScriptedBackend::new(&[("a.wav", 2.0)]).failing_start(),
            &["a.wav"],
        );

        assert_eq!(step(&mut player, &finished), Step::Stalled);
        assert!(!finished.load(Ordering::SeqCst));
    }
}
