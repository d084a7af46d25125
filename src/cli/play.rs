use owo_colors::OwoColorize;
use segue::config::{BackendKind, Config};
use segue::constants::AUDIO_EXTENSIONS;
use segue::playback::AdvancePolicy;
use std::error::Error;
use std::path::Path;

/// Expand `~` and flag files that will not play.
fn resolve_files(files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            let expanded = shellexpand::tilde(file).to_string();
            let path = Path::new(&expanded);
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false);

            if !path.exists() {
                eprintln!("{} {} does not exist", "Warning:".yellow().bold(), expanded);
            } else if !known {
                eprintln!(
                    "{} {} is not a recognised audio file",
                    "Warning:".yellow().bold(),
                    expanded
                );
            }
            expanded
        })
        .collect()
}

pub fn handle_play(
    files: &[String],
    backend: Option<BackendKind>,
    advance: Option<AdvancePolicy>,
    headless: bool,
) -> Result<(), Box<dyn Error>> {
    if files.is_empty() {
        return Err("No files given. Usage: segue play <FILES>...".into());
    }

    let mut config = Config::load()?;
    if let Some(backend) = backend {
        config.backend = backend;
    }
    if let Some(advance) = advance {
        config.advance = advance;
    }

    let files = resolve_files(files);

    #[cfg(feature = "player")]
    {
        segue::player::run(&files, &config, headless)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = (files, config, headless);
        println!("{} {}", "🎵".cyan(), "segue".bold());
        println!();
        println!(
            "{} Playback requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, install with:");
        println!("  {}", "cargo install segue --features player".cyan());

        Ok(())
    }
}
