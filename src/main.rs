//! segue - play a sequence of audio clips back-to-back in the terminal.
//!
//! The clips are shown as one progress bar split into segments, each as wide as
//! its share of the total running time. Clicking a segment jumps into it, the
//! space bar toggles playback, and the arrow keys move between segments. Playback
//! can also run straight through without the interactive view.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use segue::config::BackendKind;
use segue::playback::AdvancePolicy;
use std::error::Error;
use std::io;

mod cli;

#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Play a sequence of audio segments with a scrubbable progress bar")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play audio files in order
    Play {
        /// Audio files, in playback order
        #[arg(required = true)]
        files: Vec<String>,
        /// Decoding backend: buffer (decode up front) or engine (stream)
        #[arg(short, long)]
        backend: Option<BackendKind>,
        /// What happens when a segment ends: manual or auto
        #[arg(short, long)]
        advance: Option<AdvancePolicy>,
        /// Play straight through without the interactive view
        #[arg(long)]
        headless: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new([
            "backend",
            "advance",
            "frame_interval_ms",
            "cell_width",
            "cell_height",
            "log_file",
            "log_level",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            files,
            backend,
            advance,
            headless,
        } => {
            cli::play::handle_play(&files, backend, advance, headless)?;
        }
        Commands::Init { force } => {
            cli::init::handle_init(force)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
