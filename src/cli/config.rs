use owo_colors::OwoColorize;
use segue::config::Config;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    let source = if Config::exists()? {
        Config::config_path()?.display().to_string()
    } else {
        "defaults (no config file)".to_string()
    };

    println!("Current segue configuration ({}):", source.dimmed());
    println!("  backend: {}", config.backend.cyan());
    println!("  advance: {}", config.advance.cyan());
    println!("  frame_interval_ms: {}", config.frame_interval_ms);
    println!("  cell_width: {}", config.cell_width);
    println!("  cell_height: {}", config.cell_height);
    println!("  log_file: {}", config.log_file);
    println!("  log_level: {}", config.log_level);
    println!("  geometry:");
    println!("    left_margin: {}", config.geometry.left_margin);
    println!("    right_margin: {}", config.geometry.right_margin);
    println!("    bar_height: {}", config.geometry.bar_height);
    println!(
        "    progress_bar_height: {}",
        config.geometry.progress_bar_height
    );
    println!(
        "    play_button_diameter: {}",
        config.geometry.play_button_diameter
    );
    println!("    play_button_x: {}", config.geometry.play_button_x);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("No configuration file yet. Run 'segue init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    // Validate the config after editing
    match Config::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
