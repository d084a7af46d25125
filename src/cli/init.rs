use dialoguer::{Confirm, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use segue::config::Config;
use std::error::Error;

pub fn handle_init(force: bool) -> Result<(), Box<dyn Error>> {
    if Config::exists()? && !force {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Configuration already exists at {}. Overwrite with defaults?",
                Config::config_path()?.display().to_string().cyan()
            ))
            .default(false)
            .interact()?;

        if !overwrite {
            println!("Keeping existing configuration");
            return Ok(());
        }
    }

    let config = Config::new();
    config.save()?;

    println!("{} segue initialized", "✓".green());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display().to_string().cyan()
    );
    println!("Logs will be written to: {}", config.log_path().display());

    Ok(())
}
