use anyhow::{Context, Result};
use console::style;
use stackdeck_core::config;
use stackdeck_core::settings::Settings;

pub fn run() -> Result<()> {
    let path = config::settings_path()?;
    let current = Settings::load(&path).context("reading current settings")?;
    if Settings::is_configured(&path) {
        println!("Updating {}\n", path.display());
    } else {
        println!("No configuration yet, creating {}\n", path.display());
    }

    let updated = stackdeck_ui::settings::prompt_settings(&current)?;
    updated.save(&path).context("saving settings")?;
    println!("{}", style("Configuration saved.").green());
    Ok(())
}
