/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML settings file
[POS]:    CLI initialization layer
[UPDATE]: When Settings schema changes
*/

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::{Path, PathBuf};

use upkeep_client::Settings;

const LOG_LEVELS: [&str; 4] = ["error", "warn", "info", "debug"];

pub fn run_init(output: &Path) -> Result<()> {
    println!("{}", style("Welcome to upkeep").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a settings file.").dim()
    );

    if output.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            bail!("left {} untouched", output.display());
        }
    }

    let theme = ColorfulTheme::default();
    let mut settings = Settings::default();

    println!("\n{}", style("--- API ---").bold());
    settings.api.base_url = Input::with_theme(&theme)
        .with_prompt("API base URL")
        .default(settings.api.base_url.clone())
        .interact_text()?;
    settings.api.timeout_secs = Input::with_theme(&theme)
        .with_prompt("Request timeout (seconds)")
        .default(settings.api.timeout_secs)
        .interact_text()?;

    println!("\n{}", style("--- Session ---").bold());
    let session_path: String = Input::with_theme(&theme)
        .with_prompt("Session file")
        .default(settings.session.path.display().to_string())
        .interact_text()?;
    settings.session.path = PathBuf::from(session_path);

    println!("\n{}", style("--- Reporting ---").bold());
    settings.wizard.skip_enabled = Confirm::with_theme(&theme)
        .with_prompt("Offer the skip-to-details shortcut?")
        .default(settings.wizard.skip_enabled)
        .interact()?;

    let level = Select::with_theme(&theme)
        .with_prompt("Log level")
        .items(&LOG_LEVELS)
        .default(2)
        .interact()?;
    settings.logging.level = LOG_LEVELS[level].to_string();

    settings
        .validate()
        .context("settings entered are not valid")?;
    settings
        .write_template(output)
        .with_context(|| format!("failed to write settings to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!("Settings written to: {}", style(output.display()).cyan());

    Ok(())
}
