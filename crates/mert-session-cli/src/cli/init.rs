/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When CliConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::{Path, PathBuf};

use crate::config::CliConfig;
use crate::i18n::Locale;

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to MERT Session Init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a client configuration.").dim()
    );

    let theme = ColorfulTheme::default();
    let defaults = CliConfig::default();

    if output.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!("{} exists, overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    println!("\n{}", style("--- Backend ---").bold());
    let api_base_url: String = Input::with_theme(&theme)
        .with_prompt("API base URL")
        .default(defaults.api_base_url.clone())
        .interact_text()?;

    let app_name: String = Input::with_theme(&theme)
        .with_prompt("App name (shown in the wallet challenge)")
        .default(defaults.app_name.clone())
        .interact_text()?;

    let timeout: String = Input::with_theme(&theme)
        .with_prompt("Request timeout (seconds)")
        .default(defaults.timeout_secs.to_string())
        .interact_text()?;
    let timeout_secs = timeout
        .trim()
        .parse::<u64>()
        .context("timeout must be a whole number of seconds")?;

    println!("\n{}", style("--- Client ---").bold());
    let locale_labels = vec!["Türkçe (tr)", "English (en)"];
    let locale_selection = Select::with_theme(&theme)
        .with_prompt("Language")
        .items(&locale_labels)
        .default(0)
        .interact()?;
    let locale = Locale::ALL[locale_selection];

    let session_file: String = Input::with_theme(&theme)
        .with_prompt("Session file (empty for the default data directory)")
        .allow_empty(true)
        .interact_text()?;

    let log_dir: String = Input::with_theme(&theme)
        .with_prompt("Log directory (empty to log to stderr only)")
        .allow_empty(true)
        .interact_text()?;

    let config = CliConfig {
        app_name,
        api_base_url,
        locale,
        session_file: optional_path(&session_file),
        log_dir: optional_path(&log_dir),
        timeout_secs,
    };
    config.validate().context("invalid configuration")?;

    write_config(&config, &output)?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}

/// Serialize `config` as YAML to `output`, creating parent directories
pub fn write_config(config: &CliConfig, output: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("failed to serialize config to YAML")?;

    if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;
    Ok(())
}

fn optional_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}
