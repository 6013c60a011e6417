/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When SurvConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::PathBuf;

use surv_cli::config::{LemmaSettings, SurvConfig};

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to Surv CLI Init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a new configuration.").dim()
    );

    let theme = ColorfulTheme::default();
    let defaults = SurvConfig::default();

    let api_base_url: String = Input::with_theme(&theme)
        .with_prompt("Backend URL")
        .default(defaults.api_base_url.clone())
        .interact_text()?;

    println!("\n{}", style("--- Storage ---").bold());
    let storage_dir = optional_path(&theme, "Storage directory (empty for default)")?;
    let wallet_dir = optional_path(&theme, "Wallet directory (empty for default)")?;

    println!("\n{}", style("--- Lemma ---").bold());
    let issue_url: String = Input::with_theme(&theme)
        .with_prompt("Credential issuance URL")
        .default(defaults.lemma.issue_url.clone())
        .interact_text()?;

    let redirect_timeout_secs: u64 = Input::with_theme(&theme)
        .with_prompt("Redirect timeout (seconds)")
        .default(defaults.lemma.redirect_timeout_secs)
        .interact_text()?;

    let debug = Confirm::with_theme(&theme)
        .with_prompt("Enable Lemma debug logging?")
        .default(false)
        .interact()?;

    let config = SurvConfig {
        api_base_url,
        storage_dir,
        wallet_dir,
        lemma: LemmaSettings {
            issue_url,
            redirect_timeout_secs,
            debug,
            ..defaults.lemma
        },
    };
    config.validate()?;

    let yaml = config.to_yaml()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}

fn optional_path(theme: &ColorfulTheme, prompt: &str) -> Result<Option<PathBuf>> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| PathBuf::from(value)))
}
