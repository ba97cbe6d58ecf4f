use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use review_harvest_config::{Config, PathManager};
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn run_config(cmd: ConfigCommands, config_file: &Path, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(config_file, output),
        ConfigCommands::Init { force } => init_config(config_file, force, output),
    }
}

/// `--config` if given, otherwise the per-user (or container) default
pub fn resolve_config_file(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathManager::default().config_file())
}

/// `[logging] file` from the config, read before logging is set up.
/// Load errors are reported later by `load_config`.
pub fn configured_log_file(config_file: &Path) -> Option<PathBuf> {
    Config::load_optional(config_file).ok().flatten()?.logging.file
}

/// Load and validate the configuration. A missing file means built-in defaults.
pub fn load_config(config_file: &Path, output: &Output) -> Result<Config> {
    let config = match Config::load_optional(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    {
        Some(config) => {
            tracing::debug!(path = %config_file.display(), "Configuration loaded");
            config
        }
        None => {
            tracing::warn!(path = %config_file.display(), "Configuration file not found, using defaults");
            output.warn(format!(
                "Configuration file not found at {}, using defaults",
                config_file.display()
            ));
            Config::default()
        }
    };

    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;
    Ok(config)
}

fn show_config(config_file: &Path, output: &Output) -> Result<()> {
    let config = load_config(config_file, output)?;

    if !output.is_human() {
        let value = serde_json::to_value(&config)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize config: {}", e))?;
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config": value,
        }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "Configuration".bright_cyan().bold());
    println!();

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);

    let enabled = |on: bool| if on { "✓".green().to_string() } else { "✗".red().to_string() };
    let rows: Vec<(&str, String)> = vec![
        ("Config file", config_file.display().to_string()),
        ("Website URL", config.website.url.clone()),
        ("Max reviews", config.parser.max_reviews.to_string()),
        ("Headless browser", enabled(config.browser.headless)),
        ("Content timeout", format!("{}s", config.browser.content_timeout_secs)),
        ("Scroll passes", config.browser.effective_scroll_passes().to_string()),
        ("Container selectors", config.selectors.containers.join("\n")),
        ("Export files", enabled(config.output.enabled)),
        ("Output directory", config.output.directory.display().to_string()),
        ("File prefix", config.output.file_prefix.clone()),
        ("Database", enabled(config.database.enabled)),
        ("Database path", config.database.path.display().to_string()),
        (
            "Log file",
            config.logging.file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    println!();

    Ok(())
}

fn init_config(config_file: &Path, force: bool, output: &Output) -> Result<()> {
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration file already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    Config::default()
        .save_to_file(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    tracing::info!(path = %config_file.display(), "Default configuration written");
    output.success(format!("Configuration written to {}", config_file.display()));
    Ok(())
}
