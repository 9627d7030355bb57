use clap::Parser;
use std::path::PathBuf;
use task_tracker_core::config::ConfigOverrides;

/// Interactive task list manager. Running without arguments opens the menu.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Task data file (defaults to data.json beside the executable)
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Configuration file (defaults to config.json beside the executable)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override configuration values (format KEY=VALUE)
    ///
    /// Example: --config-override theme=plain
    /// Example: --config-override show_dates=false
    #[arg(long = "config-override", value_name = "KEY=VALUE")]
    pub config_override: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ShowDates,
    ShowCategories,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "show_dates" | "dates" => ConfigOverrideTarget::ShowDates,
        "show_categories" | "categories" => ConfigOverrideTarget::ShowCategories,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::ShowDates => {
                overrides.show_dates = Some(parse_flag_value(&parsed.value)?)
            }
            ConfigOverrideTarget::ShowCategories => {
                overrides.show_categories = Some(parse_flag_value(&parsed.value)?)
            }
        }
    }

    Ok(overrides)
}

fn parse_flag_value(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("expected a boolean value, got '{other}'")),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
