use crate::error::AppError;
use crate::model::Category;
use crate::storage::json_store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";

/// ANSI escape codes a theme resolves to. Empty codes mean "no styling".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub success: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub muted: &'static str,
    pub emphasis: &'static str,
    pub error: &'static str,
    pub reset: &'static str,
    categories: CategoryColors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryColors {
    work: &'static str,
    personal: &'static str,
    shopping: &'static str,
    general: &'static str,
    other: &'static str,
}

const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const WHITE: &str = "\x1b[37m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const DEFAULT_CATEGORIES: CategoryColors = CategoryColors {
    work: BLUE,
    personal: MAGENTA,
    shopping: GREEN,
    general: YELLOW,
    other: WHITE,
};

impl Palette {
    pub fn plain() -> Self {
        Self {
            success: "",
            warning: "",
            info: "",
            muted: "",
            emphasis: "",
            error: "",
            reset: "",
            categories: CategoryColors {
                work: "",
                personal: "",
                shopping: "",
                general: "",
                other: "",
            },
        }
    }

    pub fn category(&self, category: Category) -> &'static str {
        match category {
            Category::Work => self.categories.work,
            Category::Personal => self.categories.personal,
            Category::Shopping => self.categories.shopping,
            Category::General => self.categories.general,
            Category::Other => self.categories.other,
        }
    }

    pub fn paint(&self, code: &str, text: &str) -> String {
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.paint(self.muted, text)
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("plain") => Palette::plain(),
        Some("noir") => Palette {
            success: "\x1b[38;5;108m",
            warning: "\x1b[38;5;208m",
            info: "\x1b[38;5;250m",
            muted: "\x1b[38;5;242m",
            emphasis: "\x1b[38;5;255m",
            error: "\x1b[38;5;203m",
            reset: RESET,
            categories: CategoryColors {
                work: "\x1b[38;5;110m",
                personal: "\x1b[38;5;176m",
                shopping: "\x1b[38;5;108m",
                general: "\x1b[38;5;208m",
                other: "\x1b[38;5;250m",
            },
        },
        Some("solarized") => Palette {
            success: "\x1b[38;5;64m",
            warning: "\x1b[38;5;136m",
            info: "\x1b[38;5;33m",
            muted: "\x1b[38;5;246m",
            emphasis: "\x1b[38;5;230m",
            error: "\x1b[38;5;160m",
            reset: RESET,
            categories: CategoryColors {
                work: "\x1b[38;5;33m",
                personal: "\x1b[38;5;125m",
                shopping: "\x1b[38;5;64m",
                general: "\x1b[38;5;136m",
                other: "\x1b[38;5;37m",
            },
        },
        _ => Palette {
            success: GREEN,
            warning: YELLOW,
            info: BLUE,
            muted: DIM,
            emphasis: WHITE,
            error: RED,
            reset: RESET,
            categories: DEFAULT_CATEGORIES,
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
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
        return Some("default".into());
    }

    match trimmed {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        "none" | "mono" | "no_color" | "nocolor" => Some("plain".to_string()),
        other => Some(other.to_string()),
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_true")]
    pub show_dates: bool,
    #[serde(default = "default_true")]
    pub show_categories: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: None,
            show_dates: true,
            show_categories: true,
        }
    }
}

impl Config {
    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub show_dates: Option<bool>,
    pub show_categories: Option<bool>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    Ok(json_store::program_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the config at `path`, or beside the executable when `None`.
///
/// Never fails: problems are reported in [`ConfigLoad::error`] alongside defaults.
pub fn load_config_with_fallback(path: Option<&Path>) -> ConfigLoad {
    match path.map(Path::to_path_buf).map_or_else(config_path, Ok) {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }
    if let Some(show_dates) = overrides.show_dates {
        merged.show_dates = show_dates;
    }
    if let Some(show_categories) = overrides.show_categories {
        merged.show_categories = show_categories;
    }

    merged
}
