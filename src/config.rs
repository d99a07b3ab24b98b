use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

use crate::calendar::{EditorRules, EventColor};
use crate::theme::ThemeMode;

const APP_DIR: &str = "event-calendar";
const DEFAULT_SLOT: &str = "calendarEvents";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_slot: String,
    pub default_color: EventColor,
    pub theme: ThemeMode,
    pub dark_preset: Option<String>,
    pub log_level: String,
    pub reject_inverted_ranges: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_slot: DEFAULT_SLOT.to_string(),
            default_color: EventColor::default(),
            theme: ThemeMode::Dark,
            dark_preset: None,
            log_level: "info".to_string(),
            reject_inverted_ranges: false,
        }
    }
}

impl Config {
    /// Load `config.toml` from the user config directory. No file means
    /// defaults.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).wrap_err_with(|| format!("in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        file.resolve()
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(format!("{APP_DIR}.log"))
    }

    pub fn editor_rules(&self) -> EditorRules {
        EditorRules {
            default_color: self.default_color.clone(),
            reject_inverted_ranges: self.reject_inverted_ranges,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

// ── TOML config types ──

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    storage_slot: Option<String>,
    default_color: Option<String>,
    theme: Option<String>,
    dark_preset: Option<String>,
    log_level: Option<String>,
    reject_inverted_ranges: Option<bool>,
}

impl ConfigFile {
    fn resolve(self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(slot) = self.storage_slot {
            if slot.is_empty() || slot.contains(['/', '\\']) {
                return Err(eyre!("storage_slot must be a plain name, got {slot:?}"));
            }
            config.storage_slot = slot;
        }
        if let Some(color) = self.default_color {
            config.default_color = EventColor::parse(&color)
                .ok_or_else(|| eyre!("default_color is not a colour: {color:?}"))?;
        }
        if let Some(theme) = self.theme {
            config.theme = theme.parse().map_err(|e: String| eyre!(e))?;
        }
        config.dark_preset = self.dark_preset;
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(strict) = self.reject_inverted_ranges {
            config.reject_inverted_ranges = strict;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.storage_slot, "calendarEvents");
        assert_eq!(config.default_color, EventColor::default());
        assert_eq!(config.theme, ThemeMode::Dark);
        assert!(!config.reject_inverted_ranges);
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_toml(
            r##"
            data_dir = "/tmp/cal"
            storage_slot = "work"
            default_color = "#ff0000"
            theme = "light"
            log_level = "debug"
            reject_inverted_ranges = true
            "##,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cal"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/cal/event-calendar.log"));
        assert_eq!(config.storage_slot, "work");
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.log_level, "debug");
        let rules = config.editor_rules();
        assert!(rules.reject_inverted_ranges);
        assert_eq!(rules.default_color.as_str(), "#ff0000");
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(Config::from_toml("default_color = \"#zzzzzz\"").is_err());
        assert!(Config::from_toml("theme = \"sepia\"").is_err());
        assert!(Config::from_toml("storage_slot = \"../x\"").is_err());
        assert!(Config::from_toml("unknown_key = 1").is_err());
    }

    #[test]
    fn from_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = 3").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{err:?}").contains("config.toml"));
    }
}
