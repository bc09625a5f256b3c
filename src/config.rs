use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, DurationMilliSeconds, serde_as};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

/// What a short tap on the anchor does.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AnchorTapBehavior {
    /// Only report the tap; the menu needs a long press.
    #[default]
    #[strum(to_string = "ignore", serialize = "none")]
    Ignore,
    /// Open the menu on a plain tap as well.
    #[strum(to_string = "open", serialize = "show")]
    Open,
}

/// Whether releasing in a stretch zone selects the first/last item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum StretchRelease {
    #[default]
    #[strum(to_string = "ignore", serialize = "cancel")]
    Ignore,
    #[strum(to_string = "select", serialize = "commit")]
    Select,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// `#rrggbb` surface color of the menu.
    pub surface: String,
    pub surface_alpha: f32,
    /// Opacity of the white layer that tints the hover bar.
    pub hover_bar_tint: f32,
    pub elevation: f32,
    pub hover_bar_elevation: f32,
    pub corner_radius: f32,
    pub hover_bar_inset: f32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            surface: "#fffbfe".to_string(),
            surface_alpha: 0.8,
            hover_bar_tint: 0.3,
            elevation: 12.0,
            hover_bar_elevation: 12.0,
            corner_radius: 16.0,
            hover_bar_inset: 8.0,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "long_press_timeout_ms")]
    pub long_press_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "frame_interval_ms")]
    pub frame_interval: Duration,
    pub anchor_tap: AnchorTapBehavior,
    pub stretch_release: StretchRelease,
    /// How far the menu squashes at full stretch.
    pub stretch_scale: f32,
    /// Stretch factor past which the anchor shrinks away.
    pub anchor_hide_threshold: f32,
    pub hovered_item_scale: f32,
    pub pressed_item_scale: f32,
    pub theme: ThemeConfig,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            long_press_timeout: Duration::from_millis(500),
            frame_interval: Duration::from_millis(16),
            anchor_tap: AnchorTapBehavior::default(),
            stretch_release: StretchRelease::default(),
            stretch_scale: 0.05,
            anchor_hide_threshold: 0.1,
            hovered_item_scale: 1.1,
            pressed_item_scale: 0.9,
            theme: ThemeConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "dragmenu", "dragmenu").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Reads `path` (optional on disk) overlaid with `DRAGMENU_*` variables.
/// Nested keys use a double underscore, e.g. `DRAGMENU_THEME__SURFACE`.
pub fn load_config_from(path: &Path) -> Result<MenuConfig, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("DRAGMENU")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_config() -> Result<MenuConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Never fails: any problem is logged and the defaults are used.
pub fn load_or_default(path: Option<&Path>) -> MenuConfig {
    let loaded = match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    loaded.unwrap_or_else(|e| {
        log::warn!("Falling back to default menu config: {}", e);
        MenuConfig::default()
    })
}

pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = get_config_path()?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_release_deserialization() {
        let cases = vec![
            ("\"ignore\"", StretchRelease::Ignore),
            ("\"Ignore\"", StretchRelease::Ignore),
            ("\"cancel\"", StretchRelease::Ignore),
            ("\"select\"", StretchRelease::Select),
            ("\"SELECT\"", StretchRelease::Select),
            ("\"commit\"", StretchRelease::Select),
        ];

        for (json, expected) in cases {
            let deserialized: StretchRelease = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn test_anchor_tap_deserialization() {
        let open: AnchorTapBehavior = serde_json::from_str("\"show\"").unwrap();
        assert_eq!(open, AnchorTapBehavior::Open);
        assert!(serde_json::from_str::<AnchorTapBehavior>("\"explode\"").is_err());
        assert_eq!(AnchorTapBehavior::Open.to_string(), "open");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "long_press_timeout_ms": 350, "stretch_release": "select" }"#;
        let config: MenuConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.long_press_timeout, Duration::from_millis(350));
        assert_eq!(config.stretch_release, StretchRelease::Select);
        assert_eq!(config.frame_interval, Duration::from_millis(16));
        assert_eq!(config.theme, ThemeConfig::default());
    }

    #[test]
    fn test_bundled_default_matches_code_defaults() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .unwrap();
        let config: MenuConfig = s.try_deserialize().unwrap();
        assert_eq!(config, MenuConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("dragmenu-does-not-exist.toml");
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.long_press_timeout, Duration::from_millis(500));
    }
}
