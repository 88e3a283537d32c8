use crate::model::{DisplayPreferences, ThemeMode};
use crate::pagination::{FontMetrics, MAX_FONT_SIZE, MIN_FONT_SIZE, Viewport};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// High-level app configuration; the in-memory, flattened form of the TOML
/// tables.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "crate::config::defaults::default_font_family")]
    pub font_family: String,
    #[serde(default = "crate::config::defaults::default_font_size")]
    pub font_size: u32,
    #[serde(default = "crate::config::defaults::default_line_height")]
    pub line_height: f32,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default = "crate::config::defaults::default_glyph_width_ratio")]
    pub glyph_width_ratio: f32,
    #[serde(default = "crate::config::defaults::default_viewport_width")]
    pub viewport_width: f32,
    #[serde(default = "crate::config::defaults::default_viewport_height")]
    pub viewport_height: f32,
    #[serde(default = "crate::config::defaults::default_state_dir")]
    pub state_dir: String,
    #[serde(default = "crate::config::defaults::default_sync_timeout_ms")]
    pub sync_timeout_ms: u64,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            theme: ThemeMode::default(),
            font_family: crate::config::defaults::default_font_family(),
            font_size: crate::config::defaults::default_font_size(),
            line_height: crate::config::defaults::default_line_height(),
            text_align: TextAlign::default(),
            glyph_width_ratio: crate::config::defaults::default_glyph_width_ratio(),
            viewport_width: crate::config::defaults::default_viewport_width(),
            viewport_height: crate::config::defaults::default_viewport_height(),
            state_dir: crate::config::defaults::default_state_dir(),
            sync_timeout_ms: crate::config::defaults::default_sync_timeout_ms(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    /// Preferences a fresh session starts with.
    pub fn initial_preferences(&self) -> DisplayPreferences {
        DisplayPreferences {
            theme: self.theme,
            font_family: self.font_family.clone(),
            font_size: self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
        }
    }

    /// Font metrics for the given preferences, carrying this config's line
    /// height and alignment.
    pub fn font_metrics(&self, prefs: &DisplayPreferences) -> FontMetrics {
        FontMetrics {
            family: prefs.font_family.clone(),
            size: prefs.font_size,
            line_height: self.line_height,
            align: self.text_align,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    pub fn state_dir(&self) -> PathBuf {
        PathBuf::from(&self.state_dir)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }
}

/// Text alignment used by both the visible page and the measurement surface.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl std::fmt::Display for TextAlign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TextAlign::Left => "Left",
            TextAlign::Center => "Center",
            TextAlign::Right => "Right",
            TextAlign::Justify => "Justify",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
