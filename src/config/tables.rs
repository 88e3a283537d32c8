use super::defaults;
use super::models::{AppConfig, LogLevel, TextAlign};
use crate::model::ThemeMode;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    appearance: AppearanceConfig,
    #[serde(default)]
    viewport: ViewportConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    remote: RemoteConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            theme: tables.appearance.theme,
            font_family: tables.appearance.font_family,
            font_size: tables.appearance.font_size,
            line_height: tables.appearance.line_height,
            text_align: tables.appearance.text_align,
            glyph_width_ratio: tables.appearance.glyph_width_ratio,
            viewport_width: tables.viewport.width,
            viewport_height: tables.viewport.height,
            state_dir: tables.storage.state_dir,
            sync_timeout_ms: tables.remote.sync_timeout_ms,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            appearance: AppearanceConfig {
                theme: config.theme,
                font_family: config.font_family.clone(),
                font_size: config.font_size,
                line_height: config.line_height,
                text_align: config.text_align,
                glyph_width_ratio: config.glyph_width_ratio,
            },
            viewport: ViewportConfig {
                width: config.viewport_width,
                height: config.viewport_height,
            },
            storage: StorageConfig {
                state_dir: config.state_dir.clone(),
            },
            remote: RemoteConfig {
                sync_timeout_ms: config.sync_timeout_ms,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AppearanceConfig {
    #[serde(default)]
    theme: ThemeMode,
    #[serde(default = "defaults::default_font_family")]
    font_family: String,
    #[serde(default = "defaults::default_font_size")]
    font_size: u32,
    #[serde(default = "defaults::default_line_height")]
    line_height: f32,
    #[serde(default)]
    text_align: TextAlign,
    #[serde(default = "defaults::default_glyph_width_ratio")]
    glyph_width_ratio: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            theme: ThemeMode::default(),
            font_family: defaults::default_font_family(),
            font_size: defaults::default_font_size(),
            line_height: defaults::default_line_height(),
            text_align: TextAlign::default(),
            glyph_width_ratio: defaults::default_glyph_width_ratio(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ViewportConfig {
    #[serde(default = "defaults::default_viewport_width")]
    width: f32,
    #[serde(default = "defaults::default_viewport_height")]
    height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            width: defaults::default_viewport_width(),
            height: defaults::default_viewport_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_state_dir")]
    state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            state_dir: defaults::default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct RemoteConfig {
    #[serde(default = "defaults::default_sync_timeout_ms")]
    sync_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            sync_timeout_ms: defaults::default_sync_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
