pub(crate) fn default_font_family() -> String {
    "Literata".to_string()
}

pub(crate) fn default_font_size() -> u32 {
    16
}

pub(crate) fn default_line_height() -> f32 {
    1.5
}

pub(crate) fn default_glyph_width_ratio() -> f32 {
    0.55
}

pub(crate) fn default_viewport_width() -> f32 {
    720.0
}

pub(crate) fn default_viewport_height() -> f32 {
    960.0
}

pub(crate) fn default_state_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_sync_timeout_ms() -> u64 {
    3_000
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
