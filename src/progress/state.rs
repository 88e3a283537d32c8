use crate::model::{AiCache, Book, DisplayPreferences, ThemeMode};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Session blob written under the session key after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct PersistedState {
    pub book: Option<Book>,
    pub current_chapter_index: usize,
    pub current_page_index: usize,
    pub font_size: u32,
    pub theme: ThemeMode,
    pub font_family: String,
}

impl PersistedState {
    pub fn fresh(prefs: &DisplayPreferences) -> Self {
        Self {
            book: None,
            current_chapter_index: 0,
            current_page_index: 0,
            font_size: prefs.font_size,
            theme: prefs.theme,
            font_family: prefs.font_family.clone(),
        }
    }

    pub fn preferences(&self) -> DisplayPreferences {
        DisplayPreferences {
            theme: self.theme,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
        }
    }

    /// Overlay a stored blob on top of `defaults`, so fields missing from an
    /// older blob keep their default values.
    pub fn merge_over(defaults: &PersistedState, stored: &str) -> Result<Self> {
        let mut base = serde_json::to_value(defaults).context("serializing default state")?;
        let overlay: serde_json::Value =
            serde_json::from_str(stored).context("parsing stored session state")?;
        let (Some(base_map), serde_json::Value::Object(overlay_map)) =
            (base.as_object_mut(), overlay)
        else {
            return Err(anyhow!("stored session state is not a JSON object"));
        };
        for (key, value) in overlay_map {
            base_map.insert(key, value);
        }
        serde_json::from_value(base).context("decoding merged session state")
    }
}

pub(super) fn decode_cache(stored: &str) -> Result<AiCache> {
    serde_json::from_str(stored).context("parsing stored AI cache")
}
