//! Domain types shared by the store, the paginator and the collaborators.
//!
//! `Book` deserializes from the same JSON shape the structuring service
//! returns, so a structured book can be saved and reopened without
//! translation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured book: ordered chapters plus the main character names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    pub title: String,
    #[serde(default = "unknown_author")]
    pub author: String,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub last_read_chapter: Option<usize>,
}

pub(crate) fn unknown_author() -> String {
    "Unknown Author".to_string()
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            id: None,
            owner_id: None,
            file_path: None,
            title: title.into(),
            author: author.into(),
            chapters,
            characters: Vec::new(),
            cover_url: None,
            last_read_chapter: None,
        }
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Case-insensitive lookup returning the canonical spelling from the
    /// character list.
    pub fn find_character(&self, name: &str) -> Option<&str> {
        let needle = name.trim().to_lowercase();
        self.characters
            .iter()
            .find(|candidate| candidate.to_lowercase() == needle)
            .map(String::as_str)
    }
}

/// One titled unit of a book. Paragraph breaks are embedded newlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRelationship {
    pub character_name: String,
    pub relationship_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub description: String,
    pub physical_appearance: String,
    #[serde(default)]
    pub relationships: Vec<CharacterRelationship>,
}

/// Profile plus generated portrait reference, cached together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCharacter {
    pub profile: CharacterProfile,
    pub image_url: String,
}

/// Per-book memo of generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiCache {
    #[serde(default)]
    pub characters: BTreeMap<String, CachedCharacter>,
    #[serde(default)]
    pub summaries: BTreeMap<usize, String>,
}

impl AiCache {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.summaries.is_empty()
    }
}

/// Pointer into the active book. `page_index` is only meaningful against the
/// most recent pagination of `chapter_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub book_id: Option<u64>,
    pub chapter_index: usize,
    pub page_index: usize,
}

/// Theme mode.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        write!(f, "{}", label)
    }
}

/// Global display settings, independent of any loaded book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub theme: ThemeMode,
    pub font_family: String,
    pub font_size: u32,
}
