//! AI-artifact collaborator and the reader-side flow around it.
//!
//! [`ReaderAssistant`] drives the single interaction panel of the reader:
//! character profiles and chapter summaries are looked up in the store's
//! cache first and written back on success; selection summaries, scene
//! images and definitions are always generated fresh. A failed request
//! leaves the cache untouched, so retrying the same action calls the service
//! again.

use crate::error::AiError;
use crate::model::{Book, CachedCharacter, CharacterProfile};
use crate::progress::ProgressStore;
use tracing::{debug, info, warn};

/// Longest selection (in characters) the reader acts on.
pub const MAX_SELECTION_CHARS: usize = 500;
/// Selections up to this many words can be defined.
pub const MAX_DEFINITION_WORDS: usize = 5;
/// Selections need more than this many words to be summarized or visualized.
pub const MIN_PASSAGE_WORDS: usize = 2;

pub trait AiService {
    fn character_profile(&self, character_name: &str, book: &Book) -> Result<CharacterProfile, AiError>;

    /// Returns an image reference (URL or encoded image data).
    fn character_portrait(
        &self,
        character_name: &str,
        physical_appearance: &str,
        book_title: &str,
    ) -> Result<String, AiError>;

    fn chapter_summary(
        &self,
        chapter_title: &str,
        chapter_content: &str,
        book_title: &str,
    ) -> Result<String, AiError>;

    fn selection_summary(&self, selected_text: &str, book_title: &str) -> Result<String, AiError>;

    fn scene_image(&self, selected_text: &str, book_title: &str) -> Result<String, AiError>;

    fn definition(&self, word: &str) -> Result<String, AiError>;
}

/// A text selection made on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    text: String,
}

impl Selection {
    /// Accepts non-empty selections shorter than [`MAX_SELECTION_CHARS`],
    /// trimmed of surrounding whitespace.
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        let len = text.chars().count();
        if len == 0 || len >= MAX_SELECTION_CHARS {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn can_define(&self) -> bool {
        (1..=MAX_DEFINITION_WORDS).contains(&self.word_count())
    }

    pub fn can_summarize_or_visualize(&self) -> bool {
        self.word_count() > MIN_PASSAGE_WORDS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Character,
    Summary,
    SceneImage,
    Definition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionPayload {
    Character {
        name: String,
        entry: Option<CachedCharacter>,
    },
    Text(String),
    Image(String),
}

/// What the interaction panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionState {
    pub kind: InteractionKind,
    pub payload: Option<InteractionPayload>,
    pub error: Option<String>,
}

impl InteractionState {
    fn ok(kind: InteractionKind, payload: InteractionPayload) -> Self {
        Self {
            kind,
            payload: Some(payload),
            error: None,
        }
    }

    fn failed(kind: InteractionKind, payload: Option<InteractionPayload>, error: impl Into<String>) -> Self {
        Self {
            kind,
            payload,
            error: Some(error.into()),
        }
    }

    pub fn title(&self) -> String {
        match (&self.kind, &self.payload) {
            (InteractionKind::Character, Some(InteractionPayload::Character { name, .. })) => {
                format!("Character Profile: {name}")
            }
            (InteractionKind::Character, _) => "Character Profile".to_string(),
            (InteractionKind::Summary, _) => "Summary".to_string(),
            (InteractionKind::SceneImage, _) => "Scene Visualization".to_string(),
            (InteractionKind::Definition, _) => "Definition".to_string(),
        }
    }
}

/// One open interaction panel plus the current selection.
pub struct ReaderAssistant<'a> {
    service: &'a dyn AiService,
    interaction: Option<InteractionState>,
    selection: Option<Selection>,
}

impl<'a> ReaderAssistant<'a> {
    pub fn new(service: &'a dyn AiService) -> Self {
        Self {
            service,
            interaction: None,
            selection: None,
        }
    }

    pub fn interaction(&self) -> Option<&InteractionState> {
        self.interaction.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Returns whether the selection was accepted.
    pub fn select(&mut self, raw: &str) -> bool {
        self.selection = Selection::new(raw);
        self.selection.is_some()
    }

    pub fn close(&mut self) {
        self.interaction = None;
        self.selection = None;
    }

    pub fn view_character(&mut self, store: &mut ProgressStore, name: &str) -> &InteractionState {
        let state = self.character_state(store, name);
        self.interaction.insert(state)
    }

    fn character_state(&self, store: &mut ProgressStore, name: &str) -> InteractionState {
        let kind = InteractionKind::Character;
        let Some(book) = store.book() else {
            return InteractionState::failed(kind, None, AiError::NoBookLoaded.to_string());
        };
        let Some(canonical) = book.find_character(name).map(str::to_string) else {
            return InteractionState::failed(
                kind,
                None,
                format!("\"{}\" is not recognized as a main character.", name.trim()),
            );
        };

        if let Some(entry) = store.get_character_profile_from_cache(&canonical) {
            debug!(character = %canonical, "Character profile served from cache");
            return InteractionState::ok(
                kind,
                InteractionPayload::Character {
                    name: canonical,
                    entry: Some(entry.clone()),
                },
            );
        }

        info!(character = %canonical, "Generating character profile");
        let generated = self.service.character_profile(&canonical, book).and_then(|profile| {
            let image_url =
                self.service
                    .character_portrait(&canonical, &profile.physical_appearance, &book.title)?;
            Ok(CachedCharacter { profile, image_url })
        });

        match generated {
            Ok(entry) => {
                store.save_character_profile_to_cache(canonical.clone(), entry.clone());
                InteractionState::ok(
                    kind,
                    InteractionPayload::Character {
                        name: canonical,
                        entry: Some(entry),
                    },
                )
            }
            Err(err) => {
                warn!(character = %canonical, "Character profile failed: {err}");
                InteractionState::failed(
                    kind,
                    Some(InteractionPayload::Character {
                        name: canonical,
                        entry: None,
                    }),
                    err.to_string(),
                )
            }
        }
    }

    pub fn view_chapter_summary(&mut self, store: &mut ProgressStore, chapter_index: usize) -> &InteractionState {
        let state = self.chapter_summary_state(store, chapter_index);
        self.interaction.insert(state)
    }

    fn chapter_summary_state(&self, store: &mut ProgressStore, chapter_index: usize) -> InteractionState {
        let kind = InteractionKind::Summary;
        let Some(book) = store.book() else {
            return InteractionState::failed(kind, None, AiError::NoBookLoaded.to_string());
        };
        let Some(chapter) = book.chapter(chapter_index) else {
            return InteractionState::failed(kind, None, format!("Chapter {chapter_index} does not exist."));
        };

        if let Some(summary) = store.get_summary_from_cache(chapter_index) {
            debug!(chapter = chapter_index, "Chapter summary served from cache");
            return InteractionState::ok(kind, InteractionPayload::Text(summary.to_string()));
        }

        info!(chapter = chapter_index, title = %chapter.title, "Generating chapter summary");
        match self
            .service
            .chapter_summary(&chapter.title, &chapter.content, &book.title)
        {
            Ok(summary) => {
                store.save_summary_to_cache(chapter_index, summary.clone());
                InteractionState::ok(kind, InteractionPayload::Text(summary))
            }
            Err(err) => {
                warn!(chapter = chapter_index, "Chapter summary failed: {err}");
                InteractionState::failed(kind, None, err.to_string())
            }
        }
    }

    pub fn summarize_selection(&mut self, store: &ProgressStore, selected_text: &str) -> &InteractionState {
        let kind = InteractionKind::Summary;
        let state = match store.book() {
            None => InteractionState::failed(kind, None, AiError::NoBookLoaded.to_string()),
            Some(book) => match self.service.selection_summary(selected_text, &book.title) {
                Ok(summary) => InteractionState::ok(kind, InteractionPayload::Text(summary)),
                Err(err) => InteractionState::failed(kind, None, err.to_string()),
            },
        };
        self.interaction.insert(state)
    }

    pub fn generate_scene(&mut self, store: &ProgressStore, selected_text: &str) -> &InteractionState {
        let kind = InteractionKind::SceneImage;
        let state = match store.book() {
            None => InteractionState::failed(kind, None, AiError::NoBookLoaded.to_string()),
            Some(book) => match self.service.scene_image(selected_text, &book.title) {
                Ok(image) => InteractionState::ok(kind, InteractionPayload::Image(image)),
                Err(err) => InteractionState::failed(kind, None, err.to_string()),
            },
        };
        self.interaction.insert(state)
    }

    pub fn define(&mut self, word: &str) -> &InteractionState {
        let kind = InteractionKind::Definition;
        let state = match self.service.definition(word) {
            Ok(definition) => InteractionState::ok(kind, InteractionPayload::Text(definition)),
            Err(err) => InteractionState::failed(kind, None, err.to_string()),
        };
        self.interaction.insert(state)
    }
}
