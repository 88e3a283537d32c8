//! The progress/cache store: which book is open, where the reader is in it,
//! how pages are displayed, and which AI artifacts are already known.
//!
//! Every mutation is written through to durable storage before subscribers
//! hear about it. Storage failures are logged and otherwise ignored, so a
//! session that cannot persist keeps working from memory.

mod events;
mod state;

pub use events::{StoreEvent, SubscriptionId};

use crate::model::{AiCache, Book, CachedCharacter, Chapter, DisplayPreferences, ReadingPosition, ThemeMode};
use crate::pagination::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::remote::{FlushOutcome, RemoteLibrary, flush_last_read_chapter};
use crate::storage::{KeyValueStore, SESSION_STATE_KEY, ai_cache_key};
use events::Subscribers;
use state::{PersistedState, decode_cache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(3);

pub struct ProgressStore {
    storage: Box<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteLibrary>>,
    sync_timeout: Duration,
    book: Option<Book>,
    chapter_index: usize,
    page_index: usize,
    prefs: DisplayPreferences,
    ai_cache: AiCache,
    subscribers: Subscribers,
}

impl ProgressStore {
    /// Restore the previous session from `storage`, or start fresh with
    /// `defaults` when nothing usable is stored.
    pub fn open(storage: Box<dyn KeyValueStore>, defaults: DisplayPreferences) -> Self {
        let fresh = PersistedState::fresh(&defaults);
        let restored = match storage.get(SESSION_STATE_KEY) {
            Ok(Some(blob)) => match PersistedState::merge_over(&fresh, &blob) {
                Ok(state) => {
                    debug!("Restored session state from storage");
                    state
                }
                Err(err) => {
                    warn!("Discarding corrupt session state: {err:#}");
                    if let Err(err) = storage.remove(SESSION_STATE_KEY) {
                        warn!("Could not remove corrupt session state: {err:#}");
                    }
                    fresh
                }
            },
            Ok(None) => fresh,
            Err(err) => {
                warn!("Could not read session state; starting fresh: {err:#}");
                fresh
            }
        };

        let mut prefs = restored.preferences();
        prefs.font_size = prefs.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let chapter_count = restored.book.as_ref().map_or(0, Book::chapter_count);
        let chapter_index = if restored.current_chapter_index < chapter_count {
            restored.current_chapter_index
        } else {
            0
        };

        let mut store = Self {
            storage,
            remote: None,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            book: None,
            chapter_index,
            page_index: restored.current_page_index,
            prefs,
            ai_cache: AiCache::default(),
            subscribers: Subscribers::default(),
        };
        if let Some(book) = restored.book {
            store.ai_cache = store.read_cache(&book);
            info!(
                title = %book.title,
                chapter = chapter_index,
                "Resuming previous session"
            );
            store.book = Some(book);
        }
        store
    }

    /// Attach the remote record collaborator used to flush progress on reset.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteLibrary>, sync_timeout: Duration) -> Self {
        self.remote = Some(remote);
        self.sync_timeout = sync_timeout;
        self
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn current_chapter_index(&self) -> usize {
        self.chapter_index
    }

    pub fn current_page_index(&self) -> usize {
        self.page_index
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.book.as_ref()?.chapter(self.chapter_index)
    }

    pub fn total_chapters(&self) -> usize {
        self.book.as_ref().map_or(0, Book::chapter_count)
    }

    pub fn preferences(&self) -> &DisplayPreferences {
        &self.prefs
    }

    pub fn ai_cache(&self) -> &AiCache {
        &self.ai_cache
    }

    pub fn position(&self) -> Option<ReadingPosition> {
        let book = self.book.as_ref()?;
        Some(ReadingPosition {
            book_id: book.id,
            chapter_index: self.chapter_index,
            page_index: self.page_index,
        })
    }

    /// Make `book` the active book, starting at its last-read chapter and
    /// with whatever AI cache was stored for it.
    pub fn load_book(&mut self, book: Book) {
        let chapter_index = book
            .last_read_chapter
            .filter(|idx| *idx < book.chapter_count())
            .unwrap_or(0);
        self.ai_cache = self.read_cache(&book);
        info!(
            title = %book.title,
            chapters = book.chapter_count(),
            chapter = chapter_index,
            cached_characters = self.ai_cache.characters.len(),
            cached_summaries = self.ai_cache.summaries.len(),
            "Loaded book"
        );
        let title = book.title.clone();
        self.book = Some(book);
        self.chapter_index = chapter_index;
        self.page_index = 0;
        self.commit(StoreEvent::BookLoaded { title });
    }

    /// Out-of-range indices are ignored.
    pub fn go_to_chapter(&mut self, index: usize) -> bool {
        if index >= self.total_chapters() {
            debug!(index, total = self.total_chapters(), "Ignoring out-of-range chapter");
            return false;
        }
        if index == self.chapter_index {
            return false;
        }
        self.chapter_index = index;
        self.page_index = 0;
        info!(chapter = index, "Navigated to chapter");
        self.commit(StoreEvent::ChapterChanged { index });
        true
    }

    pub fn next_chapter(&mut self) -> bool {
        self.go_to_chapter(self.chapter_index + 1)
    }

    pub fn previous_chapter(&mut self) -> bool {
        match self.chapter_index.checked_sub(1) {
            Some(index) => self.go_to_chapter(index),
            None => false,
        }
    }

    /// Set the page index as given; callers bound it against the current
    /// pagination.
    pub fn go_to_page(&mut self, index: usize) {
        self.page_index = index;
        debug!(page = index, "Page changed");
        self.commit(StoreEvent::PageChanged { index });
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.prefs.theme = theme;
        info!(%theme, "Theme changed");
        self.commit(StoreEvent::PreferencesChanged);
    }

    pub fn toggle_theme(&mut self) {
        self.set_theme(self.prefs.theme.toggled());
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.prefs.font_family = family.into();
        debug!(family = %self.prefs.font_family, "Font family changed");
        self.commit(StoreEvent::PreferencesChanged);
    }

    pub fn set_font_size(&mut self, size: u32) {
        let clamped = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        debug!(old = self.prefs.font_size, new = clamped, "Font size changed");
        self.prefs.font_size = clamped;
        self.commit(StoreEvent::PreferencesChanged);
    }

    pub fn increase_font_size(&mut self) {
        self.set_font_size(self.prefs.font_size.saturating_add(1));
    }

    pub fn decrease_font_size(&mut self) {
        self.set_font_size(self.prefs.font_size.saturating_sub(1));
    }

    pub fn get_character_profile_from_cache(&self, name: &str) -> Option<&CachedCharacter> {
        self.ai_cache.characters.get(name)
    }

    pub fn get_summary_from_cache(&self, chapter_index: usize) -> Option<&str> {
        self.ai_cache.summaries.get(&chapter_index).map(String::as_str)
    }

    pub fn save_character_profile_to_cache(&mut self, name: impl Into<String>, entry: CachedCharacter) {
        let name = name.into();
        debug!(character = %name, "Cached character profile");
        self.ai_cache.characters.insert(name, entry);
        self.commit(StoreEvent::CacheUpdated);
    }

    pub fn save_summary_to_cache(&mut self, chapter_index: usize, summary: impl Into<String>) {
        debug!(chapter = chapter_index, "Cached chapter summary");
        self.ai_cache.summaries.insert(chapter_index, summary.into());
        self.commit(StoreEvent::CacheUpdated);
    }

    /// Close the active book. The last chapter is flushed to the remote
    /// record first when possible; that flush never blocks the local reset.
    /// Display preferences survive, and the book's AI cache stays in storage.
    pub fn reset(&mut self) -> FlushOutcome {
        let outcome = match (&self.remote, &self.book) {
            (Some(remote), Some(book)) => {
                flush_last_read_chapter(remote, book.id, self.chapter_index, self.sync_timeout)
            }
            _ => FlushOutcome::Skipped,
        };
        if let Some(book) = self.book.take() {
            info!(title = %book.title, "Closed book");
        }
        self.chapter_index = 0;
        self.page_index = 0;
        self.ai_cache = AiCache::default();
        self.commit(StoreEvent::Reset);
        outcome
    }

    fn read_cache(&self, book: &Book) -> AiCache {
        let key = ai_cache_key(&book.title);
        match self.storage.get(&key) {
            Ok(Some(blob)) => decode_cache(&blob).unwrap_or_else(|err| {
                warn!(%key, "Discarding corrupt AI cache: {err:#}");
                AiCache::default()
            }),
            Ok(None) => AiCache::default(),
            Err(err) => {
                warn!(%key, "Could not read AI cache: {err:#}");
                AiCache::default()
            }
        }
    }

    fn snapshot_state(&self) -> PersistedState {
        PersistedState {
            book: self.book.clone(),
            current_chapter_index: self.chapter_index,
            current_page_index: self.page_index,
            font_size: self.prefs.font_size,
            theme: self.prefs.theme,
            font_family: self.prefs.font_family.clone(),
        }
    }

    fn persist(&self) {
        match serde_json::to_string(&self.snapshot_state()) {
            Ok(blob) => {
                if let Err(err) = self.storage.set(SESSION_STATE_KEY, &blob) {
                    warn!("Could not save session state: {err:#}");
                }
            }
            Err(err) => warn!("Could not serialize session state: {err}"),
        }

        let Some(book) = &self.book else {
            return;
        };
        let key = ai_cache_key(&book.title);
        match serde_json::to_string(&self.ai_cache) {
            Ok(blob) => {
                if let Err(err) = self.storage.set(&key, &blob) {
                    warn!(%key, "Could not save AI cache: {err:#}");
                }
            }
            Err(err) => warn!(%key, "Could not serialize AI cache: {err}"),
        }
    }

    fn commit(&mut self, event: StoreEvent) {
        self.persist();
        self.subscribers.publish(&event);
    }
}
