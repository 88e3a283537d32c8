//! The reader session: one [`ProgressStore`] plus the pagination of its
//! current chapter, driven through [`SessionCommand`]s that each answer with
//! a fresh [`ReaderSnapshot`].

use crate::config::AppConfig;
use crate::model::{Book, DisplayPreferences, ThemeMode};
use crate::pagination::{FontMetrics, Paginator, TextMeasurer, Viewport, clamp_page};
use crate::progress::ProgressStore;
use crate::remote::FlushOutcome;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct ReaderSettingsView {
    pub theme: ThemeMode,
    pub font_family: String,
    pub font_size: u32,
}

impl From<&DisplayPreferences> for ReaderSettingsView {
    fn from(prefs: &DisplayPreferences) -> Self {
        Self {
            theme: prefs.theme,
            font_family: prefs.font_family.clone(),
            font_size: prefs.font_size,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub chapter_index: usize,
    pub chapter_title: Option<String>,
    pub total_chapters: usize,
    pub page_index: usize,
    pub total_pages: usize,
    pub page_text: String,
    /// No pages yet: nothing loaded, or the viewport has not been laid out.
    pub loading: bool,
    pub settings: ReaderSettingsView,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    NextPage,
    PrevPage,
    SetPage { page: usize },
    NextChapter,
    PrevChapter,
    GoToChapter { index: usize },
    Resize { width: f32, height: f32 },
    SetTheme { theme: ThemeMode },
    ToggleTheme,
    SetFontFamily { family: String },
    SetFontSize { size: u32 },
    IncreaseFontSize,
    DecreaseFontSize,
    CloseBook,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::NextPage => "reader_next_page",
            Self::PrevPage => "reader_prev_page",
            Self::SetPage { .. } => "reader_set_page",
            Self::NextChapter => "reader_next_chapter",
            Self::PrevChapter => "reader_prev_chapter",
            Self::GoToChapter { .. } => "reader_go_to_chapter",
            Self::Resize { .. } => "reader_resize",
            Self::SetTheme { .. } => "reader_set_theme",
            Self::ToggleTheme => "reader_toggle_theme",
            Self::SetFontFamily { .. } => "reader_set_font_family",
            Self::SetFontSize { .. } => "reader_set_font_size",
            Self::IncreaseFontSize => "reader_increase_font_size",
            Self::DecreaseFontSize => "reader_decrease_font_size",
            Self::CloseBook => "reader_close_book",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: ReaderSnapshot,
}

/// A reading session: the progress store plus the pagination of its current
/// chapter at the current viewport.
pub struct ReaderSession<M: TextMeasurer> {
    store: ProgressStore,
    paginator: Paginator,
    measurer: M,
    viewport: Viewport,
    config: AppConfig,
}

impl<M: TextMeasurer> ReaderSession<M> {
    pub fn new(store: ProgressStore, measurer: M, viewport: Viewport, config: AppConfig) -> Self {
        let mut session = Self {
            store,
            paginator: Paginator::new(),
            measurer,
            viewport,
            config,
        };
        session.repaginate();
        session
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Run `f` against the store, then repaginate so any chapter or font
    /// change it made is reflected in the page list.
    pub fn update_store<R>(&mut self, f: impl FnOnce(&mut ProgressStore) -> R) -> R {
        let result = f(&mut self.store);
        self.repaginate();
        result
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pages(&self) -> &[String] {
        self.paginator.pages()
    }

    pub fn load_book(&mut self, book: Book) {
        self.store.load_book(book);
        self.repaginate();
    }

    /// Close the book, flushing progress to the remote record when one is
    /// attached.
    pub fn close_book(&mut self) -> FlushOutcome {
        let outcome = self.store.reset();
        self.paginator.invalidate();
        outcome
    }

    fn font_metrics(&self) -> FontMetrics {
        self.config.font_metrics(self.store.preferences())
    }

    /// Bring the page list in line with the current chapter, viewport and
    /// font, then pull the stored page index back into range.
    pub fn repaginate(&mut self) {
        let Some(content) = self.store.current_chapter().map(|c| c.content.clone()) else {
            self.paginator.invalidate();
            return;
        };
        let font = self.font_metrics();
        self.paginator
            .update(&content, self.viewport, &font, &self.measurer);

        let current = self.store.current_page_index();
        let clamped = clamp_page(current, self.paginator.page_count());
        if clamped != current {
            debug!(from = current, to = clamped, "Clamped page after repagination");
            self.store.go_to_page(clamped);
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width.max(0.0), height.max(0.0));
        if viewport != self.viewport {
            debug!(width = viewport.width, height = viewport.height, "Viewport resized");
            self.viewport = viewport;
            self.repaginate();
        }
    }

    /// Advance one page, rolling into the next chapter from the last page.
    /// Does nothing while pages are still being laid out.
    pub fn next_page(&mut self) {
        if self.paginator.page_count() == 0 {
            return;
        }
        let page = self.store.current_page_index();
        if page + 1 < self.paginator.page_count() {
            self.store.go_to_page(page + 1);
            info!(page = page + 2, "Navigated to page");
        } else if self.store.next_chapter() {
            self.repaginate();
        }
    }

    pub fn prev_page(&mut self) {
        if self.paginator.page_count() == 0 {
            return;
        }
        let page = self.store.current_page_index();
        if page > 0 {
            self.store.go_to_page(page - 1);
            info!(page, "Navigated to page");
        } else if self.store.previous_chapter() {
            // Start from the end of the previous chapter; repagination clamps
            // this to its last page.
            self.store.go_to_page(usize::MAX);
            self.repaginate();
        }
    }

    pub fn set_page(&mut self, page: usize) {
        if page < self.paginator.page_count() {
            self.store.go_to_page(page);
        }
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let book = self.store.book();
        let chapter = self.store.current_chapter();
        let page_index = self.store.current_page_index();
        let page_text = self.paginator.page(page_index).unwrap_or("").to_string();
        ReaderSnapshot {
            book_title: book.map(|b| b.title.clone()),
            book_author: book.map(|b| b.author.clone()),
            chapter_index: self.store.current_chapter_index(),
            chapter_title: chapter.map(|c| c.title.clone()),
            total_chapters: self.store.total_chapters(),
            page_index,
            total_pages: self.paginator.page_count(),
            page_text,
            loading: self.paginator.page_count() == 0,
            settings: self.store.preferences().into(),
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::NextPage => self.next_page(),
            SessionCommand::PrevPage => self.prev_page(),
            SessionCommand::SetPage { page } => self.set_page(page),
            SessionCommand::NextChapter => {
                self.store.next_chapter();
                self.repaginate();
            }
            SessionCommand::PrevChapter => {
                self.store.previous_chapter();
                self.repaginate();
            }
            SessionCommand::GoToChapter { index } => {
                self.store.go_to_chapter(index);
                self.repaginate();
            }
            SessionCommand::Resize { width, height } => self.resize(width, height),
            SessionCommand::SetTheme { theme } => self.store.set_theme(theme),
            SessionCommand::ToggleTheme => self.store.toggle_theme(),
            SessionCommand::SetFontFamily { family } => {
                self.store.set_font_family(family);
                self.repaginate();
            }
            SessionCommand::SetFontSize { size } => {
                self.store.set_font_size(size);
                self.repaginate();
            }
            SessionCommand::IncreaseFontSize => {
                self.store.increase_font_size();
                self.repaginate();
            }
            SessionCommand::DecreaseFontSize => {
                self.store.decrease_font_size();
                self.repaginate();
            }
            SessionCommand::CloseBook => {
                self.close_book();
            }
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;
    use crate::pagination::GlyphGridMeasurer;
    use crate::storage::MemoryStore;

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|n| format!("line {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sample_book() -> Book {
        Book::new(
            "Lines",
            "Anon",
            vec![
                Chapter::new("One", numbered_lines(25)),
                Chapter::new("Two", numbered_lines(40)),
                Chapter::new("Three", "short"),
            ],
        )
    }

    fn build_test_session(width: f32, height: f32) -> ReaderSession<GlyphGridMeasurer> {
        let config = AppConfig::default();
        let store = ProgressStore::open(Box::new(MemoryStore::new()), config.initial_preferences());
        let mut session = ReaderSession::new(
            store,
            GlyphGridMeasurer::new(config.glyph_width_ratio),
            Viewport::new(width, height),
            config,
        );
        session.load_book(sample_book());
        session
    }

    #[test]
    fn shrinking_viewport_splits_page_and_clamps_index() {
        // 16px font at 1.5 line height: 24px lines, 25 lines fit in 800px.
        let mut session = build_test_session(440.0, 800.0);
        assert_eq!(session.pages().len(), 1);

        session.resize(440.0, 400.0);
        assert!(session.pages().len() > 1);
        session.set_page(1);
        assert_eq!(session.store().current_page_index(), 1);

        session.resize(440.0, 800.0);
        assert_eq!(session.pages().len(), 1);
        assert_eq!(session.store().current_page_index(), 0);
    }

    #[test]
    fn collapsed_viewport_reports_loading() {
        let mut session = build_test_session(440.0, 0.0);
        let snapshot = session.snapshot();
        assert!(snapshot.loading);
        assert_eq!(snapshot.total_pages, 0);
        assert_eq!(snapshot.page_text, "");

        session.resize(440.0, 800.0);
        assert!(!session.snapshot().loading);
    }

    #[test]
    fn store_updates_are_followed_by_repagination() {
        let mut session = build_test_session(440.0, 400.0);
        session.set_page(1);
        let moved = session.update_store(|store| store.go_to_chapter(2));
        assert!(moved);
        assert_eq!(session.pages(), ["short".to_string()]);
        assert_eq!(session.store().current_page_index(), 0);

        session.update_store(|store| store.set_font_size(32));
        assert_eq!(session.snapshot().settings.font_size, 32);
        assert_eq!(session.pages().len(), 1);
    }

    #[test]
    fn page_turns_while_loading_stay_in_chapter() {
        let mut session = build_test_session(440.0, 0.0);
        session.apply_command(SessionCommand::GoToChapter { index: 1 });
        session.next_page();
        session.next_page();
        assert_eq!(session.store().current_chapter_index(), 1);
        let event = session.apply_command(SessionCommand::PrevPage);
        assert_eq!(event.snapshot.chapter_index, 1);
        assert!(event.snapshot.loading);
    }

    #[test]
    fn next_page_rolls_into_next_chapter() {
        let mut session = build_test_session(440.0, 400.0);
        let pages = session.pages().len();
        for _ in 0..pages {
            session.next_page();
        }
        assert_eq!(session.store().current_chapter_index(), 1);
        assert_eq!(session.store().current_page_index(), 0);
    }

    #[test]
    fn prev_page_lands_on_last_page_of_previous_chapter() {
        let mut session = build_test_session(440.0, 400.0);
        session.apply_command(SessionCommand::GoToChapter { index: 2 });
        session.prev_page();
        assert_eq!(session.store().current_chapter_index(), 1);
        let last = session.pages().len() - 1;
        assert!(last > 0);
        assert_eq!(session.store().current_page_index(), last);
    }

    #[test]
    fn font_size_change_repaginates() {
        let mut session = build_test_session(440.0, 800.0);
        assert_eq!(session.pages().len(), 1);
        let event = session.apply_command(SessionCommand::SetFontSize { size: 32 });
        assert_eq!(event.action, "reader_set_font_size");
        assert_eq!(event.snapshot.settings.font_size, 32);
        assert!(event.snapshot.total_pages > 1);
        assert_eq!(session.pages().concat(), numbered_lines(25));
    }

    #[test]
    fn set_page_ignores_out_of_range() {
        let mut session = build_test_session(440.0, 400.0);
        session.set_page(99);
        assert_eq!(session.store().current_page_index(), 0);
    }

    #[test]
    fn command_dispatch_emits_action_and_snapshot() {
        let mut session = build_test_session(440.0, 800.0);
        let event = session.apply_command(SessionCommand::NextChapter);
        assert_eq!(event.action, "reader_next_chapter");
        assert_eq!(event.snapshot.chapter_index, 1);
        assert_eq!(event.snapshot.chapter_title.as_deref(), Some("Two"));
        assert_eq!(event.snapshot.total_chapters, 3);

        let event = session.apply_command(SessionCommand::ToggleTheme);
        assert_eq!(event.snapshot.settings.theme, ThemeMode::Light);
    }

    #[test]
    fn close_book_clears_pages() {
        let mut session = build_test_session(440.0, 800.0);
        let event = session.apply_command(SessionCommand::CloseBook);
        assert_eq!(event.snapshot.book_title, None);
        assert!(event.snapshot.loading);
        assert!(session.pages().is_empty());
    }
}
