//! Remote account/record collaborator.
//!
//! The backend holds the signed-in user's library and the last-read chapter
//! of each book. The store only ever calls `update_last_read_chapter`, once,
//! when a reading session ends; that call goes through
//! [`flush_last_read_chapter`], which never blocks the caller for longer than
//! the configured timeout.

use crate::model::{Book, Chapter};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub trait RemoteLibrary: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn list_books(&self) -> Result<Vec<Book>>;
    fn add_book(&self, book: NewBook) -> Result<Book>;
    fn update_last_read_chapter(&self, book_id: u64, chapter_index: usize) -> Result<()>;
}

/// Chapters and characters as stored alongside a book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub chapters: Vec<Chapter>,
    pub characters: Vec<String>,
}

/// A book row as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteBook {
    pub id: u64,
    pub created_at: String,
    pub title: String,
    pub author: String,
    pub file_path: String,
    pub cover_url: Option<String>,
    pub structured_content: StructuredContent,
    pub user_id: String,
    #[serde(default)]
    pub last_read_chapter: Option<usize>,
}

impl From<RemoteBook> for Book {
    fn from(row: RemoteBook) -> Self {
        Book {
            id: Some(row.id),
            owner_id: Some(row.user_id),
            file_path: Some(row.file_path),
            title: row.title,
            author: row.author,
            chapters: row.structured_content.chapters,
            characters: row.structured_content.characters,
            cover_url: row.cover_url,
            last_read_chapter: row.last_read_chapter,
        }
    }
}

/// Insert payload for a newly structured book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub file_path: String,
    pub structured_content: StructuredContent,
    pub user_id: String,
}

impl NewBook {
    pub fn from_book(book: &Book, file_path: impl Into<String>, user_id: impl Into<String>) -> Self {
        NewBook {
            title: book.title.clone(),
            author: book.author.clone(),
            file_path: file_path.into(),
            structured_content: StructuredContent {
                chapters: book.chapters.clone(),
                characters: book.characters.clone(),
            },
            user_id: user_id.into(),
        }
    }
}

/// Outcome of a best-effort progress flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Saved,
    Skipped,
    Failed,
    TimedOut,
}

/// Push the last-read chapter to the backend from a worker thread, waiting at
/// most `timeout`. Failures are logged and reported as an outcome, never as
/// an error; a timed-out call is left to finish on its own.
pub fn flush_last_read_chapter(
    remote: &Arc<dyn RemoteLibrary>,
    book_id: Option<u64>,
    chapter_index: usize,
    timeout: Duration,
) -> FlushOutcome {
    let Some(book_id) = book_id else {
        debug!("Book has no remote id; skipping progress flush");
        return FlushOutcome::Skipped;
    };
    if !remote.is_authenticated() {
        debug!(book_id, "No active remote session; skipping progress flush");
        return FlushOutcome::Skipped;
    }

    let (tx, rx) = mpsc::channel();
    let worker_remote = Arc::clone(remote);
    let spawn = thread::Builder::new()
        .name("progress-flush".to_string())
        .spawn(move || {
            let result = worker_remote.update_last_read_chapter(book_id, chapter_index);
            let _ = tx.send(result);
        });
    if let Err(err) = spawn {
        warn!(book_id, "Could not start progress flush: {err}");
        return FlushOutcome::Failed;
    }

    let received = rx
        .recv_timeout(timeout)
        .map_err(|err| anyhow!("no response from backend: {err}"));
    match received {
        Ok(Ok(())) => {
            info!(book_id, chapter = chapter_index, "Saved reading progress");
            FlushOutcome::Saved
        }
        Ok(Err(err)) => {
            warn!(book_id, "Failed to save reading progress: {err:#}");
            FlushOutcome::Failed
        }
        Err(err) => {
            warn!(
                book_id,
                timeout_ms = timeout.as_millis() as u64,
                "Progress flush abandoned: {err:#}"
            );
            FlushOutcome::TimedOut
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Recording backend with switchable failure modes.
    #[derive(Default)]
    pub(crate) struct FakeLibrary {
        pub authenticated: bool,
        pub fail: bool,
        pub delay: Option<Duration>,
        pub updates: Mutex<Vec<(u64, usize)>>,
    }

    impl FakeLibrary {
        pub(crate) fn signed_in() -> Self {
            FakeLibrary {
                authenticated: true,
                ..FakeLibrary::default()
            }
        }

        pub(crate) fn recorded(&self) -> Vec<(u64, usize)> {
            self.updates.lock().map(|u| u.clone()).unwrap_or_default()
        }
    }

    impl RemoteLibrary for FakeLibrary {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }

        fn list_books(&self) -> Result<Vec<Book>> {
            Ok(Vec::new())
        }

        fn add_book(&self, book: NewBook) -> Result<Book> {
            Ok(RemoteBook {
                id: 1,
                created_at: "2026-01-01T00:00:00Z".to_string(),
                title: book.title,
                author: book.author,
                file_path: book.file_path,
                cover_url: None,
                structured_content: book.structured_content,
                user_id: book.user_id,
                last_read_chapter: None,
            }
            .into())
        }

        fn update_last_read_chapter(&self, book_id: u64, chapter_index: usize) -> Result<()> {
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            if self.fail {
                return Err(anyhow!("backend unavailable"));
            }
            if let Ok(mut updates) = self.updates.lock() {
                updates.push((book_id, chapter_index));
            }
            Ok(())
        }
    }
}
