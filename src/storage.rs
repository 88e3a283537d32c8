//! Durable key/value persistence for session state and per-book AI caches.
//!
//! `FileStore` keeps one JSON blob per key under the state directory, using a
//! hash of the key as the filename to avoid filesystem issues. Keys are
//! derived here too: one fixed key for the session, one per book derived from
//! a sanitized title. The sanitization is lossy, so two titles that differ
//! only in punctuation or case share a cache key.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const SESSION_STATE_KEY: &str = "ebook_reader_state";
const AI_CACHE_KEY_PREFIX: &str = "ai_cache_";

/// Key/value storage of serialized blobs.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Storage key for a book's AI cache.
pub fn ai_cache_key(title: &str) -> String {
    format!("{AI_CACHE_KEY_PREFIX}{}", sanitize_title(title))
}

/// Lowercase, collapse every run of non-alphanumerics to `_`, trim the ends.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_separator = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}

/// Blob-per-file store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(format!("{hash}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating state dir {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("writing {}", path.display()))?;
        trace!(key, bytes = value.len(), "Stored blob");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }
}

/// In-process store for memory-only sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_punctuation_and_case() {
        assert_eq!(sanitize_title("The Hobbit"), "the_hobbit");
        assert_eq!(sanitize_title("  Dune: Messiah!  "), "dune_messiah");
        assert_eq!(sanitize_title("Ender's Game"), "ender_s_game");
        assert_eq!(sanitize_title("???"), "untitled");
    }

    #[test]
    fn distinct_titles_can_collide() {
        assert_eq!(ai_cache_key("Dune"), ai_cache_key("DUNE!"));
        assert_eq!(ai_cache_key("Dune"), "ai_cache_dune");
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.root(), dir.path().join("nested"));
        assert_eq!(store.get("k").expect("get"), None);
        assert!(!store.root().exists());

        store.set("k", "{\"a\":1}").expect("set");
        assert!(store.root().is_dir());
        assert_eq!(store.get("k").expect("get").as_deref(), Some("{\"a\":1}"));

        store.remove("k").expect("remove");
        assert_eq!(store.get("k").expect("get"), None);
        store.remove("k").expect("removing twice is fine");
    }

    #[test]
    fn file_store_keys_map_to_distinct_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.set("a", "1").expect("set a");
        store.set("b", "2").expect("set b");
        assert_eq!(store.get("a").expect("get").as_deref(), Some("1"));
        assert_eq!(store.get("b").expect("get").as_deref(), Some("2"));
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 2);
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set("k", "1").expect("set");
        store.set("k", "2").expect("set");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").expect("get").as_deref(), Some("2"));
    }
}
