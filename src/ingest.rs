//! Book ingestion: turning an uploaded file into a structured [`Book`].
//!
//! The structuring step sits behind [`BookStructurer`]. Two local structurers
//! ship here: one for books that are already structured JSON, and an offline
//! one that splits plain text on chapter headings.

use crate::error::IngestError;
use crate::model::{Book, Chapter, unknown_author};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

static RE_CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    // The numeral ends the line or is followed by a delimiter, so prose such
    // as "Part did not..." stays in the body.
    Regex::new(r"(?im)^[ \t]*(?:chapter|part|book)[ \t]+(?:\d+|[ivxlcdm]+)(?:[ \t]*[:.\-](?:[ \t][^\n]*)?)?[ \t\r]*$")
        .expect("chapter heading pattern")
});

pub trait BookStructurer {
    fn structure(&self, text: &str) -> Result<Book, IngestError>;
}

/// Accepts the structured-book JSON shape (`title`, `author`, `chapters`,
/// `characters`).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBookStructurer;

impl BookStructurer for JsonBookStructurer {
    fn structure(&self, text: &str) -> Result<Book, IngestError> {
        let book: Book =
            serde_json::from_str(text).map_err(|err| IngestError::Unstructured(err.to_string()))?;
        if book.chapters.is_empty() {
            return Err(IngestError::Unstructured("book has no chapters".to_string()));
        }
        Ok(book)
    }
}

/// Splits plain text on `Chapter N` / `Part IV` / `Book 2` heading lines.
#[derive(Debug, Clone)]
pub struct HeadingStructurer {
    title: String,
}

impl HeadingStructurer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl BookStructurer for HeadingStructurer {
    fn structure(&self, text: &str) -> Result<Book, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::Unstructured("file contains no text".to_string()));
        }

        let headings: Vec<_> = RE_CHAPTER_HEADING.find_iter(text).collect();
        let mut chapters = Vec::with_capacity(headings.len() + 1);

        let preface_end = headings.first().map_or(text.len(), |m| m.start());
        let preface = text[..preface_end].trim();
        if !preface.is_empty() {
            let title = if headings.is_empty() { self.title.as_str() } else { "Opening" };
            chapters.push(Chapter::new(title, preface));
        }

        for (idx, heading) in headings.iter().enumerate() {
            let body_end = headings.get(idx + 1).map_or(text.len(), |next| next.start());
            let body = text[heading.end()..body_end].trim();
            chapters.push(Chapter::new(heading.as_str().trim(), body));
        }

        debug!(chapters = chapters.len(), "Split text on chapter headings");
        Ok(Book::new(self.title.clone(), unknown_author(), chapters))
    }
}

/// Read `path` and structure it: `.json` files are parsed as structured
/// books, `.txt` files go through `structurer`.
pub fn load_book_file(path: &Path, structurer: &dyn BookStructurer) -> Result<Book, IngestError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ext != "txt" && ext != "json" {
        return Err(IngestError::UnsupportedFormat(if ext.is_empty() {
            path.display().to_string()
        } else {
            ext
        }));
    }

    info!(path = %path.display(), "Reading book file");
    let text = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut book = if ext == "json" {
        JsonBookStructurer.structure(&text)?
    } else {
        structurer.structure(&text)?
    };
    if book.file_path.is_none() {
        book.file_path = Some(path.display().to_string());
    }
    info!(
        title = %book.title,
        chapters = book.chapter_count(),
        characters = book.characters.len(),
        "Structured book"
    );
    Ok(book)
}

/// File stem used as a fallback title.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.replace(['_', '-'], " "))
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_split_text_into_chapters() {
        let text = "A Tale\n\nCHAPTER I\nIt was the best of times.\n\nChapter 2: The Mail\nIt was the worst.\n";
        let book = HeadingStructurer::new("A Tale").structure(text).expect("book");
        let titles: Vec<_> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Opening", "CHAPTER I", "Chapter 2: The Mail"]);
        assert_eq!(book.chapters[1].content, "It was the best of times.");
        assert_eq!(book.chapters[2].content, "It was the worst.");
        assert_eq!(book.author, "Unknown Author");
    }

    #[test]
    fn text_without_headings_is_one_chapter() {
        let book = HeadingStructurer::new("Notes")
            .structure("Just some prose.\nAnd more.")
            .expect("book");
        assert_eq!(book.chapter_count(), 1);
        assert_eq!(book.chapters[0].title, "Notes");
    }

    #[test]
    fn words_starting_with_chapter_are_not_headings() {
        let book = HeadingStructurer::new("T")
            .structure("Chapterhouse rules apply.\nbook keeping is dull.")
            .expect("book");
        assert_eq!(book.chapter_count(), 1);
    }

    #[test]
    fn prose_lines_after_part_or_book_are_not_headings() {
        let book = HeadingStructurer::new("T")
            .structure("It began.\nPart did not survive the fire.\nBook mid-way through.\nThe rest did.")
            .expect("book");
        assert_eq!(book.chapter_count(), 1);
        assert_eq!(book.chapters[0].title, "T");
    }

    #[test]
    fn headings_accept_trailing_delimiters() {
        let text = "Part III.\nSnow.\nChapter 4 - Storm\r\nWind.\nBOOK X\nEnd.";
        let book = HeadingStructurer::new("T").structure(text).expect("book");
        let titles: Vec<_> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Part III.", "Chapter 4 - Storm", "BOOK X"]);
        assert_eq!(book.chapters[1].content, "Wind.");
    }

    #[test]
    fn blank_text_cannot_be_structured() {
        let err = HeadingStructurer::new("T").structure(" \n\t").unwrap_err();
        assert!(matches!(err, IngestError::Unstructured(_)));
    }

    #[test]
    fn json_without_chapters_is_rejected() {
        let err = JsonBookStructurer
            .structure(r#"{"title": "Empty", "author": "X", "chapters": [], "characters": []}"#)
            .unwrap_err();
        assert!(err.to_string().starts_with("could not structure content"));
        assert!(JsonBookStructurer.structure("not json").is_err());
    }

    #[test]
    fn load_book_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let txt = dir.path().join("the_hollow-tide.txt");
        fs::write(&txt, "Chapter 1\nRain.\nChapter 2\nMore rain.").expect("write txt");
        let structurer = HeadingStructurer::new(title_from_path(&txt));
        let book = load_book_file(&txt, &structurer).expect("txt book");
        assert_eq!(book.title, "the hollow tide");
        assert_eq!(book.chapter_count(), 2);
        assert_eq!(book.file_path.as_deref(), Some(txt.display().to_string().as_str()));

        let json = dir.path().join("book.json");
        fs::write(
            &json,
            r#"{"title": "Dune", "author": "Frank Herbert", "chapters": [{"title": "1", "content": "Arrakis."}], "characters": ["Paul"]}"#,
        )
        .expect("write json");
        let book = load_book_file(&json, &structurer).expect("json book");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.characters, vec!["Paul"]);
    }

    #[test]
    fn unsupported_and_missing_files_are_reported() {
        let structurer = HeadingStructurer::new("T");
        let err = load_book_file(Path::new("novel.pdf"), &structurer).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ref ext) if ext == "pdf"));

        let err = load_book_file(Path::new("/nonexistent/novel.txt"), &structurer).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }
}
