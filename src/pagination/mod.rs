//! Measurement-driven pagination.
//!
//! Chapter text is split into whitespace-preserving tokens and greedily packed
//! into pages: each candidate page is rendered on a measurement surface that
//! matches the visible container, and the token that would overflow the
//! container's height starts the next page. Concatenating the pages gives the
//! chapter back byte for byte.
//!
//! Page boundaries depend on the viewport and the font, so the [`Paginator`]
//! keeps only the page list for the most recent (content, viewport, font)
//! combination and rebuilds it from scratch whenever any of them changes.

mod measure;
mod tokenize;

pub use measure::{GlyphGridMeasurer, MeasurementSurface, TextMeasurer};
pub use tokenize::tokenize;

use crate::config::TextAlign;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Minimum allowed font size (points).
pub const MIN_FONT_SIZE: u32 = 12;
/// Maximum allowed font size (points).
pub const MAX_FONT_SIZE: u32 = 32;

/// Visible container size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Not yet laid out.
    pub fn is_collapsed(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Font settings shared by the visible page and the measurement surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub family: String,
    pub size: u32,
    pub line_height: f32,
    pub align: TextAlign,
}

/// Split `content` into pages that each fit `viewport`.
///
/// Empty content gives a single empty page; a collapsed viewport gives no
/// pages at all.
pub fn paginate(
    content: &str,
    viewport: Viewport,
    font: &FontMetrics,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    if viewport.is_collapsed() {
        return Vec::new();
    }
    if content.is_empty() {
        return vec![String::new()];
    }

    let mut surface = measurer.attach(viewport.width, font);
    let mut pages = Vec::new();
    let mut current = String::new();
    let mut candidate = String::new();

    for token in tokenize(content) {
        candidate.clear();
        candidate.push_str(&current);
        candidate.push_str(token);
        let overflows = surface.measure_height(&candidate) > viewport.height;

        if overflows && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
        }
        // A lone token taller than the page still gets a page of its own.
        current.push_str(token);
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Clamp a page index into `[0, page_count - 1]`, or 0 when there are no pages.
pub fn clamp_page(index: usize, page_count: usize) -> usize {
    index.min(page_count.saturating_sub(1))
}

#[derive(Debug, Clone, PartialEq)]
struct PaginationKey {
    content_digest: [u8; 32],
    viewport: Viewport,
    font: FontMetrics,
}

impl PaginationKey {
    fn new(content: &str, viewport: Viewport, font: &FontMetrics) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self {
            content_digest: hasher.finalize().into(),
            viewport,
            font: font.clone(),
        }
    }
}

/// Page list for the current chapter/viewport pairing.
#[derive(Debug, Default)]
pub struct Paginator {
    key: Option<PaginationKey>,
    pages: Vec<String>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pages for these inputs, recomputing when any input differs
    /// from the previous call. Returns whether a recomputation happened.
    pub fn update(
        &mut self,
        content: &str,
        viewport: Viewport,
        font: &FontMetrics,
        measurer: &dyn TextMeasurer,
    ) -> bool {
        let key = PaginationKey::new(content, viewport, font);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.pages = paginate(content, viewport, font, measurer);
        debug!(
            pages = self.pages.len(),
            width = viewport.width,
            height = viewport.height,
            font_size = font.size,
            "Repaginated content"
        );
        self.key = Some(key);
        true
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Drop the cached page list; the next `update` recomputes.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn font(size: u32) -> FontMetrics {
        FontMetrics {
            family: "Literata".to_string(),
            size,
            line_height: 1.5,
            align: TextAlign::Left,
        }
    }

    /// Twenty-five short lines: 600px tall at 16px/1.5 line height.
    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|n| format!("line {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn prose() -> String {
        "It was a bright cold day in April, and the clocks were striking thirteen. \
         Winston Smith, his chin nuzzled into his breast in an effort to escape the vile wind, \
         slipped quickly through the glass doors of Victory Mansions.\n\n"
            .repeat(12)
    }

    #[test]
    fn pages_concatenate_back_to_content() {
        let measurer = GlyphGridMeasurer::default();
        let content = prose();
        for height in [24.0, 60.0, 200.0, 1000.0] {
            let pages = paginate(&content, Viewport::new(320.0, height), &font(16), &measurer);
            assert!(!pages.is_empty());
            assert_eq!(pages.concat(), content, "height {height}");
        }
    }

    #[test]
    fn every_page_fits_the_container() {
        let measurer = GlyphGridMeasurer::default();
        let viewport = Viewport::new(320.0, 120.0);
        let pages = paginate(&prose(), viewport, &font(16), &measurer);
        let mut surface = measurer.attach(viewport.width, &font(16));
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(surface.measure_height(page) <= viewport.height);
        }
    }

    #[test]
    fn identical_inputs_give_identical_pages() {
        let measurer = GlyphGridMeasurer::default();
        let viewport = Viewport::new(300.0, 150.0);
        let first = paginate(&prose(), viewport, &font(18), &measurer);
        let second = paginate(&prose(), viewport, &font(18), &measurer);
        assert_eq!(first, second);
    }

    #[test]
    fn collapsed_viewport_yields_no_pages() {
        let measurer = GlyphGridMeasurer::default();
        assert!(paginate("text", Viewport::new(300.0, 0.0), &font(16), &measurer).is_empty());
        assert!(paginate("text", Viewport::new(0.0, 300.0), &font(16), &measurer).is_empty());
    }

    #[test]
    fn empty_content_is_one_empty_page() {
        let measurer = GlyphGridMeasurer::default();
        let pages = paginate("", Viewport::new(300.0, 300.0), &font(16), &measurer);
        assert_eq!(pages, vec![String::new()]);
    }

    #[test]
    fn shrinking_the_container_splits_a_single_page() {
        let measurer = GlyphGridMeasurer::default();
        let content = numbered_lines(25);
        let tall = paginate(&content, Viewport::new(440.0, 800.0), &font(16), &measurer);
        let short = paginate(&content, Viewport::new(440.0, 400.0), &font(16), &measurer);
        assert_eq!(tall.len(), 1);
        assert_eq!(short.len(), 2);
        assert_eq!(short.concat(), content);
    }

    #[test]
    fn clamp_page_handles_empty_and_overflow() {
        assert_eq!(clamp_page(5, 0), 0);
        assert_eq!(clamp_page(5, 3), 2);
        assert_eq!(clamp_page(1, 3), 1);
    }

    #[test]
    fn paginator_reuses_pages_until_an_input_changes() {
        let measurer = GlyphGridMeasurer::default();
        let mut paginator = Paginator::new();
        let content = prose();
        let viewport = Viewport::new(320.0, 200.0);

        assert!(paginator.update(&content, viewport, &font(16), &measurer));
        assert!(!paginator.update(&content, viewport, &font(16), &measurer));
        assert!(paginator.update(&content, viewport, &font(20), &measurer));
        assert!(paginator.update(&content, Viewport::new(320.0, 260.0), &font(20), &measurer));
        assert!(paginator.update("other chapter", Viewport::new(320.0, 260.0), &font(20), &measurer));
        assert_eq!(paginator.pages(), ["other chapter".to_string()]);

        paginator.invalidate();
        assert_eq!(paginator.page_count(), 0);
        assert!(paginator.update("other chapter", Viewport::new(320.0, 260.0), &font(20), &measurer));
    }

    struct CountingMeasurer {
        attached: Cell<usize>,
        detached: std::rc::Rc<Cell<usize>>,
    }

    struct CountingSurface {
        detached: std::rc::Rc<Cell<usize>>,
    }

    impl MeasurementSurface for CountingSurface {
        fn measure_height(&mut self, text: &str) -> f32 {
            text.len() as f32
        }
    }

    impl Drop for CountingSurface {
        fn drop(&mut self) {
            self.detached.set(self.detached.get() + 1);
        }
    }

    impl TextMeasurer for CountingMeasurer {
        fn attach(&self, _width: f32, _font: &FontMetrics) -> Box<dyn MeasurementSurface + '_> {
            self.attached.set(self.attached.get() + 1);
            Box::new(CountingSurface {
                detached: self.detached.clone(),
            })
        }
    }

    #[test]
    fn measurement_surface_is_detached_after_each_pass() {
        let measurer = CountingMeasurer {
            attached: Cell::new(0),
            detached: std::rc::Rc::new(Cell::new(0)),
        };
        let pages = paginate("aaaa bbbb cccc", Viewport::new(100.0, 9.0), &font(16), &measurer);
        // Height is byte length: "aaaa bbbb" is exactly 9 and still fits.
        assert_eq!(pages, vec!["aaaa bbbb".to_string(), " cccc".to_string()]);
        assert_eq!(measurer.attached.get(), 1);
        assert_eq!(measurer.detached.get(), 1);
    }

    #[test]
    fn oversized_token_gets_its_own_page() {
        let measurer = CountingMeasurer {
            attached: Cell::new(0),
            detached: std::rc::Rc::new(Cell::new(0)),
        };
        let pages = paginate("ab averyverylongword cd", Viewport::new(100.0, 5.0), &font(16), &measurer);
        assert_eq!(pages.concat(), "ab averyverylongword cd");
        assert!(pages.contains(&"averyverylongword".to_string()));
    }
}
