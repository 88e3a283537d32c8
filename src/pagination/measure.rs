//! Measurement surfaces for the paginator.
//!
//! A [`TextMeasurer`] hands out a surface configured with the container width
//! and the exact font settings of the visible page. Dropping the surface
//! detaches it, so release happens on every exit path.

use super::FontMetrics;
use tracing::trace;

pub trait TextMeasurer {
    /// Attach an invisible surface laid out like the visible container.
    fn attach(&self, width: f32, font: &FontMetrics) -> Box<dyn MeasurementSurface + '_>;
}

pub trait MeasurementSurface {
    /// Rendered height in pixels of `text` on this surface.
    fn measure_height(&mut self, text: &str) -> f32;
}

/// Fixed-advance layout model: every glyph is `size * glyph_width_ratio`
/// wide and every line box is `size * line_height` tall. Words wrap greedily;
/// a word wider than the line breaks by character.
#[derive(Debug, Clone, Copy)]
pub struct GlyphGridMeasurer {
    glyph_width_ratio: f32,
}

impl GlyphGridMeasurer {
    pub fn new(glyph_width_ratio: f32) -> Self {
        Self {
            glyph_width_ratio: glyph_width_ratio.max(0.05),
        }
    }
}

impl Default for GlyphGridMeasurer {
    fn default() -> Self {
        Self::new(0.55)
    }
}

impl TextMeasurer for GlyphGridMeasurer {
    fn attach(&self, width: f32, font: &FontMetrics) -> Box<dyn MeasurementSurface + '_> {
        let size = font.size.max(1) as f32;
        let advance = size * self.glyph_width_ratio;
        let columns = ((width / advance).floor() as usize).max(1);
        let line_px = size * font.line_height.max(0.1);
        trace!(
            columns,
            line_px,
            family = %font.family,
            align = %font.align,
            "Attached measurement surface"
        );
        Box::new(GridSurface { columns, line_px })
    }
}

struct GridSurface {
    columns: usize,
    line_px: f32,
}

impl GridSurface {
    fn line_count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.split('\n').map(|line| self.wrapped_lines(line)).sum()
    }

    fn wrapped_lines(&self, line: &str) -> usize {
        let mut lines = 1usize;
        let mut used = 0usize;
        for word in line.split(' ') {
            let len = word.chars().count();
            let needed = if used == 0 { len } else { used + 1 + len };
            if needed <= self.columns {
                used = needed;
                continue;
            }
            if used > 0 {
                lines += 1;
            }
            if len > self.columns {
                lines += (len - 1) / self.columns;
                used = len - (len - 1) / self.columns * self.columns;
            } else {
                used = len;
            }
        }
        lines
    }
}

impl MeasurementSurface for GridSurface {
    fn measure_height(&mut self, text: &str) -> f32 {
        self.line_count(text) as f32 * self.line_px
    }
}

impl Drop for GridSurface {
    fn drop(&mut self) {
        trace!("Detached measurement surface");
    }
}
