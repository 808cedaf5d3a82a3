//! Positioned character extraction and cell text assembly.
//!
//! [`TextExtractor`] places every shown glyph on the page the way pdfminer
//! does: the glyph box spans the advance width horizontally and one em
//! vertically, starting at the font's descent below the baseline. Boxes are
//! stored in extraction space so they can be tested against table cells
//! directly.
//!
//! [`chars_to_text`] rebuilds a cell's text from its characters: lines are
//! clustered by `top`, characters ordered left to right, and a space is
//! inserted wherever the horizontal gap exceeds the tolerance.

use crate::content::graphics_state::GraphicsState;
use crate::fonts::LoadedFont;
use crate::geometry::{PdfBox, Point, Rect};

/// A shown character in extraction space.
#[derive(Debug, Clone, PartialEq)]
pub struct PageChar {
    /// Unicode text (usually one char; ligatures may carry more)
    pub text: String,
    /// Glyph box, top-left origin
    pub bbox: Rect,
}

impl PageChar {
    /// Centre of the glyph box, used for cell membership.
    pub fn mid(&self) -> Point {
        self.bbox.center()
    }

    fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Collects positioned characters while text operators execute.
#[derive(Debug)]
pub struct TextExtractor {
    page_box: PdfBox,
    chars: Vec<PageChar>,
    unmapped: usize,
}

impl TextExtractor {
    /// Create an extractor for a page with the given MediaBox.
    pub fn new(page_box: PdfBox) -> Self {
        Self {
            page_box,
            chars: Vec::new(),
            unmapped: 0,
        }
    }

    /// Show a string (Tj and the string elements of TJ, ', ").
    pub fn show(&mut self, state: &mut GraphicsState, font: &LoadedFont, bytes: &[u8]) {
        let descent = font.descent / 1000.0;
        let h_scale = state.horizontal_scaling / 100.0;

        for glyph in font.decode(bytes) {
            let width = glyph.width / 1000.0;
            if glyph.text.is_empty() {
                self.unmapped += 1;
            } else {
                let trm = state.text_render_matrix();
                let corners = [
                    trm.transform_point(0.0, descent),
                    trm.transform_point(width, descent),
                    trm.transform_point(0.0, descent + 1.0),
                    trm.transform_point(width, descent + 1.0),
                ];
                let x_min = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
                let x_max = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
                let y_min = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
                let y_max = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

                let bbox = Rect::from_points(
                    self.page_box.to_extraction_x(x_min),
                    self.page_box.to_extraction_y(y_max),
                    self.page_box.to_extraction_x(x_max),
                    self.page_box.to_extraction_y(y_min),
                );
                log::trace!("Glyph {:?} at {:?}", glyph.text, bbox);
                self.chars.push(PageChar {
                    text: glyph.text,
                    bbox,
                });
            }

            let word_space = if glyph.is_word_space {
                state.word_space
            } else {
                0.0
            };
            let tx = (width * state.font_size + state.char_space + word_space) * h_scale;
            state.advance(tx);
        }
    }

    /// Apply a TJ number: move left by `amount` thousandths of an em.
    pub fn adjust(&mut self, state: &mut GraphicsState, amount: f32) {
        let tx = -amount / 1000.0 * state.font_size * state.horizontal_scaling / 100.0;
        state.advance(tx);
    }

    /// Glyphs shown so far that have no Unicode text.
    pub fn unmapped(&self) -> usize {
        self.unmapped
    }

    /// Finish extraction and return the characters in content order.
    pub fn finish(self) -> Vec<PageChar> {
        self.chars
    }
}

/// Cluster sorted values into groups whose consecutive members are at most
/// `tolerance` apart. Returns group index per input index.
fn cluster_by(values: &[f32], tolerance: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| crate::utils::safe_float_cmp(values[a], values[b]));

    let mut groups = vec![0; values.len()];
    let mut group = 0;
    let mut last: Option<f32> = None;
    for i in order {
        if let Some(prev) = last {
            if values[i] - prev > tolerance {
                group += 1;
            }
        }
        groups[i] = group;
        last = Some(values[i]);
    }
    groups
}

/// Rebuild text from a set of characters.
///
/// # Examples
///
/// ```
/// use picklist_annotator::extractors::text::{chars_to_text, PageChar};
/// use picklist_annotator::geometry::Rect;
///
/// let c = |t: &str, x: f32| PageChar {
///     text: t.to_string(),
///     bbox: Rect::from_points(x, 100.0, x + 5.0, 110.0),
/// };
/// let chars = [c("B", 5.0), c("A", 0.0), c("C", 20.0)];
/// assert_eq!(chars_to_text(chars.iter(), 3.0, 3.0), "AB C");
/// ```
pub fn chars_to_text<'a>(chars: impl IntoIterator<Item = &'a PageChar>, x_tolerance: f32, y_tolerance: f32) -> String {
    let chars: Vec<&PageChar> = chars.into_iter().collect();
    if chars.is_empty() {
        return String::new();
    }

    let tops: Vec<f32> = chars.iter().map(|c| c.bbox.top()).collect();
    let groups = cluster_by(&tops, y_tolerance);
    let line_count = groups.iter().copied().max().map_or(0, |m| m + 1);

    let mut lines: Vec<Vec<&PageChar>> = vec![Vec::new(); line_count];
    for (c, group) in chars.iter().zip(&groups) {
        lines[*group].push(*c);
    }

    let rendered: Vec<String> = lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| crate::utils::safe_float_cmp(a.bbox.left(), b.bbox.left()));
            let mut words: Vec<String> = Vec::new();
            let mut current = String::new();
            let mut prev_right: Option<f32> = None;
            for c in line {
                if c.is_whitespace() {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                    prev_right = None;
                    continue;
                }
                if let Some(right) = prev_right {
                    if c.bbox.left() > right + x_tolerance && !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                }
                current.push_str(&c.text);
                prev_right = Some(c.bbox.right());
            }
            if !current.is_empty() {
                words.push(current);
            }
            words.join(" ")
        })
        .collect();

    rendered.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::graphics_state::Matrix;

    fn ch(text: &str, x0: f32, top: f32) -> PageChar {
        PageChar {
            text: text.to_string(),
            bbox: Rect::from_points(x0, top, x0 + 5.0, top + 10.0),
        }
    }

    #[test]
    fn test_show_places_glyphs() {
        let page = PdfBox::new(0.0, 0.0, 600.0, 800.0);
        let mut extractor = TextExtractor::new(page);
        let mut state = GraphicsState::new();
        state.font_size = 10.0;
        state.next_line(100.0, 700.0);

        let font = LoadedFont::fallback();
        extractor.show(&mut state, &font, b"AB");
        let chars = extractor.finish();

        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].text, "A");
        // 500/1000 * 10pt advance per glyph
        assert!((chars[0].bbox.left() - 100.0).abs() < 1e-4);
        assert!((chars[1].bbox.left() - 105.0).abs() < 1e-4);
        // baseline 700, no descent: box from 700 to 710 in PDF space
        assert!((chars[0].bbox.top() - 90.0).abs() < 1e-4);
        assert!((chars[0].bbox.bottom() - 100.0).abs() < 1e-4);
        assert_eq!(state.text_matrix.e, 110.0);
    }

    #[test]
    fn test_show_applies_ctm_and_spacing() {
        let page = PdfBox::new(0.0, 0.0, 600.0, 800.0);
        let mut extractor = TextExtractor::new(page);
        let mut state = GraphicsState::new();
        state.font_size = 10.0;
        state.char_space = 1.0;
        state.word_space = 4.0;
        state.ctm = Matrix::translation(50.0, 0.0);

        extractor.show(&mut state, &LoadedFont::fallback(), b"A B");
        let chars = extractor.finish();
        assert_eq!(chars.len(), 3);
        // A: 5 + 1; space: 5 + 1 + 4
        assert!((chars[0].bbox.left() - 50.0).abs() < 1e-4);
        assert!((chars[2].bbox.left() - 66.0).abs() < 1e-4);
    }

    #[test]
    fn test_adjust_moves_left_for_positive() {
        let mut extractor = TextExtractor::new(PdfBox::new(0.0, 0.0, 100.0, 100.0));
        let mut state = GraphicsState::new();
        state.font_size = 10.0;
        extractor.adjust(&mut state, 200.0);
        assert!((state.text_matrix.e + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_chars_to_text_lines_and_spaces() {
        let chars = vec![
            ch("2", 10.0, 21.0),
            ch("A", 0.0, 0.0),
            ch("1", 0.0, 20.0),
            ch("B", 5.0, 1.0),
            ch(" ", 10.0, 0.0),
            ch("C", 15.0, 0.0),
        ];
        assert_eq!(chars_to_text(&chars, 3.0, 3.0), "AB C\n1 2");
    }

    #[test]
    fn test_chars_to_text_empty() {
        let chars: Vec<PageChar> = Vec::new();
        assert_eq!(chars_to_text(&chars, 3.0, 3.0), "");
    }
}
