//! Annotation column compositing.
//!
//! Every page is widened by the column width. Pages with item rows also get
//! a header cell and one labelled cell per row, drawn by a new content
//! stream appended after the original ones. The original streams are left
//! byte-identical; they are only bracketed by `q`/`Q` streams so that any
//! graphics state they leave behind cannot leak into the overlay.
//!
//! Overlay synthesis works on plain per-page data and runs in parallel; the
//! results are applied to the document in page order.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use lopdf::{Dictionary, Object, ObjectId, Stream};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{AnnotationLayout, Rgb};
use crate::document::{resolve, PageGeometry, PickingListDocument};
use crate::error::{Error, Result};
use crate::extractors::rows::{PageRowSet, RowDescriptor};
use crate::geometry::PdfBox;
use crate::mapping::MappingTable;
use crate::writer::{flate_stream, AnnotationFont, ContentStreamBuilder, Paint};

/// Resource name tried first for the annotation font.
const FONT_RESOURCE_BASE: &str = "FAnnot";

/// Result of looking up one row's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The mapping has a label for the identifier
    Matched(String),
    /// No label; the sentinel is drawn
    NotFound,
}

impl RowOutcome {
    /// Look up an identifier.
    pub fn lookup(mapping: &MappingTable, identifier: &str) -> Self {
        match mapping.get(identifier) {
            Some(label) if !identifier.is_empty() => RowOutcome::Matched(label.to_string()),
            _ => RowOutcome::NotFound,
        }
    }

    /// Text drawn in the row's cell.
    pub fn text<'a>(&'a self, layout: &'a AnnotationLayout) -> &'a str {
        match self {
            RowOutcome::Matched(label) => label,
            RowOutcome::NotFound => &layout.not_found,
        }
    }

    /// Whether a label was found.
    pub fn is_matched(&self) -> bool {
        matches!(self, RowOutcome::Matched(_))
    }
}

/// Counters for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMatchSummary {
    /// 1-based page number
    pub page: usize,
    /// Rows found on the page
    pub total_rows: usize,
    /// Rows with a label
    pub matched_rows: usize,
    /// Rows drawn with the sentinel
    pub unmatched_rows: usize,
}

/// Counters for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Rows found on all pages
    pub total_rows: usize,
    /// Rows with a label
    pub matched_rows: usize,
    /// Rows drawn with the sentinel
    pub unmatched_rows: usize,
    /// Distinct non-empty identifiers without a label, sorted
    pub unmatched_ids: BTreeSet<String>,
    /// Per-page counters in page order
    pub pages: Vec<PageMatchSummary>,
}

impl MatchSummary {
    /// Fold one page into the document counters.
    pub fn add_page(&mut self, page: PageMatchSummary, unmatched_ids: impl IntoIterator<Item = String>) {
        self.total_rows += page.total_rows;
        self.matched_rows += page.matched_rows;
        self.unmatched_rows += page.unmatched_rows;
        self.unmatched_ids.extend(unmatched_ids);
        self.pages.push(page);
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matched {}/{} rows", self.matched_rows, self.total_rows)?;
        if !self.unmatched_ids.is_empty() {
            let ids: Vec<&str> = self.unmatched_ids.iter().map(String::as_str).collect();
            write!(f, "; not found: {}", ids.join(", "))?;
        }
        Ok(())
    }
}

/// Overlay of one page, computed without touching the document.
#[derive(Debug, Clone)]
pub struct PageOverlay {
    /// 0-based page index
    pub index: usize,
    /// MediaBox after widening
    pub media_box: PdfBox,
    /// CropBox after widening, if the page has one
    pub crop_box: Option<PdfBox>,
    /// Font resource name used by `content`
    pub font_resource: String,
    /// Uncompressed overlay content; `None` for pages without rows
    pub content: Option<Vec<u8>>,
    /// Outcome per row, in row order
    pub outcomes: Vec<RowOutcome>,
    /// Non-empty identifiers without a label
    pub unmatched_ids: Vec<String>,
}

impl PageOverlay {
    /// Counters of this page.
    pub fn summary(&self) -> PageMatchSummary {
        let matched_rows = self.outcomes.iter().filter(|o| o.is_matched()).count();
        PageMatchSummary {
            page: self.index + 1,
            total_rows: self.outcomes.len(),
            matched_rows,
            unmatched_rows: self.outcomes.len() - matched_rows,
        }
    }
}

/// CropBox extended to the widened MediaBox's right edge.
fn widen_crop_box(crop: PdfBox, media: &PdfBox) -> PdfBox {
    PdfBox { x1: media.x1, ..crop }
}

fn box_object(b: &PdfBox) -> Object {
    Object::Array(b.to_array().iter().map(|&v| Object::Real(v)).collect())
}

/// Draws the annotation column onto a document.
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    layout: AnnotationLayout,
    font: Arc<AnnotationFont>,
}

impl OverlayCompositor {
    /// Create a compositor.
    pub fn new(layout: AnnotationLayout, font: Arc<AnnotationFont>) -> Self {
        Self { layout, font }
    }

    /// Column layout in use.
    pub fn layout(&self) -> &AnnotationLayout {
        &self.layout
    }

    /// Compute the overlay of one page.
    pub fn build_page(
        &self,
        index: usize,
        geometry: &PageGeometry,
        font_resource: &str,
        rows: &[RowDescriptor],
        mapping: &MappingTable,
    ) -> Result<PageOverlay> {
        let media = geometry.media_box;
        let media_box = media.widened(self.layout.column_width);
        let crop_box = geometry.crop_box.map(|crop| widen_crop_box(crop, &media_box));

        let outcomes: Vec<RowOutcome> = rows
            .iter()
            .map(|row| RowOutcome::lookup(mapping, &row.identifier))
            .collect();
        let unmatched_ids = rows
            .iter()
            .zip(&outcomes)
            .filter(|(row, outcome)| !outcome.is_matched() && !row.identifier.is_empty())
            .map(|(row, _)| row.identifier.clone())
            .collect();

        let content = if rows.is_empty() {
            None
        } else {
            Some(self.draw(&media, font_resource, rows, &outcomes))
        };

        Ok(PageOverlay {
            index,
            media_box,
            crop_box,
            font_resource: font_resource.to_string(),
            content,
            outcomes,
            unmatched_ids,
        })
    }

    fn draw(&self, page: &PdfBox, font_resource: &str, rows: &[RowDescriptor], outcomes: &[RowOutcome]) -> Vec<u8> {
        let layout = &self.layout;
        let x = layout.column_x(page.x0, page.width());
        let width = layout.column_width;
        let header_paint = Paint {
            fill: layout.header_fill,
            stroke: layout.header_fill,
            line_width: layout.cell_line_width,
        };
        let cell_paint = Paint {
            fill: layout.cell_fill,
            stroke: layout.cell_stroke,
            line_width: layout.cell_line_width,
        };

        let mut builder = ContentStreamBuilder::new();
        builder.isolated(|b| {
            let band_top = page.to_pdf_y(layout.header_top);
            let band_bottom = page.to_pdf_y(layout.header_bottom);
            let band_height = band_top - band_bottom;
            b.cell(header_paint, x, band_bottom, width, band_height);

            let first_baseline = band_bottom + band_height / 2.0 + layout.header_baseline_offset;
            for (i, line) in layout.header_lines.iter().enumerate() {
                let baseline = first_baseline - i as f32 * layout.header_line_gap;
                self.centered_text(b, font_resource, line, layout.header_font_size, layout.header_text, x, baseline);
            }

            for (row, outcome) in rows.iter().zip(outcomes) {
                let cell_bottom = page.to_pdf_y(row.bottom);
                let cell_height = row.bottom - row.top;
                b.cell(cell_paint, x, cell_bottom, width, cell_height);

                let text = outcome.text(layout);
                let baseline = cell_bottom + cell_height / 2.0 - layout.cell_baseline_drop;
                self.centered_text(b, font_resource, text, layout.font_size_for(text), layout.cell_text, x, baseline);
            }
        });
        builder.finish()
    }

    #[allow(clippy::too_many_arguments)]
    fn centered_text(
        &self,
        builder: &mut ContentStreamBuilder,
        font_resource: &str,
        text: &str,
        size: f32,
        color: Rgb,
        column_x: f32,
        baseline: f32,
    ) {
        let text_x = column_x + (self.layout.column_width - self.font.text_width(text, size)) / 2.0;
        builder.text(font_resource, size, color, text_x, baseline, self.font.encode(text));
    }

    /// Widen every page and draw the column on pages with rows.
    ///
    /// `row_sets` must hold one set per page, in page order.
    pub fn compose(
        &self,
        doc: &mut PickingListDocument,
        row_sets: &[PageRowSet],
        mapping: &MappingTable,
    ) -> Result<MatchSummary> {
        if row_sets.len() != doc.page_count() {
            return Err(Error::PageCountMismatch {
                pages: doc.page_count(),
                row_sets: row_sets.len(),
            });
        }

        let inputs: Vec<(PageGeometry, String)> = (0..doc.page_count())
            .map(|index| Ok((doc.geometry(index)?, font_resource_name(doc, index)?)))
            .collect::<Result<_>>()?;

        let overlays: Vec<PageOverlay> = inputs
            .par_iter()
            .zip(row_sets.par_iter())
            .enumerate()
            .map(|(index, ((geometry, font_resource), rows))| {
                self.build_page(index, geometry, font_resource, rows, mapping)
            })
            .collect::<Result<_>>()?;

        let font_id = if overlays.iter().any(|o| o.content.is_some()) {
            let used = overlays
                .iter()
                .flat_map(|o| o.outcomes.iter().map(|outcome| outcome.text(&self.layout)))
                .chain(self.layout.header_lines.iter().map(String::as_str));
            Some(self.font.install(doc.inner_mut(), used)?)
        } else {
            None
        };

        let mut summary = MatchSummary::default();
        for overlay in overlays {
            apply_overlay(doc, &overlay, font_id)?;
            let page = overlay.summary();
            log::debug!(
                "Page {}: {}/{} rows matched",
                page.page,
                page.matched_rows,
                page.total_rows
            );
            summary.add_page(page, overlay.unmatched_ids);
        }

        log::info!("{}", summary);
        Ok(summary)
    }
}

/// A font resource name not yet used by the page.
fn font_resource_name(doc: &PickingListDocument, index: usize) -> Result<String> {
    let resources = doc.resources(index)?;
    let fonts = match resources.get(b"Font") {
        Ok(obj) => match resolve(doc.inner(), obj)? {
            Object::Dictionary(d) => Some(d.clone()),
            _ => None,
        },
        Err(_) => None,
    };
    let Some(fonts) = fonts else {
        return Ok(FONT_RESOURCE_BASE.to_string());
    };

    let mut name = FONT_RESOURCE_BASE.to_string();
    let mut suffix = 1;
    while fonts.has(name.as_bytes()) {
        name = format!("{}{}", FONT_RESOURCE_BASE, suffix);
        suffix += 1;
    }
    Ok(name)
}

/// Write one page's overlay into the document.
fn apply_overlay(doc: &mut PickingListDocument, overlay: &PageOverlay, font_id: Option<ObjectId>) -> Result<()> {
    let page_id = doc.page_ids()[overlay.index];

    // Gather everything that needs shared access first
    let new_contents = match (&overlay.content, font_id) {
        (Some(content), Some(font_id)) => {
            let original = original_content_refs(doc, overlay.index)?;
            let mut resources = doc.resources(overlay.index)?;
            let mut fonts = match resources.get(b"Font") {
                Ok(obj) => resolve(doc.inner(), obj)?
                    .as_dict()
                    .cloned()
                    .unwrap_or_else(|_| Dictionary::new()),
                Err(_) => Dictionary::new(),
            };
            fonts.set(overlay.font_resource.as_bytes().to_vec(), font_id);
            resources.set("Font", Object::Dictionary(fonts));

            let inner = doc.inner_mut();
            let prefix = inner.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let suffix = inner.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            let overlay_stream = inner.add_object(flate_stream(Dictionary::new(), content)?);

            let mut contents = vec![Object::Reference(prefix)];
            contents.extend(original);
            contents.push(Object::Reference(suffix));
            contents.push(Object::Reference(overlay_stream));
            Some((contents, resources))
        },
        _ => None,
    };

    let page = doc.inner_mut().get_object_mut(page_id)?.as_dict_mut()?;
    page.set("MediaBox", box_object(&overlay.media_box));
    if let Some(crop) = &overlay.crop_box {
        page.set("CropBox", box_object(crop));
    }
    if let Some((contents, resources)) = new_contents {
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));
    }
    Ok(())
}

/// References to the page's existing content streams, in order.
fn original_content_refs(doc: &mut PickingListDocument, index: usize) -> Result<Vec<Object>> {
    let contents = match doc.page_dict(index)?.get(b"Contents") {
        Ok(obj) => obj.clone(),
        Err(_) => return Ok(Vec::new()),
    };

    let resolved = match &contents {
        Object::Reference(id) => doc.inner().get_object(*id)?.clone(),
        other => other.clone(),
    };

    match resolved {
        Object::Array(parts) => Ok(parts),
        Object::Stream(stream) => match contents {
            Object::Reference(_) => Ok(vec![contents]),
            // Direct streams are moved into their own object
            _ => Ok(vec![Object::Reference(doc.inner_mut().add_object(stream))]),
        },
        _ => Err(Error::InvalidPdf(format!(
            "page {} /Contents is not a stream or array",
            index + 1
        ))),
    }
}
