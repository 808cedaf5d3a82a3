//! Item rows of a picking-list table.
//!
//! Each page's last ruled table is read as a grid; after the header rows,
//! every item spans a fixed number of grid rows and starts with a row whose
//! left-most cell is present. [`RowCursor`] walks the grid accordingly and
//! [`TableExtractor`] turns each item into a [`RowDescriptor`].

use crate::config::RowGrouping;
use crate::content::interpret_page;
use crate::document::PickingListDocument;
use crate::error::Result;
use crate::extractors::text::PageChar;
use crate::layout::table_detector::{Table, TableFinder, TableSettings};

/// One item row in extraction coordinates (top-left origin, y down).
#[derive(Debug, Clone, PartialEq)]
pub struct RowDescriptor {
    /// Trimmed identifier text; empty when the cell is missing or blank
    pub identifier: String,
    /// Top edge of the item's first grid row
    pub top: f32,
    /// Bottom edge of the item's first grid row
    pub bottom: f32,
}

/// Item rows of one page, top to bottom.
pub type PageRowSet = Vec<RowDescriptor>;

/// Walks grid rows and yields the indices that start an item.
///
/// Starting after the header rows: a row whose left-most cell is present
/// starts an item and the cursor jumps a full item stride; any other row is
/// stepped over one at a time.
///
/// # Examples
///
/// ```
/// use picklist_annotator::config::RowGrouping;
/// use picklist_annotator::extractors::rows::RowCursor;
///
/// let present = [true, true, true, true, false, false, false, true, false, false];
/// let rows: Vec<usize> = RowCursor::new(&present, &RowGrouping::default()).collect();
/// assert_eq!(rows, vec![3, 7]);
/// ```
#[derive(Debug, Clone)]
pub struct RowCursor<'a> {
    present: &'a [bool],
    position: usize,
    stride: usize,
}

impl<'a> RowCursor<'a> {
    /// Cursor over a left-most-cell presence pattern.
    pub fn new(present: &'a [bool], grouping: &RowGrouping) -> Self {
        Self {
            present,
            position: grouping.header_rows,
            stride: grouping.stride.max(1),
        }
    }
}

impl Iterator for RowCursor<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.position < self.present.len() {
            let row = self.position;
            if self.present[row] {
                self.position += self.stride;
                return Some(row);
            }
            self.position += 1;
        }
        None
    }
}

/// Fold a detected table into item rows.
pub fn rows_from_table(
    table: &Table,
    chars: &[PageChar],
    settings: &TableSettings,
    grouping: &RowGrouping,
) -> PageRowSet {
    let rows = table.rows();
    let text = table.extract(chars, settings);
    let present: Vec<bool> = rows
        .iter()
        .map(|row| matches!(row.cells.first(), Some(Some(_))))
        .collect();

    RowCursor::new(&present, grouping)
        .filter_map(|index| {
            let first = rows[index].cells.first().copied().flatten()?;
            let identifier = text
                .get(index)
                .and_then(|row| row.get(grouping.identifier_column))
                .and_then(|cell| cell.as_deref())
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            Some(RowDescriptor {
                identifier,
                top: first.top(),
                bottom: first.bottom(),
            })
        })
        .collect()
}

/// Rows left without an identifier on a page that also showed glyphs with
/// no Unicode text. Such rows are unmatched but cannot be reported by name.
fn undecoded_rows(rows: &[RowDescriptor], unmapped_glyphs: usize) -> usize {
    if unmapped_glyphs == 0 {
        return 0;
    }
    rows.iter().filter(|row| row.identifier.is_empty()).count()
}

/// Extracts item rows from every page of a picking list.
#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
    settings: TableSettings,
    grouping: RowGrouping,
}

impl TableExtractor {
    /// Create an extractor.
    pub fn new(settings: TableSettings, grouping: RowGrouping) -> Self {
        Self { settings, grouping }
    }

    /// One row set per page, in page order.
    ///
    /// A page without a MediaBox is an error. A page whose content cannot be
    /// read, or that has no table, yields an empty set.
    pub fn extract(&self, doc: &PickingListDocument) -> Result<Vec<PageRowSet>> {
        let sets: Vec<PageRowSet> = (0..doc.page_count())
            .map(|index| self.extract_page(doc, index))
            .collect::<Result<_>>()?;

        let total: usize = sets.iter().map(Vec::len).sum();
        log::info!("Extracted {} rows from {} pages", total, sets.len());
        Ok(sets)
    }

    /// Row set of a single page (0-based index).
    pub fn extract_page(&self, doc: &PickingListDocument, index: usize) -> Result<PageRowSet> {
        let geometry = doc.geometry(index)?;
        let page_box = geometry.media_box;

        let marks = doc
            .content_bytes(index)
            .and_then(|content| {
                let resources = doc.resources(index)?;
                interpret_page(doc.inner(), page_box, &content, &resources)
            });
        let marks = match marks {
            Ok(marks) => marks,
            Err(e) => {
                log::warn!("Page {}: unreadable content, no rows extracted: {}", index + 1, e);
                return Ok(PageRowSet::new());
            },
        };

        let finder = TableFinder::new(&marks.segments, &page_box, self.settings);
        let tables = finder.find_tables();
        let Some(table) = tables.last() else {
            log::debug!("Page {}: no table", index + 1);
            return Ok(PageRowSet::new());
        };
        if tables.len() > 1 {
            log::debug!("Page {}: {} tables, using the last", index + 1, tables.len());
        }

        let rows = rows_from_table(table, &marks.chars, &self.settings, &self.grouping);
        log::debug!("Page {}: {} rows", index + 1, rows.len());
        let undecoded = undecoded_rows(&rows, marks.unmapped_glyphs);
        if undecoded > 0 {
            log::warn!(
                "Page {}: {} rows have no identifier text, {} glyphs have no Unicode mapping",
                index + 1,
                undecoded,
                marks.unmapped_glyphs
            );
        }
        Ok(rows)
    }
}
