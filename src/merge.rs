//! One annotation run: mapping + picking list → annotated picking list.

use crate::config::MergeConfig;
use crate::document::PickingListDocument;
use crate::editor::{MatchSummary, OverlayCompositor};
use crate::error::Result;
use crate::extractors::rows::{PageRowSet, TableExtractor};
use crate::mapping::{MappingTable, TextEncoding};
use crate::writer::AnnotationFont;

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// Annotated PDF
    pub pdf: Vec<u8>,
    /// Match counters
    pub summary: MatchSummary,
    /// Entries in the mapping table
    pub mapping_entries: usize,
    /// Encoding the mapping was decoded with; `None` after a lossy fallback
    pub mapping_encoding: Option<TextEncoding>,
}

/// Runs the mapping loader, table extractor and overlay compositor.
///
/// # Examples
///
/// ```no_run
/// use picklist_annotator::{MergeConfig, PickingListMerger};
///
/// # fn main() -> picklist_annotator::Result<()> {
/// let pdf = std::fs::read("picking_list.pdf")?;
/// let csv = std::fs::read("plan.csv")?;
/// let output = PickingListMerger::new(MergeConfig::default()).merge(&pdf, &csv)?;
/// println!("{}", output.summary);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PickingListMerger {
    config: MergeConfig,
}

impl PickingListMerger {
    /// Create a merger.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Annotate `pdf` with the labels in `csv`.
    ///
    /// Mapping loading and row extraction run concurrently; compositing
    /// starts once both are done. Nothing is returned unless every page
    /// was composited.
    pub fn merge(&self, pdf: &[u8], csv: &[u8]) -> Result<MergeOutput> {
        let extractor = TableExtractor::new(self.config.table, self.config.grouping);

        let (mapping, row_sets) = rayon::join(
            || MappingTable::from_bytes(csv),
            || -> Result<Vec<PageRowSet>> {
                let doc = PickingListDocument::load(pdf)?;
                extractor.extract(&doc)
            },
        );
        let row_sets = row_sets?;
        log::info!(
            "Loaded {} mapping entries ({})",
            mapping.len(),
            mapping.source_encoding().map_or("lossy utf-8", |e| e.name())
        );

        let mut doc = PickingListDocument::load(pdf)?;
        let font = AnnotationFont::resolve(self.config.font_path.as_deref());
        let compositor = OverlayCompositor::new(self.config.layout.clone(), font);
        let summary = compositor.compose(&mut doc, &row_sets, &mapping)?;

        Ok(MergeOutput {
            pdf: doc.save()?,
            summary,
            mapping_entries: mapping.len(),
            mapping_encoding: mapping.source_encoding(),
        })
    }
}
