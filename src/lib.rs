//! # Picklist Annotator
//!
//! Appends a delivery-plan column to warehouse picking lists.
//!
//! A picking list is a multi-page PDF with one ruled table per page; every
//! item occupies three grid rows and carries its identifier in the second
//! column. A spreadsheet export maps identifiers to delivery-plan labels.
//! The annotator widens every page, draws a labelled cell next to each item
//! and reports how many items found a label.
//!
//! ## Pipeline
//!
//! ```text
//! CSV bytes ──[mapping]──────────────────────┐
//!                                            ├─[editor::overlay]─→ PDF bytes + MatchSummary
//! PDF bytes ──[extractors::rows]─────────────┘
//!               ├ content::interpreter (painted segments, shown characters)
//!               ├ fonts (character codes → Unicode, widths)
//!               └ layout::table_detector (ruling lines → cells → rows)
//! ```
//!
//! The two inputs are processed concurrently with `rayon`; compositing
//! waits for both.
//!
//! ## Quick Start
//!
//! ```no_run
//! use picklist_annotator::{MergeConfig, PickingListMerger};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pdf = std::fs::read("picking_list.pdf")?;
//! let csv = std::fs::read("delivery_plan.csv")?;
//!
//! let config = MergeConfig::new().with_table_right_origin(false);
//! let output = PickingListMerger::new(config).merge(&pdf, &csv)?;
//!
//! std::fs::write("annotated.pdf", &output.pdf)?;
//! println!("{}", output.summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry and document access
pub mod document;
pub mod geometry;

// Mapping loader
pub mod mapping;

// Table extraction
pub mod content;
pub mod extractors;
pub mod fonts;
pub mod layout;

// Overlay compositing
pub mod editor;
pub mod writer;

// Orchestration
pub mod merge;

pub use config::{AnnotationLayout, ColumnOrigin, MergeConfig, RowGrouping};
pub use document::PickingListDocument;
pub use editor::{MatchSummary, OverlayCompositor, PageMatchSummary, RowOutcome};
pub use error::{Error, Result};
pub use extractors::{PageRowSet, RowDescriptor, TableExtractor};
pub use layout::TableSettings;
pub use mapping::MappingTable;
pub use merge::{MergeOutput, PickingListMerger};

pub(crate) mod utils {
    //! Small helpers shared across modules.

    use std::cmp::Ordering;

    /// Total order for coordinates: NaN sorts after every number so a
    /// corrupt operand cannot make a sort panic or scramble.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        a.partial_cmp(&b)
            .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
    }

}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_metadata() {
        assert!(VERSION.starts_with("0."));
        assert_eq!(NAME, "picklist_annotator");
    }
}
