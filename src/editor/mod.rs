//! Editing of picking-list documents.
//!
//! ## Architecture
//!
//! ```text
//! PickingListDocument + PageRowSet[] + MappingTable
//!     ↓
//! [OverlayCompositor::build_page] (parallel, plain data → PageOverlay)
//!     ↓
//! [OverlayCompositor::compose] (page order: widen boxes, append overlay)
//!     ↓
//! MatchSummary
//! ```

pub mod overlay;

pub use overlay::{MatchSummary, OverlayCompositor, PageMatchSummary, PageOverlay, RowOutcome};
