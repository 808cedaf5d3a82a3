//! Layout analysis for PDF pages.
//!
//! Only ruling-line tables are detected: picking lists draw every cell
//! border, so the grid is recovered from painted lines alone.

pub mod table_detector;

// Re-export main types
pub use table_detector::{Edge, Orientation, Table, TableFinder, TableRow, TableSettings};
