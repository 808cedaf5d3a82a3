//! Extraction of marks and item rows from picking-list pages.
//!
//! - [`paths`]: painted segments for ruling-line detection
//! - [`text`]: positioned characters and cell text
//! - [`rows`]: item rows of the page's data table

pub mod paths;
pub mod rows;
pub mod text;

pub use paths::{PathExtractor, Segment};
pub use rows::{rows_from_table, PageRowSet, RowCursor, RowDescriptor, TableExtractor};
pub use text::{chars_to_text, PageChar, TextExtractor};
