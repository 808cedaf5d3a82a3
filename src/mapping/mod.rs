//! Mapping loader.
//!
//! Turns a spreadsheet CSV export of unknown encoding into a
//! [`MappingTable`] from item identifier to delivery-plan label.

pub mod encoding;
pub mod loader;

pub use encoding::{decode_with, DecodedText, TextEncoding, DECODE_PRIORITY};
pub use loader::{normalize_label, ColumnSelection, MappingTable};
