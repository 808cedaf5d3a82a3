//! Font handling for text extraction.
//!
//! - [`cmap`]: ToUnicode CMap parsing
//! - [`font_dict`]: code splitting, Unicode mapping and widths per font

pub mod cmap;
pub mod font_dict;

pub use cmap::{parse_tounicode_cmap, ToUnicodeMap};
pub use font_dict::{CodeScheme, DecodedGlyph, LoadedFont};
