//! PDF writing support for the annotation overlay.
//!
//! ## Architecture
//!
//! ```text
//! RowOutcome[] per page
//!     ↓
//! [ContentStreamBuilder] (cells and labels → content stream bytes)
//!     ↓
//! [flate_stream] (FlateDecode stream object)
//!     ↓
//! page /Contents, with [AnnotationFont] installed once per document
//! ```

mod annotation_font;
mod content_stream;

pub use annotation_font::{AnnotationFont, EmbeddedFont, BUILTIN_ENCODING, BUILTIN_FONT_NAME};
pub use content_stream::{ContentStreamBuilder, OverlayOp, Paint};

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};

use crate::error::Result;

/// Compress `data` into a FlateDecode stream with the given dictionary.
pub fn flate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(Stream::new(dict, compressed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flate_stream_roundtrip() {
        let stream = flate_stream(Dictionary::new(), b"q 1 0 0 1 0 0 cm Q").unwrap();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert_eq!(stream.decompressed_content().unwrap(), b"q 1 0 0 1 0 0 cm Q");
    }
}
