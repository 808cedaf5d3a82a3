//! Font dictionaries as the text extractor needs them.
//!
//! A [`LoadedFont`] splits a shown string into character codes, maps each
//! code to Unicode and reports its advance width. Placement only needs
//! widths and the descent; glyph outlines are never read.

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_16BE, WINDOWS_1252};
use lopdf::{Dictionary, Document, Object};

use crate::document::{object_to_f32, resolve, resolve_dict, stream_bytes};
use crate::fonts::cmap::{parse_tounicode_cmap, ToUnicodeMap};

/// Width used for simple fonts without a usable /Widths entry.
const DEFAULT_SIMPLE_WIDTH: f32 = 500.0;

/// Default /DW for CID fonts.
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// How a shown string is cut into character codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeScheme {
    /// One byte per code (simple fonts)
    SingleByte,
    /// Two bytes per code (Identity-H/V, UCS-2 and UTF-16 CMaps)
    TwoByte,
    /// Shift_JIS lead bytes open a two-byte code (`*RKSJ*` CMaps)
    ShiftJis,
    /// EUC-JP multi-byte rules (`*EUC*` CMaps)
    EucJp,
}

impl CodeScheme {
    /// Pick a scheme from a predefined CMap name.
    ///
    /// # Examples
    ///
    /// ```
    /// use picklist_annotator::fonts::CodeScheme;
    ///
    /// assert_eq!(CodeScheme::from_cmap_name("90ms-RKSJ-H"), CodeScheme::ShiftJis);
    /// assert_eq!(CodeScheme::from_cmap_name("Identity-H"), CodeScheme::TwoByte);
    /// ```
    pub fn from_cmap_name(name: &str) -> Self {
        if name.contains("RKSJ") {
            CodeScheme::ShiftJis
        } else if name.contains("EUC") {
            CodeScheme::EucJp
        } else {
            CodeScheme::TwoByte
        }
    }

    fn code_len(self, bytes: &[u8]) -> usize {
        let first = bytes[0];
        let len = match self {
            CodeScheme::SingleByte => 1,
            CodeScheme::TwoByte => 2,
            CodeScheme::ShiftJis => match first {
                0x81..=0x9F | 0xE0..=0xFC => 2,
                _ => 1,
            },
            CodeScheme::EucJp => match first {
                0x8F => 3,
                0x8E | 0xA1..=0xFE => 2,
                _ => 1,
            },
        };
        len.min(bytes.len())
    }

    /// Split raw string bytes into codes.
    pub fn split<'a>(self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        let mut codes = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let (code, tail) = rest.split_at(self.code_len(rest));
            codes.push(code);
            rest = tail;
        }
        codes
    }
}

fn code_value(code: &[u8]) -> u32 {
    code.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    /// Code value
    pub code: u32,
    /// Unicode text (may be empty when unmappable)
    pub text: String,
    /// Advance width in glyph space (1/1000 text space units)
    pub width: f32,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_word_space: bool,
}

/// A font resolved from a page's resource dictionary.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    /// BaseFont name
    pub base_font: String,
    scheme: CodeScheme,
    legacy: Option<&'static Encoding>,
    to_unicode: Option<ToUnicodeMap>,
    /// Simple fonts: FirstChar and widths
    first_char: u32,
    widths: Vec<f32>,
    /// CID fonts: explicit widths by CID
    cid_widths: Vec<(u32, u32, f32)>,
    cid_identity: bool,
    default_width: f32,
    /// Descent in glyph space (negative below baseline)
    pub descent: f32,
}

impl LoadedFont {
    /// A font with no dictionary behind it: single byte WinAnsi, default widths.
    pub fn fallback() -> Self {
        Self {
            base_font: String::new(),
            scheme: CodeScheme::SingleByte,
            legacy: Some(WINDOWS_1252),
            to_unicode: None,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: Vec::new(),
            cid_identity: false,
            default_width: DEFAULT_SIMPLE_WIDTH,
            descent: 0.0,
        }
    }

    /// Resolve a font dictionary.
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = name_of(doc, dict, b"Subtype").unwrap_or_default();
        let base_font = name_of(doc, dict, b"BaseFont").unwrap_or_default();

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| stream_bytes(stream).ok())
            .map(|data| parse_tounicode_cmap(&data))
            .filter(|cmap| !cmap.is_empty());

        let font = if subtype == "Type0" {
            Self::composite(doc, dict, base_font, to_unicode)
        } else {
            Self::simple(doc, dict, base_font, to_unicode)
        };
        log::trace!(
            "Loaded font {} ({:?}, descent {})",
            font.base_font,
            font.scheme,
            font.descent
        );
        font
    }

    fn simple(doc: &Document, dict: &Dictionary, base_font: String, to_unicode: Option<ToUnicodeMap>) -> Self {
        let first_char = number_of(doc, dict, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
        let widths = dict
            .get(b"Widths")
            .ok()
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| resolve(doc, w).ok().and_then(object_to_f32).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let descriptor = resolve_dict(doc, dict, b"FontDescriptor");
        let default_width = descriptor
            .and_then(|d| number_of(doc, d, b"MissingWidth"))
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_SIMPLE_WIDTH);

        Self {
            base_font,
            scheme: CodeScheme::SingleByte,
            legacy: Some(WINDOWS_1252),
            to_unicode,
            first_char,
            widths,
            cid_widths: Vec::new(),
            cid_identity: false,
            default_width,
            descent: descriptor.and_then(|d| number_of(doc, d, b"Descent")).unwrap_or(0.0),
        }
    }

    fn composite(doc: &Document, dict: &Dictionary, base_font: String, to_unicode: Option<ToUnicodeMap>) -> Self {
        // An embedded CMap stream has no name; its codes are treated as two bytes
        let cmap_name = name_of(doc, dict, b"Encoding").unwrap_or_default();
        let scheme = CodeScheme::from_cmap_name(&cmap_name);
        let legacy = match scheme {
            CodeScheme::ShiftJis => Some(SHIFT_JIS),
            CodeScheme::EucJp => Some(EUC_JP),
            _ if cmap_name.contains("UCS2") || cmap_name.contains("UTF16") => Some(UTF_16BE),
            _ => None,
        };

        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_dict().ok());

        let default_width = descendant
            .and_then(|d| number_of(doc, d, b"DW"))
            .unwrap_or(DEFAULT_CID_WIDTH);
        let cid_widths = descendant
            .and_then(|d| d.get(b"W").ok())
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| parse_cid_widths(doc, arr))
            .unwrap_or_default();
        let descent = descendant
            .and_then(|d| resolve_dict(doc, d, b"FontDescriptor"))
            .and_then(|d| number_of(doc, d, b"Descent"))
            .unwrap_or(0.0);

        Self {
            base_font,
            scheme,
            legacy,
            to_unicode,
            first_char: 0,
            widths: Vec::new(),
            cid_widths,
            cid_identity: cmap_name.starts_with("Identity"),
            default_width,
            descent,
        }
    }

    /// Code splitting scheme.
    pub fn scheme(&self) -> CodeScheme {
        self.scheme
    }

    fn width_of(&self, code: u32) -> f32 {
        if self.scheme == CodeScheme::SingleByte {
            return code
                .checked_sub(self.first_char)
                .and_then(|i| self.widths.get(i as usize))
                .copied()
                .filter(|w| *w > 0.0)
                .unwrap_or(self.default_width);
        }
        if !self.cid_identity {
            // CID unknown without the predefined CMap's tables
            return self.default_width;
        }
        self.cid_widths
            .iter()
            .find(|(first, last, _)| (*first..=*last).contains(&code))
            .map(|(_, _, w)| *w)
            .unwrap_or(self.default_width)
    }

    fn text_of(&self, code: &[u8], value: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|cmap| cmap.get(value)) {
            return text.to_string();
        }
        match self.legacy {
            Some(encoding) => {
                let (text, _) = encoding.decode_without_bom_handling(code);
                text.into_owned()
            },
            None => String::new(),
        }
    }

    /// Decode a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let scheme = match (self.scheme, self.to_unicode.as_ref().and_then(|c| c.code_bytes())) {
            // A one-byte ToUnicode on a composite font means its CMap is one-byte too
            (CodeScheme::TwoByte, Some(1)) if !self.cid_identity => CodeScheme::SingleByte,
            (scheme, _) => scheme,
        };

        scheme
            .split(bytes)
            .into_iter()
            .map(|code| {
                let value = code_value(code);
                DecodedGlyph {
                    code: value,
                    text: self.text_of(code, value),
                    width: self.width_of(value),
                    is_word_space: code == [32],
                }
            })
            .collect()
    }
}

/// Parse a CID font /W array into `(first, last, width)` runs.
///
/// Two forms: `c [w1 w2 ...]` and `c_first c_last w`.
fn parse_cid_widths(doc: &Document, arr: &[Object]) -> Vec<(u32, u32, f32)> {
    let mut runs = Vec::new();
    let items: Vec<&Object> = arr.iter().filter_map(|o| resolve(doc, o).ok()).collect();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = object_to_f32(items[i]).map(|v| v as u32) else {
            break;
        };
        match items.get(i + 1) {
            Some(Object::Array(widths)) => {
                for (offset, w) in widths.iter().enumerate() {
                    if let Some(w) = resolve(doc, w).ok().and_then(object_to_f32) {
                        let cid = first + offset as u32;
                        runs.push((cid, cid, w));
                    }
                }
                i += 2;
            },
            Some(last) => {
                let last = object_to_f32(last).map(|v| v as u32);
                let width = items.get(i + 2).and_then(|w| object_to_f32(w));
                if let (Some(last), Some(width)) = (last, width) {
                    runs.push((first, last, width));
                }
                i += 3;
            },
            None => break,
        }
    }
    runs
}

fn name_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = resolve(doc, dict.get(key).ok()?).ok()?;
    obj.as_name()
        .ok()
        .map(|name| String::from_utf8_lossy(name).into_owned())
}

fn number_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    object_to_f32(resolve(doc, dict.get(key).ok()?).ok()?)
}
