//! ToUnicode CMap parser.
//!
//! CMap streams map character codes to Unicode. Picking lists generated by
//! Japanese form tools usually embed subset fonts whose only route back to
//! text is this map.

use regex::Regex;
use std::collections::HashMap;

/// Upper bound on codes expanded from a single bfrange line.
const MAX_RANGE: u32 = 0xFFFF;

/// Character code → Unicode map with the byte width of its source codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
    code_bytes: Option<usize>,
}

impl ToUnicodeMap {
    /// Unicode text for a character code.
    pub fn get(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Byte width of codes, taken from the first source code in the map.
    pub fn code_bytes(&self) -> Option<usize> {
        self.code_bytes
    }

    /// Number of mapped codes.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no code is mapped.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn insert(&mut self, src_hex: &str, code: u32, text: String) {
        if self.code_bytes.is_none() {
            self.code_bytes = Some(src_hex.len().div_ceil(2).max(1));
        }
        self.mappings.insert(code, text);
    }
}

/// Decode a destination hex string as UTF-16BE.
///
/// Destinations are UTF-16BE, so 8 hex digits may be a surrogate pair or
/// two BMP characters (ligatures); both decode correctly this way.
fn utf16_hex_to_string(hex: &str) -> Option<String> {
    if hex.len() <= 2 {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(String::from);
    }
    let units = hex_to_units(hex)?;
    let text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    (!text.is_empty()).then_some(text)
}

fn hex_to_units(hex: &str) -> Option<Vec<u16>> {
    let padded;
    let hex = if hex.len() % 4 != 0 {
        padded = format!("{:0>width$}", hex, width = hex.len().div_ceil(4) * 4);
        padded.as_str()
    } else {
        hex
    };
    (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect()
}

/// One lexical item inside a bfchar or bfrange block.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    Open,
    Close,
}

lazy_static::lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"<([0-9A-Fa-f]*)>|\[|\]").unwrap();
}

fn tokens(block: &str) -> Vec<Token<'_>> {
    TOKEN
        .captures_iter(block)
        .filter_map(|caps| match caps.get(1) {
            Some(hex) => Some(Token::Hex(hex.as_str())),
            None => match caps.get(0)?.as_str() {
                "[" => Some(Token::Open),
                _ => Some(Token::Close),
            },
        })
        .collect()
}

/// Bodies of every `begin<kind> ... end<kind>` block, in order.
fn blocks<'a>(content: &'a str, kind: &str) -> Vec<&'a str> {
    let open = format!("begin{}", kind);
    let close = format!("end{}", kind);
    content
        .split(open.as_str())
        .skip(1)
        .filter_map(|rest| rest.find(close.as_str()).map(|end| &rest[..end]))
        .collect()
}

/// Parse a ToUnicode CMap stream.
///
/// `bfchar` pairs and both `bfrange` destination forms are read:
///
/// ```text
/// <0041> <0041>                               bfchar
/// <0020> <007E> <0020>                        bfrange, incrementing
/// <005F> <0061> [<00660066> <00660069> ...]   bfrange, explicit list
/// ```
///
/// ```
/// use picklist_annotator::fonts::parse_tounicode_cmap;
///
/// let cmap = parse_tounicode_cmap(b"beginbfchar\n<0041> <30A2>\nendbfchar");
/// assert_eq!(cmap.get(0x41), Some("ア"));
/// assert_eq!(cmap.code_bytes(), Some(2));
/// ```
pub fn parse_tounicode_cmap(data: &[u8]) -> ToUnicodeMap {
    let text = String::from_utf8_lossy(data);
    let mut cmap = ToUnicodeMap::default();

    for block in blocks(&text, "bfchar") {
        for pair in tokens(block).chunks_exact(2) {
            let [Token::Hex(src), Token::Hex(dst)] = pair else {
                continue;
            };
            let Ok(code) = u32::from_str_radix(src, 16) else {
                continue;
            };
            if let Some(unicode) = utf16_hex_to_string(dst) {
                log::trace!("ToUnicode bfchar: 0x{:02X} -> {:?}", code, unicode);
                cmap.insert(src, code, unicode);
            }
        }
    }

    for block in blocks(&text, "bfrange") {
        read_ranges(&tokens(block), &mut cmap);
    }

    cmap
}

fn read_ranges(tokens: &[Token<'_>], cmap: &mut ToUnicodeMap) {
    let mut rest = tokens;
    while let [Token::Hex(src), Token::Hex(last), tail @ ..] = rest {
        let (Ok(first), Ok(last)) = (u32::from_str_radix(src, 16), u32::from_str_radix(last, 16)) else {
            return;
        };
        let valid = last >= first && last - first <= MAX_RANGE;
        if !valid {
            log::warn!("Ignoring ToUnicode bfrange 0x{:X}-0x{:X}", first, last);
        }

        match tail {
            [Token::Hex(dst), after @ ..] => {
                if valid {
                    incrementing_range(src, first, last, dst, cmap);
                }
                rest = after;
            },
            [Token::Open, after @ ..] => {
                let len = after.iter().position(|t| *t == Token::Close).unwrap_or(after.len());
                if valid {
                    let codes = first..=last;
                    for (code, token) in codes.zip(&after[..len]) {
                        if let Token::Hex(dst) = token {
                            if let Some(unicode) = utf16_hex_to_string(dst) {
                                cmap.insert(src, code, unicode);
                            }
                        }
                    }
                }
                rest = after.get(len + 1..).unwrap_or(&[]);
            },
            _ => return,
        }
    }
}

/// `<first> <last> <dst>`: each code adds its offset to the last UTF-16 unit.
fn incrementing_range(src: &str, first: u32, last: u32, dst: &str, cmap: &mut ToUnicodeMap) {
    let Some(base) = hex_to_units(dst) else {
        return;
    };
    for code in first..=last {
        let mut units = base.clone();
        if let Some(tail) = units.last_mut() {
            *tail = tail.wrapping_add((code - first) as u16);
        }
        let unicode: String = char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        cmap.insert(src, code, unicode);
    }
}
