//! Text encoding resolution for mapping files.
//!
//! Spreadsheet exports arrive as UTF-8 (with or without a BOM) or in one of
//! the legacy Japanese encodings. Each [`TextEncoding`] is tried strictly, in
//! [`DECODE_PRIORITY`] order; the first one that decodes without a single
//! malformed sequence wins. When none does, the bytes are decoded as lossy
//! UTF-8 so a garbled file degrades instead of aborting the run.

use std::borrow::Cow;

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};

/// A decoding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-8; a leading byte-order mark is stripped when present
    Utf8Sig,
    /// UTF-8 taken as-is
    Utf8,
    /// Windows code page 932 (Shift_JIS with Microsoft extensions)
    Cp932,
    /// EUC-JP
    EucJp,
}

/// Order in which strategies are attempted.
pub const DECODE_PRIORITY: [TextEncoding; 4] = [
    TextEncoding::Utf8Sig,
    TextEncoding::Utf8,
    TextEncoding::Cp932,
    TextEncoding::EucJp,
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8Sig | TextEncoding::Utf8 => UTF_8,
            // encoding_rs' Shift_JIS is the WHATWG definition, which is CP932
            TextEncoding::Cp932 => SHIFT_JIS,
            TextEncoding::EucJp => EUC_JP,
        }
    }

    /// Decode `bytes`, returning `None` on the first malformed sequence.
    pub fn try_decode<'a>(self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let input = match self {
            TextEncoding::Utf8Sig => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(input)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Cp932 => "cp932",
            TextEncoding::EucJp => "euc-jp",
        }
    }
}

/// Result of decoding a mapping file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    /// Decoded text
    pub text: String,
    /// Strategy that succeeded, `None` when the lossy fallback was used
    pub encoding: Option<TextEncoding>,
}

impl DecodedText {
    /// Whether the lossy fallback produced this text.
    pub fn is_lossy(&self) -> bool {
        self.encoding.is_none()
    }
}

/// Decode with the default strategy order.
pub fn decode(bytes: &[u8]) -> DecodedText {
    decode_with(bytes, &DECODE_PRIORITY)
}

/// Decode trying `strategies` in order, then lossy UTF-8.
pub fn decode_with(bytes: &[u8], strategies: &[TextEncoding]) -> DecodedText {
    for &strategy in strategies {
        match strategy.try_decode(bytes) {
            Some(text) => {
                log::debug!("Mapping decoded as {}", strategy.name());
                return DecodedText {
                    text: text.into_owned(),
                    encoding: Some(strategy),
                };
            },
            None => {
                log::trace!("Mapping is not valid {}", strategy.name());
            },
        }
    }

    log::warn!("Mapping matched no known encoding, decoding as lossy UTF-8");
    DecodedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom_strips_bom() {
        let decoded = decode("\u{FEFF}商品ID".as_bytes());
        assert_eq!(decoded.text, "商品ID");
        assert_eq!(decoded.encoding, Some(TextEncoding::Utf8Sig));
    }

    #[test]
    fn test_plain_utf8_taken_by_first_strategy() {
        let decoded = decode("A1,P100".as_bytes());
        assert_eq!(decoded.text, "A1,P100");
        assert_eq!(decoded.encoding, Some(TextEncoding::Utf8Sig));
    }

    #[test]
    fn test_plain_utf8_keeps_bom_when_tried_alone() {
        let decoded = decode_with("\u{FEFF}x".as_bytes(), &[TextEncoding::Utf8]);
        assert_eq!(decoded.text, "\u{FEFF}x");
    }

    #[test]
    fn test_cp932_fallback() {
        let (bytes, _, had_errors) = SHIFT_JIS.encode("納品プランNo");
        assert!(!had_errors);
        let decoded = decode(&bytes);
        assert_eq!(decoded.text, "納品プランNo");
        assert_eq!(decoded.encoding, Some(TextEncoding::Cp932));
    }

    #[test]
    fn test_euc_jp_when_cp932_fails() {
        // 0xA4 0xA2 is "あ" in EUC-JP; 0xFF is not a Shift_JIS byte
        let bytes = [0xA4, 0xA2, 0xFF];
        assert!(TextEncoding::Cp932.try_decode(&bytes).is_none());
        let decoded = decode_with(&[0xA4, 0xA2], &[TextEncoding::EucJp]);
        assert_eq!(decoded.text, "あ");
    }

    #[test]
    fn test_lossy_fallback_never_fails() {
        let bytes = [0xFF, 0xFE, 0xFD, b'a'];
        let decoded = decode_with(&bytes, &[TextEncoding::Utf8]);
        assert!(decoded.is_lossy());
        assert!(decoded.text.contains('\u{FFFD}'));
        assert!(decoded.text.ends_with('a'));
    }

    #[test]
    fn test_empty_input() {
        let decoded = decode(&[]);
        assert_eq!(decoded.text, "");
        assert!(!decoded.is_lossy());
    }
}
