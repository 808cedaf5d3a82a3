//! Identifier → label table parsed from a spreadsheet CSV export.

use indexmap::IndexMap;

use crate::config::MULTI_VALUE_SEPARATOR;
use crate::error::Result;
use crate::mapping::encoding::{self, TextEncoding};

/// Header names accepted for the identifier column.
pub const IDENTIFIER_HEADERS: [&str; 2] = ["商品ID", "商品コード"];

/// Header names accepted for the label column.
pub const LABEL_HEADERS: [&str; 3] = ["納品プランNo", "プランNo", "ラベル"];

/// Header written by [`MappingTable::to_csv`].
const EXPORT_HEADER: [&str; 2] = ["商品ID", "納品プランNo"];

/// Column indices chosen from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Identifier column
    pub identifier: usize,
    /// Label column
    pub label: usize,
    /// Whether both came from the header (`false` for the positional fallback)
    pub from_header: bool,
}

impl ColumnSelection {
    const POSITIONAL: ColumnSelection = ColumnSelection {
        identifier: 0,
        label: 1,
        from_header: false,
    };

    /// Pick columns by header vocabulary. A repeated header name resolves to
    /// its last occurrence; a missing one selects columns 0 and 1.
    pub fn from_header<'a>(header: impl IntoIterator<Item = &'a str>) -> Self {
        let mut identifier = None;
        let mut label = None;

        for (i, name) in header.into_iter().enumerate() {
            let name = name.trim();
            if IDENTIFIER_HEADERS.contains(&name) {
                identifier = Some(i);
            } else if LABEL_HEADERS.contains(&name) {
                label = Some(i);
            }
        }

        match (identifier, label) {
            (Some(identifier), Some(label)) => ColumnSelection {
                identifier,
                label,
                from_header: true,
            },
            _ => {
                log::warn!("Mapping header lacks identifier or label column, using columns 0 and 1");
                Self::POSITIONAL
            },
        }
    }

    fn width(&self) -> usize {
        self.identifier.max(self.label) + 1
    }
}

/// Normalise a label cell: split on line breaks, trim each part, drop empty
/// parts and join the rest with [`MULTI_VALUE_SEPARATOR`].
///
/// Returns `None` when nothing survives.
///
/// # Examples
///
/// ```
/// use picklist_annotator::mapping::normalize_label;
///
/// assert_eq!(normalize_label("P100\nP200").as_deref(), Some("P100 / P200"));
/// assert_eq!(normalize_label(" P1 \r\n\r\n P1 ").as_deref(), Some("P1 / P1"));
/// assert_eq!(normalize_label("\n \n"), None);
/// ```
pub fn normalize_label(cell: &str) -> Option<String> {
    let parts: Vec<&str> = cell
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(MULTI_VALUE_SEPARATOR))
    }
}

/// Lookup table from item identifier to delivery-plan label.
///
/// Identifiers are trimmed and case-sensitive. Insertion order is kept so the
/// table re-serializes in the order it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: IndexMap<String, String>,
    encoding: Option<TextEncoding>,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw CSV bytes of unknown encoding.
    ///
    /// Never fails: undecodable bytes, a missing header or short records
    /// degrade to fewer (possibly zero) entries.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let decoded = encoding::decode(bytes);
        let mut table = Self::from_text(&decoded.text);
        table.encoding = decoded.encoding;
        table
    }

    /// Parse already-decoded CSV text.
    ///
    /// Blank lines are skipped, so the header is the first non-blank line.
    pub fn from_text(text: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let header = match records.next() {
            Some(Ok(header)) if !header.is_empty() => header,
            Some(Err(e)) => {
                log::warn!("Mapping header unreadable: {}", e);
                return Self::new();
            },
            _ => return Self::new(),
        };

        let columns = ColumnSelection::from_header(header.iter());
        log::debug!(
            "Mapping columns: identifier={}, label={}",
            columns.identifier,
            columns.label
        );

        let mut table = Self::new();
        for (line, record) in records.enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping unreadable mapping record {}: {}", line + 2, e);
                    continue;
                },
            };
            if record.len() < columns.width() {
                continue;
            }

            let identifier = record.get(columns.identifier).unwrap_or("").trim();
            let label = record.get(columns.label).unwrap_or("").trim();
            if identifier.is_empty() || label.is_empty() {
                continue;
            }

            if let Some(label) = normalize_label(label) {
                table.insert(identifier, label);
            }
        }

        log::info!("Loaded {} mapping entries", table.len());
        table
    }

    /// Insert or replace an entry. The identifier is trimmed.
    pub fn insert(&mut self, identifier: &str, label: String) {
        self.entries.insert(identifier.trim().to_string(), label);
    }

    /// Label for an identifier.
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encoding the source bytes were decoded with, if known.
    pub fn source_encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    /// Serialize as UTF-8 CSV with a `商品ID,納品プランNo` header.
    ///
    /// Multi-value labels are written back on separate lines inside one
    /// quoted cell, the shape the spreadsheet export produces, so parsing the
    /// output yields an identical table.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new().from_writer(&mut out);
            writer.write_record(EXPORT_HEADER)?;
            for (identifier, label) in self.iter() {
                let cell = label.replace(MULTI_VALUE_SEPARATOR, "\n");
                writer.write_record([identifier, cell.as_str()])?;
            }
            writer.flush()?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_vocabulary() {
        let table = MappingTable::from_text("メモ,商品コード,ラベル\nx,A1,P100\n");
        assert_eq!(table.get("A1"), Some("P100"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let cols = ColumnSelection::from_header([" プランNo ", "商品ID "]);
        assert_eq!(cols.identifier, 1);
        assert_eq!(cols.label, 0);
        assert!(cols.from_header);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let cols = ColumnSelection::from_header(["商品ID", "納品プランNo", "商品コード"]);
        assert_eq!(cols.identifier, 2);
        assert_eq!(cols.label, 1);
    }

    #[test]
    fn test_positional_fallback() {
        let table = MappingTable::from_text("id,plan\nA1,P100\n");
        assert_eq!(table.get("A1"), Some("P100"));

        let cols = ColumnSelection::from_header(["商品ID", "数量"]);
        assert!(!cols.from_header);
        assert_eq!((cols.identifier, cols.label), (0, 1));
    }

    #[test]
    fn test_last_write_wins_across_rows() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,P100\nA1,P200\n");
        assert_eq!(table.get("A1"), Some("P200"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_multi_line_cell_joined() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"P100\nP200\"\n");
        assert_eq!(table.get("A1"), Some("P100 / P200"));
    }

    #[test]
    fn test_multi_line_cell_keeps_duplicates() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"P100\r\nP100\"\n");
        assert_eq!(table.get("A1"), Some("P100 / P100"));
    }

    #[test]
    fn test_rows_skipped() {
        let text = "商品ID,納品プランNo\n,P1\nA2,\nA3\nA4,\" \n \"\nA5 ,  P5  \n";
        let table = MappingTable::from_text(text);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A5"), Some("P5"));
        assert_eq!(table.get("A4"), None);
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nabc,P1\n");
        assert_eq!(table.get("abc"), Some("P1"));
        assert_eq!(table.get("ABC"), None);
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(MappingTable::from_bytes(b"").is_empty());
        assert!(MappingTable::from_bytes("商品ID,納品プランNo\n".as_bytes()).is_empty());
        assert!(MappingTable::from_bytes(b"\n\n").is_empty());
    }

    #[test]
    fn test_from_bytes_records_encoding() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("商品ID,納品プランNo\nＡ１,プラン１\n");
        let table = MappingTable::from_bytes(&bytes);
        assert_eq!(table.get("Ａ１"), Some("プラン１"));
        assert_eq!(table.source_encoding(), Some(TextEncoding::Cp932));
    }

    #[test]
    fn test_insertion_order_kept() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nB,2\nA,1\nC,3\nB,4\n");
        let ids: Vec<&str> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert_eq!(table.get("B"), Some("4"));
    }

    #[test]
    fn test_to_csv_round_trip() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"P1\nP2\"\n\"B,2\",\"say \"\"hi\"\"\"\n");
        assert_eq!(table.get("B,2"), Some("say \"hi\""));

        let csv = table.to_csv().unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert!(text.starts_with("商品ID,納品プランNo\n"));

        let reparsed = MappingTable::from_text(&text);
        assert_eq!(reparsed.entries, table.entries);
    }
}
