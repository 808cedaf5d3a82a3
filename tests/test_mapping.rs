//! Integration tests for the mapping loader
//!
//! Covers header selection, multi-value labels, encoding detection and
//! re-serialization.

use picklist_annotator::mapping::{decode_with, ColumnSelection, MappingTable, TextEncoding};
use proptest::prelude::*;

// ============================================================================
// Parsing
// ============================================================================

mod parsing_tests {
    use super::*;

    #[test]
    fn test_last_duplicate_wins() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,P100\nA1,P200\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A1"), Some("P200"));
    }

    #[test]
    fn test_multi_line_label_is_joined() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"P100\nP200\"\n");
        assert_eq!(table.get("A1"), Some("P100 / P200"));
    }

    #[test]
    fn test_blank_lines_inside_label_are_dropped() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"  P100 \r\n\r\n\n P200  \"\n");
        assert_eq!(table.get("A1"), Some("P100 / P200"));
    }

    #[test]
    fn test_identifiers_are_trimmed_and_case_sensitive() {
        let table = MappingTable::from_text("商品ID,納品プランNo\n  a1 ,P100\n");
        assert_eq!(table.get("a1"), Some("P100"));
        assert_eq!(table.get("A1"), None);
    }

    #[test]
    fn test_header_columns_in_any_order() {
        let table = MappingTable::from_text("備考,納品プランNo,商品ID\nx,P9,B7\n");
        assert_eq!(table.get("B7"), Some("P9"));
    }

    #[test]
    fn test_leading_blank_lines_before_header_are_skipped() {
        // Reversed columns show the second line was read as the header
        let table = MappingTable::from_text("\n\r\n納品プランNo,商品ID\nP1,A1\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A1"), Some("P1"));
    }

    #[test]
    fn test_positional_fallback_without_header_vocabulary() {
        let table = MappingTable::from_text("id,plan\nA1,P100\nA2,P200\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A2"), Some("P200"));

        let cols = ColumnSelection::from_header(["id", "plan"]);
        assert!(!cols.from_header);
    }

    #[test]
    fn test_rows_without_identifier_or_label_are_skipped() {
        let table = MappingTable::from_text("商品ID,納品プランNo\n,P1\nA2,\nA3,\" \n \"\nA4\nA5,P5\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("A5"), Some("P5"));
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        assert!(MappingTable::from_bytes(b"").is_empty());
        assert!(MappingTable::from_text("商品ID,納品プランNo\n").is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nC,3\nA,1\nB,2\n");
        let ids: Vec<&str> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }
}

// ============================================================================
// Encodings
// ============================================================================

mod encoding_tests {
    use super::*;

    const CSV: &str = "商品ID,納品プランNo\n商品A,第一便\n";

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(CSV.as_bytes());

        let table = MappingTable::from_bytes(&bytes);
        assert_eq!(table.get("商品A"), Some("第一便"));
        assert_eq!(table.source_encoding(), Some(TextEncoding::Utf8Sig));
    }

    #[test]
    fn test_cp932() {
        let (bytes, _, unmappable) = encoding_rs::SHIFT_JIS.encode(CSV);
        assert!(!unmappable);
        assert!(std::str::from_utf8(&bytes).is_err());

        let table = MappingTable::from_bytes(&bytes);
        assert_eq!(table.get("商品A"), Some("第一便"));
        assert_eq!(table.source_encoding(), Some(TextEncoding::Cp932));
    }

    #[test]
    fn test_euc_jp_strategy() {
        let (bytes, _, unmappable) = encoding_rs::EUC_JP.encode(CSV);
        assert!(!unmappable);

        let decoded = decode_with(&bytes, &[TextEncoding::Utf8, TextEncoding::EucJp]);
        assert_eq!(decoded.text, CSV);
        assert_eq!(decoded.encoding, Some(TextEncoding::EucJp));
    }

    #[test]
    fn test_undecodable_bytes_fall_back_to_lossy() {
        let decoded = decode_with(b"A1,\xFF\xFE\n", &[TextEncoding::Utf8]);
        assert!(decoded.is_lossy());
        assert!(decoded.text.contains('\u{FFFD}'));
    }
}

// ============================================================================
// Re-serialization
// ============================================================================

mod export_tests {
    use super::*;

    #[test]
    fn test_to_csv_keeps_multi_value_labels() {
        let table = MappingTable::from_text("商品ID,納品プランNo\nA1,\"P100\nP200\"\nA2,P300\n");
        let csv = table.to_csv().unwrap();
        let text = String::from_utf8(csv.clone()).unwrap();
        assert!(text.starts_with("商品ID,納品プランNo\n"));
        assert!(text.contains("\"P100\nP200\""));

        let reparsed = MappingTable::from_bytes(&csv);
        assert_eq!(reparsed.get("A1"), Some("P100 / P200"));
        assert_eq!(reparsed.get("A2"), Some("P300"));
    }

    fn entry() -> impl Strategy<Value = (String, Vec<String>)> {
        (
            "[A-Za-z0-9][A-Za-z0-9-]{0,9}",
            prop::collection::vec("[A-Za-z0-9ぁ-ん]{1,6}", 1..4),
        )
    }

    proptest! {
        #[test]
        fn test_to_csv_reparses_to_same_entries(entries in prop::collection::vec(entry(), 0..20)) {
            let mut table = MappingTable::new();
            for (id, parts) in &entries {
                table.insert(id, parts.join(" / "));
            }

            let reparsed = MappingTable::from_bytes(&table.to_csv().unwrap());
            let before: Vec<(&str, &str)> = table.iter().collect();
            let after: Vec<(&str, &str)> = reparsed.iter().collect();
            prop_assert_eq!(before, after);
        }
    }
}
