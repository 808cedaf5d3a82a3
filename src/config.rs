//! Configuration for a merge run.
//!
//! Defaults reproduce the picking-list template the annotator was built
//! for. Every template measurement is a named constant so a different
//! template only needs a different [`AnnotationLayout`].

use std::path::PathBuf;

use crate::layout::table_detector::TableSettings;

/// Width in points of the appended annotation column.
pub const EXTRA_WIDTH: f32 = 75.0;

/// Right edge of the printed table on the template, in points from the page's left edge.
pub const TABLE_RIGHT: f32 = 571.8;

/// Top of the header band (extraction coordinates, y down).
pub const HEADER_BAND_TOP: f32 = 117.9;

/// Bottom of the header band (extraction coordinates, y down).
pub const HEADER_BAND_BOTTOM: f32 = 160.4;

/// Text drawn in place of a label when the identifier is not in the mapping.
pub const NOT_FOUND_SENTINEL: &str = "(該当なし)";

/// Joins the sub-labels of a multi-line mapping cell.
pub const MULTI_VALUE_SEPARATOR: &str = " / ";

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Rgb {
    /// Create a colour from 8-bit components.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// `#808080`
    pub fn grey() -> Self {
        Self::from_u8(0x80, 0x80, 0x80)
    }

    /// Pure white.
    pub fn white() -> Self {
        Self::from_u8(0xFF, 0xFF, 0xFF)
    }

    /// Pure black.
    pub fn black() -> Self {
        Self::from_u8(0, 0, 0)
    }
}

/// Where the annotation column starts horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnOrigin {
    /// At the original right edge of the page box.
    PageEdge,
    /// At a fixed offset from the page box's left edge.
    TableRight(f32),
}

/// Geometry, colours and text of the appended column.
#[derive(Debug, Clone)]
pub struct AnnotationLayout {
    /// Column width and amount every page is widened by
    pub column_width: f32,
    /// Horizontal start of the column
    pub column_origin: ColumnOrigin,
    /// Header band top (extraction coordinates)
    pub header_top: f32,
    /// Header band bottom (extraction coordinates)
    pub header_bottom: f32,
    /// Two header lines, drawn top to bottom
    pub header_lines: [String; 2],
    /// Header fill and border colour
    pub header_fill: Rgb,
    /// Header text colour
    pub header_text: Rgb,
    /// Header text size
    pub header_font_size: f32,
    /// Baseline of the first header line above the band middle
    pub header_baseline_offset: f32,
    /// Distance between the two header baselines
    pub header_line_gap: f32,
    /// Cell fill colour
    pub cell_fill: Rgb,
    /// Cell border colour
    pub cell_stroke: Rgb,
    /// Cell border width
    pub cell_line_width: f32,
    /// Cell text colour
    pub cell_text: Rgb,
    /// Label size for single-value labels
    pub font_size: f32,
    /// Label size for labels joined with [`MULTI_VALUE_SEPARATOR`]
    pub multi_value_font_size: f32,
    /// Baseline of cell text below the cell middle
    pub cell_baseline_drop: f32,
    /// Text drawn when an identifier has no label
    pub not_found: String,
}

impl Default for AnnotationLayout {
    fn default() -> Self {
        Self {
            column_width: EXTRA_WIDTH,
            column_origin: ColumnOrigin::PageEdge,
            header_top: HEADER_BAND_TOP,
            header_bottom: HEADER_BAND_BOTTOM,
            header_lines: ["納品プラン".to_string(), "No".to_string()],
            header_fill: Rgb::grey(),
            header_text: Rgb::white(),
            header_font_size: 7.0,
            header_baseline_offset: 8.0,
            header_line_gap: 12.0,
            cell_fill: Rgb::white(),
            cell_stroke: Rgb::grey(),
            cell_line_width: 0.5,
            cell_text: Rgb::black(),
            font_size: 7.0,
            multi_value_font_size: 5.5,
            cell_baseline_drop: 3.0,
            not_found: NOT_FOUND_SENTINEL.to_string(),
        }
    }
}

impl AnnotationLayout {
    /// Font size for a label.
    pub fn font_size_for(&self, label: &str) -> f32 {
        if label.contains(MULTI_VALUE_SEPARATOR) {
            self.multi_value_font_size
        } else {
            self.font_size
        }
    }

    /// Left edge of the column in PDF user space for a page whose box starts
    /// at `page_x0` and is `page_width` wide.
    pub fn column_x(&self, page_x0: f32, page_width: f32) -> f32 {
        match self.column_origin {
            ColumnOrigin::PageEdge => page_x0 + page_width,
            ColumnOrigin::TableRight(offset) => page_x0 + offset,
        }
    }
}

/// How physical grid rows fold into logical item rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGrouping {
    /// Leading grid rows that belong to the table header
    pub header_rows: usize,
    /// Physical rows per logical item
    pub stride: usize,
    /// Column holding the item identifier
    pub identifier_column: usize,
}

impl Default for RowGrouping {
    fn default() -> Self {
        Self {
            header_rows: 3,
            stride: 3,
            identifier_column: 1,
        }
    }
}

/// Configuration of one merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    /// Appended column
    pub layout: AnnotationLayout,
    /// Row folding
    pub grouping: RowGrouping,
    /// Ruling-line table detection
    pub table: TableSettings,
    /// TrueType file to embed for annotation text. `None` uses the
    /// predefined Japanese font.
    pub font_path: Option<PathBuf>,
}

impl MergeConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the column layout.
    pub fn with_layout(mut self, layout: AnnotationLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Start the column at the template's fixed table-right offset
    /// instead of the page edge.
    pub fn with_table_right_origin(mut self, enable: bool) -> Self {
        self.layout.column_origin = if enable {
            ColumnOrigin::TableRight(TABLE_RIGHT)
        } else {
            ColumnOrigin::PageEdge
        };
        self
    }

    /// Replace the row grouping.
    pub fn with_grouping(mut self, grouping: RowGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Replace the table detection settings.
    pub fn with_table_settings(mut self, table: TableSettings) -> Self {
        self.table = table;
        self
    }

    /// Embed a TrueType font for the annotation text.
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }
}
