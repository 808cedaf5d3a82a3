//! Picking-list fixtures built with lopdf.
//!
//! Fixture pages are A4 unless a height is given, each with one ruled table:
//! three 14pt header rows followed by items of three 12pt grid rows. The first column spans all
//! three rows of an item and the identifier sits in the second column of
//! the item's first row.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

/// Column rulings (extraction x)
pub const COLUMNS: [f32; 4] = [30.0, 90.0, 300.0, 571.8];
/// Top of the table (extraction y)
pub const TABLE_TOP: f32 = 118.0;
pub const HEADER_ROW_HEIGHT: f32 = 14.0;
pub const GRID_ROW_HEIGHT: f32 = 12.0;

/// Extraction-space top of the first item
pub fn first_item_top() -> f32 {
    TABLE_TOP + 3.0 * HEADER_ROW_HEIGHT
}

/// Extraction-space top and bottom of item `k`
pub fn item_span(k: usize) -> (f32, f32) {
    let top = first_item_top() + 3.0 * GRID_ROW_HEIGHT * k as f32;
    (top, top + 3.0 * GRID_ROW_HEIGHT)
}

/// What to draw on one fixture page.
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub items: Vec<String>,
    pub table: bool,
    pub title_box: bool,
    pub crop_box: bool,
    pub split_content: bool,
    pub height: Option<f32>,
}

impl PageSpec {
    pub fn items(ids: &[&str]) -> Self {
        Self {
            items: ids.iter().map(|s| s.to_string()).collect(),
            table: true,
            ..Default::default()
        }
    }

    /// A page with text only
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_title_box(mut self) -> Self {
        self.title_box = true;
        self
    }

    pub fn with_crop_box(mut self) -> Self {
        self.crop_box = true;
        self
    }

    pub fn with_split_content(mut self) -> Self {
        self.split_content = true;
        self
    }

    /// MediaBox `[0 0 595 height]` instead of A4
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn page_height(&self) -> f32 {
        self.height.unwrap_or(PAGE_HEIGHT)
    }
}

fn hline(out: &mut String, page_height: f32, x0: f32, x1: f32, y: f32) {
    let y = page_height - y;
    out.push_str(&format!("{} {} m {} {} l S\n", x0, y, x1, y));
}

fn vline(out: &mut String, page_height: f32, x: f32, top: f32, bottom: f32) {
    out.push_str(&format!(
        "{} {} m {} {} l S\n",
        x,
        page_height - top,
        x,
        page_height - bottom
    ));
}

/// Text whose glyph boxes start 1pt below `row_top`.
fn text_at(out: &mut String, page_height: f32, x: f32, row_top: f32, text: &str) {
    out.push_str(&format!(
        "BT /F1 9 Tf 1 0 0 1 {} {} Tm ({}) Tj ET\n",
        x,
        page_height - (row_top + 10.0),
        text
    ));
}

fn ruling_ops(layout: &PageSpec) -> String {
    let mut ops = String::from("0 0 0 RG 0.5 w\n");
    let [left, second, _, right] = COLUMNS;
    let h = layout.page_height();

    if layout.title_box {
        hline(&mut ops, h, left, 200.0, 40.0);
        hline(&mut ops, h, left, 200.0, 55.0);
        hline(&mut ops, h, left, 200.0, 70.0);
        vline(&mut ops, h, left, 40.0, 70.0);
        vline(&mut ops, h, 200.0, 40.0, 70.0);
    }

    if layout.table {
        let bottom = item_span(layout.items.len()).0;
        for row in 0..=3 {
            hline(&mut ops, h, left, right, TABLE_TOP + HEADER_ROW_HEIGHT * row as f32);
        }
        for k in 0..layout.items.len() {
            let (top, end) = item_span(k);
            hline(&mut ops, h, second, right, top + GRID_ROW_HEIGHT);
            hline(&mut ops, h, second, right, top + 2.0 * GRID_ROW_HEIGHT);
            hline(&mut ops, h, left, right, end);
        }
        for x in COLUMNS {
            vline(&mut ops, h, x, TABLE_TOP, bottom);
        }
    }
    ops
}

fn text_ops(layout: &PageSpec) -> String {
    let mut ops = String::new();
    let h = layout.page_height();
    if layout.title_box {
        text_at(&mut ops, h, 35.0, 40.0, "PICKING LIST");
    }
    if layout.table {
        text_at(&mut ops, h, 35.0, TABLE_TOP, "No");
        text_at(&mut ops, h, 95.0, TABLE_TOP, "ID");
        text_at(&mut ops, h, 305.0, TABLE_TOP, "Name");
        for (k, id) in layout.items.iter().enumerate() {
            let (top, _) = item_span(k);
            text_at(&mut ops, h, 35.0, top, &(k + 1).to_string());
            text_at(&mut ops, h, 95.0, top, id);
            text_at(&mut ops, h, 95.0, top + GRID_ROW_HEIGHT, "Product");
            text_at(&mut ops, h, 305.0, top + 2.0 * GRID_ROW_HEIGHT, "Box");
        }
    } else {
        text_at(&mut ops, h, 35.0, 100.0, "No items on this page");
    }
    ops
}

/// Build a picking-list PDF with one page per layout.
pub fn picking_list_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = picking_list_document(pages);
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture");
    out
}

/// Same as [`picking_list_pdf`] without serializing.
pub fn picking_list_document(pages: &[PageSpec]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for layout in pages {
        let rulings = ruling_ops(layout).into_bytes();
        let text = text_ops(layout).into_bytes();
        let contents: Object = if layout.split_content {
            let a = doc.add_object(Stream::new(dictionary! {}, rulings));
            let b = doc.add_object(Stream::new(dictionary! {}, text));
            Object::Array(vec![a.into(), b.into()])
        } else {
            let mut all = rulings;
            all.extend(text);
            doc.add_object(Stream::new(dictionary! {}, all)).into()
        };

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_WIDTH), Object::Real(layout.page_height())],
            "Contents" => contents,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        };
        if layout.crop_box {
            page.set(
                "CropBox",
                vec![10.into(), 10.into(), Object::Real(585.0), Object::Real(832.0)],
            );
        }
        kids.push(doc.add_object(page).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// UTF-8 mapping CSV with the export header.
pub fn mapping_csv(rows: &[(&str, &str)]) -> String {
    let mut out = String::from("商品ID,納品プランNo\n");
    for (id, label) in rows {
        if label.contains('\n') || label.contains(',') {
            out.push_str(&format!("{},\"{}\"\n", id, label));
        } else {
            out.push_str(&format!("{},{}\n", id, label));
        }
    }
    out
}

/// Numeric entries of a page box.
pub fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let arr = page.get(key).ok()?.as_array().ok()?;
    let mut out = [0.0; 4];
    for (slot, obj) in out.iter_mut().zip(arr) {
        *slot = match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => return None,
        };
    }
    Some(out)
}

/// Object ids in a page's /Contents, in order.
pub fn content_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let page = match doc.get_object(page_id).and_then(|o| o.as_dict()) {
        Ok(page) => page,
        Err(_) => return Vec::new(),
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![*id],
        Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => Vec::new(),
    }
}

/// Decoded bytes of a stream object.
pub fn stream_content(doc: &Document, id: ObjectId) -> Vec<u8> {
    let stream = doc
        .get_object(id)
        .and_then(|o| o.as_stream())
        .expect("content stream");
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}
