//! Font used for annotation text.
//!
//! Two flavours are supported:
//!
//! - [`AnnotationFont::Builtin`]: the predefined Japanese CID font
//!   `HeiseiKakuGo-W5` addressed through `UniJIS-UCS2-HW-H`. Nothing is
//!   embedded; viewers substitute a system font. Text is written as UCS-2.
//! - [`AnnotationFont::Embedded`]: a TrueType file embedded as a
//!   `CIDFontType2` with `Identity-H` encoding. Text is written as glyph IDs,
//!   and widths plus a ToUnicode CMap are generated for the glyphs in use.
//!
//! Fonts are process-wide values: the builtin one is created once and each
//! TrueType file is parsed once per path, then shared by every later run.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use lopdf::{dictionary, Document, Object, ObjectId};
use ttf_parser::{Face, GlyphId};

use crate::error::{Error, Result};
use crate::writer::flate_stream;

/// PostScript name of the predefined font.
pub const BUILTIN_FONT_NAME: &str = "HeiseiKakuGo-W5";

/// Predefined CMap for UCS-2 input with half-width Latin.
pub const BUILTIN_ENCODING: &str = "UniJIS-UCS2-HW-H";

/// Width of half-width glyphs (CIDs 231..=325 in Adobe-Japan1).
const HALF_WIDTH: u16 = 500;

/// Width of everything else.
const FULL_WIDTH: u16 = 1000;

static BUILTIN: OnceLock<Arc<AnnotationFont>> = OnceLock::new();

static EMBEDDED: OnceLock<Mutex<HashMap<PathBuf, Arc<AnnotationFont>>>> = OnceLock::new();

/// A TrueType font prepared for embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    /// PostScript name
    name: String,
    /// Raw font file
    data: Vec<u8>,
    /// Unicode → glyph ID
    glyphs: HashMap<char, u16>,
    /// Glyph ID → advance in 1/1000 em
    widths: HashMap<u16, u16>,
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
    flags: i64,
}

impl EmbeddedFont {
    /// Parse a TrueType/OpenType file. Font collections are rejected.
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Font("font file is empty".to_string()));
        }
        if data.starts_with(b"ttcf") {
            return Err(Error::Font("font collections are not supported".to_string()));
        }

        let face = Face::parse(&data, 0).map_err(|e| Error::Font(format!("failed to parse font: {}", e)))?;
        let units_per_em = i64::from(face.units_per_em().max(1));
        let scale = |v: i16| i64::from(v) * 1000 / units_per_em;

        let mut glyphs = HashMap::new();
        let mut widths = HashMap::new();
        for codepoint in 0..=0xFFFF_u32 {
            let Some(c) = char::from_u32(codepoint) else {
                continue;
            };
            if let Some(gid) = face.glyph_index(c) {
                glyphs.insert(c, gid.0);
                let advance = face.glyph_hor_advance(GlyphId(gid.0)).unwrap_or(0);
                widths.insert(gid.0, (i64::from(advance) * 1000 / units_per_em) as u16);
            }
        }

        let name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| n.replace(' ', ""))
            .unwrap_or_else(|| "AnnotationFont".to_string());

        let bbox = face.global_bounding_box();
        let bbox = [scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max)];
        let ascent = scale(face.ascender());
        let descent = scale(face.descender());
        let cap_height = scale(face.capital_height().unwrap_or(face.ascender()));
        let mut flags = 32;
        if face.is_monospaced() {
            flags |= 1;
        }
        if face.is_italic() {
            flags |= 64;
        }
        log::debug!("Parsed font {} with {} mapped characters", name, glyphs.len());

        Ok(Self {
            name,
            data,
            glyphs,
            widths,
            ascent,
            descent,
            cap_height,
            bbox,
            flags,
        })
    }

    /// PostScript name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glyph ID of a character, if the font covers it.
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.glyphs.get(&c).copied()
    }

    fn glyph_width(&self, gid: u16) -> u16 {
        self.widths.get(&gid).copied().unwrap_or(FULL_WIDTH)
    }

    fn font_dict(&self, doc: &mut Document, used: &BTreeMap<u16, char>) -> Result<Object> {
        let file = flate_stream(
            dictionary! { "Length1" => self.data.len() as i64 },
            &self.data,
        )?;
        let file_id = doc.add_object(file);

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.name.as_bytes().to_vec()),
            "Flags" => self.flags,
            "FontBBox" => self.bbox.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => self.ascent,
            "Descent" => self.descent,
            "CapHeight" => self.cap_height,
            "StemV" => 80,
            "FontFile2" => file_id,
        });

        let to_unicode = flate_stream(dictionary! {}, tounicode_cmap(used).as_bytes())?;
        let to_unicode_id = doc.add_object(to_unicode);

        let descendant = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(self.name.as_bytes().to_vec()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => i64::from(FULL_WIDTH),
            "W" => self.widths_array(used),
            "CIDToGIDMap" => "Identity",
        };

        Ok(Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(self.name.as_bytes().to_vec()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Dictionary(descendant)],
            "ToUnicode" => to_unicode_id,
        }))
    }

    /// `W` array for the used glyphs, consecutive IDs sharing one entry.
    fn widths_array(&self, used: &BTreeMap<u16, char>) -> Vec<Object> {
        let mut array = Vec::new();
        let mut run: Vec<Object> = Vec::new();
        let mut run_start: Option<u16> = None;
        let mut previous: Option<u16> = None;

        for &gid in used.keys() {
            if previous.and_then(|p| p.checked_add(1)) != Some(gid) {
                if let Some(start) = run_start {
                    array.push(Object::Integer(i64::from(start)));
                    array.push(Object::Array(std::mem::take(&mut run)));
                }
                run_start = Some(gid);
            }
            run.push(Object::Integer(i64::from(self.glyph_width(gid))));
            previous = Some(gid);
        }
        if let Some(start) = run_start {
            array.push(Object::Integer(i64::from(start)));
            array.push(Object::Array(run));
        }
        array
    }
}

/// ToUnicode CMap for glyph IDs in use.
fn tounicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::new();

    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let mappings: Vec<(&u16, &char)> = used.iter().collect();
    // At most 100 entries per bfchar section
    for chunk in mappings.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\nend\n");
    cmap
}

/// Font in which header and label text is drawn.
#[derive(Debug, Clone)]
pub enum AnnotationFont {
    /// Predefined, non-embedded Japanese CID font
    Builtin,
    /// Embedded TrueType font
    Embedded(EmbeddedFont),
}

impl AnnotationFont {
    /// Shared builtin font.
    pub fn builtin() -> Arc<AnnotationFont> {
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(AnnotationFont::Builtin)))
    }

    /// Load a TrueType file for embedding.
    pub fn from_file(path: &Path) -> Result<AnnotationFont> {
        let data = std::fs::read(path)?;
        Ok(AnnotationFont::Embedded(EmbeddedFont::from_data(data)?))
    }

    /// Embedded font for `path`, parsed on first use and shared afterwards.
    ///
    /// Failures are not cached, so a file fixed later is picked up.
    pub fn embedded(path: &Path) -> Result<Arc<AnnotationFont>> {
        let cache = EMBEDDED.get_or_init(Default::default);
        let mut fonts = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(font) = fonts.get(path) {
            log::debug!("Reusing annotation font {}", path.display());
            return Ok(Arc::clone(font));
        }

        let font = Arc::new(Self::from_file(path)?);
        log::info!("Embedding annotation font {}", path.display());
        fonts.insert(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }

    /// Font for a run: the file at `path` when it is usable, the builtin
    /// font otherwise.
    pub fn resolve(path: Option<&Path>) -> Arc<AnnotationFont> {
        let Some(path) = path else {
            return Self::builtin();
        };
        match Self::embedded(path) {
            Ok(font) => font,
            Err(e) => {
                log::warn!(
                    "Cannot use font {}, falling back to {}: {}",
                    path.display(),
                    BUILTIN_FONT_NAME,
                    e
                );
                Self::builtin()
            },
        }
    }

    /// PostScript name written as `/BaseFont`.
    pub fn base_font(&self) -> &str {
        match self {
            AnnotationFont::Builtin => BUILTIN_FONT_NAME,
            AnnotationFont::Embedded(font) => font.name(),
        }
    }

    /// Hex string operand for `Tj`.
    ///
    /// # Examples
    ///
    /// ```
    /// use picklist_annotator::writer::AnnotationFont;
    ///
    /// let font = AnnotationFont::builtin();
    /// assert_eq!(font.encode("A1"), "<00410031>");
    /// ```
    pub fn encode(&self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for c in text.chars() {
            let code = match self {
                // UCS-2 has no room for supplementary planes
                AnnotationFont::Builtin => u16::try_from(u32::from(c)).unwrap_or(0x003F),
                AnnotationFont::Embedded(font) => font.glyph_id(c).unwrap_or(0),
            };
            hex.push_str(&format!("{:04X}", code));
        }
        hex.push('>');
        hex
    }

    /// Advance of one character in 1/1000 em.
    pub fn char_width(&self, c: char) -> u16 {
        match self {
            AnnotationFont::Builtin => {
                if (' '..='~').contains(&c) {
                    HALF_WIDTH
                } else {
                    FULL_WIDTH
                }
            },
            AnnotationFont::Embedded(font) => font
                .glyph_id(c)
                .map_or(FULL_WIDTH, |gid| font.glyph_width(gid)),
        }
    }

    /// Width of `text` in points at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * font_size / 1000.0
    }

    /// Add the font to `doc` and return its object ID.
    ///
    /// `used` is every string that will be drawn; an embedded font only
    /// describes the glyphs those strings need.
    pub fn install<'a>(
        &self,
        doc: &mut Document,
        used: impl IntoIterator<Item = &'a str>,
    ) -> Result<ObjectId> {
        let font = match self {
            AnnotationFont::Builtin => {
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => BUILTIN_FONT_NAME,
                    "Flags" => 4,
                    "FontBBox" => vec![Object::Integer(-92), Object::Integer(-250), Object::Integer(1010), Object::Integer(922)],
                    "ItalicAngle" => 0,
                    "Ascent" => 752,
                    "Descent" => -221,
                    "CapHeight" => 737,
                    "StemV" => 114,
                });
                let descendant = dictionary! {
                    "Type" => "Font",
                    "Subtype" => "CIDFontType0",
                    "BaseFont" => BUILTIN_FONT_NAME,
                    "CIDSystemInfo" => dictionary! {
                        "Registry" => Object::string_literal("Adobe"),
                        "Ordering" => Object::string_literal("Japan1"),
                        "Supplement" => 2,
                    },
                    "FontDescriptor" => descriptor_id,
                    "DW" => i64::from(FULL_WIDTH),
                    "W" => vec![Object::Integer(231), Object::Integer(325), Object::Integer(i64::from(HALF_WIDTH))],
                };
                Object::Dictionary(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type0",
                    "BaseFont" => BUILTIN_FONT_NAME,
                    "Encoding" => BUILTIN_ENCODING,
                    "DescendantFonts" => vec![Object::Dictionary(descendant)],
                })
            },
            AnnotationFont::Embedded(font) => {
                let chars: BTreeSet<char> = used.into_iter().flat_map(str::chars).collect();
                let glyphs: BTreeMap<u16, char> = chars
                    .into_iter()
                    .filter_map(|c| font.glyph_id(c).map(|gid| (gid, c)))
                    .collect();
                font.font_dict(doc, &glyphs)?
            },
        };
        Ok(doc.add_object(font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_shared() {
        let a = AnnotationFont::builtin();
        let b = AnnotationFont::builtin();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.base_font(), BUILTIN_FONT_NAME);
    }

    #[test]
    fn test_builtin_encode_ucs2() {
        let font = AnnotationFont::builtin();
        assert_eq!(font.encode("納品"), "<7D0D54C1>");
        assert_eq!(font.encode("😀"), "<003F>");
        assert_eq!(font.encode(""), "<>");
    }

    #[test]
    fn test_builtin_widths() {
        let font = AnnotationFont::builtin();
        assert_eq!(font.char_width('A'), 500);
        assert_eq!(font.char_width('納'), 1000);
        // 2 × 500 + 1000 at 7pt
        assert!((font.text_width("No納", 7.0) - 14.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_missing_file_falls_back() {
        let font = AnnotationFont::resolve(Some(Path::new("/nonexistent/font.ttf")));
        assert!(matches!(*font, AnnotationFont::Builtin));
        assert!(matches!(*AnnotationFont::resolve(None), AnnotationFont::Builtin));
    }

    #[test]
    fn test_embedded_rejects_collections_and_garbage() {
        assert!(matches!(EmbeddedFont::from_data(Vec::new()), Err(Error::Font(_))));
        let mut ttc = b"ttcf".to_vec();
        ttc.extend_from_slice(&[0; 32]);
        assert!(matches!(EmbeddedFont::from_data(ttc), Err(Error::Font(_))));
        assert!(matches!(EmbeddedFont::from_data(vec![1, 2, 3, 4]), Err(Error::Font(_))));
    }

    #[test]
    fn test_install_builtin() {
        let mut doc = Document::with_version("1.5");
        let id = AnnotationFont::builtin().install(&mut doc, ["P100"]).unwrap();
        let font = doc.get_object(id).unwrap().as_dict().unwrap();
        assert_eq!(font.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(font.get(b"Encoding").unwrap().as_name().unwrap(), BUILTIN_ENCODING.as_bytes());
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), BUILTIN_FONT_NAME.as_bytes());
    }

    #[test]
    fn test_tounicode_cmap_entries() {
        let used: BTreeMap<u16, char> = [(3, 'A'), (17, '納')].into_iter().collect();
        let cmap = tounicode_cmap(&used);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0003> <0041>"));
        assert!(cmap.contains("<0011> <7D0D>"));

        // Round trip through the extraction-side parser
        let parsed = crate::fonts::parse_tounicode_cmap(cmap.as_bytes());
        assert_eq!(parsed.get(17), Some("納"));
    }

    /// Big-endian 16-bit words.
    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|&v| (v as u16).to_be_bytes()).collect()
    }

    /// Minimal TrueType file: 2048 units per em, '0'..'1' on glyphs 10..11
    /// (1024 wide), 'A'..'D' on glyphs 1..4 (1434 wide). The PostScript
    /// name is stored twice, as Mac Roman first and as UTF-16 second.
    fn sample_font() -> Vec<u8> {
        let head = words(&[
            1, 0, 1, 0, 0, 0, 0x5F0F, 0x3CF5, 0, 2048, 0, 0, 0, 0, 0, 0, 0, 0, -100, -200, 1800, 1900, 0, 8, 2, 0, 0,
        ]);
        let hhea = words(&[1, 0, 1600, -400, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 12]);
        let maxp = words(&[0, 0x5000, 12]);
        let advances: Vec<i32> = (0..12)
            .flat_map(|gid| {
                let advance = match gid {
                    0 => 2048,
                    1..=4 => 1434,
                    _ => 1024,
                };
                [advance, 0]
            })
            .collect();
        let hmtx = words(&advances);
        let cmap = words(&[
            0, 1, 3, 1, 0, 12, // one Windows BMP subtable at offset 12
            4, 40, 0, 6, 4, 1, 2, // format 4, three segments
            0x31, 0x44, 0xFFFF, 0, 0x30, 0x41, 0xFFFF, -38, -64, 1, 0, 0, 0,
        ]);
        let mut name = words(&[0, 2, 30, 1, 0, 0, 6, 7, 0, 3, 1, 0x409, 6, 22, 7]);
        name.extend_from_slice(b"MacName");
        name.extend("Sample Sans".encode_utf16().flat_map(u16::to_be_bytes));

        let tables: [(&[u8; 4], Vec<u8>); 6] = [
            (b"cmap", cmap),
            (b"head", head),
            (b"hhea", hhea),
            (b"hmtx", hmtx),
            (b"maxp", maxp),
            (b"name", name),
        ];
        let directory_len = 12 + 16 * tables.len();
        let mut font = words(&[1, 0, tables.len() as i32, 64, 2, 32]);
        let mut body = Vec::new();
        for (tag, data) in &tables {
            font.extend_from_slice(*tag);
            font.extend_from_slice(&[0; 4]);
            font.extend_from_slice(&((directory_len + body.len()) as u32).to_be_bytes());
            font.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(data);
            body.resize(body.len().next_multiple_of(4), 0);
        }
        font.extend(body);
        font
    }

    #[test]
    fn test_embedded_font_metrics() {
        let font = EmbeddedFont::from_data(sample_font()).unwrap();
        // The Mac Roman record cannot be decoded; the UTF-16 one is used
        assert_eq!(font.name(), "SampleSans");
        assert_eq!(font.glyph_id('A'), Some(1));
        assert_eq!(font.glyph_id('1'), Some(11));
        assert_eq!(font.glyph_id('Z'), None);

        let font = AnnotationFont::Embedded(font);
        assert_eq!(font.char_width('D'), 700);
        assert_eq!(font.char_width('0'), 500);
        assert_eq!(font.char_width('Z'), FULL_WIDTH);
        assert_eq!(font.encode("A0"), "<0001000A>");
    }

    #[test]
    fn test_widths_array_groups_consecutive_glyphs() {
        let font = EmbeddedFont {
            name: "Synthetic".to_string(),
            data: Vec::new(),
            glyphs: HashMap::new(),
            widths: [(1, 700), (2, 650), (3, 600), (10, 500)].into_iter().collect(),
            ascent: 800,
            descent: -200,
            cap_height: 700,
            bbox: [0, -200, 1000, 800],
            flags: 32,
        };
        let used: BTreeMap<u16, char> = [(1, 'A'), (2, 'B'), (3, 'C'), (10, '0'), (12, '2')].into_iter().collect();

        let int = Object::Integer;
        assert_eq!(
            font.widths_array(&used),
            vec![
                int(1),
                Object::Array(vec![int(700), int(650), int(600)]),
                int(10),
                Object::Array(vec![int(500)]),
                int(12),
                Object::Array(vec![int(i64::from(FULL_WIDTH))]),
            ]
        );
        assert!(font.widths_array(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_install_embedded_font() {
        let font = AnnotationFont::Embedded(EmbeddedFont::from_data(sample_font()).unwrap());
        let mut doc = Document::with_version("1.5");
        let id = font.install(&mut doc, ["BA", "0"]).unwrap();

        let type0 = doc.get_object(id).unwrap().as_dict().unwrap();
        assert_eq!(type0.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(type0.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
        assert_eq!(type0.get(b"BaseFont").unwrap().as_name().unwrap(), b"SampleSans");

        let descendants = type0.get(b"DescendantFonts").unwrap().as_array().unwrap();
        let cid_font = descendants[0].as_dict().unwrap();
        assert_eq!(cid_font.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");
        assert_eq!(cid_font.get(b"CIDToGIDMap").unwrap().as_name().unwrap(), b"Identity");
        let w = cid_font.get(b"W").unwrap().as_array().unwrap();
        assert_eq!(w.len(), 4);
        assert_eq!(w[0], Object::Integer(1));
        assert_eq!(w[1], Object::Array(vec![Object::Integer(700), Object::Integer(700)]));
        assert_eq!(w[2], Object::Integer(10));

        let descriptor_id = cid_font.get(b"FontDescriptor").unwrap().as_reference().unwrap();
        let descriptor = doc.get_object(descriptor_id).unwrap().as_dict().unwrap();
        assert!(descriptor.has(b"FontFile2"));
        assert_eq!(descriptor.get(b"Ascent").unwrap().as_i64().unwrap(), 781);

        let cmap_id = type0.get(b"ToUnicode").unwrap().as_reference().unwrap();
        let cmap = doc.get_object(cmap_id).unwrap().as_stream().unwrap();
        let cmap = cmap.decompressed_content().unwrap();
        let parsed = crate::fonts::parse_tounicode_cmap(&cmap);
        assert_eq!(parsed.get(2), Some("B"));
        assert_eq!(parsed.get(10), Some("0"));
    }

    #[test]
    fn test_embedded_font_is_parsed_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.ttf");
        std::fs::write(&path, sample_font()).unwrap();

        let first = AnnotationFont::resolve(Some(&path));
        let second = AnnotationFont::resolve(Some(&path));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.base_font(), "SampleSans");

        let missing = dir.path().join("missing.ttf");
        assert!(AnnotationFont::embedded(&missing).is_err());
        std::fs::write(&missing, sample_font()).unwrap();
        assert!(AnnotationFont::embedded(&missing).is_ok());
    }
}
