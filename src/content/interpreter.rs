//! Content stream interpreter.
//!
//! Walks a page's decoded operators with a [`GraphicsStateStack`], feeding
//! path operators to a [`PathExtractor`] and text operators to a
//! [`TextExtractor`]. Form XObjects are entered recursively with their own
//! matrix and resources. Images, colours and marked content are skipped.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object};

use crate::content::graphics_state::{GraphicsStateStack, Matrix};
use crate::document::{object_to_f32, resolve, resolve_dict, stream_bytes};
use crate::error::{Error, Result};
use crate::extractors::paths::{PathExtractor, Segment};
use crate::extractors::text::{PageChar, TextExtractor};
use crate::fonts::LoadedFont;
use crate::geometry::PdfBox;

/// Nesting limit for form XObjects.
pub const MAX_FORM_DEPTH: usize = 8;

/// Everything table detection needs from one page.
#[derive(Debug, Default)]
pub struct PageMarks {
    /// Painted straight segments, page space
    pub segments: Vec<Segment>,
    /// Shown characters, extraction space
    pub chars: Vec<PageChar>,
    /// Shown glyphs that decoded to no text (no ToUnicode on an Identity font)
    pub unmapped_glyphs: usize,
}

/// Fonts resolved for one resource dictionary.
struct FontCache<'a> {
    doc: &'a Document,
    resources: &'a Dictionary,
    loaded: HashMap<Vec<u8>, Rc<LoadedFont>>,
}

impl<'a> FontCache<'a> {
    fn new(doc: &'a Document, resources: &'a Dictionary) -> Self {
        Self {
            doc,
            resources,
            loaded: HashMap::new(),
        }
    }

    fn get(&mut self, name: &[u8]) -> Rc<LoadedFont> {
        if let Some(font) = self.loaded.get(name) {
            return Rc::clone(font);
        }
        let font = resolve_dict(self.doc, self.resources, b"Font")
            .and_then(|fonts| fonts.get(name).ok())
            .and_then(|obj| resolve(self.doc, obj).ok())
            .and_then(|obj| obj.as_dict().ok())
            .map(|dict| LoadedFont::from_dict(self.doc, dict))
            .unwrap_or_else(|| {
                log::debug!("Font /{} not in resources", String::from_utf8_lossy(name));
                LoadedFont::fallback()
            });
        let font = Rc::new(font);
        self.loaded.insert(name.to_vec(), Rc::clone(&font));
        font
    }

    /// Font selected in the current graphics state.
    fn current(&mut self, stack: &GraphicsStateStack) -> Rc<LoadedFont> {
        match stack.current().font_name.clone() {
            Some(name) => self.get(&name),
            None => Rc::new(LoadedFont::fallback()),
        }
    }
}

/// Interprets page content into [`PageMarks`].
pub struct PageInterpreter<'a> {
    doc: &'a Document,
    paths: PathExtractor,
    text: TextExtractor,
}

impl<'a> PageInterpreter<'a> {
    /// Create an interpreter for a page with the given MediaBox.
    pub fn new(doc: &'a Document, page_box: PdfBox) -> Self {
        Self {
            doc,
            paths: PathExtractor::new(),
            text: TextExtractor::new(page_box),
        }
    }

    /// Interpret `content` against `resources` and return the collected marks.
    pub fn run(mut self, content: &[u8], resources: &Dictionary) -> Result<PageMarks> {
        let content = Content::decode(content)?;
        let mut stack = GraphicsStateStack::new();
        self.execute(&content.operations, resources, &mut stack, 0)?;
        Ok(PageMarks {
            unmapped_glyphs: self.text.unmapped(),
            segments: self.paths.finish(),
            chars: self.text.finish(),
        })
    }

    fn execute(
        &mut self,
        operations: &[Operation],
        resources: &Dictionary,
        stack: &mut GraphicsStateStack,
        depth: usize,
    ) -> Result<()> {
        let mut fonts = FontCache::new(self.doc, resources);
        let mut font = fonts.current(stack);

        for op in operations {
            let nums = numbers(&op.operands);
            match op.operator.as_str() {
                // Graphics state
                "q" => stack.save(),
                "Q" => {
                    stack.restore();
                    self.paths.set_ctm(stack.current().ctm);
                    font = fonts.current(stack);
                },
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&nums) {
                        let state = stack.current_mut();
                        state.ctm = m.multiply(&state.ctm);
                        self.paths.set_ctm(state.ctm);
                    }
                },

                // Path construction and painting
                "m" => {
                    if let [x, y, ..] = nums[..] {
                        self.paths.move_to(x, y);
                    }
                },
                "l" => {
                    if let [x, y, ..] = nums[..] {
                        self.paths.line_to(x, y);
                    }
                },
                "c" => {
                    if let [_, _, _, _, x, y, ..] = nums[..] {
                        self.paths.curve_to(x, y);
                    }
                },
                "v" | "y" => {
                    if let [_, _, x, y, ..] = nums[..] {
                        self.paths.curve_to(x, y);
                    }
                },
                "re" => {
                    if let [x, y, w, h, ..] = nums[..] {
                        self.paths.rectangle(x, y, w, h);
                    }
                },
                "h" => self.paths.close_path(),
                "S" | "f" | "F" | "f*" | "B" | "B*" => self.paths.paint(false),
                "s" | "b" | "b*" => self.paths.paint(true),
                "n" => self.paths.end_path(),

                // Text state
                "BT" => {
                    let state = stack.current_mut();
                    state.text_matrix = Matrix::identity();
                    state.text_line_matrix = Matrix::identity();
                },
                "Tf" => {
                    let state = stack.current_mut();
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        state.font_name = Some(name.to_vec());
                        font = fonts.get(name);
                    }
                    if let Some(size) = op.operands.get(1).and_then(object_to_f32) {
                        state.font_size = size;
                    }
                },
                "Tc" => set_first(&nums, &mut stack.current_mut().char_space),
                "Tw" => set_first(&nums, &mut stack.current_mut().word_space),
                "Tz" => set_first(&nums, &mut stack.current_mut().horizontal_scaling),
                "TL" => set_first(&nums, &mut stack.current_mut().leading),
                "Ts" => set_first(&nums, &mut stack.current_mut().text_rise),
                "Td" => {
                    if let [tx, ty, ..] = nums[..] {
                        stack.current_mut().next_line(tx, ty);
                    }
                },
                "TD" => {
                    if let [tx, ty, ..] = nums[..] {
                        let state = stack.current_mut();
                        state.leading = -ty;
                        state.next_line(tx, ty);
                    }
                },
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&nums) {
                        let state = stack.current_mut();
                        state.text_matrix = m;
                        state.text_line_matrix = m;
                    }
                },
                "T*" => {
                    let state = stack.current_mut();
                    let leading = state.leading;
                    state.next_line(0.0, -leading);
                },

                // Text showing
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        self.text.show(stack.current_mut(), &font, bytes);
                    }
                },
                "'" => {
                    let state = stack.current_mut();
                    let leading = state.leading;
                    state.next_line(0.0, -leading);
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        self.text.show(state, &font, bytes);
                    }
                },
                "\"" => {
                    let state = stack.current_mut();
                    if let [aw, ac, ..] = nums[..] {
                        state.word_space = aw;
                        state.char_space = ac;
                    }
                    let leading = state.leading;
                    state.next_line(0.0, -leading);
                    if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                        self.text.show(state, &font, bytes);
                    }
                },
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let state = stack.current_mut();
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.text.show(state, &font, bytes),
                                other => {
                                    if let Some(amount) = object_to_f32(other) {
                                        self.text.adjust(state, amount);
                                    }
                                },
                            }
                        }
                    }
                },

                // External objects
                "Do" => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        self.enter_form(name, resources, stack, depth)?;
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }

    fn enter_form(
        &mut self,
        name: &[u8],
        resources: &Dictionary,
        stack: &mut GraphicsStateStack,
        depth: usize,
    ) -> Result<()> {
        if depth >= MAX_FORM_DEPTH {
            log::warn!("Form XObject nesting deeper than {}, skipping", MAX_FORM_DEPTH);
            return Ok(());
        }
        let doc = self.doc;
        let Some(stream) = resolve_dict(doc, resources, b"XObject")
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_stream().ok())
        else {
            return Ok(());
        };
        if stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() != Some(b"Form".as_slice()) {
            return Ok(());
        }

        let bytes = stream_bytes(stream)?;
        let content = Content::decode(&bytes).map_err(|e| {
            Error::InvalidPdf(format!(
                "form /{} content unreadable: {}",
                String::from_utf8_lossy(name),
                e
            ))
        })?;
        let form_resources = resolve_dict(doc, &stream.dict, b"Resources").unwrap_or(resources);
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| Matrix::from_operands(&numbers(arr)))
            .unwrap_or_default();

        log::trace!("Entering form /{} at depth {}", String::from_utf8_lossy(name), depth + 1);
        let mut inner = GraphicsStateStack::with_state(stack.current().clone());
        {
            let state = inner.current_mut();
            state.ctm = form_matrix.multiply(&state.ctm);
            self.paths.set_ctm(state.ctm);
        }
        self.execute(&content.operations, form_resources, &mut inner, depth + 1)?;
        self.paths.set_ctm(stack.current().ctm);
        Ok(())
    }
}

fn numbers(operands: &[Object]) -> Vec<f32> {
    operands.iter().filter_map(object_to_f32).collect()
}

fn set_first(nums: &[f32], target: &mut f32) {
    if let Some(v) = nums.first() {
        *target = *v;
    }
}

/// Interpret a page and collect its marks.
pub fn interpret_page(doc: &Document, page_box: PdfBox, content: &[u8], resources: &Dictionary) -> Result<PageMarks> {
    PageInterpreter::new(doc, page_box).run(content, resources)
}
