//! Picking-list PDF document access.
//!
//! A thin wrapper over [`lopdf::Document`] that resolves what the extractor
//! and compositor need from each page: its boxes (with page-tree
//! inheritance), its decoded content and its resources.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::geometry::PdfBox;

/// Indirect references are followed at most this many hops.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Convert a numeric PDF object to f32.
pub fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow indirect references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Result<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id)?,
            _ => return Ok(obj),
        }
    }
    Err(Error::InvalidPdf("reference chain too deep".to_string()))
}

/// Resolve `dict[key]` to a dictionary. Streams yield their dictionary.
pub fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let obj = dict.get(key).ok()?;
    match resolve(doc, obj).ok()? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Decode a stream, decompressing if it carries a filter.
pub fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

fn box_from_object(doc: &Document, obj: &Object) -> Option<PdfBox> {
    let array = resolve(doc, obj).ok()?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        *slot = object_to_f32(resolve(doc, item).ok()?)?;
    }
    let b = PdfBox::new(values[0], values[1], values[2], values[3]);
    (b.width() > 0.0 && b.height() > 0.0).then_some(b)
}

/// Page boxes relevant to widening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Effective MediaBox
    pub media_box: PdfBox,
    /// CropBox when the page (or an ancestor) declares one
    pub crop_box: Option<PdfBox>,
}

/// A loaded picking-list document.
#[derive(Debug, Clone)]
pub struct PickingListDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PickingListDocument {
    /// Parse a document from memory.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(bytes)?;
        Ok(Self::from_document(inner))
    }

    /// Wrap an already parsed document.
    pub fn from_document(inner: Document) -> Self {
        // get_pages is keyed by 1-based page number, so values are in page order
        let page_ids = inner.get_pages().into_values().collect();
        Self { inner, page_ids }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// The underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Mutable access to the underlying lopdf document.
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            Error::InvalidPdf(format!(
                "page index {} out of range (0..{})",
                index,
                self.page_ids.len()
            ))
        })
    }

    /// Page dictionary for a page index.
    pub fn page_dict(&self, index: usize) -> Result<&Dictionary> {
        let id = self.page_id(index)?;
        Ok(self.inner.get_object(id)?.as_dict()?)
    }

    /// Look up `key` on the page, walking `/Parent` links when absent.
    pub fn inherited(&self, index: usize, key: &[u8]) -> Result<Option<&Object>> {
        let mut dict = self.page_dict(index)?;
        for _ in 0..MAX_REFERENCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            match dict.get(b"Parent") {
                Ok(parent) => dict = resolve(&self.inner, parent)?.as_dict()?,
                Err(_) => return Ok(None),
            }
        }
        Err(Error::InvalidPdf("page tree too deep".to_string()))
    }

    /// Effective MediaBox and CropBox of a page.
    pub fn geometry(&self, index: usize) -> Result<PageGeometry> {
        let media_box = self
            .inherited(index, b"MediaBox")?
            .and_then(|obj| box_from_object(&self.inner, obj))
            .ok_or(Error::MissingMediaBox { page: index })?;
        let crop_box = self
            .inherited(index, b"CropBox")?
            .and_then(|obj| box_from_object(&self.inner, obj));
        Ok(PageGeometry {
            media_box,
            crop_box,
        })
    }

    /// Effective resource dictionary of a page (empty when none).
    pub fn resources(&self, index: usize) -> Result<Dictionary> {
        match self.inherited(index, b"Resources")? {
            Some(obj) => match resolve(&self.inner, obj)? {
                Object::Dictionary(d) => Ok(d.clone()),
                _ => Ok(Dictionary::new()),
            },
            None => Ok(Dictionary::new()),
        }
    }

    /// Decoded content of a page, streams concatenated in order.
    pub fn content_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let dict = self.page_dict(index)?;
        let contents = match dict.get(b"Contents") {
            Ok(obj) => resolve(&self.inner, obj)?,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Stream(stream) => stream_bytes(stream),
            Object::Array(parts) => {
                let mut content = Vec::new();
                for part in parts {
                    let stream = resolve(&self.inner, part)?.as_stream()?;
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    content.extend_from_slice(&stream_bytes(stream)?);
                }
                Ok(content)
            },
            _ => Err(Error::InvalidPdf(format!(
                "page {} /Contents is not a stream or array",
                index
            ))),
        }
    }

    /// Serialize the document.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.save_to(&mut buf)?;
        Ok(buf)
    }
}
