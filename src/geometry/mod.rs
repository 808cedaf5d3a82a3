//! Geometric primitives shared by extraction and composition.
//!
//! Two coordinate systems meet in this crate:
//!
//! - **Extraction space** ([`Rect`], [`Point`]): origin at the top-left of the
//!   page box, y grows downward. Table cells, characters and row descriptors
//!   live here.
//! - **PDF user space** ([`PdfBox`]): origin at the bottom-left, y grows
//!   upward. Page boxes and everything drawn into content streams live here.
//!
//! [`PdfBox::to_pdf_y`] and [`PdfBox::to_extraction_y`] convert between them
//! using the page's own box, never a document-wide height.

/// A position in extraction space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Distance from the box's left edge
    pub x: f32,
    /// Distance below the box's top edge
    pub y: f32,
}

impl Point {
    /// ```
    /// use picklist_annotator::geometry::Point;
    ///
    /// let p = Point::new(10.0, 20.0);
    /// assert_eq!((p.x, p.y), (10.0, 20.0));
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in extraction space, stored by its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    x0: f32,
    top: f32,
    x1: f32,
    bottom: f32,
}

impl Rect {
    /// Box with the given left, top, right and bottom edges. Swapped edges
    /// are put back in order.
    ///
    /// ```
    /// use picklist_annotator::geometry::Rect;
    ///
    /// let cell = Rect::from_points(110.0, 20.0, 10.0, 70.0);
    /// assert_eq!(cell.left(), 10.0);
    /// assert_eq!(cell.right(), 110.0);
    /// assert_eq!(cell.height(), 50.0);
    /// ```
    pub fn from_points(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    /// Left edge.
    pub fn left(&self) -> f32 {
        self.x0
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x1
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Mid-point.
    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Left and top edges inclusive, right and bottom exclusive. A point on
    /// a border shared by two cells lands in exactly one of them.
    ///
    /// ```
    /// use picklist_annotator::geometry::{Point, Rect};
    ///
    /// let cell = Rect::from_points(0.0, 0.0, 10.0, 10.0);
    /// assert!(cell.contains_point_half_open(&Point::new(0.0, 0.0)));
    /// assert!(!cell.contains_point_half_open(&Point::new(10.0, 5.0)));
    /// ```
    pub fn contains_point_half_open(&self, p: &Point) -> bool {
        (self.x0..self.x1).contains(&p.x) && (self.top..self.bottom).contains(&p.y)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A page box (`/MediaBox`, `/CropBox`) in PDF user space.
///
/// Stored normalised so that `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfBox {
    /// Left edge
    pub x0: f32,
    /// Bottom edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
}

impl PdfBox {
    /// Create a box from two corners, normalising their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use picklist_annotator::geometry::PdfBox;
    ///
    /// let b = PdfBox::new(595.0, 842.0, 0.0, 0.0);
    /// assert_eq!(b.x0, 0.0);
    /// assert_eq!(b.y1, 842.0);
    /// assert_eq!(b.width(), 595.0);
    /// ```
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Same box with the right edge pushed out by `extra`.
    pub fn widened(&self, extra: f32) -> PdfBox {
        PdfBox {
            x1: self.x1 + extra,
            ..*self
        }
    }

    /// Convert an extraction-space y (distance below the box top) into PDF
    /// user space.
    ///
    /// # Examples
    ///
    /// ```
    /// use picklist_annotator::geometry::PdfBox;
    ///
    /// let page = PdfBox::new(0.0, 0.0, 595.0, 842.0);
    /// assert_eq!(page.to_pdf_y(100.0), 742.0);
    /// assert_eq!(page.to_extraction_y(742.0), 100.0);
    /// ```
    pub fn to_pdf_y(&self, extraction_y: f32) -> f32 {
        self.y1 - extraction_y
    }

    /// Convert a PDF user-space y into extraction space.
    pub fn to_extraction_y(&self, pdf_y: f32) -> f32 {
        self.y1 - pdf_y
    }

    /// Convert a PDF user-space x into extraction space.
    pub fn to_extraction_x(&self, pdf_x: f32) -> f32 {
        pdf_x - self.x0
    }

    /// The box as a four-number PDF array.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}
