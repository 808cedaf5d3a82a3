//! Positioning state for the content stream walk.
//!
//! Ruling lines and glyph boxes depend on the CTM and the text state only.
//! Colour, dash and blending parameters are ignored.

use crate::geometry::Point;

/// Affine transform in PDF operand order `[a b c d e f]`.
///
/// A point maps as `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// x scale
    pub a: f32,
    /// y shear
    pub b: f32,
    /// x shear
    pub c: f32,
    /// y scale
    pub d: f32,
    /// x offset
    pub e: f32,
    /// y offset
    pub f: f32,
}

impl Matrix {
    /// The identity transform.
    ///
    /// ```
    /// use picklist_annotator::content::Matrix;
    ///
    /// let p = Matrix::identity().transform_point(3.0, 4.0);
    /// assert_eq!((p.x, p.y), (3.0, 4.0));
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix from `cm` / `Tm` operands.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure offset.
    ///
    /// ```
    /// use picklist_annotator::content::Matrix;
    ///
    /// let p = Matrix::translation(10.0, 20.0).transform_point(5.0, 10.0);
    /// assert_eq!((p.x, p.y), (15.0, 30.0));
    /// ```
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// First six operands as a matrix.
    pub fn from_operands(values: &[f32]) -> Option<Self> {
        let [a, b, c, d, e, f, ..] = *values else {
            return None;
        };
        Some(Self::new(a, b, c, d, e, f))
    }

    /// `self` followed by `other`. `cm` updates the CTM as `m.multiply(&ctm)`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let o = other;
        Matrix::new(
            self.a * o.a + self.b * o.c,
            self.a * o.b + self.b * o.d,
            self.c * o.a + self.d * o.c,
            self.c * o.b + self.d * o.d,
            self.e * o.a + self.f * o.c + o.e,
            self.e * o.b + self.f * o.d + o.f,
        )
    }

    /// Map a point.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point::new(self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// How much a unit of height grows under this transform.
    pub fn vertical_scale(&self) -> f32 {
        self.c.hypot(self.d)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// CTM plus the text state operators set (Tc, Tw, Tz, TL, Tf, Ts).
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// User space to page space
    pub ctm: Matrix,
    /// Tm, advanced after each glyph
    pub text_matrix: Matrix,
    /// Tm at the start of the current line
    pub text_line_matrix: Matrix,
    /// Tc
    pub char_space: f32,
    /// Tw
    pub word_space: f32,
    /// Tz, in percent
    pub horizontal_scaling: f32,
    /// TL
    pub leading: f32,
    /// Font resource name from Tf
    pub font_name: Option<Vec<u8>>,
    /// Font size from Tf
    pub font_size: f32,
    /// Ts
    pub text_rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font_name: None,
            font_size: 0.0,
            text_rise: 0.0,
        }
    }
}

impl GraphicsState {
    /// State at the start of a page.
    ///
    /// ```
    /// use picklist_annotator::content::GraphicsState;
    ///
    /// let state = GraphicsState::new();
    /// assert_eq!(state.horizontal_scaling, 100.0);
    /// assert!(state.font_name.is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Td: start a line offset from the current line start.
    pub fn next_line(&mut self, tx: f32, ty: f32) {
        let line = Matrix::translation(tx, ty).multiply(&self.text_line_matrix);
        self.text_line_matrix = line;
        self.text_matrix = line;
    }

    /// Move the glyph origin `tx` units along the baseline.
    pub fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
    }

    /// Glyph space to page space for the glyph at the current origin.
    pub fn text_render_matrix(&self) -> Matrix {
        let size = self.font_size;
        let scaled = Matrix::new(size * self.horizontal_scaling / 100.0, 0.0, 0.0, size, 0.0, self.text_rise);
        scaled.multiply(&self.text_matrix).multiply(&self.ctm)
    }
}

/// `q`/`Q` nesting. The bottom state can never be popped.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    states: Vec<GraphicsState>,
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self::with_state(GraphicsState::default())
    }
}

impl GraphicsStateStack {
    /// Stack with a page-start state.
    ///
    /// ```
    /// use picklist_annotator::content::GraphicsStateStack;
    ///
    /// let mut stack = GraphicsStateStack::new();
    /// stack.save();
    /// stack.restore();
    /// stack.restore();
    /// assert_eq!(stack.depth(), 1);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack whose bottom is `state`; form XObjects start from the caller's state.
    pub fn with_state(state: GraphicsState) -> Self {
        Self { states: vec![state] }
    }

    /// State in effect.
    pub fn current(&self) -> &GraphicsState {
        &self.states[self.states.len() - 1]
    }

    /// State in effect, mutably.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        let top = self.states.len() - 1;
        &mut self.states[top]
    }

    /// q
    pub fn save(&mut self) {
        let copy = self.current().clone();
        self.states.push(copy);
    }

    /// Q. Extra restores are ignored.
    pub fn restore(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    /// Number of states, including the bottom one.
    pub fn depth(&self) -> usize {
        self.states.len()
    }
}
