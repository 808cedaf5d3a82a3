//! Overlay content stream builder.
//!
//! The appended column only ever needs three things: a paint state, a
//! bordered cell and a line of text. Each is one [`OverlayOp`] and renders
//! to the operator sequence a PDF viewer expects.

use std::fmt;

use crate::config::Rgb;

/// Colours and line width used for cell borders and fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Fill colour (rg)
    pub fill: Rgb,
    /// Stroke colour (RG)
    pub stroke: Rgb,
    /// Line width (w)
    pub line_width: f32,
}

/// One drawing step of the overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOp {
    /// q
    Save,
    /// Q
    Restore,
    /// Select fill, stroke and line width
    Paint(Paint),
    /// Rectangle at (x, y) with width and height, filled and stroked
    Cell(f32, f32, f32, f32),
    /// A self-contained text object
    Text {
        /// Font resource name
        font: String,
        /// Font size
        size: f32,
        /// Text colour
        color: Rgb,
        /// Baseline start
        x: f32,
        /// Baseline
        y: f32,
        /// Encoded string including the angle brackets
        hex: String,
    },
}

fn rgb(f: &mut fmt::Formatter<'_>, c: Rgb, op: &str) -> fmt::Result {
    write!(f, "{} {} {} {}", c.r, c.g, c.b, op)
}

impl fmt::Display for OverlayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayOp::Save => f.write_str("q"),
            OverlayOp::Restore => f.write_str("Q"),
            OverlayOp::Paint(paint) => {
                rgb(f, paint.fill, "rg\n")?;
                rgb(f, paint.stroke, "RG\n")?;
                write!(f, "{} w", paint.line_width)
            },
            OverlayOp::Cell(x, y, w, h) => write!(f, "{} {} {} {} re\nB", x, y, w, h),
            OverlayOp::Text {
                font,
                size,
                color,
                x,
                y,
                hex,
            } => {
                rgb(f, *color, "rg\n")?;
                writeln!(f, "BT")?;
                writeln!(f, "/{} {} Tf", font, size)?;
                writeln!(f, "1 0 0 1 {} {} Tm", x, y)?;
                writeln!(f, "{} Tj", hex)?;
                f.write_str("ET")
            },
        }
    }
}

/// Collects overlay steps and renders them as content stream bytes.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    ops: Vec<OverlayOp>,
    // Paint in effect; text resets the fill colour so it clears this
    paint: Option<Paint>,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps added so far.
    pub fn ops(&self) -> &[OverlayOp] {
        &self.ops
    }

    /// Wrap everything added by `body` in q/Q.
    pub fn isolated(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.ops.push(OverlayOp::Save);
        body(self);
        self.ops.push(OverlayOp::Restore);
        self.paint = None;
        self
    }

    /// Draw a filled, bordered rectangle.
    pub fn cell(&mut self, paint: Paint, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        if self.paint != Some(paint) {
            self.ops.push(OverlayOp::Paint(paint));
            self.paint = Some(paint);
        }
        self.ops.push(OverlayOp::Cell(x, y, width, height));
        self
    }

    /// Draw an encoded string with its baseline starting at (x, y).
    pub fn text(&mut self, font: &str, size: f32, color: Rgb, x: f32, y: f32, hex: String) -> &mut Self {
        self.ops.push(OverlayOp::Text {
            font: font.to_string(),
            size,
            color,
            x,
            y,
            hex,
        });
        self.paint = None;
        self
    }

    /// Render one operator group per line.
    pub fn finish(&self) -> Vec<u8> {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out.into_bytes()
    }
}
