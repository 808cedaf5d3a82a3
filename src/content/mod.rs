//! PDF content stream execution.
//!
//! Content streams are decoded with lopdf and run through a small
//! interpreter that tracks the graphics state, collecting the painted
//! segments and shown characters a page produces.

pub mod graphics_state;
pub mod interpreter;

pub use graphics_state::{GraphicsState, GraphicsStateStack, Matrix};
pub use interpreter::{interpret_page, PageInterpreter, PageMarks};
