//! Ruling-line capture.
//!
//! [`PathExtractor`] records the straight pieces of every painted path in
//! page space. Curves collapse to a chord between their end points and paths
//! ended with `n` (clip-only) never reach the output.
//!
//! ```
//! use picklist_annotator::extractors::paths::PathExtractor;
//!
//! let mut paths = PathExtractor::new();
//! paths.rectangle(10.0, 10.0, 100.0, 20.0);
//! paths.paint(false);
//! assert_eq!(paths.finish().len(), 4);
//! ```

use crate::content::graphics_state::Matrix;
use crate::geometry::Point;

/// A painted straight segment in page space (PDF user space, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub from: Point,
    /// End point
    pub to: Point,
}

/// Collects painted segments while a content stream is walked.
#[derive(Debug, Default)]
pub struct PathExtractor {
    /// Painted so far
    segments: Vec<Segment>,
    /// Built but not yet painted
    pending: Vec<Segment>,
    current_point: Option<Point>,
    /// Where `h` returns to
    subpath_start: Option<Point>,
    ctm: Matrix,
}

impl PathExtractor {
    /// Empty collector with an identity CTM.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points are mapped when added, so a `cm` issued mid-path only moves
    /// later points.
    pub fn set_ctm(&mut self, ctm: Matrix) {
        self.ctm = ctm;
    }

    /// m
    pub fn move_to(&mut self, x: f32, y: f32) {
        let point = self.ctm.transform_point(x, y);
        self.current_point = Some(point);
        self.subpath_start = Some(point);
    }

    /// l
    pub fn line_to(&mut self, x: f32, y: f32) {
        let point = self.ctm.transform_point(x, y);
        self.segment_to(point);
    }

    /// c, v and y. Only the end point is kept.
    pub fn curve_to(&mut self, x3: f32, y3: f32) {
        let point = self.ctm.transform_point(x3, y3);
        self.segment_to(point);
    }

    /// re: four segments, counter-clockwise from (x, y).
    pub fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)]
            .map(|(px, py)| self.ctm.transform_point(px, py));
        let next = corners.iter().cycle().skip(1);
        self.pending
            .extend(corners.iter().zip(next).map(|(&from, &to)| Segment { from, to }));
        self.current_point = Some(corners[0]);
        self.subpath_start = Some(corners[0]);
    }

    /// h
    pub fn close_path(&mut self) {
        if let Some(origin) = self.subpath_start {
            self.segment_to(origin);
        }
    }

    fn segment_to(&mut self, point: Point) {
        // No current point: this point opens the subpath
        match self.current_point {
            Some(from) => self.pending.push(Segment { from, to: point }),
            None => self.subpath_start = Some(point),
        }
        self.current_point = Some(point);
    }

    /// Any painting operator. `close` is set for `s`, `b` and `b*`; fills
    /// need no explicit close because the rectangle sides are already there.
    pub fn paint(&mut self, close: bool) {
        if close {
            self.close_path();
        }
        self.segments.append(&mut self.pending);
        self.reset();
    }

    /// n: drop the path unpainted.
    pub fn end_path(&mut self) {
        self.pending.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.current_point = None;
        self.subpath_start = None;
    }

    /// Painted segments in paint order.
    pub fn finish(self) -> Vec<Segment> {
        self.segments
    }

    /// Painted segment count.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroked_line() {
        let mut paths = PathExtractor::new();
        paths.move_to(10.0, 10.0);
        paths.line_to(100.0, 10.0);
        paths.paint(false);

        let segments = paths.finish();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].from, Point::new(10.0, 10.0));
        assert_eq!(segments[0].to, Point::new(100.0, 10.0));
    }

    #[test]
    fn test_rectangle_sides() {
        let mut paths = PathExtractor::new();
        paths.rectangle(50.0, 50.0, 100.0, 75.0);
        paths.paint(false);

        let segments = paths.finish();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1].from, Point::new(150.0, 50.0));
        assert_eq!(segments[1].to, Point::new(150.0, 125.0));
    }

    #[test]
    fn test_close_adds_return_segment() {
        let mut paths = PathExtractor::new();
        paths.move_to(0.0, 0.0);
        paths.line_to(100.0, 0.0);
        paths.line_to(100.0, 100.0);
        paths.paint(true);

        let segments = paths.finish();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].to, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_end_path_discards() {
        let mut paths = PathExtractor::new();
        paths.rectangle(0.0, 0.0, 10.0, 10.0);
        paths.end_path();
        assert_eq!(paths.segment_count(), 0);

        paths.move_to(0.0, 0.0);
        paths.line_to(5.0, 0.0);
        paths.paint(false);
        assert_eq!(paths.finish().len(), 1);
    }

    #[test]
    fn test_curve_reduced_to_endpoints() {
        let mut paths = PathExtractor::new();
        paths.move_to(0.0, 0.0);
        paths.curve_to(100.0, 0.0);
        paths.paint(false);

        let segments = paths.finish();
        assert_eq!(segments, vec![Segment {
            from: Point::new(0.0, 0.0),
            to: Point::new(100.0, 0.0),
        }]);
    }

    #[test]
    fn test_points_follow_ctm() {
        let mut paths = PathExtractor::new();
        paths.set_ctm(Matrix::translation(100.0, 200.0));
        paths.move_to(0.0, 0.0);
        paths.line_to(10.0, 0.0);
        paths.paint(false);

        let segments = paths.finish();
        assert_eq!(segments[0].from, Point::new(100.0, 200.0));
        assert_eq!(segments[0].to, Point::new(110.0, 200.0));
    }

    #[test]
    fn test_line_without_move_starts_subpath() {
        let mut paths = PathExtractor::new();
        paths.line_to(10.0, 10.0);
        paths.line_to(20.0, 10.0);
        paths.paint(false);
        assert_eq!(paths.finish().len(), 1);
    }
}
