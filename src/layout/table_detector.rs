//! Ruling-line table detection.
//!
//! Tables are recovered from the lines a page actually draws, not from
//! text alignment:
//!
//! 1. Painted segments become horizontal and vertical [`Edge`]s.
//! 2. Edges are snapped onto shared positions, collinear pieces are joined
//!    and short ones dropped.
//! 3. Every crossing of a vertical and a horizontal edge is an intersection.
//! 4. From each intersection the smallest rectangle whose four corners are
//!    intersections connected by edges is taken as a cell.
//! 5. Cells sharing a corner are grouped into tables, ordered by their
//!    top-most, then left-most corner.
//!
//! All coordinates are in extraction space (top-left origin, y down).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::extractors::paths::Segment;
use crate::extractors::text::{chars_to_text, PageChar};
use crate::geometry::{PdfBox, Rect};
use crate::utils::safe_float_cmp;

/// A segment counts as axis-aligned when its off-axis extent is below this.
const AXIS_EPSILON: f32 = 0.01;

/// Tolerances for table detection and cell text extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSettings {
    /// Edges whose positions are this close are snapped together
    pub snap_tolerance: f32,
    /// Collinear edges with gaps up to this are joined
    pub join_tolerance: f32,
    /// Edges shorter than this are dropped before snapping
    pub edge_min_length_prefilter: f32,
    /// Edges shorter than this are dropped after joining
    pub edge_min_length: f32,
    /// Slack when testing whether a vertical and a horizontal edge cross
    pub intersection_tolerance: f32,
    /// Horizontal gap that separates words in cell text
    pub text_x_tolerance: f32,
    /// Vertical distance within which characters share a line
    pub text_y_tolerance: f32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length_prefilter: 1.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
            text_x_tolerance: 3.0,
            text_y_tolerance: 3.0,
        }
    }
}

/// Edge orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Constant y
    Horizontal,
    /// Constant x
    Vertical,
}

/// An axis-aligned ruling line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Orientation
    pub orientation: Orientation,
    /// Left x
    pub x0: f32,
    /// Top y
    pub top: f32,
    /// Right x (equals `x0` for vertical edges)
    pub x1: f32,
    /// Bottom y (equals `top` for horizontal edges)
    pub bottom: f32,
}

impl Edge {
    /// Horizontal edge at `y` from `x0` to `x1`.
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
        }
    }

    /// Vertical edge at `x` from `top` to `bottom`.
    pub fn vertical(x: f32, top: f32, bottom: f32) -> Self {
        Self {
            orientation: Orientation::Vertical,
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
        }
    }

    /// Convert a page-space segment. Slanted and degenerate segments yield `None`.
    pub fn from_segment(segment: &Segment, page_box: &PdfBox) -> Option<Self> {
        let x0 = page_box.to_extraction_x(segment.from.x);
        let x1 = page_box.to_extraction_x(segment.to.x);
        let y0 = page_box.to_extraction_y(segment.from.y);
        let y1 = page_box.to_extraction_y(segment.to.y);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        if dy < AXIS_EPSILON && dx >= AXIS_EPSILON {
            Some(Edge::horizontal((y0 + y1) / 2.0, x0, x1))
        } else if dx < AXIS_EPSILON && dy >= AXIS_EPSILON {
            Some(Edge::vertical((x0 + x1) / 2.0, y0, y1))
        } else {
            None
        }
    }

    /// Length along the edge's axis.
    pub fn length(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }

    /// Position across the axis (y for horizontal, x for vertical).
    fn position(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.top,
            Orientation::Vertical => self.x0,
        }
    }

    fn set_position(&mut self, value: f32) {
        match self.orientation {
            Orientation::Horizontal => {
                self.top = value;
                self.bottom = value;
            },
            Orientation::Vertical => {
                self.x0 = value;
                self.x1 = value;
            },
        }
    }

    /// (start, end) along the axis.
    fn span(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Horizontal => (self.x0, self.x1),
            Orientation::Vertical => (self.top, self.bottom),
        }
    }

    fn set_end(&mut self, end: f32) {
        match self.orientation {
            Orientation::Horizontal => self.x1 = end,
            Orientation::Vertical => self.bottom = end,
        }
    }
}

/// Chained clustering of sorted values: a value joins the current cluster
/// when it is within `tolerance` of the previous one. Returns cluster id per
/// input index plus the mean of each cluster.
fn cluster_positions(values: &[f32], tolerance: f32) -> (Vec<usize>, Vec<f32>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| safe_float_cmp(values[a], values[b]));

    let mut ids = vec![0; values.len()];
    let mut sums: Vec<(f32, usize)> = Vec::new();
    let mut last: Option<f32> = None;
    for i in order {
        let v = values[i];
        match last {
            Some(prev) if v - prev <= tolerance => {},
            _ => sums.push((0.0, 0)),
        }
        let id = sums.len() - 1;
        sums[id].0 += v;
        sums[id].1 += 1;
        ids[i] = id;
        last = Some(v);
    }
    let means = sums.into_iter().map(|(sum, n)| sum / n as f32).collect();
    (ids, means)
}

/// Snap edges of one orientation onto shared positions and join collinear
/// pieces. Each returned edge's position is exactly its cluster mean.
fn snap_and_join(edges: Vec<Edge>, settings: &TableSettings) -> Vec<Edge> {
    let positions: Vec<f32> = edges.iter().map(Edge::position).collect();
    let (ids, means) = cluster_positions(&positions, settings.snap_tolerance);

    let mut groups: BTreeMap<usize, Vec<Edge>> = BTreeMap::new();
    for (mut edge, id) in edges.into_iter().zip(ids) {
        edge.set_position(means[id]);
        groups.entry(id).or_default().push(edge);
    }

    let mut joined = Vec::new();
    for (_, mut group) in groups {
        group.sort_by(|a, b| safe_float_cmp(a.span().0, b.span().0));
        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };
        for edge in iter {
            let (start, end) = edge.span();
            let (_, current_end) = current.span();
            if start <= current_end + settings.join_tolerance {
                if end > current_end {
                    current.set_end(end);
                }
            } else {
                joined.push(current);
                current = edge;
            }
        }
        joined.push(current);
    }
    joined
}

/// Snap, join and length-filter a raw edge list.
pub fn merge_edges(edges: Vec<Edge>, settings: &TableSettings) -> Vec<Edge> {
    let (horizontal, vertical): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .filter(|e| e.length() >= settings.edge_min_length_prefilter)
        .partition(|e| e.orientation == Orientation::Horizontal);

    let mut merged = snap_and_join(horizontal, settings);
    merged.extend(snap_and_join(vertical, settings));
    merged.retain(|e| e.length() >= settings.edge_min_length);
    merged
}

/// Intersection grid over merged edges.
///
/// Vertices are addressed by index into the sorted distinct x positions of
/// vertical edges and y positions of horizontal edges, so equality never
/// depends on float comparison.
#[derive(Debug, Default)]
struct IntersectionGrid {
    xs: Vec<f32>,
    ys: Vec<f32>,
    /// (x index, y index) → (vertical edge ids, horizontal edge ids)
    vertices: BTreeMap<(usize, usize), (BTreeSet<usize>, BTreeSet<usize>)>,
}

impl IntersectionGrid {
    fn build(edges: &[Edge], tolerance: f32) -> Self {
        let verticals: Vec<usize> = (0..edges.len())
            .filter(|&i| edges[i].orientation == Orientation::Vertical)
            .collect();
        let horizontals: Vec<usize> = (0..edges.len())
            .filter(|&i| edges[i].orientation == Orientation::Horizontal)
            .collect();

        let xs = distinct_sorted(verticals.iter().map(|&i| edges[i].x0));
        let ys = distinct_sorted(horizontals.iter().map(|&i| edges[i].top));

        let mut vertices: BTreeMap<(usize, usize), (BTreeSet<usize>, BTreeSet<usize>)> = BTreeMap::new();
        for &vi in &verticals {
            let v = &edges[vi];
            for &hi in &horizontals {
                let h = &edges[hi];
                if v.top <= h.top + tolerance
                    && v.bottom >= h.top - tolerance
                    && v.x0 >= h.x0 - tolerance
                    && v.x0 <= h.x1 + tolerance
                {
                    let (Some(xi), Some(yi)) = (index_of(&xs, v.x0), index_of(&ys, h.top)) else {
                        continue;
                    };
                    let entry = vertices.entry((xi, yi)).or_default();
                    entry.0.insert(vi);
                    entry.1.insert(hi);
                }
            }
        }

        Self { xs, ys, vertices }
    }

    fn connects(&self, a: (usize, usize), b: (usize, usize)) -> bool {
        let (Some(va), Some(vb)) = (self.vertices.get(&a), self.vertices.get(&b)) else {
            return false;
        };
        if a.0 == b.0 && !va.0.is_disjoint(&vb.0) {
            return true;
        }
        a.1 == b.1 && !va.1.is_disjoint(&vb.1)
    }

    /// Smallest cell whose top-left corner is `points[i]`.
    fn smallest_cell(&self, points: &[(usize, usize)], i: usize) -> Option<[usize; 4]> {
        let pt = points[i];
        let rest = &points[i + 1..];
        let below = rest.iter().filter(|p| p.0 == pt.0);

        for &below_pt in below {
            if !self.connects(pt, below_pt) {
                continue;
            }
            for &right_pt in rest.iter().filter(|p| p.1 == pt.1) {
                if !self.connects(pt, right_pt) {
                    continue;
                }
                let bottom_right = (right_pt.0, below_pt.1);
                if self.vertices.contains_key(&bottom_right)
                    && self.connects(bottom_right, right_pt)
                    && self.connects(bottom_right, below_pt)
                {
                    return Some([pt.0, pt.1, bottom_right.0, bottom_right.1]);
                }
            }
        }
        None
    }

    fn cells(&self) -> Vec<[usize; 4]> {
        // BTreeMap keys are sorted by (x, y)
        let points: Vec<(usize, usize)> = self.vertices.keys().copied().collect();
        (0..points.len())
            .filter_map(|i| self.smallest_cell(&points, i))
            .collect()
    }

    fn rect(&self, cell: &[usize; 4]) -> Rect {
        Rect::from_points(self.xs[cell[0]], self.ys[cell[1]], self.xs[cell[2]], self.ys[cell[3]])
    }
}

fn distinct_sorted(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut values: Vec<f32> = values.collect();
    values.sort_by(|a, b| safe_float_cmp(*a, *b));
    values.dedup();
    values
}

fn index_of(sorted: &[f32], value: f32) -> Option<usize> {
    sorted
        .binary_search_by(|probe| safe_float_cmp(*probe, value))
        .ok()
}

/// Group cells that share corners into tables.
fn group_cells(cells: Vec<[usize; 4]>) -> Vec<Vec<[usize; 4]>> {
    let corners = |c: &[usize; 4]| [(c[0], c[1]), (c[0], c[3]), (c[2], c[1]), (c[2], c[3])];

    let mut remaining = cells;
    let mut tables = Vec::new();
    let mut current_corners: HashSet<(usize, usize)> = HashSet::new();
    let mut current: Vec<[usize; 4]> = Vec::new();

    while !remaining.is_empty() {
        let before = current.len();
        let mut rest = Vec::with_capacity(remaining.len());
        for cell in remaining {
            let cell_corners = corners(&cell);
            if current.is_empty() || cell_corners.iter().any(|c| current_corners.contains(c)) {
                current_corners.extend(cell_corners);
                current.push(cell);
            } else {
                rest.push(cell);
            }
        }
        remaining = rest;
        if current.len() == before {
            tables.push(std::mem::take(&mut current));
            current_corners.clear();
        }
    }
    if !current.is_empty() {
        tables.push(current);
    }

    // Order by top-most then left-most corner, keep real tables only
    tables.sort_by_key(|t| t.iter().map(|c| (c[1], c[0])).min());
    tables.retain(|t| t.len() > 1);
    tables
}

/// One physical grid row of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// One slot per table column, left to right; `None` where no cell starts
    /// in that column (merged or missing cells)
    pub cells: Vec<Option<Rect>>,
}

impl TableRow {
    /// Bounding box of the present cells.
    pub fn bbox(&self) -> Option<Rect> {
        self.cells
            .iter()
            .flatten()
            .copied()
            .reduce(|acc, cell| acc.union(&cell))
    }
}

/// A detected table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Cells in detection order
    pub cells: Vec<Rect>,
}

impl Table {
    /// Bounding box of all cells.
    pub fn bbox(&self) -> Option<Rect> {
        self.cells.iter().copied().reduce(|acc, cell| acc.union(&cell))
    }

    /// Cells arranged in grid rows, top to bottom.
    ///
    /// Columns are the distinct cell left edges across the whole table; a row
    /// holds the cells sharing one top edge.
    pub fn rows(&self) -> Vec<TableRow> {
        let columns = distinct_sorted(self.cells.iter().map(|c| c.left()));

        let mut sorted = self.cells.clone();
        sorted.sort_by(|a, b| {
            safe_float_cmp(a.top(), b.top()).then_with(|| safe_float_cmp(a.left(), b.left()))
        });

        let mut rows: Vec<TableRow> = Vec::new();
        let mut current_top: Option<f32> = None;
        for cell in sorted {
            if current_top != Some(cell.top()) {
                rows.push(TableRow {
                    cells: vec![None; columns.len()],
                });
                current_top = Some(cell.top());
            }
            if let (Some(row), Some(col)) = (rows.last_mut(), index_of(&columns, cell.left())) {
                row.cells[col] = Some(cell);
            }
        }
        rows
    }

    /// Cell text per grid row: `None` for absent cells, `""` for empty ones.
    ///
    /// A character belongs to a cell when the centre of its box lies inside
    /// the cell (left/top inclusive, right/bottom exclusive).
    pub fn extract(&self, chars: &[PageChar], settings: &TableSettings) -> Vec<Vec<Option<String>>> {
        self.rows()
            .iter()
            .map(|row| {
                let row_chars: Vec<&PageChar> = match row.bbox() {
                    Some(bbox) => chars
                        .iter()
                        .filter(|c| bbox.contains_point_half_open(&c.mid()))
                        .collect(),
                    None => Vec::new(),
                };
                row.cells
                    .iter()
                    .map(|cell| {
                        cell.map(|cell| {
                            let inside = row_chars
                                .iter()
                                .copied()
                                .filter(|c| cell.contains_point_half_open(&c.mid()));
                            chars_to_text(inside, settings.text_x_tolerance, settings.text_y_tolerance)
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Finds tables on one page from its painted segments.
#[derive(Debug)]
pub struct TableFinder {
    settings: TableSettings,
    edges: Vec<Edge>,
}

impl TableFinder {
    /// Prepare edges from page-space segments.
    pub fn new(segments: &[Segment], page_box: &PdfBox, settings: TableSettings) -> Self {
        let raw: Vec<Edge> = segments
            .iter()
            .filter_map(|s| Edge::from_segment(s, page_box))
            .collect();
        Self::from_edges(raw, settings)
    }

    /// Prepare from extraction-space edges.
    pub fn from_edges(edges: Vec<Edge>, settings: TableSettings) -> Self {
        let raw_count = edges.len();
        let edges = merge_edges(edges, &settings);
        log::trace!("{} raw edges merged into {}", raw_count, edges.len());
        Self { settings, edges }
    }

    /// Merged edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Detected tables, ordered by top-most then left-most cell corner.
    pub fn find_tables(&self) -> Vec<Table> {
        let grid = IntersectionGrid::build(&self.edges, self.settings.intersection_tolerance);
        let cells = grid.cells();
        let tables: Vec<Table> = group_cells(cells)
            .into_iter()
            .map(|group| Table {
                cells: group.iter().map(|c| grid.rect(c)).collect(),
            })
            .collect();
        log::debug!(
            "{} intersections, {} tables",
            grid.vertices.len(),
            tables.len()
        );
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    /// Full grid of `cols` × `rows` cells starting at (x, y).
    fn grid_edges(x: f32, y: f32, col_widths: &[f32], row_heights: &[f32]) -> Vec<Edge> {
        let width: f32 = col_widths.iter().sum();
        let height: f32 = row_heights.iter().sum();
        let mut edges = Vec::new();

        let mut cy = y;
        edges.push(Edge::horizontal(cy, x, x + width));
        for h in row_heights {
            cy += h;
            edges.push(Edge::horizontal(cy, x, x + width));
        }
        let mut cx = x;
        edges.push(Edge::vertical(cx, y, y + height));
        for w in col_widths {
            cx += w;
            edges.push(Edge::vertical(cx, y, y + height));
        }
        edges
    }

    #[test]
    fn test_cluster_positions_chained() {
        let (ids, means) = cluster_positions(&[10.0, 12.5, 15.0, 30.0], 3.0);
        assert_eq!(ids, vec![0, 0, 0, 1]);
        assert!((means[0] - 12.5).abs() < 1e-5);
        assert_eq!(means[1], 30.0);
    }

    #[test]
    fn test_merge_snaps_and_joins() {
        let edges = vec![
            Edge::horizontal(100.0, 0.0, 50.0),
            Edge::horizontal(101.0, 52.0, 100.0),
            Edge::horizontal(200.0, 0.0, 2.0),
            Edge::vertical(10.0, 0.0, 0.5),
        ];
        let merged = merge_edges(edges, &TableSettings::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].top, 100.5);
        assert_eq!(merged[0].x0, 0.0);
        assert_eq!(merged[0].x1, 100.0);
    }

    #[test]
    fn test_edge_from_segment_flips() {
        let page = PdfBox::new(0.0, 0.0, 600.0, 800.0);
        let seg = Segment {
            from: Point::new(10.0, 700.0),
            to: Point::new(110.0, 700.0),
        };
        let edge = Edge::from_segment(&seg, &page).unwrap();
        assert_eq!(edge.orientation, Orientation::Horizontal);
        assert_eq!(edge.top, 100.0);

        let slanted = Segment {
            from: Point::new(0.0, 0.0),
            to: Point::new(10.0, 10.0),
        };
        assert!(Edge::from_segment(&slanted, &page).is_none());
    }

    #[test]
    fn test_simple_grid() {
        let edges = grid_edges(50.0, 100.0, &[40.0, 60.0], &[20.0, 20.0, 20.0]);
        let finder = TableFinder::from_edges(edges, TableSettings::default());
        let tables = finder.find_tables();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.cells.len(), 6);
        let bbox = table.bbox().unwrap();
        assert_eq!(bbox, Rect::from_points(50.0, 100.0, 150.0, 160.0));

        let rows = table.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.cells.len() == 2 && r.cells.iter().all(Option::is_some)));
        assert_eq!(rows[1].cells[1], Some(Rect::from_points(90.0, 120.0, 150.0, 140.0)));
    }

    #[test]
    fn test_merged_cell_leaves_gap() {
        // Second row has no inner divider: one wide cell, column 1 absent
        let mut edges = vec![
            Edge::horizontal(0.0, 0.0, 100.0),
            Edge::horizontal(10.0, 0.0, 100.0),
            Edge::horizontal(20.0, 0.0, 100.0),
            Edge::vertical(0.0, 0.0, 20.0),
            Edge::vertical(100.0, 0.0, 20.0),
        ];
        edges.push(Edge::vertical(50.0, 0.0, 10.0));
        let tables = TableFinder::from_edges(edges, TableSettings::default()).find_tables();
        assert_eq!(tables.len(), 1);

        let rows = tables[0].rows();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].cells[0].is_some());
        assert!(rows[1].cells[1].is_none());
        assert_eq!(rows[1].cells[0].unwrap().right(), 100.0);
    }

    #[test]
    fn test_no_edges_no_tables() {
        let finder = TableFinder::from_edges(Vec::new(), TableSettings::default());
        assert!(finder.find_tables().is_empty());
    }

    #[test]
    fn test_single_cell_is_not_a_table() {
        let edges = grid_edges(0.0, 0.0, &[50.0], &[20.0]);
        let finder = TableFinder::from_edges(edges, TableSettings::default());
        assert!(finder.find_tables().is_empty());
    }

    #[test]
    fn test_two_tables_ordered_top_first() {
        let mut edges = grid_edges(10.0, 400.0, &[30.0, 30.0], &[15.0]);
        edges.extend(grid_edges(200.0, 50.0, &[30.0], &[15.0, 15.0]));
        let tables = TableFinder::from_edges(edges, TableSettings::default()).find_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].bbox().unwrap().top(), 50.0);
        assert_eq!(tables[1].bbox().unwrap().top(), 400.0);
    }

    #[test]
    fn test_extract_cell_text() {
        let edges = grid_edges(0.0, 0.0, &[50.0, 100.0], &[20.0, 20.0]);
        let tables = TableFinder::from_edges(edges, TableSettings::default()).find_tables();
        let ch = |t: &str, x: f32, top: f32| PageChar {
            text: t.to_string(),
            bbox: Rect::from_points(x, top, x + 5.0, top + 8.0),
        };
        let chars = vec![
            ch("N", 5.0, 5.0),
            ch("o", 10.0, 5.0),
            ch("A", 60.0, 25.0),
            ch("1", 65.0, 25.0),
            // centre on the shared border at x=50 belongs to the right cell
            ch("X", 47.5, 25.0),
        ];
        let text = tables[0].extract(&chars, &TableSettings::default());
        assert_eq!(text.len(), 2);
        assert_eq!(text[0][0].as_deref(), Some("No"));
        assert_eq!(text[0][1].as_deref(), Some(""));
        assert_eq!(text[1][1].as_deref(), Some("X A1"));
    }
}
