use std::collections::{HashMap, HashSet};

use glam::Vec2;
use smallvec::SmallVec;

use crate::types::{ItemKey, Rect};

/// Cell span covered by a rect: columns `cx .. cx + cols` and rows
/// `cy .. cy + rows`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellSpan {
    pub cx: i32,
    pub cy: i32,
    pub cols: i32,
    pub rows: i32,
}

/// Sparse uniform grid mapping cell coordinates to the set of items whose
/// rect overlaps the cell.
///
/// Cells are created lazily on insertion and dropped when their last item is
/// removed, so iteration cost tracks occupied cells rather than the world's
/// bounding extent.
#[derive(Debug)]
pub struct Grid<K> {
    cell_size: f32,
    cells: HashMap<(i32, i32), HashSet<K>>,
}

/// Per-axis traversal state: cell step, parameter increment per cell and the
/// parameter of the first boundary crossing.
fn traverse_init_step(cell_size: f32, ct: i32, t1: f32, t2: f32) -> (i32, f32, f32) {
    let v = t2 - t1;
    if v > 0.0 {
        (1, cell_size / v, ((ct + 1) as f32 * cell_size - t1) / v)
    } else if v < 0.0 {
        (-1, -cell_size / v, (ct as f32 * cell_size - t1) / v)
    } else {
        (0, f32::INFINITY, f32::INFINITY)
    }
}

impl<K: ItemKey> Grid<K> {
    pub fn new(cell_size: f32) -> Grid<K> {
        Grid {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell containing a world-space point.
    pub fn to_cell(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// World-space top-left corner of a cell.
    pub fn cell_origin(&self, cx: i32, cy: i32) -> Vec2 {
        Vec2::new(cx as f32 * self.cell_size, cy as f32 * self.cell_size)
    }

    /// Cells covered by a rect. Right and bottom edges are half-open: a rect
    /// ending exactly on a boundary does not reach into the next cell.
    pub fn cell_span(&self, rect: Rect) -> CellSpan {
        let cs = self.cell_size;
        let cx = (rect.x / cs).floor() as i32;
        let cy = (rect.y / cs).floor() as i32;
        // The max() guards against a span collapsing to nothing when a tiny
        // width rounds away at a boundary; every rect lives in at least one
        // cell.
        let cr = (((rect.x + rect.w) / cs).ceil() as i32 - 1).max(cx);
        let cb = (((rect.y + rect.h) / cs).ceil() as i32 - 1).max(cy);
        CellSpan {
            cx,
            cy,
            cols: cr - cx + 1,
            rows: cb - cy + 1,
        }
    }

    pub fn insert(&mut self, item: K, rect: Rect) {
        let span = self.cell_span(rect);
        for cy in span.cy..span.cy + span.rows {
            for cx in span.cx..span.cx + span.cols {
                self.cells.entry((cx, cy)).or_default().insert(item);
            }
        }
    }

    pub fn remove(&mut self, item: K, rect: Rect) {
        let span = self.cell_span(rect);
        for cy in span.cy..span.cy + span.rows {
            for cx in span.cx..span.cx + span.cols {
                let mut emptied = false;
                if let Some(items) = self.cells.get_mut(&(cx, cy)) {
                    items.remove(&item);
                    emptied = items.is_empty();
                }
                if emptied {
                    self.cells.remove(&(cx, cy));
                }
            }
        }
    }

    /// Items stored in one cell.
    pub fn items_at(&self, cx: i32, cy: i32) -> Option<&HashSet<K>> {
        self.cells.get(&(cx, cy))
    }

    /// Deduplicated union of the item sets over the rect's cell span. Large
    /// items appear in many cells but are returned once.
    pub fn query(&self, rect: Rect) -> Vec<K> {
        let span = self.cell_span(rect);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for cy in span.cy..span.cy + span.rows {
            for cx in span.cx..span.cx + span.cols {
                if let Some(items) = self.cells.get(&(cx, cy)) {
                    for &item in items {
                        if seen.insert(item) {
                            out.push(item);
                        }
                    }
                }
            }
        }
        out
    }

    /// Walk every cell the segment touches, in traversal order from `p1`
    /// toward `p2`.
    ///
    /// When the segment crosses a cell corner exactly, both off-diagonal
    /// cells are emitted (x neighbor first) before the diagonal one,
    /// matching the order a perfectly diagonal ray touches them. A budget of
    /// twice the Manhattan cell distance terminates the walk if accumulated
    /// float error stalls it; the end cell is always emitted.
    pub fn traverse_segment(&self, p1: Vec2, p2: Vec2, mut visit: impl FnMut(i32, i32)) {
        let (cx1, cy1) = self.to_cell(p1);
        let (cx2, cy2) = self.to_cell(p2);
        let (step_x, dx, mut tx) = traverse_init_step(self.cell_size, cx1, p1.x, p2.x);
        let (step_y, dy, mut ty) = traverse_init_step(self.cell_size, cy1, p1.y, p2.y);
        let (mut cx, mut cy) = (cx1, cy1);

        visit(cx, cy);

        let mut budget = 2 * ((cx2 - cx1).abs() + (cy2 - cy1).abs());
        while (cx != cx2 || cy != cy2) && budget > 0 {
            budget -= 1;
            if tx < ty {
                tx += dx;
                cx += step_x;
                visit(cx, cy);
            } else if ty < tx {
                ty += dy;
                cy += step_y;
                visit(cx, cy);
            } else {
                // Exact corner crossing.
                visit(cx + step_x, cy);
                visit(cx, cy + step_y);
                tx += dx;
                ty += dy;
                cx += step_x;
                cy += step_y;
                visit(cx, cy);
            }
        }

        if cx != cx2 || cy != cy2 {
            visit(cx2, cy2);
        }
    }

    /// Occupied cells along the segment, in traversal order.
    pub fn cells_touching_segment(&self, p1: Vec2, p2: Vec2) -> SmallVec<[(i32, i32); 16]> {
        let mut out = SmallVec::new();
        self.traverse_segment(p1, p2, |cx, cy| {
            if self.cells.contains_key(&(cx, cy)) {
                out.push((cx, cy));
            }
        });
        out
    }
}
