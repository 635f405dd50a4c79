use glam::Vec2;

use crate::collision::Collision;
use crate::errors::Result;
use crate::types::*;

/// Public API contract for the collision world.
pub trait CollisionWorldApi<K: ItemKey> {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Result<Self>
    where
        Self: Sized;

    // --- Item lifecycle ----------------------------------------------------

    /// Register an item with its rect. Rejects duplicates and rects with
    /// non-positive extents.
    fn add(&mut self, item: K, rect: Rect) -> Result<()>;

    /// Forget an item entirely.
    fn remove(&mut self, item: K) -> Result<()>;

    /// Replace an item's rect wholesale (position and/or size), without
    /// collision detection.
    fn teleport(&mut self, item: K, rect: Rect) -> Result<()>;

    /// Current rect of an item.
    fn rect_of(&self, item: K) -> Result<Rect>;

    // --- Movement ----------------------------------------------------------

    /// Detect every collision an item would undergo moving its top-left to
    /// `goal`, sorted by time of impact. Does not mutate the world.
    fn check(&self, item: K, goal: Vec2) -> Result<Vec<Collision<K>>>;

    /// Like [`check`](Self::check), skipping items in `ignore` and items for
    /// which `filter` returns true.
    fn check_filtered<F>(
        &self,
        item: K,
        goal: Vec2,
        ignore: &[K],
        filter: F,
    ) -> Result<Vec<Collision<K>>>
    where
        F: FnMut(K) -> bool;

    /// [`check`](Self::check), then adopt the goal position unconditionally.
    /// The caller decides how to respond to the returned collisions (e.g.
    /// compute a slide position and move again).
    fn move_to(&mut self, item: K, goal: Vec2) -> Result<Vec<Collision<K>>>;

    /// Filtered variant of [`move_to`](Self::move_to).
    fn move_to_filtered<F>(
        &mut self,
        item: K,
        goal: Vec2,
        ignore: &[K],
        filter: F,
    ) -> Result<Vec<Collision<K>>>
    where
        F: FnMut(K) -> bool;

    // --- Queries -----------------------------------------------------------

    /// All items strictly containing the point, in unspecified order.
    fn query_point(&self, p: Vec2) -> Vec<K>;

    /// All items overlapping the rect, in unspecified order.
    fn query_rect(&self, rect: Rect) -> Vec<K>;

    /// All items crossed by the directed segment, in traversal order.
    fn query_segment(&self, p1: Vec2, p2: Vec2) -> Vec<K>;

    /// Like [`query_segment`](Self::query_segment), with clip parameters and
    /// world-space entry/exit points per item.
    fn query_segment_info(&self, p1: Vec2, p2: Vec2) -> Vec<SegmentInfo<K>>;
}

/// Geometry kernel signatures: pure functions over rects and segments.
pub trait AabbKernelApi {
    /// Corner of `rect` nearest to `p`, per axis. Exact ties resolve to the
    /// far side (`x + w` / `y + h`).
    fn nearest_corner(rect: Rect, p: Vec2) -> Vec2;

    /// Strict interior test with [`DELTA`](crate::types::DELTA) tolerance;
    /// boundary points are not contained.
    fn contains_point(rect: Rect, p: Vec2) -> bool;

    /// Strict overlap; rects that merely touch do not overlap.
    fn rects_overlap(a: Rect, b: Rect) -> bool;

    /// Minkowski difference of `a` and `b`: contains the origin iff the two
    /// rects overlap, and a segment from the origin along `a`'s displacement
    /// crosses it iff the swept `a` crosses `b`.
    fn minkowski_diff(a: Rect, b: Rect) -> Rect;

    /// Squared distance between rect centers.
    fn rect_distance_sq(a: Rect, b: Rect) -> f32;

    /// Clip the segment `p1 -> p2` against `rect` starting from the
    /// parameter interval `[ti1, ti2]` (generalized Liang-Barsky).
    fn segment_intersection(
        rect: Rect,
        p1: Vec2,
        p2: Vec2,
        ti1: f32,
        ti2: f32,
    ) -> Option<SegmentClip>;
}
