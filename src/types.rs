use std::hash::Hash;

use glam::{IVec2, Vec2};

/// Tolerance for the strict point containment test.
///
/// A point must sit at least this far inside every edge to count as interior,
/// so grazing contacts never classify as intersections.
pub const DELTA: f32 = 1e-5;

/// Cell size used by [`WorldConfig::default`].
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// User-defined opaque identity carried through collisions and queries
/// (e.g., pack your entity id). The world stores geometry separately and
/// never inspects keys beyond identity.
pub trait ItemKey: Copy + Eq + Hash {}

impl<T: Copy + Eq + Hash> ItemKey for T {}

/// Axis-aligned rectangle: top-left corner plus extents, +y pointing down.
///
/// Every rect stored in a world has strictly positive extents. For grid
/// membership a rect covers the half-open region `[x, x+w) x [y, y+h)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    /// Top-left corner.
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Same extents at a different top-left corner.
    pub fn with_pos(self, pos: Vec2) -> Rect {
        Rect {
            x: pos.x,
            y: pos.y,
            ..self
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Smallest rect covering both `self` and `other`. This is the swept
    /// bounds of a move from one position to another.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let r = (self.x + self.w).max(other.x + other.w);
        let b = (self.y + self.h).max(other.y + other.h);
        Rect::new(x, y, r - x, b - y)
    }

    /// Finite position, strictly positive finite extents.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Edge length of one grid cell. Immutable after construction.
    pub cell_size: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

/// Result of clipping a segment against a rect: entry/exit parameters plus
/// the outward normals of the sides crossed at entry and exit.
///
/// Normals are only meaningful when the clip ran over the unbounded
/// parameter interval.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentClip {
    pub ti1: f32,
    pub ti2: f32,
    pub normal1: IVec2,
    pub normal2: IVec2,
}

/// First-contact info for a resolved collision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Touch {
    /// Top-left of the moving rect at the moment of first contact.
    pub pos: Vec2,
    /// Outward normal of the stationary rect at the contact, axis-aligned.
    pub normal: IVec2,
}

/// Touch info plus the corrected goal for a slide response.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Slide {
    pub touch: Vec2,
    pub normal: IVec2,
    /// Goal position with the component perpendicular to the normal restored.
    pub pos: Vec2,
}

/// Touch info plus the corrected goal for a bounce response.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounce {
    pub touch: Vec2,
    pub normal: IVec2,
    /// Remaining displacement reflected across the contact normal's axis.
    pub pos: Vec2,
}

/// One item crossed by a segment query, with the clipped parameters and the
/// world-space entry/exit points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentInfo<K> {
    pub item: K,
    pub ti1: f32,
    pub ti2: f32,
    pub entry: Vec2,
    pub exit: Vec2,
}
