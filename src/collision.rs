use glam::{IVec2, Vec2};

use crate::api::AabbKernelApi;
use crate::narrowphase::Kernel;
use crate::types::{Bounce, ItemKey, Rect, Slide, Touch};

fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// One resolved collision between a moving item and a stationary other.
///
/// Descriptors are only obtainable through [`Collision::resolve`], so every
/// one the caller sees is fully classified; the response helpers
/// ([`touch`](Collision::touch), [`slide`](Collision::slide),
/// [`bounce`](Collision::bounce)) are pure derivations. A descriptor is a
/// snapshot: it stays meaningful until the next world mutation affecting
/// either item.
#[derive(Copy, Clone, Debug)]
pub struct Collision<K> {
    /// The moving item.
    pub item: K,
    /// The stationary other.
    pub other: K,
    /// The moving rect at resolution time.
    pub item_rect: Rect,
    /// The other rect at resolution time.
    pub other_rect: Rect,
    /// Requested top-left for the moving rect.
    pub goal: Vec2,
    /// Attempted displacement, `goal - item_rect.pos()`.
    pub vel: Vec2,
    /// True when the rects already overlapped before any motion.
    pub is_intersection: bool,
    /// Time of impact in `[0, 1)` for tunneling hits. For pre-existing
    /// intersections this is minus the overlap area, so intersections sort
    /// before every tunneling hit and deeper overlaps sort first.
    pub ti: f32,
    /// Entry normal for tunneling hits; `(0, 0)` for intersections, where
    /// the touch normal is determined by the minimum translation instead.
    pub normal: IVec2,
    /// Minkowski difference of the two rects.
    pub diff: Rect,
    touch: Vec2,
    touch_normal: IVec2,
}

impl<K: ItemKey> Collision<K> {
    /// Classify one candidate pair. Returns `None` when moving `item_rect`'s
    /// top-left to `goal` never brings it into contact with `other_rect`.
    pub fn resolve(item: K, other: K, item_rect: Rect, other_rect: Rect, goal: Vec2) -> Option<Self> {
        let vel = goal - item_rect.pos();
        let diff = Kernel::minkowski_diff(item_rect, other_rect);

        let (is_intersection, ti, normal) = if Kernel::contains_point(diff, Vec2::ZERO) {
            let corner = Kernel::nearest_corner(diff, Vec2::ZERO);
            let wi = item_rect.w.min(corner.x.abs());
            let hi = item_rect.h.min(corner.y.abs());
            (true, -wi * hi, IVec2::ZERO)
        } else {
            let clip = Kernel::segment_intersection(
                diff,
                Vec2::ZERO,
                vel,
                f32::NEG_INFINITY,
                f32::INFINITY,
            )?;
            let hits = clip.ti1 < 1.0 && (clip.ti1 > 0.0 || (clip.ti1 == 0.0 && clip.ti2 > 0.0));
            if !hits {
                return None;
            }
            (false, clip.ti1, clip.normal1)
        };

        let (touch, touch_normal) = contact(item_rect, diff, vel, is_intersection, ti, normal);

        Some(Collision {
            item,
            other,
            item_rect,
            other_rect,
            goal,
            vel,
            is_intersection,
            ti,
            normal,
            diff,
            touch,
            touch_normal,
        })
    }

    /// Position of the moving rect at first contact, with the contact normal.
    pub fn touch(&self) -> Touch {
        Touch {
            pos: self.touch,
            normal: self.touch_normal,
        }
    }

    /// Slide response: from the touch position, restore the goal coordinate
    /// perpendicular to the contact normal. Without motion the slide position
    /// equals the touch position.
    pub fn slide(&self) -> Slide {
        let Touch { pos, normal } = self.touch();
        let mut slid = pos;
        if self.vel != Vec2::ZERO {
            if normal.x != 0 {
                slid.y = self.goal.y;
            } else {
                slid.x = self.goal.x;
            }
        }
        Slide {
            touch: pos,
            normal,
            pos: slid,
        }
    }

    /// Bounce response: reflect the remaining displacement `goal - touch` by
    /// negating its component along the contact normal's axis. Without motion
    /// the bounce position equals the touch position.
    pub fn bounce(&self) -> Bounce {
        let Touch { pos, normal } = self.touch();
        let mut bounced = pos;
        if self.vel != Vec2::ZERO {
            let mut rest = self.goal - pos;
            if normal.x == 0 {
                rest.y = -rest.y;
            } else {
                rest.x = -rest.x;
            }
            bounced = pos + rest;
        }
        Bounce {
            touch: pos,
            normal,
            pos: bounced,
        }
    }
}

/// First-contact position and normal for a classified collision.
fn contact(
    item_rect: Rect,
    diff: Rect,
    vel: Vec2,
    is_intersection: bool,
    ti: f32,
    normal: IVec2,
) -> (Vec2, IVec2) {
    if !is_intersection {
        return (item_rect.pos() + vel * ti, normal);
    }

    if vel == Vec2::ZERO {
        // Stationary overlap: minimum translation along the axis of least
        // penetration. Exact ties go to the y axis.
        let corner = Kernel::nearest_corner(diff, Vec2::ZERO);
        let (px, py) = if corner.x.abs() < corner.y.abs() {
            (corner.x, 0.0)
        } else {
            (0.0, corner.y)
        };
        (
            item_rect.pos() + Vec2::new(px, py),
            IVec2::new(sign(px), sign(py)),
        )
    } else {
        // Moving overlap: rewind along the displacement to the last instant
        // the rects were separated and surface the face crossed there.
        match Kernel::segment_intersection(diff, Vec2::ZERO, vel, f32::NEG_INFINITY, 1.0) {
            Some(clip) => (item_rect.pos() + vel * clip.ti1, clip.normal1),
            // Unreachable for an origin interior to `diff`; keep the
            // displaced position with an undetermined normal.
            None => (item_rect.pos() + vel * ti, IVec2::ZERO),
        }
    }
}
