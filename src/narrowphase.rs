use glam::{IVec2, Vec2};

use crate::api::AabbKernelApi;
use crate::types::{DELTA, Rect, SegmentClip};

/// Stateless AABB geometry kernel.
pub struct Kernel;

fn nearest(v: f32, a: f32, b: f32) -> f32 {
    // Ties go to `b`, the far side. Resolution of stationary overlaps
    // depends on this.
    if (a - v).abs() < (b - v).abs() { a } else { b }
}

impl AabbKernelApi for Kernel {
    fn nearest_corner(rect: Rect, p: Vec2) -> Vec2 {
        Vec2::new(
            nearest(p.x, rect.x, rect.x + rect.w),
            nearest(p.y, rect.y, rect.y + rect.h),
        )
    }

    fn contains_point(rect: Rect, p: Vec2) -> bool {
        p.x - rect.x > DELTA
            && p.y - rect.y > DELTA
            && rect.x + rect.w - p.x > DELTA
            && rect.y + rect.h - p.y > DELTA
    }

    fn rects_overlap(a: Rect, b: Rect) -> bool {
        a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
    }

    fn minkowski_diff(a: Rect, b: Rect) -> Rect {
        Rect::new(b.x - a.x - a.w, b.y - a.y - a.h, a.w + b.w, a.h + b.h)
    }

    fn rect_distance_sq(a: Rect, b: Rect) -> f32 {
        let dx = a.x - b.x + (a.w - b.w) / 2.0;
        let dy = a.y - b.y + (a.h - b.h) / 2.0;
        dx * dx + dy * dy
    }

    fn segment_intersection(
        rect: Rect,
        p1: Vec2,
        p2: Vec2,
        ti1: f32,
        ti2: f32,
    ) -> Option<SegmentClip> {
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let (mut ti1, mut ti2) = (ti1, ti2);
        let mut normal1 = IVec2::ZERO;
        let mut normal2 = IVec2::ZERO;

        // For each side: `p` is the direction component perpendicular to the
        // side, `q` the signed distance from the start point to the side.
        let sides = [
            (IVec2::new(-1, 0), -dx, p1.x - rect.x),
            (IVec2::new(1, 0), dx, rect.x + rect.w - p1.x),
            (IVec2::new(0, -1), -dy, p1.y - rect.y),
            (IVec2::new(0, 1), dy, rect.y + rect.h - p1.y),
        ];

        for (normal, p, q) in sides {
            if p == 0.0 {
                // Parallel to this side; starting outside means no hit ever.
                if q <= 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    // Entering face.
                    if r > ti2 {
                        return None;
                    }
                    if r > ti1 {
                        ti1 = r;
                        normal1 = normal;
                    }
                } else {
                    // Exiting face.
                    if r < ti1 {
                        return None;
                    }
                    if r < ti2 {
                        ti2 = r;
                        normal2 = normal;
                    }
                }
            }
        }

        Some(SegmentClip {
            ti1,
            ti2,
            normal1,
            normal2,
        })
    }
}
