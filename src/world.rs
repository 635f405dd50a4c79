use std::collections::{HashMap, HashSet};

use glam::Vec2;
use log::{debug, trace};

use crate::api::{AabbKernelApi, CollisionWorldApi};
use crate::collision::Collision;
use crate::errors::{Error, Result};
use crate::grid::Grid;
use crate::narrowphase::Kernel;
use crate::types::{ItemKey, Rect, SegmentInfo, WorldConfig};

/// Top-level collision world: owns the authoritative item -> rect map and
/// the uniform grid that accelerates the broad phase.
///
/// Geometry lives in the rect map; grid cells hold copies of the keys only,
/// so dropping a cell never affects an item's rect.
pub struct CollisionWorld<K> {
    cfg: WorldConfig,
    rects: HashMap<K, Rect>,
    grid: Grid<K>,
}

impl<K: ItemKey> CollisionWorldApi<K> for CollisionWorld<K> {
    fn new(cfg: WorldConfig) -> Result<Self> {
        if !cfg.cell_size.is_finite() || cfg.cell_size <= 0.0 {
            return Err(Error::InvalidCellSize);
        }
        let grid = Grid::new(cfg.cell_size);
        Ok(CollisionWorld {
            cfg,
            rects: HashMap::new(),
            grid,
        })
    }

    // --- Item lifecycle ----------------------------------------------------

    fn add(&mut self, item: K, rect: Rect) -> Result<()> {
        if !rect.is_valid() {
            return Err(Error::InvalidDimensions);
        }
        if self.rects.contains_key(&item) {
            return Err(Error::DuplicateItem);
        }
        self.rects.insert(item, rect);
        self.grid.insert(item, rect);
        debug!(
            "add rect ({}, {}) {}x{}; {} items tracked",
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            self.rects.len()
        );
        Ok(())
    }

    fn remove(&mut self, item: K) -> Result<()> {
        let rect = self.rects.remove(&item).ok_or(Error::UnknownItem)?;
        self.grid.remove(item, rect);
        debug!("remove rect at ({}, {})", rect.x, rect.y);
        Ok(())
    }

    fn teleport(&mut self, item: K, rect: Rect) -> Result<()> {
        if !rect.is_valid() {
            return Err(Error::InvalidDimensions);
        }
        let Some(slot) = self.rects.get_mut(&item) else {
            return Err(Error::UnknownItem);
        };
        let prev = std::mem::replace(slot, rect);
        self.grid.remove(item, prev);
        self.grid.insert(item, rect);
        debug!(
            "teleport ({}, {}) -> ({}, {})",
            prev.x, prev.y, rect.x, rect.y
        );
        Ok(())
    }

    fn rect_of(&self, item: K) -> Result<Rect> {
        self.rects.get(&item).copied().ok_or(Error::UnknownItem)
    }

    // --- Movement ----------------------------------------------------------

    fn check(&self, item: K, goal: Vec2) -> Result<Vec<Collision<K>>> {
        self.check_filtered(item, goal, &[], |_| false)
    }

    fn check_filtered<F>(
        &self,
        item: K,
        goal: Vec2,
        ignore: &[K],
        mut filter: F,
    ) -> Result<Vec<Collision<K>>>
    where
        F: FnMut(K) -> bool,
    {
        if !goal.x.is_finite() || !goal.y.is_finite() {
            return Err(Error::InvalidCoordinates);
        }
        let rect = self.rect_of(item)?;
        // Broad phase over the swept bounds of the move; every candidate is
        // visited once even when it spans many cells.
        let swept = rect.union(&rect.with_pos(goal));
        let candidates = self.grid.query(swept);
        let candidate_count = candidates.len();

        let mut collisions = Vec::new();
        for other in candidates {
            if other == item || ignore.contains(&other) || filter(other) {
                continue;
            }
            let Some(&other_rect) = self.rects.get(&other) else {
                continue;
            };
            if let Some(col) = Collision::resolve(item, other, rect, other_rect, goal) {
                collisions.push(col);
            }
        }
        collisions.sort_by(|a, b| {
            a.ti.total_cmp(&b.ti).then_with(|| {
                let da = Kernel::rect_distance_sq(a.item_rect, a.other_rect);
                let db = Kernel::rect_distance_sq(b.item_rect, b.other_rect);
                da.total_cmp(&db)
            })
        });
        trace!(
            "check: {} collisions from {} candidates",
            collisions.len(),
            candidate_count
        );
        Ok(collisions)
    }

    fn move_to(&mut self, item: K, goal: Vec2) -> Result<Vec<Collision<K>>> {
        self.move_to_filtered(item, goal, &[], |_| false)
    }

    fn move_to_filtered<F>(
        &mut self,
        item: K,
        goal: Vec2,
        ignore: &[K],
        filter: F,
    ) -> Result<Vec<Collision<K>>>
    where
        F: FnMut(K) -> bool,
    {
        let collisions = self.check_filtered(item, goal, ignore, filter)?;
        // The goal is adopted regardless of what the check found; responding
        // to the collisions is the caller's business.
        let rect = self.rect_of(item)?;
        if rect.pos() != goal {
            self.teleport(item, rect.with_pos(goal))?;
        }
        Ok(collisions)
    }

    // --- Queries -----------------------------------------------------------

    fn query_point(&self, p: Vec2) -> Vec<K> {
        let (cx, cy) = self.grid.to_cell(p);
        let mut out = Vec::new();
        if let Some(items) = self.grid.items_at(cx, cy) {
            for &item in items {
                if let Some(&rect) = self.rects.get(&item)
                    && Kernel::contains_point(rect, p)
                {
                    out.push(item);
                }
            }
        }
        out
    }

    fn query_rect(&self, rect: Rect) -> Vec<K> {
        self.grid
            .query(rect)
            .into_iter()
            .filter(|item| {
                self.rects
                    .get(item)
                    .is_some_and(|&r| Kernel::rects_overlap(r, rect))
            })
            .collect()
    }

    fn query_segment(&self, p1: Vec2, p2: Vec2) -> Vec<K> {
        self.query_segment_info(p1, p2)
            .into_iter()
            .map(|info| info.item)
            .collect()
    }

    fn query_segment_info(&self, p1: Vec2, p2: Vec2) -> Vec<SegmentInfo<K>> {
        let d = p2 - p1;
        let mut visited = HashSet::new();
        let mut weighted: Vec<(f32, SegmentInfo<K>)> = Vec::new();
        for (cx, cy) in self.grid.cells_touching_segment(p1, p2) {
            let Some(items) = self.grid.items_at(cx, cy) else {
                continue;
            };
            for &item in items {
                if !visited.insert(item) {
                    continue;
                }
                let Some(&rect) = self.rects.get(&item) else {
                    continue;
                };
                let Some(clip) = Kernel::segment_intersection(rect, p1, p2, 0.0, 1.0) else {
                    continue;
                };
                let crossed = (0.0 < clip.ti1 && clip.ti1 < 1.0)
                    || (0.0 < clip.ti2 && clip.ti2 < 1.0);
                if !crossed {
                    continue;
                }
                // Sort on the infinite-line parameter so items behind the
                // start still order sensibly.
                let Some(line) = Kernel::segment_intersection(
                    rect,
                    p1,
                    p2,
                    f32::NEG_INFINITY,
                    f32::INFINITY,
                ) else {
                    continue;
                };
                weighted.push((
                    line.ti1.min(line.ti2),
                    SegmentInfo {
                        item,
                        ti1: clip.ti1,
                        ti2: clip.ti2,
                        entry: p1 + d * clip.ti1,
                        exit: p1 + d * clip.ti2,
                    },
                ));
            }
        }
        weighted.sort_by(|a, b| a.0.total_cmp(&b.0));
        weighted.into_iter().map(|(_, info)| info).collect()
    }
}

impl<K: ItemKey> CollisionWorld<K> {
    /// World with the default cell size.
    pub fn with_defaults() -> Self {
        let grid = Grid::new(WorldConfig::default().cell_size);
        CollisionWorld {
            cfg: WorldConfig::default(),
            rects: HashMap::new(),
            grid,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cfg.cell_size
    }

    pub fn has_item(&self, item: K) -> bool {
        self.rects.contains_key(&item)
    }

    pub fn item_count(&self) -> usize {
        self.rects.len()
    }

    /// All registered items, in unspecified order.
    pub fn items(&self) -> impl Iterator<Item = K> + '_ {
        self.rects.keys().copied()
    }

    /// Number of occupied grid cells.
    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::IVec2;
    use proptest::prelude::*;

    use super::*;

    fn world() -> CollisionWorld<&'static str> {
        CollisionWorld::new(WorldConfig { cell_size: 64.0 }).unwrap()
    }

    #[test]
    fn test_add_into_empty_world_collides_with_nothing() {
        let mut w = world();
        w.add("x", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let cols = w.check("x", Vec2::new(0.0, 0.0)).unwrap();
        assert!(cols.is_empty());
    }

    #[test]
    fn test_static_overlap_detected_on_check() {
        let mut w = world();
        w.add("a", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        w.add("b", Rect::new(4.0, 6.0, 10.0, 10.0)).unwrap();
        let cols = w.check("b", Vec2::new(4.0, 6.0)).unwrap();
        assert_eq!(cols.len(), 1);
        let col = &cols[0];
        assert_eq!(col.other, "a");
        assert!(col.is_intersection);
        assert_relative_eq!(col.ti, -24.0);
        let touch = col.touch();
        assert_eq!(touch.normal, IVec2::new(0, 1));
        assert_relative_eq!(touch.pos.y, 10.0);
    }

    #[test]
    fn test_tunneling_collision_through_small_item() {
        let mut w = world();
        w.add("a", Rect::new(1.0, 0.0, 2.0, 1.0)).unwrap();
        w.add("b", Rect::new(5.0, 0.0, 4.0, 1.0)).unwrap();
        let cols = w.check("b", Vec2::new(-5.0, 0.0)).unwrap();
        assert_eq!(cols.len(), 1);
        let col = &cols[0];
        assert_eq!(col.other, "a");
        assert!(!col.is_intersection);
        assert_relative_eq!(col.ti, 0.2);
        assert_eq!(col.normal, IVec2::new(1, 0));
    }

    #[test]
    fn test_collisions_sorted_by_time_of_impact() {
        let mut w = world();
        w.add("a", Rect::new(11.0, 0.0, 1.0, 1.0)).unwrap();
        w.add("b", Rect::new(7.0, 0.0, 1.0, 1.0)).unwrap();
        w.add("c", Rect::new(5.0, 0.0, 1.0, 1.0)).unwrap();
        w.add("d", Rect::new(9.0, 0.0, 1.0, 1.0)).unwrap();
        let cols = w.check("a", Vec2::new(1.0, 0.0)).unwrap();
        let order: Vec<&str> = cols.iter().map(|c| c.other).collect();
        assert_eq!(order, vec!["d", "b", "c"]);
        assert_relative_eq!(cols[0].ti, 0.1);
        assert_relative_eq!(cols[1].ti, 0.3);
        assert_relative_eq!(cols[2].ti, 0.5);
    }

    #[test]
    fn test_intersections_sort_before_tunnelings() {
        let mut w = world();
        w.add("mover", Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        // Overlapping at start; sorts first with negative ti.
        w.add("inside", Rect::new(2.0, 0.0, 4.0, 4.0)).unwrap();
        // Hit partway through the move.
        w.add("ahead", Rect::new(10.0, 0.0, 4.0, 4.0)).unwrap();
        let cols = w.check("mover", Vec2::new(20.0, 0.0)).unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].other, "inside");
        assert!(cols[0].ti < 0.0);
        assert_eq!(cols[1].other, "ahead");
        assert!(cols[1].ti >= 0.0 && cols[1].ti < 1.0);
    }

    #[test]
    fn test_move_adopts_goal_even_when_blocked() {
        let mut w = world();
        w.add("wall", Rect::new(20.0, 0.0, 10.0, 10.0)).unwrap();
        w.add("p", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let cols = w.move_to("p", Vec2::new(40.0, 0.0)).unwrap();
        assert_eq!(cols.len(), 1);
        let rect = w.rect_of("p").unwrap();
        assert_relative_eq!(rect.x, 40.0);
        assert_relative_eq!(rect.y, 0.0);
        assert_relative_eq!(rect.w, 10.0);
        assert_relative_eq!(rect.h, 10.0);
    }

    #[test]
    fn test_move_then_slide_resolves_against_wall() {
        let mut w = world();
        w.add("wall", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        w.add("p", Rect::new(20.0, 0.0, 10.0, 10.0)).unwrap();
        let cols = w.check("p", Vec2::new(5.0, 3.0)).unwrap();
        assert_eq!(cols.len(), 1);
        let slide = cols[0].slide();
        assert_relative_eq!(slide.touch.x, 10.0);
        assert_relative_eq!(slide.pos.x, 10.0);
        assert_relative_eq!(slide.pos.y, 3.0);
        // Re-issue the move to the slide position: it lands flush, touching
        // but not overlapping.
        let cols = w.move_to("p", slide.pos).unwrap();
        assert!(cols.is_empty());
        assert!(w.query_rect(Rect::new(9.9, 0.0, 0.2, 10.0)).contains(&"p"));
    }

    #[test]
    fn test_check_respects_ignore_and_filter() {
        let mut w = world();
        w.add("a", Rect::new(2.0, 0.0, 4.0, 4.0)).unwrap();
        w.add("b", Rect::new(3.0, 0.0, 4.0, 4.0)).unwrap();
        w.add("p", Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        let all = w.check("p", Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(all.len(), 2);
        let without_a = w
            .check_filtered("p", Vec2::new(0.0, 0.0), &["a"], |_| false)
            .unwrap();
        assert_eq!(without_a.len(), 1);
        assert_eq!(without_a[0].other, "b");
        let none = w
            .check_filtered("p", Vec2::new(0.0, 0.0), &[], |other| other == "b")
            .unwrap();
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].other, "a");
    }

    #[test]
    fn test_add_remove_round_trip_restores_world() {
        let mut w = world();
        w.add("keep", Rect::new(200.0, 200.0, 8.0, 8.0)).unwrap();
        let cells_before = w.cell_count();
        w.add("tmp", Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        w.remove("tmp").unwrap();
        assert_eq!(w.item_count(), 1);
        assert_eq!(w.cell_count(), cells_before);
        assert!(w.query_rect(Rect::new(-10.0, -10.0, 120.0, 120.0)).is_empty());
    }

    #[test]
    fn test_teleport_equals_remove_then_add() {
        let mut a = world();
        a.add("x", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        a.teleport("x", Rect::new(100.0, 100.0, 20.0, 5.0)).unwrap();

        let mut b = world();
        b.add("x", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        b.remove("x").unwrap();
        b.add("x", Rect::new(100.0, 100.0, 20.0, 5.0)).unwrap();

        assert_eq!(a.rect_of("x").unwrap(), b.rect_of("x").unwrap());
        assert_eq!(a.cell_count(), b.cell_count());
        assert!(a.query_rect(Rect::new(-5.0, -5.0, 20.0, 20.0)).is_empty());
        assert!(
            a.query_rect(Rect::new(90.0, 90.0, 20.0, 20.0))
                .contains(&"x")
        );
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        assert!(matches!(
            CollisionWorld::<u32>::new(WorldConfig { cell_size: 0.0 }),
            Err(Error::InvalidCellSize)
        ));
        assert!(matches!(
            CollisionWorld::<u32>::new(WorldConfig {
                cell_size: f32::NAN
            }),
            Err(Error::InvalidCellSize)
        ));

        let mut w = world();
        assert!(matches!(
            w.add("x", Rect::new(0.0, 0.0, 0.0, 10.0)),
            Err(Error::InvalidDimensions)
        ));
        assert!(matches!(
            w.add("x", Rect::new(f32::NAN, 0.0, 1.0, 1.0)),
            Err(Error::InvalidDimensions)
        ));
        w.add("x", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(matches!(
            w.add("x", Rect::new(50.0, 50.0, 10.0, 10.0)),
            Err(Error::DuplicateItem)
        ));
        assert!(matches!(
            w.check("x", Vec2::new(f32::NAN, 0.0)),
            Err(Error::InvalidCoordinates)
        ));
        // A failed add leaves the world unchanged.
        assert_eq!(w.item_count(), 1);
        assert_relative_eq!(w.rect_of("x").unwrap().x, 0.0);
    }

    #[test]
    fn test_unknown_item_operations_fail() {
        let mut w = world();
        assert!(matches!(w.remove("ghost"), Err(Error::UnknownItem)));
        assert!(matches!(w.rect_of("ghost"), Err(Error::UnknownItem)));
        assert!(matches!(
            w.check("ghost", Vec2::ZERO),
            Err(Error::UnknownItem)
        ));
        assert!(matches!(
            w.move_to("ghost", Vec2::ZERO),
            Err(Error::UnknownItem)
        ));
        assert!(matches!(
            w.teleport("ghost", Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(Error::UnknownItem)
        ));
    }

    #[test]
    fn test_query_point_uses_strict_containment() {
        let mut w = world();
        w.add("a", Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(w.query_point(Vec2::new(5.0, 5.0)), vec!["a"]);
        assert!(w.query_point(Vec2::new(0.0, 5.0)).is_empty());
        assert!(w.query_point(Vec2::new(10.0, 5.0)).is_empty());
        assert!(w.query_point(Vec2::new(50.0, 50.0)).is_empty());
    }

    #[test]
    fn test_query_rect_is_exact() {
        let mut w = world();
        w.add("in", Rect::new(10.0, 10.0, 10.0, 10.0)).unwrap();
        // Same cell as the probe, but only touching its edge.
        w.add("touching", Rect::new(30.0, 10.0, 10.0, 10.0)).unwrap();
        w.add("out", Rect::new(300.0, 300.0, 10.0, 10.0)).unwrap();
        let hits = w.query_rect(Rect::new(15.0, 15.0, 15.0, 10.0));
        assert_eq!(hits, vec!["in"]);
    }

    #[test]
    fn test_query_segment_orders_by_distance() {
        let mut w = world();
        w.add("a", Rect::new(10.0, 0.0, 1.0, 10.0)).unwrap();
        w.add("b", Rect::new(20.0, 0.0, 1.0, 10.0)).unwrap();
        let hits = w.query_segment(Vec2::new(0.0, 5.0), Vec2::new(30.0, 5.0));
        assert_eq!(hits, vec!["a", "b"]);

        let infos = w.query_segment_info(Vec2::new(0.0, 5.0), Vec2::new(30.0, 5.0));
        assert_eq!(infos.len(), 2);
        assert_relative_eq!(infos[0].ti1, 10.0 / 30.0);
        assert_relative_eq!(infos[0].ti2, 11.0 / 30.0);
        assert_relative_eq!(infos[0].entry.x, 10.0);
        assert_relative_eq!(infos[0].exit.x, 11.0);
        assert_relative_eq!(infos[0].entry.y, 5.0);
        assert_relative_eq!(infos[1].ti1, 20.0 / 30.0);

        let reversed = w.query_segment(Vec2::new(30.0, 5.0), Vec2::new(0.0, 5.0));
        assert_eq!(reversed, vec!["b", "a"]);
    }

    #[test]
    fn test_query_segment_skips_item_enclosing_whole_segment() {
        let mut w = world();
        w.add("big", Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let hits = w.query_segment(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_resolver_never_reports_ti_of_one_or_more() {
        let mut w = world();
        w.add("a", Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        w.add("b", Rect::new(5.0, 0.0, 1.0, 1.0)).unwrap();
        // Stops exactly at contact: nothing reported.
        assert!(w.check("a", Vec2::new(4.0, 0.0)).unwrap().is_empty());
        let cols = w.check("a", Vec2::new(4.5, 0.0)).unwrap();
        assert_eq!(cols.len(), 1);
        assert!(cols[0].ti < 1.0);
    }

    #[test]
    fn test_large_item_found_once_across_many_cells() {
        let mut w = world();
        w.add("big", Rect::new(0.0, 0.0, 600.0, 600.0)).unwrap();
        w.add("p", Rect::new(-20.0, 0.0, 10.0, 10.0)).unwrap();
        let cols = w.check("p", Vec2::new(700.0, 0.0)).unwrap();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].other, "big");
    }

    proptest! {
        #[test]
        fn test_query_rect_matches_brute_force(
            rects in prop::collection::vec(
                (0f32..400.0, 0f32..400.0, 1f32..80.0, 1f32..80.0),
                1..30,
            ),
            probe in (0f32..400.0, 0f32..400.0, 1f32..150.0, 1f32..150.0),
        ) {
            let mut w: CollisionWorld<usize> =
                CollisionWorld::new(WorldConfig::default()).unwrap();
            let rects: Vec<Rect> =
                rects.into_iter().map(|(x, y, w, h)| Rect::new(x, y, w, h)).collect();
            for (i, rect) in rects.iter().enumerate() {
                w.add(i, *rect).unwrap();
            }
            let probe = Rect::new(probe.0, probe.1, probe.2, probe.3);
            let mut got = w.query_rect(probe);
            got.sort_unstable();
            let want: Vec<usize> = rects
                .iter()
                .enumerate()
                .filter(|(_, r)| Kernel::rects_overlap(**r, probe))
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(got, want);
        }

        #[test]
        fn test_moves_keep_map_and_grid_consistent(
            moves in prop::collection::vec(
                (0usize..8, -200f32..200.0, -200f32..200.0),
                1..60,
            ),
        ) {
            let mut w: CollisionWorld<usize> =
                CollisionWorld::new(WorldConfig { cell_size: 50.0 }).unwrap();
            for i in 0..8usize {
                w.add(i, Rect::new(i as f32 * 30.0, 0.0, 20.0, 20.0)).unwrap();
            }
            for (item, x, y) in moves {
                w.move_to(item, Vec2::new(x, y)).unwrap();
            }
            // Every item is found by a query at its stored position.
            for i in 0..8usize {
                let rect = w.rect_of(i).unwrap();
                prop_assert!(w.query_rect(rect).contains(&i));
                prop_assert!(w.query_point(rect.center()).contains(&i));
            }
        }
    }
}
