use glam::Vec2;
use thud::*;

fn main() {
    env_logger::init();

    let mut world: CollisionWorld<&str> =
        CollisionWorld::new(WorldConfig::default()).expect("valid cell size");

    world.add("pillar", Rect::new(100.0, 0.0, 20.0, 200.0)).unwrap();
    world.add("crate", Rect::new(200.0, 80.0, 40.0, 40.0)).unwrap();
    world.add("ledge", Rect::new(300.0, 85.0, 80.0, 30.0)).unwrap();

    let p1 = Vec2::new(0.0, 100.0);
    let p2 = Vec2::new(400.0, 100.0);

    for info in world.query_segment_info(p1, p2) {
        println!(
            "{:8} t=[{:.3}, {:.3}] entry=({:.1}, {:.1}) exit=({:.1}, {:.1})",
            info.item, info.ti1, info.ti2, info.entry.x, info.entry.y, info.exit.x, info.exit.y
        );
    }
}
