use std::time::Instant;

use glam::Vec2;
use thud::*;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn frand(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() {
    env_logger::init();

    let mut world: CollisionWorld<u32> =
        CollisionWorld::new(WorldConfig { cell_size: 8.0 }).expect("valid cell size");

    let n = 20_000u32;
    let mut seed = 1u32;

    let t0 = Instant::now();
    for i in 0..n {
        let x = frand(&mut seed) * 2_000.0 - 1_000.0;
        let y = frand(&mut seed) * 2_000.0 - 1_000.0;
        world
            .add(i, Rect::new(x, y, 1.0, 1.0))
            .expect("fresh key, positive extents");
    }
    let t_add = t0.elapsed();

    let t1 = Instant::now();
    let mut total_collisions = 0usize;
    for i in 0..n {
        let rect = world.rect_of(i).expect("item present");
        let dx = frand(&mut seed) * 8.0 - 4.0;
        let dy = frand(&mut seed) * 8.0 - 4.0;
        let goal = rect.pos() + Vec2::new(dx, dy);
        total_collisions += world.move_to(i, goal).expect("item present").len();
    }
    let t_move = t1.elapsed();

    println!(
        "N={} cell_size={} add={:.3}ms moves={:.3}ms collisions={} cells={}",
        n,
        world.cell_size(),
        t_add.as_secs_f64() * 1000.0,
        t_move.as_secs_f64() * 1000.0,
        total_collisions,
        world.cell_count()
    );
}
