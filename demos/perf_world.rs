use flatbody::*;
use std::time::Instant;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f64 {
    lcg(seed) as f64 / u32::MAX as f64
}

fn main() {
    let mut world = PhysicsWorld::new(WorldConfig {
        gravity: Vector2::new(0.0, -9.81),
        enable_timing: true,
        ..Default::default()
    });

    world
        .create_box_body(120.0, 2.0, Vector2::new(0.0, -1.0), 1.0, true, 0.2)
        .expect("floor");

    let n = 800usize; // number of dynamic bodies
    let mut seed = 1u32;
    for i in 0..n {
        let x = unit(&mut seed) * 100.0 - 50.0;
        let y = 2.0 + unit(&mut seed) * 60.0;
        let created = if i % 2 == 0 {
            world.create_box_body(0.8, 0.8, Vector2::new(x, y), 1.0, false, 0.3)
        } else {
            world.create_circle_body(0.4, Vector2::new(x, y), 1.0, false, 0.3)
        };
        created.expect("body parameters are in range");
    }

    let frames = 120;
    let substeps = 4;
    let t0 = Instant::now();
    let mut totals = WorldTiming::default();
    let mut contacts = 0usize;
    for _ in 0..frames {
        world.step(1.0 / 60.0, substeps);
        contacts += world.debug_stats().contacts;
        if let Some(t) = world.timing() {
            totals.step_ms += t.step_ms;
            totals.integrate_ms += t.integrate_ms;
            totals.broad_phase_ms += t.broad_phase_ms;
            totals.narrow_phase_ms += t.narrow_phase_ms;
        }
    }
    let wall = t0.elapsed();
    let per = frames as f64;
    println!(
        "N={} frames={} substeps={} wall={:?} step={:.3}ms (integrate={:.3}ms broad={:.3}ms narrow={:.3}ms) contacts/frame={:.1}",
        world.body_count(),
        frames,
        substeps,
        wall,
        totals.step_ms / per,
        totals.integrate_ms / per,
        totals.broad_phase_ms / per,
        totals.narrow_phase_ms / per,
        contacts as f64 / per
    );
}
