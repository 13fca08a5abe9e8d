use flatbody::*;

fn main() {
    let mut world = PhysicsWorld::new(WorldConfig {
        record_contacts: true,
        ..Default::default()
    });

    world
        .create_box_body(30.0, 2.0, Vector2::new(0.0, -1.0), 1.0, true, 0.5)
        .expect("ground");
    let ledge = world
        .create_box_body(8.0, 0.5, Vector2::new(-5.0, 6.0), 1.0, true, 0.5)
        .expect("ledge");
    if let Some(body) = world.get_mut(ledge) {
        body.rotate_by(-0.35);
    }

    let mut drops = Vec::new();
    for i in 0..6 {
        let x = -8.0 + i as f64 * 1.2;
        drops.push(
            world
                .create_circle_body(0.5, Vector2::new(x, 10.0 + i as f64), 1.5, false, 0.6)
                .expect("ball"),
        );
        drops.push(
            world
                .create_box_body(1.0, 0.8, Vector2::new(x + 0.5, 14.0 + i as f64), 2.0, false, 0.3)
                .expect("crate"),
        );
    }

    // Fan of a hexagon to show arbitrary convex outlines.
    let hexagon: Vec<Vector2> = (0..6)
        .map(|k| {
            let a = k as f64 * std::f64::consts::TAU / 6.0;
            Vector2::new(a.cos(), a.sin()) * 0.7
        })
        .collect();
    let hex = RigidBody::create_polygon(&hexagon, Vector2::new(3.0, 12.0), 1.0, false, 0.4)
        .expect("hexagon");
    println!("hexagon triangles: {:?}", hex.triangles());
    drops.push(world.add(hex));

    let dt = 1.0 / 60.0;
    for frame in 1..=300 {
        world.step(dt, 8);
        let events = world.drain_contacts();
        if frame % 60 == 0 {
            let resting = drops
                .iter()
                .filter_map(|h| world.get(*h))
                .filter(|b| b.linear_velocity().length() < 0.05)
                .count();
            println!(
                "t={:.1}s contacts={} resting={}/{}",
                frame as f64 * dt,
                events.len(),
                resting,
                drops.len()
            );
        }
    }

    for (h, body) in world.bodies().filter(|(_, b)| !b.is_static()) {
        let p = body.position();
        println!("{:?} at ({:.2}, {:.2}) rot {:.2}", h, p.x, p.y, body.rotation());
    }
}
