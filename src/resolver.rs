use crate::body::RigidBody;
use crate::math::Vector2;
use crate::types::Manifold;

/// Sequential-impulse collision response with rotation.
pub struct ContactResolver;

impl ContactResolver {
    /// Apply restitution impulses for one manifold.
    ///
    /// All per-contact impulses are computed from the velocities as they were
    /// on entry and only applied afterwards, so contact order within the
    /// manifold does not bias the result. Each impulse is divided by the
    /// contact count. Separating contacts receive no impulse.
    pub fn resolve(a: &mut RigidBody, b: &mut RigidBody, manifold: &Manifold) {
        let contacts = manifold.contacts();
        if contacts.is_empty() {
            return;
        }
        let normal = manifold.normal;
        let e = manifold.restitution;
        let count = contacts.len() as f64;

        let mut impulses = [Vector2::ZERO; 2];
        let mut arms = [(Vector2::ZERO, Vector2::ZERO); 2];

        for (i, p) in contacts.iter().enumerate() {
            let ra = *p - a.position();
            let rb = *p - b.position();
            arms[i] = (ra, rb);

            let ra_perp = ra.perp();
            let rb_perp = rb.perp();
            let relative_velocity = (b.linear_velocity() + rb_perp * b.angular_velocity())
                - (a.linear_velocity() + ra_perp * a.angular_velocity());

            let contact_velocity = relative_velocity.dot(normal);
            if contact_velocity > 0.0 {
                continue;
            }

            let ra_perp_n = ra_perp.dot(normal);
            let rb_perp_n = rb_perp.dot(normal);
            let denom = a.inverse_mass()
                + b.inverse_mass()
                + ra_perp_n * ra_perp_n * a.inverse_inertia()
                + rb_perp_n * rb_perp_n * b.inverse_inertia();
            if denom <= 0.0 {
                continue;
            }

            let j = -(1.0 + e) * contact_velocity / denom / count;
            impulses[i] = normal * j;
        }

        for (impulse, (ra, rb)) in impulses.iter().zip(arms).take(contacts.len()) {
            a.apply_velocity_change(
                -*impulse * a.inverse_mass(),
                -ra.perp_dot(*impulse) * a.inverse_inertia(),
            );
            b.apply_velocity_change(
                *impulse * b.inverse_mass(),
                rb.perp_dot(*impulse) * b.inverse_inertia(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrowphase::{build_manifold, collides};

    fn ball(x: f64, vx: f64, restitution: f64) -> RigidBody {
        let mut b = RigidBody::create_circle(1.0, Vector2::new(x, 0.0), 1.0, false, restitution).unwrap();
        b.set_linear_velocity(Vector2::new(vx, 0.0));
        b
    }

    fn manifold_for(a: &mut RigidBody, b: &mut RigidBody) -> Manifold {
        let (normal, depth) = collides(a, b).expect("bodies should overlap");
        build_manifold(a, b, normal, depth)
    }

    #[test]
    fn test_elastic_head_on_swaps_velocities() {
        let mut a = ball(-0.9, 2.0, 1.0);
        let mut b = ball(0.9, -2.0, 1.0);
        let m = manifold_for(&mut a, &mut b);
        ContactResolver::resolve(&mut a, &mut b, &m);
        assert!((a.linear_velocity() - Vector2::new(-2.0, 0.0)).length() < 1e-9);
        assert!((b.linear_velocity() - Vector2::new(2.0, 0.0)).length() < 1e-9);
        assert!(a.angular_velocity().abs() < 1e-12);
        assert!(b.angular_velocity().abs() < 1e-12);
    }

    #[test]
    fn test_restitution_uses_minimum() {
        let mut a = ball(-0.9, 1.0, 1.0);
        let mut b = ball(0.9, -1.0, 0.0);
        let m = manifold_for(&mut a, &mut b);
        assert_eq!(m.restitution, 0.0);
        ContactResolver::resolve(&mut a, &mut b, &m);
        // Perfectly inelastic: both end at the common (zero) velocity.
        assert!(a.linear_velocity().length() < 1e-9);
        assert!(b.linear_velocity().length() < 1e-9);
    }

    #[test]
    fn test_separating_contact_gets_no_impulse() {
        let mut a = ball(-0.9, -1.0, 1.0);
        let mut b = ball(0.9, 1.0, 1.0);
        let m = manifold_for(&mut a, &mut b);
        ContactResolver::resolve(&mut a, &mut b, &m);
        assert_eq!(a.linear_velocity(), Vector2::new(-1.0, 0.0));
        assert_eq!(b.linear_velocity(), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_static_body_is_unaffected() {
        let mut floor = RigidBody::create_box(10.0, 1.0, Vector2::ZERO, 1.0, true, 1.0).unwrap();
        let mut b = RigidBody::create_circle(0.5, Vector2::new(0.0, 0.9), 1.0, false, 0.5).unwrap();
        b.set_linear_velocity(Vector2::new(0.0, -4.0));
        let m = manifold_for(&mut floor, &mut b);
        ContactResolver::resolve(&mut floor, &mut b, &m);
        assert_eq!(floor.linear_velocity(), Vector2::ZERO);
        assert_eq!(floor.angular_velocity(), 0.0);
        assert!((b.linear_velocity() - Vector2::new(0.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn test_flat_box_landing_does_not_spin() {
        let mut floor = RigidBody::create_box(10.0, 1.0, Vector2::ZERO, 1.0, true, 0.0).unwrap();
        let mut crate_ = RigidBody::create_box(1.0, 1.0, Vector2::new(0.0, 0.95), 1.0, false, 0.0).unwrap();
        crate_.set_linear_velocity(Vector2::new(0.0, -3.0));
        let m = manifold_for(&mut floor, &mut crate_);
        assert_eq!(m.contact_count, 2);
        ContactResolver::resolve(&mut floor, &mut crate_, &m);
        assert!(crate_.angular_velocity().abs() < 1e-9);
        let vy = crate_.linear_velocity().y;
        assert!(vy > -3.0 && vy <= 0.0);
    }

    #[test]
    fn test_off_center_hit_induces_spin() {
        let mut floor = RigidBody::create_box(10.0, 1.0, Vector2::ZERO, 1.0, true, 0.0).unwrap();
        let mut plank = RigidBody::create_box(2.0, 0.2, Vector2::new(0.0, 0.75), 1.0, false, 0.0).unwrap();
        plank.rotate_by(0.2);
        plank.set_linear_velocity(Vector2::new(0.0, -2.0));
        let (normal, depth) = collides(&mut floor, &mut plank).expect("plank corner overlaps floor");
        let m = build_manifold(&mut floor, &mut plank, normal, depth);
        assert_eq!(m.contact_count, 1);
        ContactResolver::resolve(&mut floor, &mut plank, &m);
        assert!(plank.angular_velocity().abs() > 1e-6);
    }
}
