use std::borrow::Cow;
use std::f64::consts::{PI, TAU};

use crate::error::CreationError;
use crate::math::{Transform, Vector2};
use crate::types::*;

/// A rigid body: immutable shape and mass properties plus mutable motion state.
///
/// Bodies are only built through the validating factories
/// ([`RigidBody::create_circle`], [`RigidBody::create_box`],
/// [`RigidBody::create_polygon`]). Polygon bodies keep a lazily refreshed cache
/// of their world-space vertices; anything that moves or rotates the body marks
/// that cache dirty.
#[derive(Clone, Debug)]
pub struct RigidBody {
    shape: Shape,
    density: f64,
    area: f64,
    restitution: f64,
    is_static: bool,
    mass: f64,
    inverse_mass: f64,
    inertia: f64,
    inverse_inertia: f64,

    position: Vector2,
    rotation: f64,
    linear_velocity: Vector2,
    angular_velocity: f64,
    force: Vector2,

    world_vertices: Vec<Vector2>,
    vertices_dirty: bool,
}

fn validate(area: f64, density: f64) -> Result<(), CreationError> {
    if !(MIN_DENSITY..=MAX_DENSITY).contains(&density) {
        return Err(CreationError::InvalidDensity {
            density,
            min: MIN_DENSITY,
            max: MAX_DENSITY,
        });
    }
    if !(MIN_BODY_SIZE..=MAX_BODY_SIZE).contains(&area) {
        return Err(CreationError::InvalidArea {
            area,
            min: MIN_BODY_SIZE,
            max: MAX_BODY_SIZE,
        });
    }
    Ok(())
}

fn validate_position(position: Vector2) -> Result<(), CreationError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(CreationError::InvalidPosition { x: position.x, y: position.y })
    }
}

fn clamp_restitution(restitution: f64) -> f64 {
    if restitution.is_nan() {
        0.0
    } else {
        restitution.clamp(0.0, 1.0)
    }
}

impl RigidBody {
    fn new(
        shape: Shape,
        position: Vector2,
        density: f64,
        area: f64,
        inertia_per_mass: f64,
        is_static: bool,
        restitution: f64,
    ) -> Self {
        let mass = density * area;
        let inertia = mass * inertia_per_mass;
        let (inverse_mass, inverse_inertia) = if is_static {
            (0.0, 0.0)
        } else {
            (1.0 / mass, if inertia > 0.0 { 1.0 / inertia } else { 0.0 })
        };
        let vertex_count = match &shape {
            Shape::Circle { .. } => 0,
            Shape::Polygon { local_vertices } => local_vertices.len(),
        };
        Self {
            shape,
            density,
            area,
            restitution: clamp_restitution(restitution),
            is_static,
            mass,
            inverse_mass,
            inertia,
            inverse_inertia,
            position,
            rotation: 0.0,
            linear_velocity: Vector2::ZERO,
            angular_velocity: 0.0,
            force: Vector2::ZERO,
            world_vertices: vec![Vector2::ZERO; vertex_count],
            vertices_dirty: true,
        }
    }

    /// Circle body. `area = π r²`, `inertia = ½ m r²`.
    pub fn create_circle(
        radius: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<Self, CreationError> {
        let area = PI * radius * radius;
        validate(area, density)?;
        validate_position(position)?;
        if radius <= 0.0 {
            return Err(CreationError::InvalidArea {
                area,
                min: MIN_BODY_SIZE,
                max: MAX_BODY_SIZE,
            });
        }
        Ok(Self::new(
            Shape::Circle { radius },
            position,
            density,
            area,
            0.5 * radius * radius,
            is_static,
            restitution,
        ))
    }

    /// Axis-aligned (at rotation 0) rectangle centered on `position`.
    /// `inertia = m (w² + h²) / 12`.
    pub fn create_box(
        width: f64,
        height: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<Self, CreationError> {
        let area = width * height;
        validate(area, density)?;
        validate_position(position)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(CreationError::InvalidArea {
                area,
                min: MIN_BODY_SIZE,
                max: MAX_BODY_SIZE,
            });
        }
        let (hw, hh) = (width * 0.5, height * 0.5);
        let local_vertices = vec![
            Vector2::new(-hw, hh),
            Vector2::new(hw, hh),
            Vector2::new(hw, -hh),
            Vector2::new(-hw, -hh),
        ];
        Ok(Self::new(
            Shape::Polygon { local_vertices },
            position,
            density,
            area,
            (width * width + height * height) / 12.0,
            is_static,
            restitution,
        ))
    }

    /// Arbitrary convex polygon, wound consistently in either direction.
    ///
    /// The vertices are recentred on their area centroid, which is then placed
    /// at `position`. Fewer than three vertices, a zero-area outline or a
    /// non-convex outline is rejected.
    pub fn create_polygon(
        vertices: &[Vector2],
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<Self, CreationError> {
        let n = vertices.len();
        if n < 3 || vertices.iter().any(|v| !v.is_finite()) {
            return Err(CreationError::InvalidPolygon);
        }

        let mut twice_area = 0.0;
        let mut centroid = Vector2::ZERO;
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let cross = a.perp_dot(b);
            twice_area += cross;
            centroid += (a + b) * cross;
        }
        if twice_area == 0.0 || !twice_area.is_finite() {
            return Err(CreationError::InvalidPolygon);
        }
        // Every turn bends the same way and the turns add up to one full
        // revolution; a star keeps turning past it.
        let winding = twice_area.signum();
        let mut total_turn = 0.0;
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            let (e1, e2) = (b - a, c - b);
            let cross = e1.perp_dot(e2);
            if cross * winding < 0.0 {
                return Err(CreationError::InvalidPolygon);
            }
            total_turn += cross.atan2(e1.dot(e2));
        }
        if (total_turn.abs() - TAU).abs() > 1e-6 {
            return Err(CreationError::InvalidPolygon);
        }
        let area = twice_area.abs() * 0.5;
        validate(area, density)?;
        validate_position(position)?;
        centroid /= 3.0 * twice_area;

        let local_vertices: Vec<Vector2> = vertices.iter().map(|v| *v - centroid).collect();

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for i in 0..n {
            let a = local_vertices[i];
            let b = local_vertices[(i + 1) % n];
            let cross = a.perp_dot(b).abs();
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross;
        }
        let inertia_per_mass = numerator / (6.0 * denominator);

        Ok(Self::new(
            Shape::Polygon { local_vertices },
            position,
            density,
            area,
            inertia_per_mass,
            is_static,
            restitution,
        ))
    }

    // --- Placement ---------------------------------------------------------

    pub fn move_by(&mut self, delta: Vector2) {
        self.position += delta;
        self.vertices_dirty = true;
    }

    pub fn move_to(&mut self, position: Vector2) {
        self.position = position;
        self.vertices_dirty = true;
    }

    pub fn rotate_by(&mut self, angle: f64) {
        self.rotation += angle;
        self.vertices_dirty = true;
    }

    // --- Motion ------------------------------------------------------------

    /// Advance one (sub-)step: semi-implicit Euler under `gravity` plus the
    /// accumulated force, which is consumed.
    pub fn step(&mut self, dt: f64, gravity: Vector2) {
        if self.is_static {
            return;
        }
        let acceleration = gravity + self.force * self.inverse_mass;
        self.linear_velocity += acceleration * dt;
        self.position += self.linear_velocity * dt;
        self.rotation += self.angular_velocity * dt;
        self.force = Vector2::ZERO;
        self.vertices_dirty = true;
    }

    /// Accumulate a force for the next integration. Ignored on static bodies.
    pub fn add_force(&mut self, force: Vector2) {
        if !self.is_static {
            self.force += force;
        }
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        if !self.is_static {
            self.linear_velocity = velocity;
        }
    }

    pub fn set_angular_velocity(&mut self, velocity: f64) {
        if !self.is_static {
            self.angular_velocity = velocity;
        }
    }

    pub(crate) fn apply_velocity_change(&mut self, linear: Vector2, angular: f64) {
        self.linear_velocity += linear;
        self.angular_velocity += angular;
    }

    // --- Geometry ----------------------------------------------------------

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// World-space polygon vertices; empty for circles.
    ///
    /// Borrowed from the cache when it is current (always the case right after
    /// a world step). A body moved since then gets its vertices computed on
    /// the fly without touching the cache.
    pub fn world_vertices(&self) -> Cow<'_, [Vector2]> {
        match &self.shape {
            Shape::Polygon { local_vertices } if self.vertices_dirty => {
                let t = self.transform();
                Cow::Owned(local_vertices.iter().map(|v| t.apply(*v)).collect())
            }
            _ => Cow::Borrowed(&self.world_vertices),
        }
    }

    pub(crate) fn refresh_world_vertices(&mut self) {
        if !self.vertices_dirty {
            return;
        }
        if let Shape::Polygon { local_vertices } = &self.shape {
            let t = Transform::new(self.position, self.rotation);
            for (dst, src) in self.world_vertices.iter_mut().zip(local_vertices) {
                *dst = t.apply(*src);
            }
        }
        self.vertices_dirty = false;
    }

    /// Cached vertices; callers refresh first.
    pub(crate) fn cached_world_vertices(&self) -> &[Vector2] {
        debug_assert!(!self.vertices_dirty, "world vertex cache read while dirty");
        &self.world_vertices
    }

    /// Bounds of the body at its current position and rotation. A stale
    /// vertex cache is bypassed rather than refreshed.
    pub fn aabb(&self) -> Aabb {
        match &self.shape {
            Shape::Circle { radius } => Aabb::new(
                self.position - Vector2::splat(*radius),
                self.position + Vector2::splat(*radius),
            ),
            Shape::Polygon { .. } if !self.vertices_dirty => Aabb::from_points(&self.world_vertices),
            Shape::Polygon { local_vertices } => {
                let t = self.transform();
                let mut min = Vector2::splat(f64::MAX);
                let mut max = Vector2::splat(f64::MIN);
                for v in local_vertices {
                    let w = t.apply(*v);
                    min = min.min(w);
                    max = max.max(w);
                }
                Aabb::new(min, max)
            }
        }
    }

    /// Point containment (boundary inclusive).
    pub fn contains_point(&self, p: Vector2) -> bool {
        match &self.shape {
            Shape::Circle { radius } => p.distance_squared(self.position) <= radius * radius,
            Shape::Polygon { local_vertices } => {
                // Work in local space: undo translation and rotation.
                let (sin, cos) = self.rotation.sin_cos();
                let d = p - self.position;
                let local = Vector2::new(cos * d.x + sin * d.y, -sin * d.x + cos * d.y);
                let n = local_vertices.len();
                let side = |i: usize| {
                    let a = local_vertices[i];
                    let b = local_vertices[(i + 1) % n];
                    (b - a).perp_dot(local - a)
                };
                (0..n).all(|i| side(i) >= 0.0) || (0..n).all(|i| side(i) <= 0.0)
            }
        }
    }

    /// Fan triangulation of the polygon as vertex indices; empty for circles.
    pub fn triangles(&self) -> Vec<usize> {
        match &self.shape {
            Shape::Circle { .. } => Vec::new(),
            Shape::Polygon { local_vertices } => (1..local_vertices.len().saturating_sub(1))
                .flat_map(|i| [0, i, i + 1])
                .collect(),
        }
    }

    // --- Accessors ---------------------------------------------------------

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
    pub fn position(&self) -> Vector2 {
        self.position
    }
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
    pub fn linear_velocity(&self) -> Vector2 {
        self.linear_velocity
    }
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }
    pub fn force(&self) -> Vector2 {
        self.force
    }
    pub fn density(&self) -> f64 {
        self.density
    }
    pub fn area(&self) -> f64 {
        self.area
    }
    pub fn restitution(&self) -> f64 {
        self.restitution
    }
    pub fn is_static(&self) -> bool {
        self.is_static
    }
    pub fn mass(&self) -> f64 {
        self.mass
    }
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
    pub fn inverse_inertia(&self) -> f64 {
        self.inverse_inertia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_circle_mass_properties() {
        let b = RigidBody::create_circle(1.0, Vector2::ZERO, 2.0, false, 0.5).unwrap();
        assert!((b.area() - PI).abs() < 1e-12);
        assert!((b.mass() - 2.0 * PI).abs() < 1e-12);
        assert!((b.inertia() - 0.5 * b.mass()).abs() < 1e-12);
        assert!((b.inverse_mass() - 1.0 / b.mass()).abs() < 1e-12);
        assert_eq!(b.linear_velocity(), Vector2::ZERO);
        assert_eq!(b.angular_velocity(), 0.0);
    }

    #[test]
    fn test_box_vertices_and_inertia() {
        let b = RigidBody::create_box(2.0, 4.0, Vector2::ZERO, 1.0, false, 0.0).unwrap();
        let Shape::Polygon { local_vertices } = b.shape().clone() else {
            panic!("box must be a polygon");
        };
        assert_eq!(
            local_vertices,
            vec![
                Vector2::new(-1.0, 2.0),
                Vector2::new(1.0, 2.0),
                Vector2::new(1.0, -2.0),
                Vector2::new(-1.0, -2.0),
            ]
        );
        assert!((b.inertia() - 8.0 * (4.0 + 16.0) / 12.0).abs() < 1e-12);
        assert_eq!(b.world_vertices(), local_vertices.as_slice());
        assert_eq!(b.triangles(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_static_body_has_zero_inverses() {
        let b = RigidBody::create_box(3.0, 1.0, Vector2::ZERO, 1.0, true, 0.3).unwrap();
        assert_eq!(b.inverse_mass(), 0.0);
        assert_eq!(b.inverse_inertia(), 0.0);
        assert!(b.mass() > 0.0);
    }

    #[test]
    fn test_creation_validation() {
        let err = RigidBody::create_circle(0.0001, Vector2::ZERO, 1.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidArea { .. }));
        let err = RigidBody::create_circle(1.0, Vector2::ZERO, 0.1, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidDensity { .. }));
        let err = RigidBody::create_box(100.0, 100.0, Vector2::ZERO, 1000.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidDensity { .. }));
        let err = RigidBody::create_box(100.0, 100.0, Vector2::ZERO, 1.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidArea { .. }));
        let err = RigidBody::create_box(-2.0, -2.0, Vector2::ZERO, 1.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidArea { .. }));
        let err = RigidBody::create_circle(f64::NAN, Vector2::ZERO, 1.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidArea { .. }));

        let nan = Vector2::new(f64::NAN, 0.0);
        let err = RigidBody::create_circle(1.0, nan, 1.0, false, 0.5).unwrap_err();
        assert!(matches!(err, CreationError::InvalidPosition { .. }));
        let err = RigidBody::create_box(1.0, 1.0, Vector2::new(0.0, f64::INFINITY), 1.0, false, 0.5)
            .unwrap_err();
        assert!(matches!(err, CreationError::InvalidPosition { .. }));
    }

    #[test]
    fn test_restitution_clamped() {
        let hi = RigidBody::create_circle(1.0, Vector2::ZERO, 1.0, false, 3.0).unwrap();
        let lo = RigidBody::create_circle(1.0, Vector2::ZERO, 1.0, false, -1.0).unwrap();
        let nan = RigidBody::create_circle(1.0, Vector2::ZERO, 1.0, false, f64::NAN).unwrap();
        assert_eq!(hi.restitution(), 1.0);
        assert_eq!(lo.restitution(), 0.0);
        assert_eq!(nan.restitution(), 0.0);
    }

    #[test]
    fn test_polygon_is_recentred_and_validated() {
        let tri = [
            Vector2::new(0.0, 0.0),
            Vector2::new(3.0, 0.0),
            Vector2::new(0.0, 3.0),
        ];
        let b = RigidBody::create_polygon(&tri, Vector2::new(5.0, 5.0), 1.0, false, 0.2).unwrap();
        assert!((b.area() - 4.5).abs() < 1e-12);
        let Shape::Polygon { local_vertices } = b.shape() else {
            panic!("expected polygon");
        };
        assert!((local_vertices[0] - Vector2::new(-1.0, -1.0)).length() < 1e-12);

        let cw = [tri[0], tri[2], tri[1]];
        let b = RigidBody::create_polygon(&cw, Vector2::ZERO, 1.0, false, 0.2).unwrap();
        assert!((b.area() - 4.5).abs() < 1e-12);
        assert!(b.contains_point(Vector2::ZERO));

        let flat = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
        ];
        assert_eq!(
            RigidBody::create_polygon(&flat, Vector2::ZERO, 1.0, false, 0.2).unwrap_err(),
            CreationError::InvalidPolygon
        );
        assert_eq!(
            RigidBody::create_polygon(&tri[..2], Vector2::ZERO, 1.0, false, 0.2).unwrap_err(),
            CreationError::InvalidPolygon
        );
        let dart = [
            Vector2::new(0.0, 0.0),
            Vector2::new(2.0, 1.0),
            Vector2::new(4.0, 0.0),
            Vector2::new(2.0, 4.0),
        ];
        assert_eq!(
            RigidBody::create_polygon(&dart, Vector2::ZERO, 1.0, false, 0.2).unwrap_err(),
            CreationError::InvalidPolygon
        );

        // Star outline: every turn bends left, but it winds around twice.
        let star: Vec<Vector2> = [0, 2, 4, 1, 3]
            .iter()
            .map(|k| {
                let a = std::f64::consts::FRAC_PI_2 + *k as f64 * TAU / 5.0;
                Vector2::new(a.cos(), a.sin()) * 2.0
            })
            .collect();
        assert_eq!(
            RigidBody::create_polygon(&star, Vector2::ZERO, 1.0, false, 0.2).unwrap_err(),
            CreationError::InvalidPolygon
        );
        let mut reversed = star.clone();
        reversed.reverse();
        assert_eq!(
            RigidBody::create_polygon(&reversed, Vector2::ZERO, 1.0, false, 0.2).unwrap_err(),
            CreationError::InvalidPolygon
        );

        // Collinear points along an edge are still a convex outline.
        let mut padded = vec![Vector2::new(0.0, 0.0), Vector2::new(4.0, 0.0)];
        padded.extend((1..=4).map(|i| Vector2::new(4.0 - i as f64 * 0.8, i as f64 * 0.4)));
        padded.push(Vector2::new(0.0, 2.0));
        let b = RigidBody::create_polygon(&padded, Vector2::ZERO, 1.0, false, 0.2).unwrap();
        assert!((b.area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_inertia_matches_box() {
        let square = [
            Vector2::new(-1.0, -1.0),
            Vector2::new(1.0, -1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(-1.0, 1.0),
        ];
        let poly = RigidBody::create_polygon(&square, Vector2::ZERO, 2.0, false, 0.0).unwrap();
        let bx = RigidBody::create_box(2.0, 2.0, Vector2::ZERO, 2.0, false, 0.0).unwrap();
        assert!((poly.inertia() - bx.inertia()).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_cache_tracks_moves() {
        let mut b = RigidBody::create_box(2.0, 2.0, Vector2::ZERO, 1.0, false, 0.0).unwrap();
        // Fresh bodies compute on the fly; a refreshed cache is lent out as is.
        assert!(matches!(b.world_vertices(), Cow::Owned(_)));
        b.refresh_world_vertices();
        assert!(matches!(b.world_vertices(), Cow::Borrowed(_)));
        let first = b.world_vertices().to_vec();
        let second = b.world_vertices().to_vec();
        assert_eq!(first, second);

        b.move_by(Vector2::new(10.0, 0.0));
        assert!((b.world_vertices()[0] - Vector2::new(9.0, 1.0)).length() < 1e-12);

        b.move_to(Vector2::ZERO);
        b.rotate_by(FRAC_PI_2);
        // (-1, 1) rotated by 90° is (-1, -1)
        assert!((b.world_vertices()[0] - Vector2::new(-1.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_aabb_without_refresh() {
        let mut b = RigidBody::create_box(2.0, 4.0, Vector2::ZERO, 1.0, false, 0.0).unwrap();
        b.rotate_by(FRAC_PI_2);
        let bb = b.aabb();
        assert!((bb.min - Vector2::new(-2.0, -1.0)).length() < 1e-12);
        assert!((bb.max - Vector2::new(2.0, 1.0)).length() < 1e-12);

        let c = RigidBody::create_circle(0.5, Vector2::new(1.0, 1.0), 1.0, false, 0.0).unwrap();
        assert_eq!(c.aabb(), Aabb::new(Vector2::splat(0.5), Vector2::splat(1.5)));
    }

    #[test]
    fn test_step_integrates_and_consumes_force() {
        let mut b = RigidBody::create_circle(1.0, Vector2::ZERO, 1.0, false, 0.0).unwrap();
        b.set_angular_velocity(2.0);
        b.add_force(Vector2::new(b.mass(), 0.0));
        b.step(0.5, Vector2::new(0.0, -10.0));
        assert!((b.linear_velocity() - Vector2::new(0.5, -5.0)).length() < 1e-12);
        assert!((b.position() - Vector2::new(0.25, -2.5)).length() < 1e-12);
        assert!((b.rotation() - 1.0).abs() < 1e-12);
        assert_eq!(b.force(), Vector2::ZERO);
    }

    #[test]
    fn test_static_step_is_noop() {
        let mut b = RigidBody::create_circle(1.0, Vector2::new(1.0, 2.0), 1.0, true, 0.0).unwrap();
        b.set_linear_velocity(Vector2::new(5.0, 5.0));
        b.set_angular_velocity(3.0);
        b.add_force(Vector2::new(100.0, 0.0));
        b.step(1.0, Vector2::new(0.0, -9.81));
        assert_eq!(b.position(), Vector2::new(1.0, 2.0));
        assert_eq!(b.linear_velocity(), Vector2::ZERO);
        assert_eq!(b.angular_velocity(), 0.0);
        assert_eq!(b.rotation(), 0.0);
    }

    #[test]
    fn test_contains_point() {
        let mut b = RigidBody::create_box(2.0, 2.0, Vector2::new(3.0, 0.0), 1.0, false, 0.0).unwrap();
        b.rotate_by(0.3);
        assert!(b.contains_point(Vector2::new(3.0, 0.0)));
        assert!(!b.contains_point(Vector2::new(5.0, 0.0)));
        let c = RigidBody::create_circle(1.0, Vector2::ZERO, 1.0, false, 0.0).unwrap();
        assert!(c.contains_point(Vector2::new(0.0, 1.0)));
        assert!(!c.contains_point(Vector2::new(0.8, 0.8)));
    }
}
