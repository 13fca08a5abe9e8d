use glam::DVec2;

/// 2D point / displacement. All of the core runs in f64.
pub type Vector2 = DVec2;

/// Tolerance used when comparing contact distances and contact points.
pub const EPSILON: f64 = 1e-4;

/// Scalar comparison within [`EPSILON`].
#[inline]
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Point comparison: squared distance within `EPSILON²`.
#[inline]
pub fn nearly_equal_points(a: Vector2, b: Vector2) -> bool {
    a.distance_squared(b) < EPSILON * EPSILON
}

/// Unit vector in the direction of `v`, or `None` for zero-length / non-finite input.
#[inline]
pub fn try_unit(v: Vector2) -> Option<Vector2> {
    v.try_normalize()
}

/// Closest point to `p` on segment `a..b`, with its squared distance to `p`.
pub fn closest_point_on_segment(p: Vector2, a: Vector2, b: Vector2) -> (Vector2, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return (a, p.distance_squared(a));
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (closest, p.distance_squared(closest))
}

/// Position plus precomputed sine/cosine of a rotation angle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector2,
    pub sin: f64,
    pub cos: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vector2::ZERO,
        sin: 0.0,
        cos: 1.0,
    };

    pub fn new(position: Vector2, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { position, sin, cos }
    }

    /// Map a local-space point to world space (rotate, then translate).
    #[inline]
    pub fn apply(&self, v: Vector2) -> Vector2 {
        Vector2::new(
            self.cos * v.x - self.sin * v.y + self.position.x,
            self.sin * v.x + self.cos * v.y + self.position.y,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
