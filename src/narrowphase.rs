use crate::api::NarrowphaseApi;
use crate::body::RigidBody;
use crate::math::*;
use crate::types::{Manifold, Shape};

/// SAT overlap tests and contact-point extraction on world-space geometry.
pub struct Narrowphase;

/// Minimum-overlap axis tracking shared by all SAT routines.
struct AxisSearch {
    normal: Vector2,
    depth: f64,
    tested: bool,
}

impl AxisSearch {
    fn new() -> Self {
        Self {
            normal: Vector2::ZERO,
            depth: f64::MAX,
            tested: false,
        }
    }

    /// Returns `false` when `axis` separates the two intervals.
    fn check(&mut self, axis: Vector2, (min_a, max_a): (f64, f64), (min_b, max_b): (f64, f64)) -> bool {
        if max_a <= min_b || max_b <= min_a {
            return false;
        }
        let axis_depth = (max_b - min_a).min(max_a - min_b);
        if axis_depth < self.depth {
            self.depth = axis_depth;
            self.normal = axis;
        }
        self.tested = true;
        true
    }

    /// Orient the winning axis from `from` toward `to`.
    fn finish(self, from: Vector2, to: Vector2) -> Option<(Vector2, f64)> {
        if !self.tested {
            return None;
        }
        let normal = if (to - from).dot(self.normal) < 0.0 {
            -self.normal
        } else {
            self.normal
        };
        Some((normal, self.depth))
    }
}

/// Unit perpendicular of edge `i -> i+1`; `None` for a zero-length edge.
#[inline]
fn edge_axis(vertices: &[Vector2], i: usize) -> Option<Vector2> {
    let v1 = vertices[i];
    let v2 = vertices[(i + 1) % vertices.len()];
    try_unit((v2 - v1).perp())
}

fn closest_vertex_index(point: Vector2, vertices: &[Vector2]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, v) in vertices.iter().enumerate() {
        let d = v.distance_squared(point);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Running closest-feature search used by polygon contact extraction.
struct ContactSearch {
    points: [Vector2; 2],
    count: usize,
    min_dist_sq: f64,
}

impl ContactSearch {
    fn new() -> Self {
        Self {
            points: [Vector2::ZERO; 2],
            count: 0,
            min_dist_sq: f64::MAX,
        }
    }

    fn visit(&mut self, point: Vector2, dist_sq: f64) {
        if nearly_equal(dist_sq, self.min_dist_sq) {
            if !nearly_equal_points(point, self.points[0]) {
                self.points[1] = point;
                self.count = 2;
            }
        } else if dist_sq < self.min_dist_sq {
            self.min_dist_sq = dist_sq;
            self.points[0] = point;
            self.count = 1;
        }
    }

    /// Every vertex of `from` against every edge of `onto`.
    fn scan(&mut self, from: &[Vector2], onto: &[Vector2]) {
        let n = onto.len();
        for p in from {
            for j in 0..n {
                let (cp, dist_sq) = closest_point_on_segment(*p, onto[j], onto[(j + 1) % n]);
                self.visit(cp, dist_sq);
            }
        }
    }
}

impl NarrowphaseApi for Narrowphase {
    fn project_vertices(vertices: &[Vector2], axis: Vector2) -> (f64, f64) {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for v in vertices {
            let proj = v.dot(axis);
            min = min.min(proj);
            max = max.max(proj);
        }
        (min, max)
    }

    fn project_circle(center: Vector2, radius: f64, axis: Vector2) -> (f64, f64) {
        let offset = try_unit(axis).unwrap_or(Vector2::ZERO) * radius;
        let mut min = (center + offset).dot(axis);
        let mut max = (center - offset).dot(axis);
        if min > max {
            core::mem::swap(&mut min, &mut max);
        }
        (min, max)
    }

    fn circle_circle(
        center_a: Vector2,
        radius_a: f64,
        center_b: Vector2,
        radius_b: f64,
    ) -> Option<(Vector2, f64)> {
        let distance = center_a.distance(center_b);
        let radii = radius_a + radius_b;
        if distance >= radii {
            return None;
        }
        // Coincident centers: any direction separates them, pick +X.
        let normal = try_unit(center_b - center_a).unwrap_or(Vector2::X);
        Some((normal, radii - distance))
    }

    fn circle_polygon(
        circle_center: Vector2,
        radius: f64,
        polygon_center: Vector2,
        vertices: &[Vector2],
    ) -> Option<(Vector2, f64)> {
        let mut search = AxisSearch::new();

        for i in 0..vertices.len() {
            let Some(axis) = edge_axis(vertices, i) else {
                continue;
            };
            let poly = Self::project_vertices(vertices, axis);
            let circle = Self::project_circle(circle_center, radius, axis);
            if !search.check(axis, poly, circle) {
                return None;
            }
        }

        if !vertices.is_empty() {
            let closest = vertices[closest_vertex_index(circle_center, vertices)];
            if let Some(axis) = try_unit(closest - circle_center) {
                let poly = Self::project_vertices(vertices, axis);
                let circle = Self::project_circle(circle_center, radius, axis);
                if !search.check(axis, poly, circle) {
                    return None;
                }
            }
        }

        search.finish(circle_center, polygon_center)
    }

    fn polygon_polygon(
        center_a: Vector2,
        vertices_a: &[Vector2],
        center_b: Vector2,
        vertices_b: &[Vector2],
    ) -> Option<(Vector2, f64)> {
        let mut search = AxisSearch::new();

        for owner in [vertices_a, vertices_b] {
            for i in 0..owner.len() {
                let Some(axis) = edge_axis(owner, i) else {
                    continue;
                };
                let a = Self::project_vertices(vertices_a, axis);
                let b = Self::project_vertices(vertices_b, axis);
                if !search.check(axis, a, b) {
                    return None;
                }
            }
        }

        search.finish(center_a, center_b)
    }

    fn circle_circle_contact(center_a: Vector2, radius_a: f64, center_b: Vector2) -> Vector2 {
        let dir = try_unit(center_b - center_a).unwrap_or(Vector2::X);
        center_a + dir * radius_a
    }

    fn circle_polygon_contact(circle_center: Vector2, vertices: &[Vector2]) -> Vector2 {
        let n = vertices.len();
        let mut best = circle_center;
        let mut best_dist = f64::MAX;
        for i in 0..n {
            let (cp, dist_sq) = closest_point_on_segment(circle_center, vertices[i], vertices[(i + 1) % n]);
            if dist_sq < best_dist {
                best_dist = dist_sq;
                best = cp;
            }
        }
        best
    }

    fn polygon_polygon_contacts(
        vertices_a: &[Vector2],
        vertices_b: &[Vector2],
    ) -> ([Vector2; 2], usize) {
        let mut search = ContactSearch::new();
        search.scan(vertices_a, vertices_b);
        search.scan(vertices_b, vertices_a);
        (search.points, search.count)
    }
}

/// Exact overlap test between two bodies. The normal points from `a` toward `b`.
pub fn collides(a: &mut RigidBody, b: &mut RigidBody) -> Option<(Vector2, f64)> {
    a.refresh_world_vertices();
    b.refresh_world_vertices();
    collides_refreshed(a, b)
}

/// Contact points for a pair already known to collide (up to two).
pub fn find_contact_points(a: &mut RigidBody, b: &mut RigidBody) -> ([Vector2; 2], usize) {
    a.refresh_world_vertices();
    b.refresh_world_vertices();
    contact_points_refreshed(a, b)
}

/// Package a confirmed collision into a [`Manifold`]. Restitution is the
/// smaller of the two bodies' coefficients.
pub fn build_manifold(a: &mut RigidBody, b: &mut RigidBody, normal: Vector2, depth: f64) -> Manifold {
    let (points, contact_count) = find_contact_points(a, b);
    Manifold {
        normal,
        depth,
        points,
        contact_count,
        restitution: a.restitution().min(b.restitution()),
    }
}

fn collides_refreshed(a: &RigidBody, b: &RigidBody) -> Option<(Vector2, f64)> {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            Narrowphase::circle_circle(a.position(), *ra, b.position(), *rb)
        }
        (Shape::Circle { radius }, Shape::Polygon { .. }) => {
            let vb = b.cached_world_vertices();
            Narrowphase::circle_polygon(a.position(), *radius, b.position(), vb)
        }
        (Shape::Polygon { .. }, Shape::Circle { radius }) => {
            let va = a.cached_world_vertices();
            Narrowphase::circle_polygon(b.position(), *radius, a.position(), va)
                .map(|(normal, depth)| (-normal, depth))
        }
        (Shape::Polygon { .. }, Shape::Polygon { .. }) => {
            let va = a.cached_world_vertices();
            let vb = b.cached_world_vertices();
            Narrowphase::polygon_polygon(a.position(), va, b.position(), vb)
        }
    }
}

fn contact_points_refreshed(a: &RigidBody, b: &RigidBody) -> ([Vector2; 2], usize) {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius }, Shape::Circle { .. }) => {
            let cp = Narrowphase::circle_circle_contact(a.position(), *radius, b.position());
            ([cp, Vector2::ZERO], 1)
        }
        (Shape::Circle { .. }, Shape::Polygon { .. }) => {
            let cp = Narrowphase::circle_polygon_contact(a.position(), b.cached_world_vertices());
            ([cp, Vector2::ZERO], 1)
        }
        (Shape::Polygon { .. }, Shape::Circle { .. }) => {
            let cp = Narrowphase::circle_polygon_contact(b.position(), a.cached_world_vertices());
            ([cp, Vector2::ZERO], 1)
        }
        (Shape::Polygon { .. }, Shape::Polygon { .. }) => {
            Narrowphase::polygon_polygon_contacts(a.cached_world_vertices(), b.cached_world_vertices())
        }
    }
}
