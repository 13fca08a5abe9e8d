use crate::body::RigidBody;
use crate::error::{CreationError, IndexError};
use crate::math::Vector2;
use crate::types::*;

/// Public API contract for the owning rigid-body world.
pub trait PhysicsWorldApi {
    /// Construct an empty world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Body lifecycle ----------------------------------------------------

    /// Take ownership of a body and return its handle.
    fn add(&mut self, body: RigidBody) -> BodyHandle;

    /// Drop the body behind `handle`. Stale handles are rejected.
    fn remove(&mut self, handle: BodyHandle) -> Result<(), IndexError>;

    fn get(&self, handle: BodyHandle) -> Option<&RigidBody>;

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody>;

    fn body_count(&self) -> usize;

    /// Handles of all live bodies, in insertion order.
    fn handles(&self) -> Vec<BodyHandle>;

    /// Convenience: validate, build and add a circle body.
    fn create_circle_body(
        &mut self,
        radius: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<BodyHandle, CreationError>;

    /// Convenience: validate, build and add a box body.
    fn create_box_body(
        &mut self,
        width: f64,
        height: f64,
        position: Vector2,
        density: f64,
        is_static: bool,
        restitution: f64,
    ) -> Result<BodyHandle, CreationError>;

    // --- Simulation --------------------------------------------------------

    /// Advance by `dt`, split into `substeps` equal sub-steps (clamped to
    /// `[MIN_ITERATIONS, MAX_ITERATIONS]`).
    fn step(&mut self, dt: f64, substeps: usize);

    fn gravity(&self) -> Vector2;

    fn set_gravity(&mut self, gravity: Vector2);

    /// Drain the contacts recorded by the last `step` (needs `record_contacts`).
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;

    // --- Queries -----------------------------------------------------------

    /// All bodies whose shape contains `p`.
    fn query_point(&self, p: Vector2) -> Vec<BodyHandle>;

    /// All bodies whose bounds overlap `region`.
    fn query_aabb(&self, region: Aabb) -> Vec<BodyHandle>;
}

/// Narrow-phase primitives working on world-space geometry.
///
/// Collision tests return `(normal, depth)` with the normal pointing from the
/// first shape toward the second.
pub trait NarrowphaseApi {
    // Projections -----------------------------------------------------------

    fn project_vertices(vertices: &[Vector2], axis: Vector2) -> (f64, f64);
    fn project_circle(center: Vector2, radius: f64, axis: Vector2) -> (f64, f64);

    // Overlaps --------------------------------------------------------------

    fn circle_circle(
        center_a: Vector2,
        radius_a: f64,
        center_b: Vector2,
        radius_b: f64,
    ) -> Option<(Vector2, f64)>;

    fn circle_polygon(
        circle_center: Vector2,
        radius: f64,
        polygon_center: Vector2,
        vertices: &[Vector2],
    ) -> Option<(Vector2, f64)>;

    fn polygon_polygon(
        center_a: Vector2,
        vertices_a: &[Vector2],
        center_b: Vector2,
        vertices_b: &[Vector2],
    ) -> Option<(Vector2, f64)>;

    // Contact points --------------------------------------------------------

    fn circle_circle_contact(center_a: Vector2, radius_a: f64, center_b: Vector2) -> Vector2;
    fn circle_polygon_contact(circle_center: Vector2, vertices: &[Vector2]) -> Vector2;
    fn polygon_polygon_contacts(vertices_a: &[Vector2], vertices_b: &[Vector2])
    -> ([Vector2; 2], usize);
}
