use crate::math::Vector2;

/// Smallest accepted body area (world units²).
pub const MIN_BODY_SIZE: f64 = 0.01 * 0.01;
/// Largest accepted body area (world units²).
pub const MAX_BODY_SIZE: f64 = 64.0 * 64.0;
/// Smallest accepted density (g/cm³).
pub const MIN_DENSITY: f64 = 0.5;
/// Largest accepted density (g/cm³, roughly platinum).
pub const MAX_DENSITY: f64 = 21.45;

/// Sub-step bounds applied to `PhysicsWorld::step`.
pub const MIN_ITERATIONS: usize = 1;
pub const MAX_ITERATIONS: usize = 128;

/// Collision geometry in body-local space.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Circle centered on the body position.
    Circle { radius: f64 },
    /// Convex polygon with consistent winding, centered on the center of mass.
    Polygon { local_vertices: Vec<Vector2> },
}

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector2,
    pub max: Vector2,
}

impl Aabb {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vector2]) -> Self {
        let mut min = Vector2::splat(f64::MAX);
        let mut max = Vector2::splat(f64::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    /// Strict overlap: boxes that only touch do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn contains_point(&self, p: Vector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }
}

/// Generational handle to a body owned by a `PhysicsWorld`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Contact description for one colliding pair during one sub-step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Manifold {
    /// Unit normal pointing from body A toward body B.
    pub normal: Vector2,
    /// Penetration depth (≥ 0).
    pub depth: f64,
    /// Contact points; only the first `contact_count` are meaningful.
    pub points: [Vector2; 2],
    /// Number of valid contact points (0..=2).
    pub contact_count: usize,
    /// Restitution used for the pair: the smaller of the two bodies'.
    pub restitution: f64,
}

impl Manifold {
    /// The valid contact points.
    pub fn contacts(&self) -> &[Vector2] {
        &self.points[..self.contact_count.min(2)]
    }
}

/// How overlapping bodies are pushed apart before impulses are applied.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PositionCorrection {
    /// Each dynamic body moves half of the depth.
    #[default]
    HalfSplit,
    /// Depth is split in proportion to inverse mass.
    MassWeighted,
}

/// Contact recorded during the last `step` call.
#[derive(Copy, Clone, Debug)]
pub struct ContactEvent {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub manifold: Manifold,
}

/// World-level configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Constant acceleration applied to every dynamic body.
    pub gravity: Vector2,
    pub position_correction: PositionCorrection,
    /// Record resolved contacts so they can be drained after `step`.
    pub record_contacts: bool,
    /// Maximum number of recorded contacts per `step`; extra are dropped.
    pub max_contacts: usize,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vector2::new(0.0, -9.81),
            position_correction: PositionCorrection::HalfSplit,
            record_contacts: false,
            max_contacts: 1024,
            enable_timing: false,
        }
    }
}

/// Debug statistics for the last `step` call, summed over its sub-steps.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub substeps: usize,
    /// Pairs that survived the AABB filter.
    pub candidate_pairs: usize,
    /// Pairs the narrow phase confirmed and resolved.
    pub contacts: usize,
}

/// Timing breakdown for the last `step` call.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub integrate_ms: f64,
    pub broad_phase_ms: f64,
    pub narrow_phase_ms: f64,
}
