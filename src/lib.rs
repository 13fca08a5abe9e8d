//! flatbody: 2D rigid-body core (SAT detection, impulse resolution, owning world)

pub mod api;
pub mod body;
pub mod error;
pub mod math;
pub mod narrowphase;
pub mod resolver;
pub mod types;
pub mod world;

pub use crate::api::*;
pub use crate::body::RigidBody;
pub use crate::error::{CreationError, IndexError, PhysicsError};
pub use crate::math::{Transform, Vector2};
pub use crate::narrowphase::{Narrowphase, build_manifold, collides, find_contact_points};
pub use crate::resolver::ContactResolver;
pub use crate::types::*;
pub use crate::world::PhysicsWorld;
