use thiserror::Error;

use crate::types::BodyHandle;

/// Rejected body construction. No body is built when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CreationError {
    #[error("body area {area} outside [{min}, {max}]")]
    InvalidArea { area: f64, min: f64, max: f64 },
    #[error("body density {density} outside [{min}, {max}]")]
    InvalidDensity { density: f64, min: f64, max: f64 },
    #[error("polygon must be convex, non-degenerate and have at least 3 vertices")]
    InvalidPolygon,
    #[error("body position ({x}, {y}) is not finite")]
    InvalidPosition { x: f64, y: f64 },
}

/// Stale or unknown body handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("body handle {handle:?} is out of range or stale")]
    OutOfRange { handle: BodyHandle },
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PhysicsError {
    #[error(transparent)]
    Creation(#[from] CreationError),
    #[error(transparent)]
    Index(#[from] IndexError),
}
