//! Normalized plan-surface geometry.
//!
//! # Responsibility
//! - Represent pin coordinates relative to a plan's rendered bounds.
//! - Validate coordinates before any placement mutation.
//!
//! # Invariants
//! - Valid coordinates are finite and within `[0.0, 1.0]` on both axes.
//! - A `PinPosition` is bound to exactly one plan and is not portable.
//! - Core never stores pixel coordinates; renderers derive them on demand.

use crate::model::plan::PlanId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coordinate axis used in validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
        }
    }
}

/// Validation errors for normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionError {
    /// Coordinate lies outside `[0.0, 1.0]`.
    OutOfRange { axis: Axis, value: f64 },
    /// Coordinate is NaN or infinite.
    NotFinite { axis: Axis },
    /// Boundary input omitted a required coordinate.
    MissingCoordinate { axis: Axis },
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { axis, value } => {
                write!(f, "{axis} must be within [0, 1], got {value}")
            }
            Self::NotFinite { axis } => write!(f, "{axis} must be a finite number"),
            Self::MissingCoordinate { axis } => write!(f, "{axis} coordinate is required"),
        }
    }
}

impl Error for PositionError {}

/// A point in normalized plan space. `(0, 0)` is the top-left corner.
///
/// Fields stay public for renderers; deserialized points are validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

impl TryFrom<RawPoint> for NormalizedPoint {
    type Error = PositionError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y)
    }
}

impl NormalizedPoint {
    /// Builds a validated point.
    pub fn new(x: f64, y: f64) -> Result<Self, PositionError> {
        let point = Self { x, y };
        point.validate()?;
        Ok(point)
    }

    /// Builds a point from optional boundary inputs (FFI/CLI payloads).
    pub fn from_parts(x: Option<f64>, y: Option<f64>) -> Result<Self, PositionError> {
        let x = x.ok_or(PositionError::MissingCoordinate { axis: Axis::X })?;
        let y = y.ok_or(PositionError::MissingCoordinate { axis: Axis::Y })?;
        Self::new(x, y)
    }

    /// Checks both axes. Values are never clamped.
    pub fn validate(&self) -> Result<(), PositionError> {
        validate_axis(Axis::X, self.x)?;
        validate_axis(Axis::Y, self.y)
    }
}

fn validate_axis(axis: Axis, value: f64) -> Result<(), PositionError> {
    if !value.is_finite() {
        return Err(PositionError::NotFinite { axis });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(PositionError::OutOfRange { axis, value });
    }
    Ok(())
}

/// A normalized point pinned to one specific plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinPosition {
    pub plan_id: PlanId,
    pub point: NormalizedPoint,
}

impl PinPosition {
    pub fn new(plan_id: PlanId, point: NormalizedPoint) -> Self {
        Self { plan_id, point }
    }

    /// Projects onto a rendered plan of `width` x `height` pixels.
    pub fn to_pixels(&self, width: u32, height: u32) -> (f64, f64) {
        (
            self.point.x * f64::from(width),
            self.point.y * f64::from(height),
        )
    }
}
