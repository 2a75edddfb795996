//! Domain model for as-built pin placement.
//!
//! # Responsibility
//! - Define canonical plan/photo/placement records used by core logic.
//! - Keep geometry in normalized plan space, independent of rendering.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Positions are meaningless without their owning plan id.

pub mod activity;
pub mod geometry;
pub mod photo;
pub mod placement;
pub mod plan;
