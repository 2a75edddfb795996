//! Persistence collaborator: repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load plans, photos and placements per project.
//! - Provide durable, fail-fast writes for active-plan and placement changes.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`PlanNotFound`,
//!   `PhotoNotFound`) in addition to DB transport errors.
//! - Nothing here retries; failures propagate to the caller unchanged.

pub mod error;
pub mod photo_repo;
pub mod placement_repo;
pub mod plan_repo;
pub mod sqlite;
