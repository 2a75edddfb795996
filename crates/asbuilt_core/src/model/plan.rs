//! Floor plan domain model.
//!
//! # Responsibility
//! - Define the plan record photos are pinned against.
//! - Resolve the effective active plan of one project.
//!
//! # Invariants
//! - `id` is stable and never reused for another plan.
//! - Within one project at most one plan has `is_active = true`.
//! - With no explicit flag, the newest plan is the implicit default.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Stable identifier of a project that owns plans and photos.
pub type ProjectId = Uuid;

/// Stable identifier of one floor plan.
pub type PlanId = Uuid;

/// One floor plan document uploaded to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub project_id: ProjectId,
    /// User-facing label, e.g. "Level 2 - Mechanical".
    pub display_name: String,
    /// Opaque handle into the external file store.
    pub image_ref: String,
    /// Explicit primary-plan flag. Only toggled through the plan registry.
    pub is_active: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Plan {
    /// Creates an inactive plan with a generated stable ID.
    pub fn new(
        project_id: ProjectId,
        display_name: impl Into<String>,
        image_ref: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            display_name: display_name.into(),
            image_ref: image_ref.into(),
            is_active: false,
            created_at,
        }
    }
}

/// Newest-first ordering; ties resolved by id so listings stay deterministic.
pub fn newest_first(a: &Plan, b: &Plan) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Resolves the effective active plan among one project's plans.
///
/// Explicit `is_active` wins; otherwise the newest plan is returned.
pub fn resolve_active_plan(plans: &[Plan]) -> Option<&Plan> {
    plans
        .iter()
        .find(|plan| plan.is_active)
        .or_else(|| plans.iter().min_by(|a, b| newest_first(a, b)))
}
