//! In-memory plan registry.
//!
//! # Responsibility
//! - Hold the plans of one or more projects, loaded from persistence.
//! - Enforce the single-active-plan invariant on every toggle.
//!
//! # Invariants
//! - Per project, `count(is_active) <= 1` before and after every call.
//! - `set_active_plan` clears and sets flags in one step; no caller can
//!   observe zero or multiple explicit holders in between.
//! - Listings are newest-first (`created_at DESC, id ASC`).

use crate::error::{ReviewError, ReviewResult};
use crate::model::plan::{newest_first, resolve_active_plan, Plan, PlanId, ProjectId};
use std::collections::HashMap;

/// Process-local registry of plans grouped by project.
#[derive(Debug, Clone, Default)]
pub struct PlanRegistry {
    projects: HashMap<ProjectId, Vec<Plan>>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from loaded plans.
    ///
    /// If storage ever yields more than one flagged plan for a project, only
    /// the last flagged plan inserted keeps its flag.
    pub fn from_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let mut registry = Self::new();
        for plan in plans {
            registry.insert(plan);
        }
        registry
    }

    /// Registers one uploaded plan. Replaces an existing plan with the same id.
    pub fn insert(&mut self, plan: Plan) {
        let plans = self.projects.entry(plan.project_id).or_default();
        plans.retain(|existing| existing.id != plan.id);
        if plan.is_active {
            for existing in plans.iter_mut() {
                existing.is_active = false;
            }
        }
        plans.push(plan);
        plans.sort_by(newest_first);
    }

    /// Lists one project's plans newest-first.
    pub fn list_plans(&self, project_id: ProjectId) -> Vec<Plan> {
        self.projects.get(&project_id).cloned().unwrap_or_default()
    }

    /// Resolves the effective active plan: explicit flag, else newest.
    pub fn active_plan(&self, project_id: ProjectId) -> Option<&Plan> {
        self.projects
            .get(&project_id)
            .and_then(|plans| resolve_active_plan(plans))
    }

    /// Returns the explicitly flagged plan, ignoring the implicit default.
    pub fn flagged_plan_id(&self, project_id: ProjectId) -> Option<PlanId> {
        self.projects
            .get(&project_id)?
            .iter()
            .find(|plan| plan.is_active)
            .map(|plan| plan.id)
    }

    /// Looks up one plan by id across all projects.
    pub fn get(&self, plan_id: PlanId) -> Option<&Plan> {
        self.projects
            .values()
            .flat_map(|plans| plans.iter())
            .find(|plan| plan.id == plan_id)
    }

    pub fn contains_plan(&self, plan_id: PlanId) -> bool {
        self.get(plan_id).is_some()
    }

    /// Returns whether `plan_id` belongs to `project_id`.
    pub fn project_contains(&self, project_id: ProjectId, plan_id: PlanId) -> bool {
        self.projects
            .get(&project_id)
            .is_some_and(|plans| plans.iter().any(|plan| plan.id == plan_id))
    }

    /// Makes `plan_id` the single flagged plan of `project_id`.
    ///
    /// Returns the previously flagged plan id (if any) so callers can restore
    /// it via [`PlanRegistry::restore_flag`] when persistence fails.
    ///
    /// # Errors
    /// - `PlanNotFound` when `plan_id` does not belong to `project_id`.
    pub fn set_active_plan(
        &mut self,
        project_id: ProjectId,
        plan_id: PlanId,
    ) -> ReviewResult<Option<PlanId>> {
        let plans = self
            .projects
            .get_mut(&project_id)
            .filter(|plans| plans.iter().any(|plan| plan.id == plan_id))
            .ok_or(ReviewError::PlanNotFound {
                project_id: Some(project_id),
                plan_id,
            })?;

        let previous = plans.iter().find(|plan| plan.is_active).map(|plan| plan.id);
        for plan in plans.iter_mut() {
            plan.is_active = plan.id == plan_id;
        }
        Ok(previous)
    }

    /// Restores the flag state returned by `set_active_plan`.
    pub fn restore_flag(&mut self, project_id: ProjectId, previous: Option<PlanId>) {
        if let Some(plans) = self.projects.get_mut(&project_id) {
            for plan in plans.iter_mut() {
                plan.is_active = Some(plan.id) == previous;
            }
        }
    }

    pub fn plan_count(&self, project_id: ProjectId) -> usize {
        self.projects.get(&project_id).map_or(0, Vec::len)
    }
}
