//! Review session controller.
//!
//! # Responsibility
//! - Drive one interactive review view: plan selection, photo selection and
//!   pin placement for a single project.
//! - Own the in-memory registry/store snapshot for that view.
//!
//! # Invariants
//! - The session is the only writer of its placement store.
//! - `select_plan` changes the local view only; the project's flagged plan
//!   changes only through `set_active_plan`.
//! - Switching plans keeps the selected photo.
//! - No notifications are pushed; callers recompute stats on read.

use crate::error::{ReviewError, ReviewResult};
use crate::model::geometry::NormalizedPoint;
use crate::model::photo::{Photo, PhotoId};
use crate::model::placement::Placement;
use crate::model::plan::{Plan, PlanId, ProjectId};
use crate::registry::plan_registry::PlanRegistry;
use crate::review::progress::{compute_plan_stats, compute_stats, PlacementStats};
use crate::store::placement_store::PlacementStore;
use std::collections::BTreeMap;

/// Observable state of a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Project has no plans, or none was selected yet.
    NoPlanSelected,
    PlanSelected {
        plan_id: PlanId,
    },
    PhotoSelected {
        plan_id: PlanId,
        photo_id: PhotoId,
    },
}

/// Transient review context for one project view.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    project_id: ProjectId,
    plans: PlanRegistry,
    photos: BTreeMap<PhotoId, Photo>,
    placements: PlacementStore,
    active_plan_id: Option<PlanId>,
    selected_photo_id: Option<PhotoId>,
}

impl ReviewSession {
    /// Opens a session over one project's loaded data.
    ///
    /// Plans and photos of other projects are ignored. The initial active plan
    /// is the registry's effective active plan, if the project has any plans.
    ///
    /// # Errors
    /// - `InvalidPosition` when a loaded placement holds an out-of-range point.
    pub fn open(
        project_id: ProjectId,
        plans: impl IntoIterator<Item = Plan>,
        photos: impl IntoIterator<Item = Photo>,
        placements: impl IntoIterator<Item = Placement>,
    ) -> ReviewResult<Self> {
        let plans = PlanRegistry::from_plans(
            plans
                .into_iter()
                .filter(|plan| plan.project_id == project_id),
        );
        let photos = photos
            .into_iter()
            .filter(|photo| photo.project_id == project_id)
            .map(|photo| (photo.id, photo))
            .collect::<BTreeMap<_, _>>();
        let placements = PlacementStore::from_placements(placements.into_iter().filter(
            |placement| {
                photos.contains_key(&placement.photo_id)
                    && placement
                        .position()
                        .is_some_and(|position| plans.contains_plan(position.plan_id))
            },
        ))?;
        let active_plan_id = plans.active_plan(project_id).map(|plan| plan.id);

        Ok(Self {
            project_id,
            plans,
            photos,
            placements,
            active_plan_id,
            selected_photo_id: None,
        })
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn state(&self) -> SessionState {
        match (self.active_plan_id, self.selected_photo_id) {
            (None, _) => SessionState::NoPlanSelected,
            (Some(plan_id), None) => SessionState::PlanSelected { plan_id },
            (Some(plan_id), Some(photo_id)) => SessionState::PhotoSelected { plan_id, photo_id },
        }
    }

    /// Returns whether the project has no plans to show.
    pub fn is_empty(&self) -> bool {
        self.plans.plan_count(self.project_id) == 0
    }

    pub fn active_plan_id(&self) -> Option<PlanId> {
        self.active_plan_id
    }

    pub fn active_plan(&self) -> Option<&Plan> {
        self.active_plan_id.and_then(|plan_id| self.plans.get(plan_id))
    }

    pub fn selected_photo_id(&self) -> Option<PhotoId> {
        self.selected_photo_id
    }

    pub fn selected_photo(&self) -> Option<&Photo> {
        self.selected_photo_id
            .and_then(|photo_id| self.photos.get(&photo_id))
    }

    /// Project plans newest-first.
    pub fn plans(&self) -> Vec<Plan> {
        self.plans.list_plans(self.project_id)
    }

    pub fn registry(&self) -> &PlanRegistry {
        &self.plans
    }

    /// Project photos ordered by id.
    pub fn photos(&self) -> impl Iterator<Item = &Photo> {
        self.photos.values()
    }

    pub fn placement_store(&self) -> &PlacementStore {
        &self.placements
    }

    /// Switches the session's view to `plan_id`.
    ///
    /// # Errors
    /// - `PlanNotFound` when the plan is not part of this project.
    pub fn select_plan(&mut self, plan_id: PlanId) -> ReviewResult<()> {
        self.ensure_plan(plan_id)?;
        self.active_plan_id = Some(plan_id);
        Ok(())
    }

    /// Selects one photo for inspection or placement.
    ///
    /// # Errors
    /// - `PhotoNotFound` when the photo is not part of this project.
    pub fn select_photo(&mut self, photo_id: PhotoId) -> ReviewResult<()> {
        self.ensure_photo(photo_id)?;
        self.selected_photo_id = Some(photo_id);
        Ok(())
    }

    pub fn clear_photo_selection(&mut self) {
        self.selected_photo_id = None;
    }

    /// Makes `plan_id` the project's flagged primary plan and views it.
    ///
    /// Returns the previously flagged plan id for rollback.
    pub fn set_active_plan(&mut self, plan_id: PlanId) -> ReviewResult<Option<PlanId>> {
        let previous = self.plans.set_active_plan(self.project_id, plan_id)?;
        self.active_plan_id = Some(plan_id);
        Ok(previous)
    }

    /// Reverts a `set_active_plan` whose persistence failed.
    pub(crate) fn restore_active_plan(
        &mut self,
        previous_flag: Option<PlanId>,
        previous_view: Option<PlanId>,
    ) {
        self.plans.restore_flag(self.project_id, previous_flag);
        self.active_plan_id = previous_view;
    }

    /// Pins `photo_id` on the session's active plan.
    ///
    /// Returns the placement held before this call.
    ///
    /// # Errors
    /// - `NoPlanSelected` when the session has no active plan.
    /// - `PhotoNotFound` when the photo is not part of this project.
    /// - `InvalidPosition` / `PlanNotFound` from the placement store.
    pub fn place_pin(
        &mut self,
        photo_id: PhotoId,
        point: NormalizedPoint,
    ) -> ReviewResult<Placement> {
        let plan_id = self.active_plan_id.ok_or(ReviewError::NoPlanSelected)?;
        self.ensure_photo(photo_id)?;
        self.placements
            .place(&self.plans, photo_id, plan_id, point)
    }

    /// Clears the pin of `photo_id`; no-op when already unplaced.
    pub fn unplace_pin(&mut self, photo_id: PhotoId) -> ReviewResult<Placement> {
        self.ensure_photo(photo_id)?;
        Ok(self.placements.unplace(photo_id))
    }

    pub(crate) fn restore_placement(&mut self, previous: Placement) {
        self.placements.restore(previous);
    }

    pub fn placement(&self, photo_id: PhotoId) -> Placement {
        self.placements.get_placement(photo_id)
    }

    /// Placements visible on the active plan. Empty without an active plan.
    pub fn visible_placements(&self) -> Vec<Placement> {
        self.active_plan_id
            .map(|plan_id| self.placements.list_placements(plan_id))
            .unwrap_or_default()
    }

    /// Project-wide progress.
    pub fn stats(&self) -> PlacementStats {
        compute_stats(self.photos.values(), &self.placements)
    }

    /// Progress counting only pins on the active plan.
    pub fn plan_stats(&self) -> PlacementStats {
        match self.active_plan_id {
            Some(plan_id) => compute_plan_stats(self.photos.values(), &self.placements, plan_id),
            None => PlacementStats::default(),
        }
    }

    fn ensure_plan(&self, plan_id: PlanId) -> ReviewResult<()> {
        if !self.plans.project_contains(self.project_id, plan_id) {
            return Err(ReviewError::PlanNotFound {
                project_id: Some(self.project_id),
                plan_id,
            });
        }
        Ok(())
    }

    fn ensure_photo(&self, photo_id: PhotoId) -> ReviewResult<()> {
        if !self.photos.contains_key(&photo_id) {
            return Err(ReviewError::PhotoNotFound(photo_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ReviewSession, SessionState};
    use crate::error::ReviewError;
    use crate::model::geometry::NormalizedPoint;
    use crate::model::photo::Photo;
    use crate::model::plan::Plan;
    use uuid::Uuid;

    struct Fixture {
        session: ReviewSession,
        plan_a: Plan,
        plan_b: Plan,
        photo: Photo,
    }

    fn fixture() -> Fixture {
        let project = Uuid::new_v4();
        let plan_a = Plan::new(project, "A", "a.png", 1_000);
        let mut plan_b = Plan::new(project, "B", "b.png", 2_000);
        plan_b.is_active = true;
        let photo = Photo::new(project, "p.jpg", 3_000);
        let session = ReviewSession::open(
            project,
            [plan_a.clone(), plan_b.clone()],
            [photo.clone()],
            [],
        )
        .unwrap();
        Fixture {
            session,
            plan_a,
            plan_b,
            photo,
        }
    }

    fn point(x: f64, y: f64) -> NormalizedPoint {
        NormalizedPoint::new(x, y).unwrap()
    }

    #[test]
    fn opens_on_registry_active_plan() {
        let f = fixture();
        assert_eq!(
            f.session.state(),
            SessionState::PlanSelected {
                plan_id: f.plan_b.id
            }
        );
    }

    #[test]
    fn project_without_plans_opens_empty() {
        let project = Uuid::new_v4();
        let session =
            ReviewSession::open(project, [], [Photo::new(project, "p.jpg", 0)], []).unwrap();
        assert!(session.is_empty());
        assert_eq!(session.state(), SessionState::NoPlanSelected);
        assert!(session.visible_placements().is_empty());
    }

    #[test]
    fn select_plan_does_not_touch_registry_flag() {
        let mut f = fixture();
        f.session.select_plan(f.plan_a.id).unwrap();

        assert_eq!(f.session.active_plan_id(), Some(f.plan_a.id));
        assert_eq!(
            f.session.registry().flagged_plan_id(f.session.project_id()),
            Some(f.plan_b.id)
        );
    }

    #[test]
    fn select_unknown_plan_or_photo_is_not_found() {
        let mut f = fixture();
        let err = f.session.select_plan(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ReviewError::PlanNotFound { .. }));

        let err = f.session.select_photo(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ReviewError::PhotoNotFound(_)));
    }

    #[test]
    fn selected_photo_survives_plan_switch() {
        let mut f = fixture();
        f.session.select_photo(f.photo.id).unwrap();
        f.session.select_plan(f.plan_a.id).unwrap();

        assert_eq!(
            f.session.state(),
            SessionState::PhotoSelected {
                plan_id: f.plan_a.id,
                photo_id: f.photo.id
            }
        );
    }

    #[test]
    fn placement_is_scoped_to_active_plan() {
        let mut f = fixture();
        f.session.select_plan(f.plan_a.id).unwrap();
        f.session.place_pin(f.photo.id, point(0.3, 0.4)).unwrap();
        f.session.select_plan(f.plan_b.id).unwrap();

        let placement = f.session.placement(f.photo.id);
        assert_eq!(placement.position().unwrap().plan_id, f.plan_a.id);
        assert!(f.session.visible_placements().is_empty());
        assert_eq!(f.session.stats().placed, 1);
        assert_eq!(f.session.plan_stats().placed, 0);
    }

    #[test]
    fn place_without_plan_is_rejected() {
        let project = Uuid::new_v4();
        let photo = Photo::new(project, "p.jpg", 0);
        let mut session = ReviewSession::open(project, [], [photo.clone()], []).unwrap();

        let err = session.place_pin(photo.id, point(0.5, 0.5)).unwrap_err();
        assert_eq!(err, ReviewError::NoPlanSelected);
    }

    #[test]
    fn stats_recompute_after_place_and_unplace() {
        let mut f = fixture();
        assert_eq!(f.session.stats().percentage, 0);

        f.session.place_pin(f.photo.id, point(0.5, 0.5)).unwrap();
        assert_eq!(f.session.stats().percentage, 100);

        f.session.unplace_pin(f.photo.id).unwrap();
        assert_eq!(f.session.stats().unplaced, 1);
    }
}
