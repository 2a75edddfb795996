//! In-memory photo placement store.
//!
//! # Responsibility
//! - Track exactly one placement per photo.
//! - Validate coordinates and plan references before mutating.
//!
//! # Invariants
//! - A photo absent from the map is `Unplaced`.
//! - `place` overwrites any prior position, including one on another plan.
//! - Failed calls leave the store unchanged.

use crate::error::{ReviewError, ReviewResult};
use crate::model::geometry::{NormalizedPoint, PinPosition};
use crate::model::photo::PhotoId;
use crate::model::placement::{Placement, PlacementState};
use crate::model::plan::PlanId;
use crate::registry::plan_registry::PlanRegistry;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PlacementStore {
    positions: HashMap<PhotoId, PinPosition>,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from loaded placements. `Unplaced` entries are skipped.
    ///
    /// # Errors
    /// - `InvalidPosition` when any loaded point lies outside `[0, 1]`.
    pub fn from_placements(
        placements: impl IntoIterator<Item = Placement>,
    ) -> ReviewResult<Self> {
        let mut positions = HashMap::new();
        for placement in placements {
            if let PlacementState::Placed(position) = placement.state {
                position.point.validate()?;
                positions.insert(placement.photo_id, position);
            }
        }
        Ok(Self { positions })
    }

    /// Returns the placement of one photo; never-placed photos are `Unplaced`.
    pub fn get_placement(&self, photo_id: PhotoId) -> Placement {
        match self.positions.get(&photo_id) {
            Some(position) => Placement::placed(photo_id, *position),
            None => Placement::unplaced(photo_id),
        }
    }

    /// Pins `photo_id` on `plan_id` at `point`, superseding any prior pin.
    ///
    /// Returns the placement held before this call.
    ///
    /// # Errors
    /// - `InvalidPosition` when either axis is outside `[0, 1]` or not finite.
    /// - `PlanNotFound` when `plan_id` is unknown to `plans`.
    pub fn place(
        &mut self,
        plans: &PlanRegistry,
        photo_id: PhotoId,
        plan_id: PlanId,
        point: NormalizedPoint,
    ) -> ReviewResult<Placement> {
        point.validate()?;
        if !plans.contains_plan(plan_id) {
            return Err(ReviewError::PlanNotFound {
                project_id: None,
                plan_id,
            });
        }

        let previous = self.get_placement(photo_id);
        self.positions
            .insert(photo_id, PinPosition::new(plan_id, point));
        Ok(previous)
    }

    /// Clears the pin of `photo_id`. No-op when already unplaced.
    ///
    /// Returns the placement held before this call.
    pub fn unplace(&mut self, photo_id: PhotoId) -> Placement {
        match self.positions.remove(&photo_id) {
            Some(position) => Placement::placed(photo_id, position),
            None => Placement::unplaced(photo_id),
        }
    }

    /// Puts back a placement previously returned by `place`/`unplace`.
    pub fn restore(&mut self, previous: Placement) {
        match previous.state {
            PlacementState::Placed(position) => {
                self.positions.insert(previous.photo_id, position);
            }
            PlacementState::Unplaced => {
                self.positions.remove(&previous.photo_id);
            }
        }
    }

    /// Lists photos currently pinned on `plan_id`, ordered by photo id.
    pub fn list_placements(&self, plan_id: PlanId) -> Vec<Placement> {
        let mut items = self
            .positions
            .iter()
            .filter(|(_, position)| position.plan_id == plan_id)
            .map(|(photo_id, position)| Placement::placed(*photo_id, *position))
            .collect::<Vec<_>>();
        items.sort_by_key(|placement| placement.photo_id);
        items
    }

    pub fn is_placed(&self, photo_id: PhotoId) -> bool {
        self.positions.contains_key(&photo_id)
    }

    pub fn placed_count(&self) -> usize {
        self.positions.len()
    }
}
