//! Photo-to-plan placement association.
//!
//! # Invariants
//! - Exactly one `Placement` exists per photo at any time.
//! - A position exists if and only if the state is `Placed`.

use crate::model::geometry::PinPosition;
use crate::model::photo::PhotoId;
use crate::model::plan::PlanId;
use serde::{Deserialize, Serialize};

/// Placement lifecycle state of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "position")]
pub enum PlacementState {
    /// No position recorded.
    Unplaced,
    /// Pinned at a position on one plan.
    Placed(PinPosition),
}

/// The placement of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub photo_id: PhotoId,
    pub state: PlacementState,
}

impl Placement {
    pub fn unplaced(photo_id: PhotoId) -> Self {
        Self {
            photo_id,
            state: PlacementState::Unplaced,
        }
    }

    pub fn placed(photo_id: PhotoId, position: PinPosition) -> Self {
        Self {
            photo_id,
            state: PlacementState::Placed(position),
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.state, PlacementState::Placed(_))
    }

    pub fn position(&self) -> Option<&PinPosition> {
        match &self.state {
            PlacementState::Placed(position) => Some(position),
            PlacementState::Unplaced => None,
        }
    }

    /// Returns whether this photo is pinned on `plan_id`.
    pub fn is_on_plan(&self, plan_id: PlanId) -> bool {
        self.position()
            .is_some_and(|position| position.plan_id == plan_id)
    }
}
