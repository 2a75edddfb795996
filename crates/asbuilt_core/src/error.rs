//! Local validation errors raised by the in-memory review core.

use crate::model::geometry::PositionError;
use crate::model::photo::PhotoId;
use crate::model::plan::{PlanId, ProjectId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ReviewResult<T> = Result<T, ReviewError>;

/// Errors from plan registry, placement store and review session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewError {
    /// Plan does not exist in the given project (or at all when `None`).
    PlanNotFound {
        project_id: Option<ProjectId>,
        plan_id: PlanId,
    },
    /// Photo does not exist in the session's project.
    PhotoNotFound(PhotoId),
    /// Coordinate outside `[0, 1]`, non-finite, or missing.
    InvalidPosition(PositionError),
    /// Placement requested while the session has no active plan.
    NoPlanSelected,
}

impl ReviewError {
    /// Returns whether this is a not-found class error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlanNotFound { .. } | Self::PhotoNotFound(_))
    }
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlanNotFound {
                project_id: Some(project_id),
                plan_id,
            } => write!(f, "plan {plan_id} not found in project {project_id}"),
            Self::PlanNotFound {
                project_id: None,
                plan_id,
            } => write!(f, "plan not found: {plan_id}"),
            Self::PhotoNotFound(id) => write!(f, "photo not found: {id}"),
            Self::InvalidPosition(err) => write!(f, "invalid position: {err}"),
            Self::NoPlanSelected => write!(f, "no plan selected in review session"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPosition(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PositionError> for ReviewError {
    fn from(value: PositionError) -> Self {
        Self::InvalidPosition(value)
    }
}
