//! Review use-case service.
//!
//! # Responsibility
//! - Load project data from repositories into review sessions.
//! - Route session mutations through durable writes, fail-fast.
//! - Notify the analytics collaborator after successful writes.
//!
//! # Invariants
//! - Mutations apply in memory, then persist; if persistence fails the
//!   in-memory change is rolled back before the error is returned.
//! - Analytics is notified only after a write succeeded.
//! - Persistence errors propagate unchanged; nothing is retried.

use crate::analytics::{AnalyticsSink, LogAnalyticsSink, ReviewEvent};
use crate::error::ReviewError;
use crate::model::geometry::NormalizedPoint;
use crate::model::photo::{Photo, PhotoId};
use crate::model::placement::Placement;
use crate::model::plan::{resolve_active_plan, Plan, PlanId, ProjectId};
use crate::repo::error::RepoError;
use crate::repo::photo_repo::PhotoRepository;
use crate::repo::placement_repo::PlacementRepository;
use crate::repo::plan_repo::PlanRepository;
use crate::review::progress::{compute_stats, PlacementStats};
use crate::review::session::ReviewSession;
use crate::store::placement_store::PlacementStore;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from review service operations.
#[derive(Debug)]
pub enum ReviewServiceError {
    /// Plan display name is blank after trim.
    InvalidDisplayName,
    /// Image reference is blank after trim.
    InvalidImageRef,
    /// Local validation failure (not found, invalid position, no plan).
    Review(ReviewError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ReviewServiceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Review(err) => err.is_not_found(),
            Self::Repo(err) => err.is_not_found(),
            _ => false,
        }
    }
}

impl Display for ReviewServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDisplayName => write!(f, "plan display name must not be blank"),
            Self::InvalidImageRef => write!(f, "image reference must not be blank"),
            Self::Review(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReviewServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Review(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReviewError> for ReviewServiceError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<RepoError> for ReviewServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PlanNotFound(plan_id) => Self::Review(ReviewError::PlanNotFound {
                project_id: None,
                plan_id,
            }),
            RepoError::PhotoNotFound(photo_id) => Self::Review(ReviewError::PhotoNotFound(photo_id)),
            other => Self::Repo(other),
        }
    }
}

pub type ReviewServiceResult<T> = Result<T, ReviewServiceError>;

/// Request model for recording an uploaded plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanUpload {
    pub project_id: ProjectId,
    pub display_name: String,
    pub image_ref: String,
    /// Epoch ms; `None` uses the current time.
    pub created_at: Option<i64>,
}

/// Request model for recording an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub project_id: ProjectId,
    pub image_ref: String,
    pub caption: Option<String>,
    /// Epoch ms; `None` uses the current time.
    pub created_at: Option<i64>,
}

/// Review service facade over repository implementations.
pub struct ReviewService<R> {
    repo: R,
    analytics: Arc<dyn AnalyticsSink>,
}

impl<R> ReviewService<R>
where
    R: PlanRepository + PhotoRepository + PlacementRepository,
{
    /// Creates a service that reports analytics to the log.
    pub fn new(repo: R) -> Self {
        Self::with_analytics(repo, Arc::new(LogAnalyticsSink))
    }

    pub fn with_analytics(repo: R, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { repo, analytics }
    }

    /// Records one uploaded plan as inactive.
    pub fn register_plan(&self, upload: PlanUpload) -> ReviewServiceResult<Plan> {
        let display_name = normalize_required(&upload.display_name)
            .ok_or(ReviewServiceError::InvalidDisplayName)?;
        let image_ref =
            normalize_required(&upload.image_ref).ok_or(ReviewServiceError::InvalidImageRef)?;
        let plan = Plan::new(
            upload.project_id,
            display_name,
            image_ref,
            upload.created_at.unwrap_or_else(now_epoch_ms),
        );
        self.repo.create_plan(&plan)?;
        info!(
            "event=plan_register module=service status=ok project_id={} plan_id={}",
            plan.project_id, plan.id
        );
        Ok(plan)
    }

    /// Records one uploaded photo.
    pub fn register_photo(&self, upload: PhotoUpload) -> ReviewServiceResult<Photo> {
        let image_ref =
            normalize_required(&upload.image_ref).ok_or(ReviewServiceError::InvalidImageRef)?;
        let mut photo = Photo::new(
            upload.project_id,
            image_ref,
            upload.created_at.unwrap_or_else(now_epoch_ms),
        );
        photo.caption = upload
            .caption
            .as_deref()
            .and_then(normalize_required);
        self.repo.create_photo(&photo)?;
        info!(
            "event=photo_register module=service status=ok project_id={} photo_id={}",
            photo.project_id, photo.id
        );
        Ok(photo)
    }

    /// Lists plans newest-first.
    pub fn list_plans(&self, project_id: ProjectId) -> ReviewServiceResult<Vec<Plan>> {
        Ok(self.repo.list_plans(project_id)?)
    }

    /// Resolves the effective active plan straight from storage.
    pub fn active_plan(&self, project_id: ProjectId) -> ReviewServiceResult<Option<Plan>> {
        let plans = self.repo.list_plans(project_id)?;
        Ok(resolve_active_plan(&plans).cloned())
    }

    /// Opens a review session over one project's persisted state.
    pub fn open_session(&self, project_id: ProjectId) -> ReviewServiceResult<ReviewSession> {
        let plans = self.repo.list_plans(project_id)?;
        let photos = self.repo.list_photos(project_id)?;
        let placements = self.repo.list_placements(project_id)?;
        let session = ReviewSession::open(project_id, plans, photos, placements)?;
        info!(
            "event=review_open module=service status=ok project_id={} plans={} empty={}",
            project_id,
            session.plans().len(),
            session.is_empty()
        );
        Ok(session)
    }

    /// Makes `plan_id` the project's primary plan, durably.
    ///
    /// Re-activating the flagged plan only switches the session view; nothing
    /// is written and no event is recorded.
    pub fn set_active_plan(
        &self,
        session: &mut ReviewSession,
        plan_id: PlanId,
    ) -> ReviewServiceResult<()> {
        let project_id = session.project_id();
        let previous_view = session.active_plan_id();
        let previous_flag = session.set_active_plan(plan_id)?;
        if previous_flag == Some(plan_id) {
            return Ok(());
        }

        if let Err(err) = self.repo.set_active_plan(project_id, plan_id) {
            session.restore_active_plan(previous_flag, previous_view);
            warn!(
                "event=active_plan_set module=service status=error project_id={} plan_id={} error={}",
                project_id, plan_id, err
            );
            return Err(err.into());
        }

        self.analytics.record(&ReviewEvent::ActivePlanChanged {
            project_id,
            plan_id,
            previous_plan_id: previous_flag,
        });
        Ok(())
    }

    /// Pins `photo_id` on the session's active plan, durably.
    ///
    /// Returns the new placement.
    pub fn place_pin(
        &self,
        session: &mut ReviewSession,
        photo_id: PhotoId,
        point: NormalizedPoint,
    ) -> ReviewServiceResult<Placement> {
        let previous = session.place_pin(photo_id, point)?;
        let placement = session.placement(photo_id);
        let Some(position) = placement.position().copied() else {
            return Err(ReviewError::NoPlanSelected.into());
        };

        if let Err(err) = self.repo.save_placement(photo_id, &position) {
            session.restore_placement(previous);
            warn!(
                "event=pin_place module=service status=error photo_id={} plan_id={} error={}",
                photo_id, position.plan_id, err
            );
            return Err(err.into());
        }

        self.analytics.record(&ReviewEvent::PinPlaced {
            project_id: session.project_id(),
            plan_id: position.plan_id,
            photo_id,
            point,
        });
        Ok(placement)
    }

    /// Clears the pin of `photo_id`, durably. No-op when already unplaced.
    pub fn unplace_pin(
        &self,
        session: &mut ReviewSession,
        photo_id: PhotoId,
    ) -> ReviewServiceResult<()> {
        let previous = session.unplace_pin(photo_id)?;
        if !previous.is_placed() {
            return Ok(());
        }

        if let Err(err) = self.repo.delete_placement(photo_id) {
            session.restore_placement(previous);
            warn!(
                "event=pin_unplace module=service status=error photo_id={} error={}",
                photo_id, err
            );
            return Err(err.into());
        }

        self.analytics.record(&ReviewEvent::PinRemoved {
            project_id: session.project_id(),
            photo_id,
        });
        Ok(())
    }

    /// Computes project progress directly from storage.
    pub fn project_stats(&self, project_id: ProjectId) -> ReviewServiceResult<PlacementStats> {
        let photos = self.repo.list_photos(project_id)?;
        let placements =
            PlacementStore::from_placements(self.repo.list_placements(project_id)?)?;
        Ok(compute_stats(&photos, &placements))
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

fn normalize_required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
