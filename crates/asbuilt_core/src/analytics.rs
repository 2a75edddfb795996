//! Review analytics hooks.
//!
//! # Responsibility
//! - Describe review events that external analytics may record.
//! - Provide the sink seam services notify after successful mutations.
//!
//! # Invariants
//! - Sinks are fire-and-forget: `record` cannot fail or block core flow.
//! - Events carry ids and coordinates only, never captions or image refs.

use crate::model::activity::{ActivityAlert, ActivityItem, ActivitySection, ApprovalStatus};
use crate::model::geometry::NormalizedPoint;
use crate::model::photo::PhotoId;
use crate::model::plan::{PlanId, ProjectId};
use log::info;

/// Review event emitted after a successful, persisted mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewEvent {
    PinPlaced {
        project_id: ProjectId,
        plan_id: PlanId,
        photo_id: PhotoId,
        point: NormalizedPoint,
    },
    PinRemoved {
        project_id: ProjectId,
        photo_id: PhotoId,
    },
    ActivePlanChanged {
        project_id: ProjectId,
        plan_id: PlanId,
        previous_plan_id: Option<PlanId>,
    },
}

impl ReviewEvent {
    /// Stable event name used in log lines and analytics payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PinPlaced { .. } => "pin_placed",
            Self::PinRemoved { .. } => "pin_removed",
            Self::ActivePlanChanged { .. } => "active_plan_changed",
        }
    }

    pub fn project_id(&self) -> ProjectId {
        match self {
            Self::PinPlaced { project_id, .. }
            | Self::PinRemoved { project_id, .. }
            | Self::ActivePlanChanged { project_id, .. } => *project_id,
        }
    }

    /// Projects this event into an activity feed entry.
    pub fn to_activity(&self, occurred_at: i64) -> ActivityItem {
        let (alert, section, title) = match self {
            Self::PinPlaced { .. } => (ActivityAlert::Success, ActivitySection::Photos, "Photo pinned"),
            Self::PinRemoved { .. } => (ActivityAlert::Info, ActivitySection::Photos, "Pin removed"),
            Self::ActivePlanChanged { .. } => {
                (ActivityAlert::Info, ActivitySection::Plans, "Active plan changed")
            }
        };
        ActivityItem {
            alert,
            section,
            title: title.to_string(),
            approval: ApprovalStatus::NotRequired,
            occurred_at,
        }
    }
}

/// Best-effort analytics collaborator.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &ReviewEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalyticsSink;

impl AnalyticsSink for NoopAnalyticsSink {
    fn record(&self, _event: &ReviewEvent) {}
}

/// Writes metadata-only `event=...` lines through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnalyticsSink;

impl AnalyticsSink for LogAnalyticsSink {
    fn record(&self, event: &ReviewEvent) {
        let badge = event.to_activity(0).badge();
        match event {
            ReviewEvent::PinPlaced {
                project_id,
                plan_id,
                photo_id,
                point,
            } => info!(
                "event={} module=analytics status=ok project_id={} plan_id={} photo_id={} x={:.4} y={:.4} icon={}",
                event.name(),
                project_id,
                plan_id,
                photo_id,
                point.x,
                point.y,
                badge.icon
            ),
            ReviewEvent::PinRemoved {
                project_id,
                photo_id,
            } => info!(
                "event={} module=analytics status=ok project_id={} photo_id={} icon={}",
                event.name(),
                project_id,
                photo_id,
                badge.icon
            ),
            ReviewEvent::ActivePlanChanged {
                project_id,
                plan_id,
                previous_plan_id,
            } => info!(
                "event={} module=analytics status=ok project_id={} plan_id={} previous_plan_id={} icon={}",
                event.name(),
                project_id,
                plan_id,
                previous_plan_id.map_or_else(|| "none".to_string(), |id| id.to_string()),
                badge.icon
            ),
        }
    }
}
