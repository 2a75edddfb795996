//! Core domain logic for as-built photo pin placement and review.
//! This crate is the single source of truth for placement invariants.

pub mod analytics;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod review;
pub mod service;
pub mod store;

pub use analytics::{AnalyticsSink, LogAnalyticsSink, NoopAnalyticsSink, ReviewEvent};
pub use error::{ReviewError, ReviewResult};
pub use logging::{init_logging, LogLevel, LoggingConfig, LoggingError};
pub use model::activity::{
    badge_for, ActivityAlert, ActivityBadge, ActivityItem, ActivitySection, ApprovalStatus,
    BadgeTone,
};
pub use model::geometry::{Axis, NormalizedPoint, PinPosition, PositionError};
pub use model::photo::{Photo, PhotoId};
pub use model::placement::{Placement, PlacementState};
pub use model::plan::{resolve_active_plan, Plan, PlanId, ProjectId};
pub use registry::plan_registry::PlanRegistry;
pub use repo::error::{RepoError, RepoResult};
pub use repo::photo_repo::PhotoRepository;
pub use repo::placement_repo::PlacementRepository;
pub use repo::plan_repo::PlanRepository;
pub use repo::sqlite::SqliteReviewRepository;
pub use review::progress::{compute_plan_stats, compute_stats, PlacementStats};
pub use review::session::{ReviewSession, SessionState};
pub use service::review_service::{
    now_epoch_ms, PhotoUpload, PlanUpload, ReviewService, ReviewServiceError,
    ReviewServiceResult,
};
pub use store::placement_store::PlacementStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
