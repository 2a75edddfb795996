//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level review functions to Dart via FRB.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Ids cross the boundary as hyphenated UUID strings.
//! - Every DB-backed call opens its own connection and review session.

use asbuilt_core::db::open_db;
use asbuilt_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    LoggingConfig, NormalizedPoint, PhotoUpload, Plan, PlacementStats, PlanUpload, ReviewService,
    ReviewServiceError, SqliteReviewRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const REVIEW_DB_FILE_NAME: &str = "asbuilt_review.sqlite3";
const REVIEW_DB_PATH_ENV: &str = "ASBUILT_DB_PATH";
static REVIEW_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match LoggingConfig::new(&level, log_dir.trim()).and_then(|config| init_logging_inner(&config))
    {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the review database location for this process.
///
/// Must run before the first DB-backed call to take effect. Repeating the
/// call with the already-active path is accepted.
///
/// # FFI contract
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn review_configure_db(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = REVIEW_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "review DB already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Plan row returned by [`review_list_plans`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPlanItem {
    pub plan_id: String,
    pub display_name: String,
    pub image_ref: String,
    /// Stored primary flag; see `active_plan_id` for the effective plan.
    pub is_active: bool,
    pub created_at: i64,
}

/// Plan listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPlanListResponse {
    pub ok: bool,
    /// Plans newest-first.
    pub items: Vec<ReviewPlanItem>,
    /// Effective active plan (flagged, else newest).
    pub active_plan_id: Option<String>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected entity.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ReviewActionResponse {
    fn success(message: impl Into<String>, id: impl ToString) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Progress envelope. Counts are zero when `ok` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewStatsResponse {
    pub ok: bool,
    pub total: u32,
    pub placed: u32,
    pub unplaced: u32,
    pub percentage: u32,
    pub message: String,
}

impl ReviewStatsResponse {
    fn from_stats(stats: PlacementStats) -> Self {
        Self {
            ok: true,
            total: stats.total,
            placed: stats.placed,
            unplaced: stats.unplaced,
            percentage: stats.percentage,
            message: format!("{}% placed.", stats.percentage),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            total: 0,
            placed: 0,
            unplaced: 0,
            percentage: 0,
            message: message.into(),
        }
    }
}

/// Records an uploaded plan for `project_id`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the new plan id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn review_register_plan(
    project_id: String,
    display_name: String,
    image_ref: String,
) -> ReviewActionResponse {
    let result = parse_id("project_id", &project_id).and_then(|project_id| {
        with_review_service(|service| {
            service.register_plan(PlanUpload {
                project_id,
                display_name,
                image_ref,
                created_at: None,
            })
        })
    });
    match result {
        Ok(plan) => ReviewActionResponse::success("Plan registered.", plan.id),
        Err(err) => action_failure("review_register_plan", err),
    }
}

/// Records an uploaded photo for `project_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn review_register_photo(
    project_id: String,
    image_ref: String,
    caption: Option<String>,
) -> ReviewActionResponse {
    let result = parse_id("project_id", &project_id).and_then(|project_id| {
        with_review_service(|service| {
            service.register_photo(PhotoUpload {
                project_id,
                image_ref,
                caption,
                created_at: None,
            })
        })
    });
    match result {
        Ok(photo) => ReviewActionResponse::success("Photo registered.", photo.id),
        Err(err) => action_failure("review_register_photo", err),
    }
}

/// Lists a project's plans newest-first with the effective active plan.
#[flutter_rust_bridge::frb(sync)]
pub fn review_list_plans(project_id: String) -> ReviewPlanListResponse {
    let result = parse_id("project_id", &project_id)
        .and_then(|project_id| with_review_service(|service| service.list_plans(project_id)));
    match result {
        Ok(plans) => {
            let active_plan_id =
                asbuilt_core::resolve_active_plan(&plans).map(|plan| plan.id.to_string());
            let items: Vec<_> = plans.into_iter().map(to_plan_item).collect();
            let message = if items.is_empty() {
                "No plans uploaded.".to_string()
            } else {
                format!("Found {} plan(s).", items.len())
            };
            ReviewPlanListResponse {
                ok: true,
                items,
                active_plan_id,
                message,
            }
        }
        Err(err) => ReviewPlanListResponse {
            ok: false,
            items: Vec::new(),
            active_plan_id: None,
            message: failure_message("review_list_plans", &err),
        },
    }
}

/// Makes `plan_id` the project's primary plan.
#[flutter_rust_bridge::frb(sync)]
pub fn review_set_active_plan(project_id: String, plan_id: String) -> ReviewActionResponse {
    let result = parse_id("project_id", &project_id).and_then(|project_id| {
        let plan_id = parse_id("plan_id", &plan_id)?;
        with_review_service(|service| {
            let mut session = service.open_session(project_id)?;
            service.set_active_plan(&mut session, plan_id)?;
            Ok(plan_id)
        })
    });
    match result {
        Ok(plan_id) => ReviewActionResponse::success("Active plan updated.", plan_id),
        Err(err) => action_failure("review_set_active_plan", err),
    }
}

/// Pins a photo at normalized `(x, y)`.
///
/// Input semantics:
/// - `plan_id`: plan to pin on; `None` uses the project's active plan.
/// - `x`, `y`: fractions of plan width/height in `[0, 1]`; both required.
///
/// # FFI contract
/// - Never panics.
/// - Out-of-range or missing coordinates fail and leave storage unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn review_place_pin(
    project_id: String,
    photo_id: String,
    plan_id: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
) -> ReviewActionResponse {
    let result = parse_id("project_id", &project_id).and_then(|project_id| {
        let photo_id = parse_id("photo_id", &photo_id)?;
        let plan_id = plan_id
            .as_deref()
            .map(|raw| parse_id("plan_id", raw))
            .transpose()?;
        let point = NormalizedPoint::from_parts(x, y).map_err(|err| err.to_string())?;
        with_review_service(|service| {
            let mut session = service.open_session(project_id)?;
            if let Some(plan_id) = plan_id {
                session.select_plan(plan_id)?;
            }
            service.place_pin(&mut session, photo_id, point)
        })
    });
    match result {
        Ok(placement) => ReviewActionResponse::success("Pin placed.", placement.photo_id),
        Err(err) => action_failure("review_place_pin", err),
    }
}

/// Removes the pin of a photo. Succeeds when the photo was not placed.
#[flutter_rust_bridge::frb(sync)]
pub fn review_unplace_pin(project_id: String, photo_id: String) -> ReviewActionResponse {
    let result = parse_id("project_id", &project_id).and_then(|project_id| {
        let photo_id = parse_id("photo_id", &photo_id)?;
        with_review_service(|service| {
            let mut session = service.open_session(project_id)?;
            service.unplace_pin(&mut session, photo_id)?;
            Ok(photo_id)
        })
    });
    match result {
        Ok(photo_id) => ReviewActionResponse::success("Pin removed.", photo_id),
        Err(err) => action_failure("review_unplace_pin", err),
    }
}

/// Computes project-wide placement progress.
#[flutter_rust_bridge::frb(sync)]
pub fn review_project_stats(project_id: String) -> ReviewStatsResponse {
    let result = parse_id("project_id", &project_id)
        .and_then(|project_id| with_review_service(|service| service.project_stats(project_id)));
    match result {
        Ok(stats) => ReviewStatsResponse::from_stats(stats),
        Err(err) => ReviewStatsResponse::failure(failure_message("review_project_stats", &err)),
    }
}

fn resolve_review_db_path() -> PathBuf {
    REVIEW_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(REVIEW_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(REVIEW_DB_FILE_NAME)
        })
        .clone()
}

fn with_review_service<T>(
    f: impl FnOnce(&ReviewService<SqliteReviewRepository<'_>>) -> Result<T, ReviewServiceError>,
) -> Result<T, String> {
    let db_path = resolve_review_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("review DB open failed: {err}"))?;
    let repo = SqliteReviewRepository::try_new(&conn)
        .map_err(|err| format!("review repo init failed: {err}"))?;
    let service = ReviewService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid {field} `{raw}`: {err}"))
}

fn failure_message(operation: &str, err: &str) -> String {
    warn!("event=ffi_call module=ffi status=error op={operation}");
    format!("{operation} failed: {err}")
}

fn action_failure(operation: &str, err: String) -> ReviewActionResponse {
    ReviewActionResponse::failure(failure_message(operation, &err))
}

fn to_plan_item(plan: Plan) -> ReviewPlanItem {
    ReviewPlanItem {
        plan_id: plan.id.to_string(),
        display_name: plan.display_name,
        image_ref: plan.image_ref,
        is_active: plan.is_active,
        created_at: plan.created_at,
    }
}
