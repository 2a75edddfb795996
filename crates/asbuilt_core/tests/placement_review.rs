use asbuilt_core::db::open_db_in_memory;
use asbuilt_core::{
    AnalyticsSink, Axis, NormalizedPoint, Photo, PhotoId, PhotoRepository, PhotoUpload,
    PinPosition, Placement, PlacementRepository, PlacementState, PlacementStats, Plan, PlanId,
    PlanRepository, PlanUpload, PositionError, ProjectId, RepoError, RepoResult, ReviewError,
    ReviewEvent, ReviewService, ReviewServiceError, SessionState, SqliteReviewRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ReviewEvent>>,
}

impl RecordingSink {
    fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(ReviewEvent::name)
            .collect()
    }
}

impl AnalyticsSink for RecordingSink {
    fn record(&self, event: &ReviewEvent) {
        self.events.lock().unwrap().push(*event);
    }
}

/// Delegates reads to SQLite and fails every placement write.
struct FailingPlacementWrites<'conn> {
    inner: SqliteReviewRepository<'conn>,
}

impl PlanRepository for FailingPlacementWrites<'_> {
    fn create_plan(&self, plan: &Plan) -> RepoResult<()> {
        self.inner.create_plan(plan)
    }
    fn list_plans(&self, project_id: ProjectId) -> RepoResult<Vec<Plan>> {
        self.inner.list_plans(project_id)
    }
    fn set_active_plan(&self, _project_id: ProjectId, _plan_id: PlanId) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }
}

impl PhotoRepository for FailingPlacementWrites<'_> {
    fn create_photo(&self, photo: &Photo) -> RepoResult<()> {
        self.inner.create_photo(photo)
    }
    fn list_photos(&self, project_id: ProjectId) -> RepoResult<Vec<Photo>> {
        self.inner.list_photos(project_id)
    }
}

impl PlacementRepository for FailingPlacementWrites<'_> {
    fn list_placements(&self, project_id: ProjectId) -> RepoResult<Vec<Placement>> {
        self.inner.list_placements(project_id)
    }
    fn get_placement(&self, photo_id: PhotoId) -> RepoResult<Placement> {
        self.inner.get_placement(photo_id)
    }
    fn save_placement(&self, _photo_id: PhotoId, _position: &PinPosition) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }
    fn delete_placement(&self, _photo_id: PhotoId) -> RepoResult<()> {
        Err(RepoError::InvalidData("injected write failure".to_string()))
    }
}

struct Project {
    id: ProjectId,
    plan_a: Plan,
    plan_b: Plan,
    photos: Vec<Photo>,
}

fn seed(conn: &Connection, photo_count: usize) -> Project {
    let service = ReviewService::new(SqliteReviewRepository::try_new(conn).unwrap());
    let id = Uuid::new_v4();
    let plan_a = service
        .register_plan(PlanUpload {
            project_id: id,
            display_name: "Level 1".to_string(),
            image_ref: "plans/l1.png".to_string(),
            created_at: Some(1_000),
        })
        .unwrap();
    let plan_b = service
        .register_plan(PlanUpload {
            project_id: id,
            display_name: "Level 2".to_string(),
            image_ref: "plans/l2.png".to_string(),
            created_at: Some(2_000),
        })
        .unwrap();
    let photos = (0..photo_count)
        .map(|i| {
            service
                .register_photo(PhotoUpload {
                    project_id: id,
                    image_ref: format!("photos/{i}.jpg"),
                    caption: Some(format!("duct run {i}")),
                    created_at: Some(10_000 + i as i64),
                })
                .unwrap()
        })
        .collect();
    Project {
        id,
        plan_a,
        plan_b,
        photos,
    }
}

fn point(x: f64, y: f64) -> NormalizedPoint {
    NormalizedPoint::new(x, y).unwrap()
}

#[test]
fn place_then_get_yields_exact_position_and_overwrites() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    session.select_plan(project.plan_a.id).unwrap();

    service.place_pin(&mut session, photo, point(0.5, 0.5)).unwrap();
    let stored = repo.get_placement(photo).unwrap();
    assert_eq!(
        stored.state,
        PlacementState::Placed(PinPosition::new(project.plan_a.id, point(0.5, 0.5)))
    );

    service.place_pin(&mut session, photo, point(0.2, 0.8)).unwrap();
    let stored = repo.get_placement(photo).unwrap();
    assert_eq!(stored.position().unwrap().point, point(0.2, 0.8));
    assert_eq!(repo.list_placements(project.id).unwrap().len(), 1);
    assert_eq!(session.placement(photo), stored);
}

#[test]
fn out_of_range_position_fails_and_store_is_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    let err = service
        .place_pin(&mut session, photo, NormalizedPoint { x: 1.5, y: 0.2 })
        .unwrap_err();

    assert!(matches!(
        err,
        ReviewServiceError::Review(ReviewError::InvalidPosition(PositionError::OutOfRange {
            axis: Axis::X,
            ..
        }))
    ));
    assert!(!session.placement(photo).is_placed());
    assert!(service.project_stats(project.id).unwrap().placed == 0);
}

#[test]
fn placement_survives_plan_switch_but_is_hidden_from_other_plan() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    session.select_plan(project.plan_a.id).unwrap();
    session.select_photo(photo).unwrap();
    service.place_pin(&mut session, photo, point(0.3, 0.4)).unwrap();

    session.select_plan(project.plan_b.id).unwrap();
    assert_eq!(
        session.state(),
        SessionState::PhotoSelected {
            plan_id: project.plan_b.id,
            photo_id: photo
        }
    );
    let placement = session.placement(photo);
    assert_eq!(placement.position().unwrap().plan_id, project.plan_a.id);
    assert!(session.visible_placements().is_empty());

    session.select_plan(project.plan_a.id).unwrap();
    assert_eq!(session.visible_placements(), vec![placement]);
}

#[test]
fn reopened_session_reproduces_persisted_state() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 3);
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());

    let mut session = service.open_session(project.id).unwrap();
    service
        .set_active_plan(&mut session, project.plan_a.id)
        .unwrap();
    service
        .place_pin(&mut session, project.photos[0].id, point(0.1, 0.9))
        .unwrap();
    service
        .place_pin(&mut session, project.photos[2].id, point(0.7, 0.3))
        .unwrap();
    drop(session);

    let reopened = service.open_session(project.id).unwrap();
    assert_eq!(reopened.active_plan_id(), Some(project.plan_a.id));
    assert_eq!(reopened.visible_placements().len(), 2);
    assert_eq!(
        reopened.stats(),
        PlacementStats {
            total: 3,
            placed: 2,
            unplaced: 1,
            percentage: 67
        }
    );
    assert_eq!(service.project_stats(project.id).unwrap(), reopened.stats());
}

#[test]
fn unplace_clears_persisted_row_and_is_noop_when_unplaced() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let sink = Arc::new(RecordingSink::default());
    let service = ReviewService::with_analytics(
        SqliteReviewRepository::try_new(&conn).unwrap(),
        sink.clone(),
    );
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    service.unplace_pin(&mut session, photo).unwrap();
    service.place_pin(&mut session, photo, point(0.5, 0.5)).unwrap();
    service.unplace_pin(&mut session, photo).unwrap();

    assert!(!session.placement(photo).is_placed());
    assert!(service
        .open_session(project.id)
        .unwrap()
        .visible_placements()
        .is_empty());
    assert_eq!(sink.names(), vec!["pin_placed", "pin_removed"]);
}

#[test]
fn analytics_sees_only_successful_mutations() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let sink = Arc::new(RecordingSink::default());
    let service = ReviewService::with_analytics(
        SqliteReviewRepository::try_new(&conn).unwrap(),
        sink.clone(),
    );
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    service
        .place_pin(&mut session, photo, NormalizedPoint { x: -0.1, y: 0.5 })
        .unwrap_err();
    service
        .set_active_plan(&mut session, project.plan_a.id)
        .unwrap();
    service.place_pin(&mut session, photo, point(0.4, 0.6)).unwrap();

    assert_eq!(sink.names(), vec!["active_plan_changed", "pin_placed"]);
}

#[test]
fn reactivating_flagged_plan_records_no_event() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 0);
    let sink = Arc::new(RecordingSink::default());
    let service = ReviewService::with_analytics(
        SqliteReviewRepository::try_new(&conn).unwrap(),
        sink.clone(),
    );

    let mut session = service.open_session(project.id).unwrap();
    service
        .set_active_plan(&mut session, project.plan_a.id)
        .unwrap();
    session.select_plan(project.plan_b.id).unwrap();
    service
        .set_active_plan(&mut session, project.plan_a.id)
        .unwrap();

    assert_eq!(session.active_plan_id(), Some(project.plan_a.id));
    assert_eq!(sink.names(), vec!["active_plan_changed"]);
    let events = sink.events.lock().unwrap();
    assert!(matches!(
        events[0],
        ReviewEvent::ActivePlanChanged {
            previous_plan_id: None,
            ..
        }
    ));
}

#[test]
fn failed_persistence_rolls_back_session() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let sink = Arc::new(RecordingSink::default());
    let service = ReviewService::with_analytics(
        FailingPlacementWrites {
            inner: SqliteReviewRepository::try_new(&conn).unwrap(),
        },
        sink.clone(),
    );
    let photo = project.photos[0].id;

    let mut session = service.open_session(project.id).unwrap();
    let view_before = session.active_plan_id();

    let err = service
        .place_pin(&mut session, photo, point(0.5, 0.5))
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Repo(RepoError::InvalidData(_))));
    assert!(!session.placement(photo).is_placed());

    let err = service
        .set_active_plan(&mut session, project.plan_a.id)
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Repo(_)));
    assert_eq!(session.active_plan_id(), view_before);
    assert_eq!(session.registry().flagged_plan_id(project.id), None);

    assert!(sink.names().is_empty());
}

#[test]
fn unknown_photo_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());

    let mut session = service.open_session(project.id).unwrap();
    let err = service
        .place_pin(&mut session, Uuid::new_v4(), point(0.5, 0.5))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn repository_save_rejects_unknown_plan() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = repo
        .save_placement(project.photos[0].id, &PinPosition::new(missing, point(0.5, 0.5)))
        .unwrap_err();
    assert!(matches!(err, RepoError::PlanNotFound(id) if id == missing));
}

#[test]
fn repository_save_rejects_plan_from_other_project() {
    let conn = open_db_in_memory().unwrap();
    let project = seed(&conn, 1);
    let other = seed(&conn, 0);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();
    let photo = project.photos[0].id;

    let err = repo
        .save_placement(photo, &PinPosition::new(other.plan_a.id, point(0.5, 0.5)))
        .unwrap_err();
    assert!(matches!(err, RepoError::PlanNotFound(id) if id == other.plan_a.id));
    assert!(!repo.get_placement(photo).unwrap().is_placed());
}

#[test]
fn empty_project_stats_are_zero() {
    let conn = open_db_in_memory().unwrap();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());

    let project_id = Uuid::new_v4();
    assert_eq!(
        service.project_stats(project_id).unwrap(),
        PlacementStats::default()
    );
    let session = service.open_session(project_id).unwrap();
    assert!(session.is_empty());
    assert_eq!(session.state(), SessionState::NoPlanSelected);
}

#[test]
fn placement_serializes_with_tagged_state() {
    let photo_id = Uuid::new_v4();
    let plan_id = Uuid::new_v4();
    let placed = Placement::placed(photo_id, PinPosition::new(plan_id, point(0.25, 0.75)));

    let value = serde_json::to_value(placed).unwrap();
    assert_eq!(value["state"]["state"], "placed");
    assert_eq!(value["state"]["position"]["point"]["x"], 0.25);

    let unplaced = serde_json::to_value(Placement::unplaced(photo_id)).unwrap();
    assert_eq!(unplaced["state"]["state"], "unplaced");
}
