use asbuilt_core::db::open_db_in_memory;
use asbuilt_core::{
    NoopAnalyticsSink, Plan, PlanRepository, PlanUpload, ReviewError, ReviewService,
    ReviewServiceError, SqliteReviewRepository,
};
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn upload(project_id: Uuid, name: &str, created_at: i64) -> PlanUpload {
    PlanUpload {
        project_id,
        display_name: name.to_string(),
        image_ref: format!("{name}.png"),
        created_at: Some(created_at),
    }
}

fn active_rows(conn: &rusqlite::Connection, project_id: Uuid) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM plans WHERE project_uuid = ?1 AND is_active = 1;",
        [project_id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn list_plans_is_newest_first() {
    let conn = setup();
    let service = ReviewService::with_analytics(
        SqliteReviewRepository::try_new(&conn).unwrap(),
        Arc::new(NoopAnalyticsSink),
    );
    let project = Uuid::new_v4();

    let first = service.register_plan(upload(project, "L1", 1_000)).unwrap();
    let third = service.register_plan(upload(project, "L3", 3_000)).unwrap();
    let second = service.register_plan(upload(project, "L2", 2_000)).unwrap();

    let ids: Vec<_> = service
        .list_plans(project)
        .unwrap()
        .into_iter()
        .map(|plan| plan.id)
        .collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[test]
fn newest_plan_is_implicit_default() {
    let conn = setup();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let project = Uuid::new_v4();

    assert!(service.active_plan(project).unwrap().is_none());

    service.register_plan(upload(project, "A", 1_000)).unwrap();
    let b = service.register_plan(upload(project, "B", 2_000)).unwrap();

    assert_eq!(service.active_plan(project).unwrap().map(|p| p.id), Some(b.id));
    assert_eq!(active_rows(&conn, project), 0);
}

#[test]
fn set_active_plan_moves_flag_and_persists() {
    let conn = setup();
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();
    let project = Uuid::new_v4();

    let a = Plan::new(project, "A", "a.png", 1_000);
    let mut b = Plan::new(project, "B", "b.png", 2_000);
    b.is_active = true;
    repo.create_plan(&a).unwrap();
    repo.create_plan(&b).unwrap();

    let service = ReviewService::new(repo);
    assert_eq!(service.active_plan(project).unwrap().map(|p| p.id), Some(b.id));

    let mut session = service.open_session(project).unwrap();
    service.set_active_plan(&mut session, a.id).unwrap();

    assert_eq!(session.active_plan_id(), Some(a.id));
    assert_eq!(service.active_plan(project).unwrap().map(|p| p.id), Some(a.id));
    let stored_b = service
        .list_plans(project)
        .unwrap()
        .into_iter()
        .find(|plan| plan.id == b.id)
        .unwrap();
    assert!(!stored_b.is_active);
    assert_eq!(active_rows(&conn, project), 1);
}

#[test]
fn set_active_plan_rejects_plan_from_other_project() {
    let conn = setup();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let project = Uuid::new_v4();
    let other = Uuid::new_v4();

    service.register_plan(upload(project, "A", 1_000)).unwrap();
    let foreign = service.register_plan(upload(other, "X", 1_000)).unwrap();

    let mut session = service.open_session(project).unwrap();
    let before = session.active_plan_id();
    let err = service.set_active_plan(&mut session, foreign.id).unwrap_err();

    assert!(matches!(
        err,
        ReviewServiceError::Review(ReviewError::PlanNotFound { plan_id, .. }) if plan_id == foreign.id
    ));
    assert_eq!(session.active_plan_id(), before);
    assert_eq!(active_rows(&conn, project), 0);
    assert_eq!(active_rows(&conn, other), 0);
}

#[test]
fn repeated_activation_keeps_single_flag() {
    let conn = setup();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());
    let project = Uuid::new_v4();

    let plans: Vec<_> = (0..4i64)
        .map(|i| {
            service
                .register_plan(upload(project, &format!("P{i}"), i * 1_000))
                .unwrap()
        })
        .collect();

    let mut session = service.open_session(project).unwrap();
    for plan in plans.iter().chain(plans.iter().rev()) {
        service.set_active_plan(&mut session, plan.id).unwrap();
        assert_eq!(active_rows(&conn, project), 1);
        assert_eq!(
            service.active_plan(project).unwrap().map(|p| p.id),
            Some(plan.id)
        );
    }
}

#[test]
fn register_plan_rejects_blank_name() {
    let conn = setup();
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn).unwrap());

    let err = service
        .register_plan(upload(Uuid::new_v4(), "   ", 0))
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::InvalidDisplayName));
}
