//! Placement repository contract and SQLite implementation.
//!
//! # Invariants
//! - `placements.photo_uuid` is the primary key: one row per placed photo.
//! - Absence of a row is the persisted form of `Unplaced`.
//! - A pin's plan and photo belong to the same project.
//! - Coordinates are re-validated on read; out-of-range rows are reported
//!   as `InvalidData`, never clamped.

use crate::model::geometry::{NormalizedPoint, PinPosition};
use crate::model::photo::PhotoId;
use crate::model::placement::Placement;
use crate::model::plan::{PlanId, ProjectId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::sqlite::{parse_uuid, SqliteReviewRepository};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Persistence contract for placements.
pub trait PlacementRepository {
    /// Loads every placed photo of one project.
    fn list_placements(&self, project_id: ProjectId) -> RepoResult<Vec<Placement>>;
    /// Loads one photo's placement; `Unplaced` when no row exists.
    fn get_placement(&self, photo_id: PhotoId) -> RepoResult<Placement>;
    /// Inserts or overwrites the pin of `photo_id`.
    fn save_placement(&self, photo_id: PhotoId, position: &PinPosition) -> RepoResult<()>;
    /// Removes the pin of `photo_id`. No-op when absent.
    fn delete_placement(&self, photo_id: PhotoId) -> RepoResult<()>;
}

impl PlacementRepository for SqliteReviewRepository<'_> {
    fn list_placements(&self, project_id: ProjectId) -> RepoResult<Vec<Placement>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                pl.photo_uuid AS photo_uuid,
                pl.plan_uuid AS plan_uuid,
                pl.x AS x,
                pl.y AS y
             FROM placements pl
             INNER JOIN photos ph ON ph.photo_uuid = pl.photo_uuid
             WHERE ph.project_uuid = ?1
             ORDER BY pl.photo_uuid ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_placement_row(row)?);
        }
        Ok(items)
    }

    fn get_placement(&self, photo_id: PhotoId) -> RepoResult<Placement> {
        let mut stmt = self.conn.prepare(
            "SELECT photo_uuid, plan_uuid, x, y
             FROM placements
             WHERE photo_uuid = ?1;",
        )?;
        let mut rows = stmt.query([photo_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_placement_row(row);
        }
        Ok(Placement::unplaced(photo_id))
    }

    fn save_placement(&self, photo_id: PhotoId, position: &PinPosition) -> RepoResult<()> {
        position
            .point
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        if !photo_exists(self.conn, photo_id)? {
            return Err(RepoError::PhotoNotFound(photo_id));
        }
        if !plan_shares_project(self.conn, position.plan_id, photo_id)? {
            return Err(RepoError::PlanNotFound(position.plan_id));
        }

        self.conn.execute(
            "INSERT INTO placements (photo_uuid, plan_uuid, x, y)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(photo_uuid) DO UPDATE SET
                plan_uuid = excluded.plan_uuid,
                x = excluded.x,
                y = excluded.y,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                photo_id.to_string(),
                position.plan_id.to_string(),
                position.point.x,
                position.point.y,
            ],
        )?;
        Ok(())
    }

    fn delete_placement(&self, photo_id: PhotoId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM placements WHERE photo_uuid = ?1;",
            [photo_id.to_string()],
        )?;
        Ok(())
    }
}

fn photo_exists(conn: &Connection, photo_id: PhotoId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM photos WHERE photo_uuid = ?1;",
            [photo_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// A plan of another project is reported as missing for this photo.
fn plan_shares_project(
    conn: &Connection,
    plan_id: PlanId,
    photo_id: PhotoId,
) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1
             FROM plans
             WHERE plan_uuid = ?1
               AND project_uuid = (
                   SELECT project_uuid FROM photos WHERE photo_uuid = ?2
               );",
            params![plan_id.to_string(), photo_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_placement_row(row: &Row<'_>) -> RepoResult<Placement> {
    let photo_uuid: String = row.get("photo_uuid")?;
    let plan_uuid: String = row.get("plan_uuid")?;
    let photo_id = parse_uuid(&photo_uuid, "placements.photo_uuid")?;
    let plan_id = parse_uuid(&plan_uuid, "placements.plan_uuid")?;
    let point = NormalizedPoint::new(row.get("x")?, row.get("y")?).map_err(|err| {
        RepoError::InvalidData(format!("placement of photo {photo_id}: {err}"))
    })?;
    Ok(Placement::placed(photo_id, PinPosition::new(plan_id, point)))
}
