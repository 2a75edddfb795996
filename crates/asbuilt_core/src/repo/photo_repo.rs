//! Photo repository contract and SQLite implementation.

use crate::model::photo::Photo;
use crate::model::plan::ProjectId;
use crate::repo::error::RepoResult;
use crate::repo::sqlite::{parse_uuid, SqliteReviewRepository};
use rusqlite::{params, Row};

const PHOTO_SELECT_SQL: &str = "SELECT
    photo_uuid,
    project_uuid,
    image_ref,
    caption,
    created_at
FROM photos";

/// Persistence contract for photos. Photos are write-once.
pub trait PhotoRepository {
    fn create_photo(&self, photo: &Photo) -> RepoResult<()>;
    /// Lists one project's photos oldest-first.
    fn list_photos(&self, project_id: ProjectId) -> RepoResult<Vec<Photo>>;
}

impl PhotoRepository for SqliteReviewRepository<'_> {
    fn create_photo(&self, photo: &Photo) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO photos (
                photo_uuid,
                project_uuid,
                image_ref,
                caption,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                photo.id.to_string(),
                photo.project_id.to_string(),
                photo.image_ref.as_str(),
                photo.caption.as_deref(),
                photo.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_photos(&self, project_id: ProjectId) -> RepoResult<Vec<Photo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHOTO_SELECT_SQL}
             WHERE project_uuid = ?1
             ORDER BY created_at ASC, photo_uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_photo_row(row)?);
        }
        Ok(items)
    }
}

fn parse_photo_row(row: &Row<'_>) -> RepoResult<Photo> {
    let photo_uuid: String = row.get("photo_uuid")?;
    let project_uuid: String = row.get("project_uuid")?;
    Ok(Photo {
        id: parse_uuid(&photo_uuid, "photos.photo_uuid")?,
        project_id: parse_uuid(&project_uuid, "photos.project_uuid")?,
        image_ref: row.get("image_ref")?,
        caption: row.get("caption")?,
        created_at: row.get("created_at")?,
    })
}
