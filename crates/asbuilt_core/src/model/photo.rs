//! Site photo domain model.

use crate::model::plan::ProjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one photo.
pub type PhotoId = Uuid;

/// One uploaded site photo. Immutable from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub project_id: ProjectId,
    /// Opaque handle into the external file store.
    pub image_ref: String,
    /// Optional observation text captured with the photo.
    pub caption: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Photo {
    /// Creates a photo record with a generated stable ID.
    pub fn new(project_id: ProjectId, image_ref: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            image_ref: image_ref.into(),
            caption: None,
            created_at,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}
