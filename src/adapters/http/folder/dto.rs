//! HTTP DTOs for folder endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::library::Folder;

/// Request to create a folder.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

/// Request to rename a folder.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameFolderRequest {
    pub name: String,
}

/// One folder in responses.
#[derive(Debug, Clone, Serialize)]
pub struct FolderResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

impl From<&Folder> for FolderResponse {
    fn from(folder: &Folder) -> Self {
        Self {
            id: *folder.id.as_uuid(),
            name: folder.name.clone(),
            created_at: folder.created_at.to_string(),
        }
    }
}
