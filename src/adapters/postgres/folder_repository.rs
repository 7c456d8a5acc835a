//! PostgreSQL implementation of FolderRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, FolderId, Timestamp, UserId};
use crate::domain::library::Folder;
use crate::ports::FolderRepository;

/// PostgreSQL implementation of FolderRepository.
#[derive(Clone)]
pub struct PostgresFolderRepository {
    pool: PgPool,
}

impl PostgresFolderRepository {
    /// Creates a new PostgresFolderRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn folder_from_row(row: &sqlx::postgres::PgRow) -> Result<Folder, DomainError> {
        let id: uuid::Uuid = row.get("id");
        let user_id: String = row.get("user_id");
        let name: String = row.get("name");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

        Ok(Folder {
            id: FolderId::from_uuid(id),
            user_id: UserId::new(user_id).map_err(|e| DomainError::database(e.to_string()))?,
            name,
            created_at: Timestamp::from_datetime(created_at),
        })
    }
}

#[async_trait]
impl FolderRepository for PostgresFolderRepository {
    async fn create(&self, folder: &Folder) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO folders (id, user_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(folder.id.as_uuid())
        .bind(folder.user_id.as_str())
        .bind(&folder.name)
        .bind(folder.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert folder: {}", e)))?;

        Ok(())
    }

    async fn find(&self, id: FolderId, user: &UserId) -> Result<Option<Folder>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at
            FROM folders
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch folder: {}", e)))?;

        row.as_ref().map(Self::folder_from_row).transpose()
    }

    async fn list(&self, user: &UserId) -> Result<Vec<Folder>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, created_at
            FROM folders
            WHERE user_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list folders: {}", e)))?;

        rows.iter().map(Self::folder_from_row).collect()
    }

    async fn update(&self, folder: &Folder) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE folders SET name = $3
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(folder.id.as_uuid())
        .bind(folder.user_id.as_str())
        .bind(&folder.name)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update folder: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("folder", folder.id));
        }

        Ok(())
    }

    async fn delete(&self, id: FolderId, user: &UserId) -> Result<(), DomainError> {
        // Conversations in the folder fall back to no folder via
        // ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete folder: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("folder", id));
        }

        Ok(())
    }
}
