//! PostgreSQL implementation of ConversationRepository.
//!
//! Persists conversation records and their messages. Every query is scoped
//! by the owning user id, so a conversation owned by someone else is
//! indistinguishable from a missing one.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{Citation, ImagePayload};
use crate::domain::foundation::{
    ConversationId, DomainError, FolderId, MessageId, Timestamp, UserId,
};
use crate::domain::library::{ConversationRecord, StoredMessage};
use crate::ports::ConversationRepository;

use super::{mode_to_str, role_to_str, str_to_mode, str_to_role};

/// PostgreSQL implementation of ConversationRepository.
#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    /// Creates a new PostgresConversationRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<ConversationRecord, DomainError> {
        let id: uuid::Uuid = row.get("id");
        let user_id: String = row.get("user_id");
        let title: String = row.get("title");
        let folder_id: Option<uuid::Uuid> = row.get("folder_id");
        let is_archived: bool = row.get("is_archived");
        let parent_id: Option<uuid::Uuid> = row.get("parent_conversation_id");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
        let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

        Ok(ConversationRecord {
            id: ConversationId::from_uuid(id),
            user_id: UserId::new(user_id).map_err(|e| DomainError::database(e.to_string()))?,
            title,
            folder_id: folder_id.map(FolderId::from_uuid),
            is_archived,
            parent_conversation_id: parent_id.map(ConversationId::from_uuid),
            created_at: Timestamp::from_datetime(created_at),
            updated_at: Timestamp::from_datetime(updated_at),
        })
    }

    fn message_from_row(row: &sqlx::postgres::PgRow) -> Result<StoredMessage, DomainError> {
        let id: uuid::Uuid = row.get("id");
        let conversation_id: uuid::Uuid = row.get("conversation_id");
        let role_str: &str = row.get("role");
        let content: String = row.get("content");
        let images: serde_json::Value = row.get("images");
        let citations: serde_json::Value = row.get("citations");
        let mode_str: Option<String> = row.get("mode");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

        let images: Vec<ImagePayload> = serde_json::from_value(images)
            .map_err(|e| DomainError::database(format!("corrupt images column: {}", e)))?;
        let citations: Vec<Citation> = serde_json::from_value(citations)
            .map_err(|e| DomainError::database(format!("corrupt citations column: {}", e)))?;
        let mode = mode_str.as_deref().map(str_to_mode).transpose()?;

        Ok(StoredMessage {
            id: MessageId::from_uuid(id),
            conversation_id: ConversationId::from_uuid(conversation_id),
            role: str_to_role(role_str)?,
            content,
            images,
            citations,
            mode,
            created_at: Timestamp::from_datetime(created_at),
        })
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn create(&self, record: &ConversationRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, user_id, title, folder_id, is_archived,
                parent_conversation_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(&record.title)
        .bind(record.folder_id.as_ref().map(|f| *f.as_uuid()))
        .bind(record.is_archived)
        .bind(record.parent_conversation_id.as_ref().map(|p| *p.as_uuid()))
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert conversation: {}", e)))?;

        Ok(())
    }

    async fn find(
        &self,
        id: ConversationId,
        user: &UserId,
    ) -> Result<Option<ConversationRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, folder_id, is_archived,
                   parent_conversation_id, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch conversation: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn list(
        &self,
        user: &UserId,
        include_archived: bool,
    ) -> Result<Vec<ConversationRecord>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, folder_id, is_archived,
                   parent_conversation_id, created_at, updated_at
            FROM conversations
            WHERE user_id = $1 AND (is_archived = false OR $2)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user.as_str())
        .bind(include_archived)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list conversations: {}", e)))?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn update(&self, record: &ConversationRecord) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                title = $3,
                folder_id = $4,
                is_archived = $5,
                updated_at = $6
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(&record.title)
        .bind(record.folder_id.as_ref().map(|f| *f.as_uuid()))
        .bind(record.is_archived)
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("conversation", record.id));
        }

        Ok(())
    }

    async fn delete(&self, id: ConversationId, user: &UserId) -> Result<(), DomainError> {
        // Messages go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("conversation", id));
        }

        Ok(())
    }

    async fn append_message(&self, message: &StoredMessage) -> Result<(), DomainError> {
        let images = serde_json::to_value(&message.images)
            .map_err(|e| DomainError::database(format!("Failed to encode images: {}", e)))?;
        let citations = serde_json::to_value(&message.citations)
            .map_err(|e| DomainError::database(format!("Failed to encode citations: {}", e)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, conversation_id, role, content, images, citations, mode, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(role_to_str(message.role))
        .bind(&message.content)
        .bind(images)
        .bind(citations)
        .bind(message.mode.map(mode_to_str))
        .bind(message.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert message: {}", e)))?;

        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(message.conversation_id.as_uuid())
            .bind(message.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to touch conversation: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn messages(
        &self,
        id: ConversationId,
        user: &UserId,
    ) -> Result<Vec<StoredMessage>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.conversation_id, m.role, m.content,
                   m.images, m.citations, m.mode, m.created_at
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE m.conversation_id = $1 AND c.user_id = $2
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch messages: {}", e)))?;

        rows.iter().map(Self::message_from_row).collect()
    }
}
