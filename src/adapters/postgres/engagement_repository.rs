//! PostgreSQL implementation of EngagementRepository.
//!
//! Votes use upsert semantics: one row per (message, user), a repeat vote
//! replaces the previous value.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::library::{Feedback, Vote};
use crate::ports::EngagementRepository;

use super::{str_to_vote, vote_to_str};

/// PostgreSQL implementation of EngagementRepository.
#[derive(Clone)]
pub struct PostgresEngagementRepository {
    pool: PgPool,
}

impl PostgresEngagementRepository {
    /// Creates a new PostgresEngagementRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementRepository for PostgresEngagementRepository {
    async fn upsert_vote(&self, vote: &Vote) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO votes (message_id, user_id, value, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (message_id, user_id)
            DO UPDATE SET value = EXCLUDED.value, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(vote.message_id.as_uuid())
        .bind(vote.user_id.as_str())
        .bind(vote_to_str(vote.value))
        .bind(vote.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert vote: {}", e)))?;

        Ok(())
    }

    async fn remove_vote(&self, message_id: MessageId, user: &UserId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM votes WHERE message_id = $1 AND user_id = $2")
            .bind(message_id.as_uuid())
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to remove vote: {}", e)))?;

        Ok(())
    }

    async fn votes_for_conversation(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<Vec<Vote>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT v.message_id, v.user_id, v.value, v.created_at
            FROM votes v
            JOIN messages m ON m.id = v.message_id
            WHERE m.conversation_id = $1 AND v.user_id = $2
            ORDER BY v.created_at ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch votes: {}", e)))?;

        rows.iter()
            .map(|row| {
                let message_id: uuid::Uuid = row.get("message_id");
                let user_id: String = row.get("user_id");
                let value: &str = row.get("value");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

                Ok(Vote {
                    message_id: MessageId::from_uuid(message_id),
                    user_id: UserId::new(user_id)
                        .map_err(|e| DomainError::database(e.to_string()))?,
                    value: str_to_vote(value)?,
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    async fn record_feedback(&self, feedback: &Feedback) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, user_id, conversation_id, message_id, content, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(feedback.id.as_uuid())
        .bind(feedback.user_id.as_str())
        .bind(feedback.conversation_id.as_ref().map(|c| *c.as_uuid()))
        .bind(feedback.message_id.as_ref().map(|m| *m.as_uuid()))
        .bind(&feedback.content)
        .bind(feedback.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record feedback: {}", e)))?;

        Ok(())
    }
}
