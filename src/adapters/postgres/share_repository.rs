//! PostgreSQL implementation of ShareRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ConversationId, DomainError, ShareToken, Timestamp, UserId};
use crate::domain::library::Share;
use crate::ports::ShareRepository;

/// PostgreSQL implementation of ShareRepository.
#[derive(Clone)]
pub struct PostgresShareRepository {
    pool: PgPool,
}

impl PostgresShareRepository {
    /// Creates a new PostgresShareRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn share_from_row(row: &sqlx::postgres::PgRow) -> Result<Share, DomainError> {
        let token: String = row.get("token");
        let conversation_id: uuid::Uuid = row.get("conversation_id");
        let user_id: String = row.get("user_id");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

        Ok(Share {
            token: ShareToken::new(token).map_err(|e| DomainError::database(e.to_string()))?,
            conversation_id: ConversationId::from_uuid(conversation_id),
            user_id: UserId::new(user_id).map_err(|e| DomainError::database(e.to_string()))?,
            created_at: Timestamp::from_datetime(created_at),
        })
    }
}

#[async_trait]
impl ShareRepository for PostgresShareRepository {
    async fn create(&self, share: &Share) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO shares (token, conversation_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(share.token.as_str())
        .bind(share.conversation_id.as_uuid())
        .bind(share.user_id.as_str())
        .bind(share.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert share: {}", e)))?;

        Ok(())
    }

    async fn resolve(&self, token: &ShareToken) -> Result<Option<Share>, DomainError> {
        // Deliberately unscoped: holding the token is the authorization.
        let row = sqlx::query(
            r#"
            SELECT token, conversation_id, user_id, created_at
            FROM shares
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to resolve share: {}", e)))?;

        row.as_ref().map(Self::share_from_row).transpose()
    }

    async fn list(&self, user: &UserId) -> Result<Vec<Share>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT token, conversation_id, user_id, created_at
            FROM shares
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list shares: {}", e)))?;

        rows.iter().map(Self::share_from_row).collect()
    }

    async fn revoke(&self, token: &ShareToken, user: &UserId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM shares WHERE token = $1 AND user_id = $2")
            .bind(token.as_str())
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to revoke share: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("share", token.as_str()));
        }

        Ok(())
    }
}
